// Shared simulation and visual tuning constants used by both web and native frontends.

// Physics world
pub const GRAVITY_PX_PER_SEC2: f32 = 200.0; // downward, screen coordinates
pub const AIR_DRAG_PER_SEC: f32 = 0.6; // fraction of velocity lost per second
pub const SUBSTEP_HZ: f32 = 120.0; // fixed internal integration rate
pub const MAX_SUBSTEPS_PER_FRAME: u32 = 8; // guards against spiral-of-death after stalls
pub const BASE_STEP_MS: f32 = 1000.0 / 60.0; // step over which a one-shot impulse acts
pub const FALLBACK_FRAME_MS: f64 = 1000.0 / 60.0; // dt used for the very first frame
pub const MAX_LINEAR_SPEED_PX_PER_SEC: f32 = 4000.0; // tiny bodies get huge kicks from small forces

// Boundary walls
pub const WALL_THICKNESS: f32 = 10.0;
pub const WALL_RESTITUTION: f32 = 0.8;
pub const WALL_FRICTION: f32 = 0.005;
pub const DEFAULT_CANVAS_SIZE: [f32; 2] = [800.0, 600.0];

// Bodies
pub const MIN_BODY_SIZE: f32 = 1.0;
pub const DEFAULT_FRICTION: f32 = 0.001;

// Note normalization
pub const DEFAULT_NOTE_VELOCITY: f32 = 0.7;
pub const MAX_PITCH: u8 = 127;

// Visual curves
pub const SIZE_BREATH_AMOUNT: f32 = 0.2; // how much particles shrink mid-life

// Command queue between the audio/UI drivers and the frame loop
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

// Track markers
pub const MARKER_PICK_RADIUS: f32 = 20.0;
