use anyhow::Context;
use clap::Parser;
use particles_core::{AnimationEngine, FrameStats, RecordingSurface, Sequencer, TrackRegistry};
use std::path::PathBuf;
use std::time::Duration;

/// Drive the demo sequencer and the particle engine without a window and
/// report what happened.
#[derive(Parser, Debug)]
#[command(name = "particles-native", version, about)]
struct Args {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
    /// Seed for both the sequencer and the engine
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    #[arg(long, default_value_t = 600.0)]
    height: f32,
    #[arg(long, default_value_t = 110.0)]
    bpm: f32,
    /// JSON track config; the built-in tracks are used when absent
    #[arg(long)]
    config: Option<PathBuf>,
    /// Draw the debug overlay into the recorded frames
    #[arg(long)]
    debug: bool,
}

#[derive(Default)]
struct RunStats {
    frames: u64,
    notes: u64,
    peak_particles: usize,
    expired: usize,
    failed: usize,
    draw_calls: usize,
}

impl RunStats {
    fn record(&mut self, frame: &FrameStats, draw_calls: usize) {
        self.frames += 1;
        self.peak_particles = self.peak_particles.max(frame.alive);
        self.expired += frame.expired;
        self.failed += frame.failed;
        self.draw_calls += draw_calls;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    anyhow::ensure!(args.fps > 0.0, "fps must be positive");
    anyhow::ensure!(args.seconds >= 0.0, "seconds must not be negative");

    let registry = match &args.config {
        Some(path) => TrackRegistry::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TrackRegistry::builtin(),
    };

    let mut engine = AnimationEngine::with_seed(registry, args.width, args.height, args.seed);
    engine.set_debug(args.debug);
    let mut sequencer = Sequencer::demo(args.width, args.height, args.seed);
    sequencer.set_bpm(args.bpm);
    for p in &sequencer.patterns {
        engine.update_track_position(p.track_id, p.marker.x, p.marker.y);
    }

    let frame_ms = 1000.0 / args.fps;
    let total_frames = (args.seconds * args.fps).round() as u64;
    let mut surface = RecordingSurface::new();
    let mut notes = Vec::new();
    let mut stats = RunStats::default();

    for frame in 0..total_frames {
        let now_ms = frame as f64 * frame_ms;
        notes.clear();
        sequencer.tick(
            Duration::from_secs_f64(frame_ms / 1000.0),
            now_ms / 1000.0,
            &mut notes,
        );
        for n in &notes {
            engine.trigger_animation(n.track_id, n.position.x, n.position.y, n.note);
        }
        stats.notes += notes.len() as u64;

        surface.clear();
        let frame_stats = engine.update_at(now_ms, &mut surface);
        stats.record(&frame_stats, surface.shape_count());

        if frame % args.fps.round().max(1.0) as u64 == 0 {
            log::info!(
                "t={:>5.1}s particles={:>3} substeps={} notes={}",
                now_ms / 1000.0,
                frame_stats.alive,
                frame_stats.substeps,
                stats.notes
            );
        }
    }

    log::info!(
        "done: {} frames, {} notes, peak {} particles, {} expired, {} failed draws, {} shapes drawn, {} left",
        stats.frames,
        stats.notes,
        stats.peak_particles,
        stats.expired,
        stats.failed,
        stats.draw_calls,
        engine.particle_count()
    );
    engine.cleanup();
    Ok(())
}
