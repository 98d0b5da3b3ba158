//! Per-track visual configuration.
//!
//! Configs are plain immutable data. The registry hands out `Arc`s so that a
//! particle can keep the exact config it was spawned with even if the host
//! swaps the registry later. Loading is lenient where the engine has a safe
//! fallback (unknown shapes, unknown variants) and strict where it does not
//! (malformed JSON, malformed colors).

use crate::error::ConfigError;
use crate::variant::VariantKind;
use anyhow::Context;
use fnv::FnvHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub type TrackId = u32;

/// Straight-alpha color with components in 0..1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let err = || ConfigError::Color(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        let nibble = |i: usize| -> Result<f32, ConfigError> {
            let v = u8::from_str_radix(&hex[i..=i], 16).map_err(|_| err())?;
            Ok((v * 17) as f32 / 255.0)
        };
        let byte = |i: usize| -> Result<f32, ConfigError> {
            let v = u8::from_str_radix(hex.get(i..i + 2).ok_or_else(err)?, 16).map_err(|_| err())?;
            Ok(v as f32 / 255.0)
        };
        if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            3 => Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, 1.0)),
            6 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, 1.0)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(err()),
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba()` string for canvas style setters.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            channel_u8(self.r),
            channel_u8(self.g),
            channel_u8(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

#[inline]
fn channel_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            channel_u8(self.r),
            channel_u8(self.g),
            channel_u8(self.b),
            channel_u8(self.a)
        )
    }
}

impl TryFrom<String> for Rgba {
    type Error = ConfigError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&s)
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

/// Geometry of a particle body and of its drawn shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Circle,
    Square,
    Triangle,
}

impl FromStr for ShapeKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" | "ellipse" => Ok(Self::Circle),
            "square" | "rectangle" | "rect" => Ok(Self::Square),
            "triangle" => Ok(Self::Triangle),
            _ => Err(ConfigError::UnknownShape(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ShapeKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(s.parse().unwrap_or_else(|e: ConfigError| {
            log::warn!("{e}, falling back to circle");
            ShapeKind::Circle
        }))
    }
}

/// Where particles are born relative to the track marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub radius: f32,
    /// Distribution shape: small values concentrate births near the center.
    pub spread: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            radius: 100.0,
            spread: 1.0,
        }
    }
}

/// Initial kick given to a new particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub force: f32,
    pub vertical_bias: f32,
    pub horizontal_spread: f32,
    pub randomness: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            force: 0.05,
            vertical_bias: 0.7,
            horizontal_spread: 0.5,
            randomness: 0.3,
        }
    }
}

/// How strongly a track reacts to the note's velocity, pitch and duration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteResponse {
    pub size_scale: f32,
    pub pitch_effect: f32,
    pub duration_scale: f32,
}

impl Default for NoteResponse {
    fn default() -> Self {
        Self {
            size_scale: 1.0,
            pitch_effect: 1.0,
            duration_scale: 1.0,
        }
    }
}

/// Kinds of attachable visual effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Pulse,
    Shockwave,
    Trail,
    Glow,
}

impl FromStr for EffectKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pulse" => Ok(Self::Pulse),
            "shockwave" => Ok(Self::Shockwave),
            "trail" => Ok(Self::Trail),
            "glow" => Ok(Self::Glow),
            _ => Err(ConfigError::UnknownEffect(s.to_string())),
        }
    }
}

/// Optional overrides for an effect's defaults. Each effect reads only the
/// fields it understands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    pub frequency: Option<f32>,
    pub amplitude: Option<f32>,
    pub velocity_influence: Option<f32>,
    pub duration_ms: Option<f32>,
    pub max_radius: Option<f32>,
    pub max_points: Option<usize>,
    pub fade_speed: Option<f32>,
    pub min_opacity: Option<f32>,
    pub intensity: Option<f32>,
    pub size: Option<f32>,
}

/// An effect requested by a track config. `kind` stays a string so that a
/// typo in one descriptor only drops that effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub kind: String,
    #[serde(default)]
    pub params: EffectParams,
}

impl EffectDescriptor {
    pub fn new(kind: EffectKind, params: EffectParams) -> Self {
        let kind = match kind {
            EffectKind::Pulse => "pulse",
            EffectKind::Shockwave => "shockwave",
            EffectKind::Trail => "trail",
            EffectKind::Glow => "glow",
        };
        Self {
            kind: kind.to_string(),
            params,
        }
    }

    pub fn kind(&self) -> Result<EffectKind, ConfigError> {
        self.kind.parse()
    }
}

fn lenient_variant<'de, D: Deserializer<'de>>(d: D) -> Result<Option<VariantKind>, D::Error> {
    let s = Option::<String>::deserialize(d)?;
    Ok(s.and_then(|s| match s.parse::<VariantKind>() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("{e}, variant will be chosen by track id");
            None
        }
    }))
}

/// Immutable description of how one track's particles look and move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackVisualConfig {
    pub name: String,
    pub color: Rgba,
    /// Tint used once the triggering note has stopped sounding.
    pub inactive_color: Rgba,
    pub min_size: f32,
    pub max_size: f32,
    pub lifespan_ms: f64,
    pub fade_out: bool,
    pub shape: ShapeKind,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    pub spawn: SpawnConfig,
    pub motion: MotionConfig,
    pub note_response: NoteResponse,
    #[serde(deserialize_with = "lenient_variant")]
    pub variant: Option<VariantKind>,
    pub effects: Vec<EffectDescriptor>,
}

impl Default for TrackVisualConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Rgba::WHITE,
            inactive_color: Rgba::BLACK,
            min_size: 20.0,
            max_size: 40.0,
            lifespan_ms: 2000.0,
            fade_out: true,
            shape: ShapeKind::Circle,
            density: 0.001,
            restitution: 0.7,
            friction: crate::constants::DEFAULT_FRICTION,
            spawn: SpawnConfig::default(),
            motion: MotionConfig::default(),
            note_response: NoteResponse::default(),
            variant: None,
            effects: Vec::new(),
        }
    }
}

impl TrackVisualConfig {
    /// Report every problem with this config without changing it.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        if self.min_size > self.max_size {
            problems.push(ConfigError::SizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if !(self.lifespan_ms > 0.0) {
            problems.push(ConfigError::Lifespan(self.lifespan_ms));
        }
        for e in &self.effects {
            if let Err(err) = e.kind() {
                problems.push(err);
            }
        }
        problems
    }

    /// Copy of this config with the repairable problems fixed.
    pub fn repaired(mut self) -> Self {
        if self.min_size > self.max_size {
            std::mem::swap(&mut self.min_size, &mut self.max_size);
        }
        if !(self.lifespan_ms > 0.0) {
            self.lifespan_ms = TrackVisualConfig::default().lifespan_ms;
        }
        self
    }
}

#[derive(Deserialize)]
struct TrackEntry {
    id: TrackId,
    #[serde(flatten)]
    config: TrackVisualConfig,
}

/// Lookup table from track id to its visual config.
#[derive(Clone, Debug, Default)]
pub struct TrackRegistry {
    tracks: FnvHashMap<TrackId, Arc<TrackVisualConfig>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a track. Problems are logged and repaired.
    pub fn insert(&mut self, id: TrackId, config: TrackVisualConfig) {
        for problem in config.validate() {
            log::warn!("track {id} ({}): {problem}", config.name);
        }
        self.tracks.insert(id, Arc::new(config.repaired()));
    }

    pub fn get(&self, id: TrackId) -> Result<Arc<TrackVisualConfig>, ConfigError> {
        self.tracks
            .get(&id)
            .cloned()
            .ok_or(ConfigError::UnknownTrack(id))
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Track ids in ascending order.
    pub fn ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Parse a JSON array of `{ "id": n, ...config }` objects.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<TrackEntry> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(entry.id, entry.config);
        }
        Ok(registry)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading track config {}", path.display()))?;
        let registry = Self::from_json(&json)
            .with_context(|| format!("parsing track config {}", path.display()))?;
        log::info!("loaded {} track configs from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// The eight tracks of the default arrangement.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (id, config) in builtin_tracks().into_iter().enumerate() {
            registry.insert(id as TrackId, config);
        }
        registry
    }
}

#[allow(clippy::too_many_arguments)]
fn track(
    name: &str,
    color: Rgba,
    sizes: [f32; 2],
    lifespan_ms: f64,
    shape: ShapeKind,
    physics: [f32; 2],
    spawn: [f32; 2],
    motion: [f32; 4],
    response: [f32; 3],
    variant: VariantKind,
    effects: Vec<EffectDescriptor>,
) -> TrackVisualConfig {
    TrackVisualConfig {
        name: name.to_string(),
        color,
        min_size: sizes[0],
        max_size: sizes[1],
        lifespan_ms,
        shape,
        density: physics[0],
        restitution: physics[1],
        spawn: SpawnConfig {
            radius: spawn[0],
            spread: spawn[1],
        },
        motion: MotionConfig {
            force: motion[0],
            vertical_bias: motion[1],
            horizontal_spread: motion[2],
            randomness: motion[3],
        },
        note_response: NoteResponse {
            size_scale: response[0],
            pitch_effect: response[1],
            duration_scale: response[2],
        },
        variant: Some(variant),
        effects,
        ..TrackVisualConfig::default()
    }
}

fn hex(s: &str) -> Rgba {
    Rgba::from_hex(s).unwrap_or(Rgba::WHITE)
}

#[rustfmt::skip]
fn builtin_tracks() -> Vec<TrackVisualConfig> {
    use ShapeKind::*;
    use VariantKind::*;
    let pulse = EffectDescriptor::new(
        EffectKind::Pulse,
        EffectParams {
            frequency: Some(1.0),
            amplitude: Some(0.2),
            ..Default::default()
        },
    );
    let glow = EffectDescriptor::new(
        EffectKind::Glow,
        EffectParams {
            intensity: Some(0.7),
            size: Some(1.8),
            ..Default::default()
        },
    );
    let shockwave = EffectDescriptor::new(
        EffectKind::Shockwave,
        EffectParams {
            duration_ms: Some(300.0),
            max_radius: Some(80.0),
            ..Default::default()
        },
    );
    let trail = EffectDescriptor::new(
        EffectKind::Trail,
        EffectParams {
            max_points: Some(15),
            fade_speed: Some(0.15),
            ..Default::default()
        },
    );
    vec![
        track("Bass", hex("#3B82F6"), [80.0, 160.0], 2000.0, Circle, [0.001, 0.8],
            [30.0, 1.0], [0.15, 0.8, 0.3, 0.2], [1.5, 0.6, 1.2], Bass,
            vec![pulse.clone(), glow.clone()]),
        track("Drums", hex("#EF4444"), [30.0, 60.0], 1500.0, Square, [0.001, 0.9],
            [20.0, 0.8], [0.2, 0.6, 0.5, 0.4], [2.0, 0.3, 0.8], Drum,
            vec![shockwave.clone()]),
        track("Lead", hex("#10B981"), [40.0, 100.0], 2000.0, Triangle, [0.008, 0.85],
            [25.0, 0.9], [0.1, 0.7, 0.4, 0.3], [1.2, 1.5, 1.0], Lead,
            vec![trail.clone()]),
        track("Pad", hex("#8B5CF6"), [100.0, 200.0], 3000.0, Circle, [0.0005, 0.7],
            [40.0, 1.2], [0.05, 0.6, 0.6, 0.3], [0.8, 1.0, 1.5], Bass,
            vec![glow]),
        track("Arpeggio", hex("#F59E0B"), [20.0, 50.0], 1000.0, Triangle, [0.002, 0.95],
            [15.0, 0.7], [0.25, 0.9, 0.2, 0.4], [1.0, 2.0, 0.7], Lead,
            vec![trail]),
        track("FX", hex("#EC4899"), [30.0, 120.0], 2500.0, Square, [0.001, 0.9],
            [35.0, 1.3], [0.15, 0.5, 0.8, 0.6], [1.8, 1.2, 1.1], Drum,
            vec![shockwave.clone()]),
        track("Sub Bass", hex("#1D4ED8"), [100.0, 200.0], 2500.0, Circle, [0.002, 0.7],
            [20.0, 0.6], [0.1, 0.7, 0.2, 0.15], [1.3, 0.4, 1.4], Bass,
            vec![pulse]),
        track("Percussion", hex("#DC2626"), [25.0, 45.0], 1000.0, Square, [0.001, 0.95],
            [15.0, 0.7], [0.3, 0.5, 0.6, 0.5], [2.2, 0.5, 0.6], Drum,
            vec![shockwave]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_in_all_widths() {
        let c = Rgba::from_hex("#ff0000").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 1.0));
        let c = Rgba::from_hex("#0f0").unwrap();
        assert_eq!((c.r, c.g, c.b), (0.0, 1.0, 0.0));
        let c = Rgba::from_hex("#00000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert!(Rgba::from_hex("red").is_err());
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gg0000").is_err());
        assert!(Rgba::from_hex("#+f+f+f").is_err());
        assert!(Rgba::from_hex("#+ff").is_err());
    }

    #[test]
    fn shape_aliases_parse() {
        assert_eq!("rectangle".parse::<ShapeKind>().unwrap(), ShapeKind::Square);
        assert_eq!("Triangle".parse::<ShapeKind>().unwrap(), ShapeKind::Triangle);
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn repaired_swaps_inverted_sizes() {
        let cfg = TrackVisualConfig {
            min_size: 50.0,
            max_size: 10.0,
            lifespan_ms: 0.0,
            ..Default::default()
        };
        assert_eq!(cfg.validate().len(), 2);
        let fixed = cfg.repaired();
        assert_eq!((fixed.min_size, fixed.max_size), (10.0, 50.0));
        assert_eq!(fixed.lifespan_ms, 2000.0);
    }
}
