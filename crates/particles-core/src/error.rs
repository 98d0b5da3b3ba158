//! Error types for configuration and per-frame rendering.
//!
//! Neither kind ever escapes the trigger surface: configuration problems are
//! repaired with defaults and rendering problems only skip one particle for
//! one frame. They are still typed so the fallback sites can log something
//! meaningful and tests can assert on them.

use thiserror::Error;

/// A track configuration that could not be used as written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no track config for track id {0}")]
    UnknownTrack(u32),
    #[error("invalid particle size {0}, using minimum size")]
    InvalidSize(f32),
    #[error("unknown shape kind '{0}'")]
    UnknownShape(String),
    #[error("unknown effect kind '{0}'")]
    UnknownEffect(String),
    #[error("unknown particle variant '{0}'")]
    UnknownVariant(String),
    #[error("min size {min} is greater than max size {max}")]
    SizeRange { min: f32, max: f32 },
    #[error("lifespan must be positive, got {0} ms")]
    Lifespan(f64),
    #[error("malformed color '{0}'")]
    Color(String),
    #[error("track config parse error: {0}")]
    Parse(String),
}

/// Failure while updating or drawing a single particle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("non-finite {what} for body {body}")]
    NonFinite { what: &'static str, body: u64 },
    #[error("body {0} missing from physics world")]
    MissingBody(u64),
    #[error("surface error: {0}")]
    Surface(String),
}
