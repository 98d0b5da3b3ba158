//! Drawing primitives the engine needs from its host.
//!
//! The engine never owns a canvas. Hosts implement `Surface` over whatever
//! they render with (a 2D canvas context on the web). `RecordingSurface`
//! keeps the calls in memory for headless runs and tests.

use crate::config::Rgba;
use crate::error::RenderError;
use glam::Vec2;

pub trait Surface {
    /// Push the current transform and styles.
    fn save(&mut self);
    /// Pop what the matching `save` pushed.
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, radians: f32);
    fn set_fill(&mut self, color: Rgba);
    fn set_stroke(&mut self, color: Rgba, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError>;
    fn stroke_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError>;
    fn fill_rect(&mut self, origin: Vec2, size: Vec2) -> Result<(), RenderError>;
    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) -> Result<(), RenderError>;
    fn fill_text(&mut self, text: &str, at: Vec2) -> Result<(), RenderError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate(Vec2),
    Rotate(f32),
    Fill(Rgba),
    Stroke(Rgba, f32),
    FillCircle { center: Vec2, radius: f32 },
    StrokeCircle { center: Vec2, radius: f32 },
    FillRect { origin: Vec2, size: Vec2 },
    FillTriangle([Vec2; 3]),
    Text(String, Vec2),
}

/// A surface that remembers every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    depth: usize,
    /// When set, the next shape call fails once. Used to exercise error paths.
    pub fail_next_shape: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.depth = 0;
    }

    /// Current save/restore nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Number of filled or stroked shapes.
    pub fn shape_count(&self) -> usize {
        self.count(|c| {
            matches!(
                c,
                DrawCommand::FillCircle { .. }
                    | DrawCommand::StrokeCircle { .. }
                    | DrawCommand::FillRect { .. }
                    | DrawCommand::FillTriangle(_)
            )
        })
    }

    fn shape(&mut self, cmd: DrawCommand) -> Result<(), RenderError> {
        if std::mem::take(&mut self.fail_next_shape) {
            return Err(RenderError::Surface("injected failure".into()));
        }
        self.commands.push(cmd);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::Save);
    }
    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.commands.push(DrawCommand::Restore);
    }
    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }
    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }
    fn set_fill(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Fill(color));
    }
    fn set_stroke(&mut self, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Stroke(color, width));
    }
    fn fill_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError> {
        self.shape(DrawCommand::FillCircle { center, radius })
    }
    fn stroke_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError> {
        self.shape(DrawCommand::StrokeCircle { center, radius })
    }
    fn fill_rect(&mut self, origin: Vec2, size: Vec2) -> Result<(), RenderError> {
        self.shape(DrawCommand::FillRect { origin, size })
    }
    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) -> Result<(), RenderError> {
        self.shape(DrawCommand::FillTriangle([a, b, c]))
    }
    fn fill_text(&mut self, text: &str, at: Vec2) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::Text(text.to_string(), at));
        Ok(())
    }
}
