use glam::Vec2;
use particles_core::{RenderError, Rgba, Surface};
use std::f64::consts::TAU;
use wasm_bindgen::JsValue;
use web_sys as web;

/// `Surface` over a 2D canvas context.
pub struct CanvasSurface {
    ctx: web::CanvasRenderingContext2d,
}

fn js_err(e: JsValue) -> RenderError {
    RenderError::Surface(format!("{e:?}"))
}

impl CanvasSurface {
    pub fn new(ctx: web::CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    /// Fill the whole canvas with the background color.
    pub fn clear(&self, width: f64, height: f64, background: Rgba) {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
        #[allow(deprecated)]
        self.ctx.set_fill_style(&JsValue::from_str(&background.to_css()));
        self.ctx.fill_rect(0.0, 0.0, width, height);
    }

    pub fn set_font(&self, font: &str) {
        self.ctx.set_font(font);
    }
}

impl Surface for CanvasSurface {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, offset: Vec2) {
        if let Err(e) = self.ctx.translate(offset.x as f64, offset.y as f64) {
            log::debug!("translate: {e:?}");
        }
    }

    fn rotate(&mut self, radians: f32) {
        if let Err(e) = self.ctx.rotate(radians as f64) {
            log::debug!("rotate: {e:?}");
        }
    }

    fn set_fill(&mut self, color: Rgba) {
        #[allow(deprecated)]
        self.ctx.set_fill_style(&JsValue::from_str(&color.to_css()));
    }

    fn set_stroke(&mut self, color: Rgba, width: f32) {
        #[allow(deprecated)]
        self.ctx.set_stroke_style(&JsValue::from_str(&color.to_css()));
        self.ctx.set_line_width(width as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError> {
        self.ctx.begin_path();
        self.ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)
            .map_err(js_err)?;
        self.ctx.fill();
        Ok(())
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32) -> Result<(), RenderError> {
        self.ctx.begin_path();
        self.ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)
            .map_err(js_err)?;
        self.ctx.stroke();
        Ok(())
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) -> Result<(), RenderError> {
        self.ctx
            .fill_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
        Ok(())
    }

    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) -> Result<(), RenderError> {
        self.ctx.begin_path();
        self.ctx.move_to(a.x as f64, a.y as f64);
        self.ctx.line_to(b.x as f64, b.y as f64);
        self.ctx.line_to(c.x as f64, c.y as f64);
        self.ctx.close_path();
        self.ctx.fill();
        Ok(())
    }

    fn fill_text(&mut self, text: &str, at: Vec2) -> Result<(), RenderError> {
        self.ctx
            .fill_text(text, at.x as f64, at.y as f64)
            .map_err(js_err)
    }
}
