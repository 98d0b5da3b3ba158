use glam::Vec2;
use particles_core::TrackId;
use web_sys as web;

/// Marker currently held by the pointer.
#[derive(Default, Clone, Copy, Debug)]
pub struct DragState {
    pub track: Option<TrackId>,
    /// Set once the pointer moved while held, so release is not a click.
    pub moved: bool,
}

impl DragState {
    pub fn begin(&mut self, track: TrackId) {
        self.track = Some(track);
        self.moved = false;
    }

    /// End the drag; returns the track that was clicked without moving.
    pub fn end(&mut self) -> Option<TrackId> {
        let clicked = self.track.filter(|_| !self.moved);
        *self = Self::default();
        clicked
    }
}

/// Pointer position in canvas backing pixels.
#[inline]
pub fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let x_css = ev.client_x() as f32 - rect.left() as f32;
    let y_css = ev.client_y() as f32 - rect.top() as f32;
    let w = (rect.width() as f32).max(1.0);
    let h = (rect.height() as f32).max(1.0);
    Vec2::new(
        x_css / w * canvas.width() as f32,
        y_css / h * canvas.height() as f32,
    )
}
