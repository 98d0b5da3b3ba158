#![cfg(target_arch = "wasm32")]
use glam::Vec2;
use instant::Instant;
use particles_core::{AnimationEngine, Rgba, ScheduledNote, Sequencer, Surface, TrackRegistry};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

mod audio;
mod canvas;
mod dom;
mod input;

use canvas::CanvasSurface;
use input::DragState;

const BACKGROUND: Rgba = Rgba::new(0.03, 0.04, 0.08, 1.0);
const MARKER_RADIUS: f32 = 14.0;
const SEED: u64 = 42;

struct Audio {
    ctx: web::AudioContext,
    bus: web::GainNode,
}

struct App {
    canvas: web::HtmlCanvasElement,
    surface: CanvasSurface,
    engine: AnimationEngine,
    sequencer: Sequencer,
    audio: Option<Audio>,
    drag: DragState,
    size: Vec2,
    last_frame: Instant,
    paused: bool,
    notes: Vec<ScheduledNote>,
}

impl App {
    fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Follow canvas resizes, moving markers proportionally.
    fn sync_size(&mut self) {
        let size = self.canvas_size();
        if size == self.size {
            return;
        }
        let scale = size / self.size.max(Vec2::ONE);
        self.engine.resize(size.x, size.y);
        for i in 0..self.sequencer.patterns.len() {
            let p = &self.sequencer.patterns[i];
            let (track, marker) = (p.track_id, p.marker * scale);
            self.sequencer.set_marker(i, marker);
            self.engine.update_track_position(track, marker.x, marker.y);
        }
        log::info!("[resize] {}x{}", size.x, size.y);
        self.size = size;
    }

    fn start_audio(&mut self) {
        if self.audio.is_some() {
            return;
        }
        let ctx = match web::AudioContext::new() {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("AudioContext error: {e:?}");
                return;
            }
        };
        if let Some(bus) = audio::master_gain(&ctx, 0.2) {
            log::info!("[audio] started");
            self.audio = Some(Audio { ctx, bus });
        }
    }

    fn frame(&mut self) {
        self.sync_size();
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        if !self.paused {
            let audio_time = self.audio.as_ref().map_or(0.0, |a| a.ctx.current_time());
            self.notes.clear();
            self.sequencer.tick(dt, audio_time, &mut self.notes);
            for n in &self.notes {
                self.engine
                    .trigger_animation(n.track_id, n.position.x, n.position.y, n.note);
                if let Some(a) = &self.audio {
                    audio::play_note(&a.ctx, &a.bus, n.track_id, &n.note, n.start_time_sec);
                }
            }
        }

        self.surface
            .clear(self.size.x as f64, self.size.y as f64, BACKGROUND);
        self.engine.update(&mut self.surface);
        self.draw_markers();
    }

    fn draw_markers(&mut self) {
        self.surface.set_font("12px sans-serif");
        for (i, p) in self.sequencer.patterns.iter().enumerate() {
            let Ok(config) = self.engine.registry().get(p.track_id) else {
                continue;
            };
            let muted = self.sequencer.tracks[i].muted;
            let alpha = if muted { 0.3 } else { 0.9 };
            self.surface.set_stroke(config.color.with_alpha(alpha), 2.0);
            let drawn = self
                .surface
                .stroke_circle(p.marker, MARKER_RADIUS)
                .and_then(|_| {
                    self.surface.set_fill(Rgba::WHITE.with_alpha(alpha));
                    self.surface
                        .fill_text(&config.name, p.marker + Vec2::new(MARKER_RADIUS + 4.0, 4.0))
                });
            if let Err(e) = drawn {
                log::warn!("marker {}: {e}", p.track_id);
            }
        }
    }

    fn pointer_down(&mut self, at: Vec2) {
        self.start_audio();
        if let Some(track) = self.engine.pick_marker(at) {
            self.drag.begin(track);
            log::info!("[pointer] begin drag on track {track}");
        }
    }

    fn pointer_move(&mut self, at: Vec2) {
        let Some(track) = self.drag.track else {
            return;
        };
        self.drag.moved = true;
        self.engine.update_track_position(track, at.x, at.y);
        if let Some(i) = self.sequencer.index_of(track) {
            self.sequencer.set_marker(i, at);
        }
    }

    fn pointer_up(&mut self, shift: bool, alt: bool) {
        let Some(track) = self.drag.end() else {
            return;
        };
        let Some(i) = self.sequencer.index_of(track) else {
            return;
        };
        if alt {
            self.sequencer.toggle_solo(i);
            log::info!("[click] solo track {track}");
        } else if shift {
            self.sequencer.reseed(i, None);
            log::info!("[click] reseed track {track}");
        } else {
            self.sequencer.toggle_mute(i);
            log::info!("[click] toggle mute track {track}");
        }
    }

    fn key_down(&mut self, key: &str) -> bool {
        match key {
            " " => self.paused = !self.paused,
            "d" | "D" => {
                let on = !self.engine.debug();
                self.engine.set_debug(on);
            }
            "c" | "C" => self.engine.cleanup(),
            "ArrowRight" | "+" | "=" => {
                let bpm = (self.sequencer.params.bpm + 5.0).min(240.0);
                self.sequencer.set_bpm(bpm);
            }
            "ArrowLeft" | "-" | "_" => {
                let bpm = (self.sequencer.params.bpm - 5.0).max(40.0);
                self.sequencer.set_bpm(bpm);
            }
            _ => return false,
        }
        true
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("particles-web starting");

    if let Err(e) = init() {
        log::error!("init error: {e:?}");
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id("app-canvas")
        .ok_or_else(|| anyhow::anyhow!("missing #app-canvas"))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    dom::wire_canvas_resize(&window, &canvas);

    let ctx: web::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|e| anyhow::anyhow!("{e:?}"))?
        .ok_or_else(|| anyhow::anyhow!("no 2d context"))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    let size = Vec2::new(canvas.width() as f32, canvas.height() as f32);
    let mut engine = AnimationEngine::new(TrackRegistry::builtin(), size.x, size.y);
    let sequencer = Sequencer::demo(size.x, size.y, SEED);
    for p in &sequencer.patterns {
        engine.update_track_position(p.track_id, p.marker.x, p.marker.y);
    }

    let app = Rc::new(RefCell::new(App {
        canvas: canvas.clone(),
        surface: CanvasSurface::new(ctx),
        engine,
        sequencer,
        audio: None,
        drag: DragState::default(),
        size,
        last_frame: Instant::now(),
        paused: false,
        notes: Vec::new(),
    }));

    wire_pointer(&canvas, &app);
    {
        let app = app.clone();
        dom::add_listener(&window, "keydown", move |ev: web::KeyboardEvent| {
            if app.borrow_mut().key_down(&ev.key()) {
                ev.prevent_default();
            }
        });
    }

    // requestAnimationFrame loop
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        app.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let Some(cb) = tick.borrow().as_ref() {
        window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    }
    Ok(())
}

fn wire_pointer(canvas: &web::HtmlCanvasElement, app: &Rc<RefCell<App>>) {
    {
        let app = app.clone();
        let c = canvas.clone();
        dom::add_listener(canvas, "pointerdown", move |ev: web::PointerEvent| {
            let at = input::pointer_canvas_px(&ev, &c);
            app.borrow_mut().pointer_down(at);
            ev.prevent_default();
        });
    }
    {
        let app = app.clone();
        let c = canvas.clone();
        dom::add_listener(canvas, "pointermove", move |ev: web::PointerEvent| {
            let at = input::pointer_canvas_px(&ev, &c);
            app.borrow_mut().pointer_move(at);
        });
    }
    {
        let app = app.clone();
        dom::add_listener(canvas, "pointerup", move |ev: web::PointerEvent| {
            app.borrow_mut().pointer_up(ev.shift_key(), ev.alt_key());
            ev.prevent_default();
        });
    }
}
