use particles_core::midi_to_hz;
use particles_core::NoteEvent;
use web_sys as web;

/// Master bus every note is routed through.
pub fn master_gain(audio_ctx: &web::AudioContext, level: f32) -> Option<web::GainNode> {
    let gain = match web::GainNode::new(audio_ctx) {
        Ok(g) => g,
        Err(e) => {
            log::error!("GainNode error: {e:?}");
            return None;
        }
    };
    gain.gain().set_value(level);
    if let Err(e) = gain.connect_with_audio_node(&audio_ctx.destination()) {
        log::error!("connect error: {e:?}");
        return None;
    }
    Some(gain)
}

fn waveform_for_track(track_id: u32) -> web::OscillatorType {
    match track_id % 3 {
        0 => web::OscillatorType::Sine,
        1 => web::OscillatorType::Square,
        _ => web::OscillatorType::Triangle,
    }
}

/// Fire a short enveloped oscillator for `note`.
pub fn play_note(
    audio_ctx: &web::AudioContext,
    bus: &web::GainNode,
    track_id: u32,
    note: &NoteEvent,
    start_time_sec: f64,
) {
    let Ok(src) = web::OscillatorNode::new(audio_ctx) else {
        return;
    };
    src.set_type(waveform_for_track(track_id));
    src.frequency().set_value(midi_to_hz(note.pitch as f32));
    let Ok(env) = web::GainNode::new(audio_ctx) else {
        return;
    };
    let duration = (note.duration_ms / 1000.0).max(0.05);
    let t0 = start_time_sec.max(audio_ctx.current_time());
    env.gain().set_value(0.0);
    let _ = env.gain().linear_ramp_to_value_at_time(note.velocity, t0 + 0.01);
    let _ = env.gain().linear_ramp_to_value_at_time(0.0, t0 + duration);
    let _ = src.connect_with_audio_node(&env);
    let _ = env.connect_with_audio_node(bus);
    let _ = src.start_with_when(t0);
    let _ = src.stop_with_when(t0 + duration + 0.02);
}
