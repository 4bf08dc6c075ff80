use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{AudioContext, AudioContextState, OscillatorType};

use crate::game::SoundCue;

/// Short synthesized blip: frequency glide then a gain decay to near silence.
struct Tone {
    wave: OscillatorType,
    from_hz: f32,
    to_hz: f32,
    glide: f64,
    exponential_glide: bool,
    level: f32,
    length: f64,
}

fn tone(cue: SoundCue) -> Tone {
    match cue {
        SoundCue::Jump => Tone {
            wave: OscillatorType::Sine,
            from_hz: 300.0,
            to_hz: 500.0,
            glide: 0.1,
            exponential_glide: false,
            level: 0.3,
            length: 0.4,
        },
        SoundCue::Step => Tone {
            wave: OscillatorType::Triangle,
            from_hz: 100.0,
            to_hz: 50.0,
            glide: 0.05,
            exponential_glide: true,
            level: 0.2,
            length: 0.1,
        },
        SoundCue::Death => Tone {
            wave: OscillatorType::Sawtooth,
            from_hz: 220.0,
            to_hz: 150.0,
            glide: 0.15,
            exponential_glide: true,
            level: 0.6,
            length: 0.2,
        },
    }
}

pub struct Audio {
    context: Option<AudioContext>,
    volume: f32,
    /// Swallows a refused `resume()`; the next gesture retries.
    ignore_rejection: Closure<dyn FnMut(JsValue)>,
}

impl Audio {
    /// Audio is optional; a browser that refuses a context just stays silent.
    pub fn new(volume: f32) -> Self {
        let context = match AudioContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("Audio unavailable: {:?}", e);
                None
            }
        };
        Self {
            context,
            volume,
            ignore_rejection: Closure::wrap(Box::new(|_: JsValue| {}) as Box<dyn FnMut(JsValue)>),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn play(&self, cue: SoundCue) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.context else {
            return;
        };
        if let Err(e) = self.schedule(ctx, &tone(cue)) {
            log::warn!("Failed to play {:?}: {:?}", cue, e);
        }
    }

    fn schedule(&self, ctx: &AudioContext, tone: &Tone) -> Result<(), JsValue> {
        // Contexts start suspended until the page sees a user gesture.
        if ctx.state() == AudioContextState::Suspended {
            let _ = ctx.resume()?.catch(&self.ignore_rejection);
        }

        let osc = ctx.create_oscillator()?;
        let gain = ctx.create_gain()?;
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;

        let now = ctx.current_time();
        osc.set_type(tone.wave);
        let freq = osc.frequency();
        freq.set_value_at_time(tone.from_hz, now)?;
        if tone.exponential_glide {
            freq.exponential_ramp_to_value_at_time(tone.to_hz, now + tone.glide)?;
        } else {
            freq.linear_ramp_to_value_at_time(tone.to_hz, now + tone.glide)?;
        }

        let level = gain.gain();
        level.set_value_at_time(self.volume * tone.level, now)?;
        level.exponential_ramp_to_value_at_time(0.01, now + tone.length)?;

        osc.start()?;
        osc.stop_with_when(now + tone.length)?;
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(ctx) = self.context.take() {
            let _ = ctx.close();
        }
    }
}
