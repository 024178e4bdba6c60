//! Audio cues: reference tones, metronome clicks, and answer feedback.
//!
//! The session never talks to cpal directly; it issues fire-and-forget cues
//! through [`AudioSink`]. The real implementation synthesizes simple
//! enveloped waveforms in the cpal output callback, fed by an mpsc channel.
//! If no output device is available every cue degrades to a silent no-op —
//! audio is advisory and must never affect game state.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;

use crate::note::PitchClass;

/// Opaque sink for audio requests. No call returns a value the caller
/// consults; failures are swallowed inside the sink.
pub trait AudioSink {
    /// Idempotent lazy start of the output stream. Called on the first
    /// user interaction so the device is only claimed once it's wanted.
    fn resume(&mut self);
    /// Reference tone for a pitch class (long triangle wave).
    fn play_tone(&mut self, pitch: PitchClass);
    /// Metronome click, brighter and louder on the accented beat.
    fn play_click(&mut self, accent: bool);
    /// Correct-answer cue: a quick C5/E5/G5 arpeggio.
    fn play_success(&mut self);
    /// Wrong-answer cue: a short dissonant sawtooth pair.
    fn play_incorrect(&mut self);
}

/// A cue sent to the audio callback.
enum Cue {
    Tone { freq: f64 },
    Click { accent: bool },
    Success,
    Incorrect,
}

#[derive(Clone, Copy)]
enum Wave {
    Sine,
    Triangle,
    Saw,
}

/// One sounding oscillator with an exponential-decay envelope.
struct Voice {
    wave: Wave,
    freq: f64,
    gain: f64,
    /// Samples to wait before the voice starts (staggers the arpeggio).
    delay: usize,
    remaining: usize,
    env: f64,
    decay: f64,
    phase: f64,
}

impl Voice {
    fn new(wave: Wave, freq: f64, gain: f64, delay_secs: f64, dur_secs: f64, rate: f64) -> Self {
        let remaining = (dur_secs * rate) as usize;
        // Ramp the envelope down to 1% of its start over the duration.
        let decay = 0.01_f64.powf(1.0 / remaining.max(1) as f64);
        Voice {
            wave,
            freq,
            gain,
            delay: (delay_secs * rate) as usize,
            remaining,
            env: 1.0,
            decay,
            phase: 0.0,
        }
    }

    /// Next output sample, or 0.0 while delayed. Advances internal state.
    fn sample(&mut self, rate: f64) -> f64 {
        if self.delay > 0 {
            self.delay -= 1;
            return 0.0;
        }
        if self.remaining == 0 {
            return 0.0;
        }
        let t = self.phase / rate;
        let angle = 2.0 * std::f64::consts::PI * self.freq * t;
        let value = match self.wave {
            Wave::Sine => angle.sin(),
            Wave::Triangle => angle.sin().asin() * std::f64::consts::FRAC_2_PI,
            Wave::Saw => 2.0 * (self.freq * t).fract() - 1.0,
        };
        self.phase += 1.0;
        self.remaining -= 1;
        let out = value * self.gain * self.env;
        self.env *= self.decay;
        out
    }

    fn finished(&self) -> bool {
        self.delay == 0 && self.remaining == 0
    }
}

/// Expand a cue into its voices.
fn voices_for(cue: Cue, rate: f64) -> Vec<Voice> {
    match cue {
        Cue::Tone { freq } => vec![Voice::new(Wave::Triangle, freq, 0.2, 0.0, 1.5, rate)],
        Cue::Click { accent } => {
            let (freq, gain) = if accent { (1200.0, 0.3) } else { (800.0, 0.15) };
            vec![Voice::new(Wave::Sine, freq, gain, 0.0, 0.1, rate)]
        }
        Cue::Success => vec![
            Voice::new(Wave::Sine, 523.25, 0.1, 0.0, 0.3, rate),
            Voice::new(Wave::Sine, 659.25, 0.1, 0.05, 0.3, rate),
            Voice::new(Wave::Sine, 783.99, 0.1, 0.10, 0.4, rate),
        ],
        Cue::Incorrect => vec![
            Voice::new(Wave::Saw, 150.0, 0.1, 0.0, 0.3, rate),
            Voice::new(Wave::Saw, 140.0, 0.1, 0.0, 0.3, rate),
        ],
    }
}

/// A started output stream plus the channel feeding it.
struct Running {
    tx: mpsc::Sender<Cue>,
    _stream: cpal::Stream,
}

/// Cpal-backed [`AudioSink`]. The stream is opened lazily on `resume` (or
/// the first cue); a failed open is remembered so we don't retry per cue.
pub struct AudioEngine {
    running: Option<Running>,
    failed: bool,
}

impl AudioEngine {
    pub fn new() -> Self {
        AudioEngine {
            running: None,
            failed: false,
        }
    }

    fn ensure_started(&mut self) {
        if self.running.is_some() || self.failed {
            return;
        }
        match start_stream() {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                eprintln!("audio unavailable, continuing silently: {}", e);
                self.failed = true;
            }
        }
    }

    fn send(&mut self, cue: Cue) {
        self.ensure_started();
        if let Some(running) = &self.running {
            // A disconnected audio thread is treated like no device at all.
            let _ = running.tx.send(cue);
        }
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for AudioEngine {
    fn resume(&mut self) {
        self.ensure_started();
    }

    fn play_tone(&mut self, pitch: PitchClass) {
        self.send(Cue::Tone {
            freq: pitch.to_freq(),
        });
    }

    fn play_click(&mut self, accent: bool) {
        self.send(Cue::Click { accent });
    }

    fn play_success(&mut self) {
        self.send(Cue::Success);
    }

    fn play_incorrect(&mut self) {
        self.send(Cue::Incorrect);
    }
}

/// Open the default output device and run the mixing callback.
fn start_stream() -> Result<Running, String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("no output audio device available")?;

    let config = device
        .default_output_config()
        .map_err(|e| format!("failed to get default output config: {}", e))?;

    let sample_rate = config.sample_rate() as f64;

    let (tx, rx) = mpsc::channel::<Cue>();
    let mut voices: Vec<Voice> = Vec::new();

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Pick up new cues without blocking the callback.
                while let Ok(cue) = rx.try_recv() {
                    voices.extend(voices_for(cue, sample_rate));
                }

                for sample in data.iter_mut() {
                    let mut value = 0.0_f64;
                    for voice in voices.iter_mut() {
                        value += voice.sample(sample_rate);
                    }
                    *sample = value.clamp(-1.0, 1.0) as f32;
                }

                voices.retain(|v| !v.finished());
            },
            move |err| {
                eprintln!("audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("failed to build output stream: {}", e))?;

    stream
        .play()
        .map_err(|e| format!("failed to play stream: {}", e))?;

    Ok(Running {
        tx,
        _stream: stream,
    })
}
