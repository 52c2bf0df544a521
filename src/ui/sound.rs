/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is synthesised into an in-memory WAV buffer once at start
/// up; playback is fire-and-forget through a detached rodio `Sink`.
///
/// Built without the "sound" feature, `SoundEngine` is a stub whose
/// `play` does nothing, so callers never need their own `cfg`.

use crate::sim::event::GameEvent;

/// One sound effect per kind of noteworthy game event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Push,
    Bounce,
    Capture,
    Release,
    Kill,
    Caught,
    Clear,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::Push, Sfx::Bounce, Sfx::Capture, Sfx::Release,
        Sfx::Kill, Sfx::Caught, Sfx::Clear,
    ];

    /// The effect for an event. Plain player steps are silent.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::PlayerMoved { .. }     => None,
            GameEvent::BoxPushed { .. }       => Some(Sfx::Push),
            GameEvent::MonsterBounced { .. }  => Some(Sfx::Bounce),
            GameEvent::MonsterCaptured { .. } => Some(Sfx::Capture),
            GameEvent::MonsterReleased { .. } => Some(Sfx::Release),
            GameEvent::MonsterKilled { .. }   => Some(Sfx::Kill),
            GameEvent::PlayerCaught { .. }    => Some(Sfx::Caught),
            GameEvent::StageCleared           => Some(Sfx::Clear),
        }
    }

    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    fn index(self) -> usize {
        self as usize
    }
}

/// Play the effects for one tick's events. Each effect sounds at most
/// once per tick, and bounces are dropped when anything louder happened.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for effect in tick_effects(events) {
        sfx.play(effect);
    }
}

fn tick_effects(events: &[GameEvent]) -> Vec<Sfx> {
    let mut effects: Vec<Sfx> = Vec::new();
    for effect in events.iter().filter_map(Sfx::for_event) {
        if !effects.contains(&effect) {
            effects.push(effect);
        }
    }
    if effects.iter().any(|&e| e != Sfx::Bounce) {
        effects.retain(|&e| e != Sfx::Bounce);
    }
    effects
}

// ════════════════════════════════════════════════════════════
//  Synthesis: mono f32 samples, then 16-bit PCM WAV
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::Sfx;

    pub const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        /// Sine plus a third harmonic, a softened square.
        Square,
        /// Tone blended with LCG noise.
        Thud,
    }

    /// Render `(frequency, seconds)` notes back to back. Each note fades
    /// out linearly by `decay` of its volume.
    fn notes(seq: &[(f32, f32)], wave: Wave, volume: f32, decay: f32) -> Vec<f32> {
        let mut out = Vec::new();
        let mut noise: u32 = 0x2545_f491;
        for &(freq, secs) in seq {
            let n = (SAMPLE_RATE as f32 * secs) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let phase = t * freq * TAU;
                let s = match wave {
                    Wave::Sine => phase.sin(),
                    Wave::Square => phase.sin() * 0.7 + (phase * 3.0).sin() * 0.3,
                    Wave::Thud => {
                        noise = noise.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                        let white = (noise >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                        phase.sin() * 0.5 + white * 0.5
                    }
                };
                let env = 1.0 - (i as f32 / n as f32) * decay;
                out.push(s * env * volume);
            }
        }
        out
    }

    pub fn render(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // low scrape
            Sfx::Push => notes(&[(160.0, 0.05), (120.0, 0.04)], Wave::Thud, 0.25, 1.0),
            Sfx::Bounce => notes(&[(880.0, 0.025)], Wave::Sine, 0.12, 1.0),
            // sticky "glop": falling pair
            Sfx::Capture => notes(&[(660.0, 0.06), (330.0, 0.09)], Wave::Square, 0.25, 0.8),
            Sfx::Release => notes(&[(330.0, 0.05), (660.0, 0.05)], Wave::Square, 0.2, 0.8),
            Sfx::Kill => notes(
                &[(1047.0, 0.04), (1319.0, 0.04), (1568.0, 0.08)],
                Wave::Square, 0.25, 0.9,
            ),
            Sfx::Caught => notes(
                &[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.25)],
                Wave::Sine, 0.3, 0.5,
            ),
            Sfx::Clear => notes(
                &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)],
                Wave::Square, 0.3, 0.4,
            ),
        }
    }

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Wrap samples in a mono 16-bit PCM WAV container.
    pub fn wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend_from_slice(b"RIFF");
        push_u32(&mut buf, 36 + data_len);
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        push_u32(&mut buf, 16);
        push_u16(&mut buf, 1); // PCM
        push_u16(&mut buf, CHANNELS);
        push_u32(&mut buf, SAMPLE_RATE);
        push_u32(&mut buf, SAMPLE_RATE * block_align as u32);
        push_u16(&mut buf, block_align);
        push_u16(&mut buf, BITS);

        buf.extend_from_slice(b"data");
        push_u32(&mut buf, data_len);
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&pcm.to_le_bytes());
        }
        buf
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<[u8]>>,
    }

    impl SoundEngine {
        /// `None` when no audio device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers: Vec<Arc<[u8]>> = Sfx::ALL.iter()
                .map(|&sfx| Arc::from(synth::wav(&synth::render(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match self.buffers.get(sfx.index()) {
                Some(b) => Arc::clone(b),
                None => return,
            };
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::debug!("sink for {sfx:?}: {e}");
                    return;
                }
            };
            match Decoder::new(Cursor::new(buf)) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => log::debug!("decode {sfx:?}: {e}"),
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_effect_renders_a_valid_wav() {
        for sfx in Sfx::ALL {
            let samples = synth::render(sfx);
            assert!(!samples.is_empty(), "{sfx:?} is silent");
            assert!(samples.iter().all(|s| s.abs() <= 1.0), "{sfx:?} clips");
            let wav = synth::wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }
    }

    #[test]
    fn effect_indices_match_table_order() {
        for (i, sfx) in Sfx::ALL.iter().enumerate() {
            assert_eq!(sfx.index(), i);
        }
    }

    #[test]
    fn player_steps_are_silent() {
        assert_eq!(Sfx::for_event(&GameEvent::PlayerMoved { x: 1, y: 1 }), None);
        assert_eq!(Sfx::for_event(&GameEvent::StageCleared), Some(Sfx::Clear));
    }

    #[test]
    fn tick_effects_deduplicate_and_drop_bounces() {
        let events = [
            GameEvent::MonsterBounced { x: 0, y: 0 },
            GameEvent::BoxPushed { x: 1, y: 0 },
            GameEvent::BoxPushed { x: 2, y: 0 },
            GameEvent::MonsterBounced { x: 3, y: 3 },
        ];
        assert_eq!(tick_effects(&events), vec![Sfx::Push]);

        let only_bounces = [
            GameEvent::MonsterBounced { x: 0, y: 0 },
            GameEvent::MonsterBounced { x: 5, y: 5 },
        ];
        assert_eq!(tick_effects(&only_bounces), vec![Sfx::Bounce]);
    }
}
