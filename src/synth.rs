//! Note synthesis
//!
//! Turns a [`Pitch`] and a duration into 16-bit PCM by running a
//! [`ToneGenerator`] frame by frame.

use crate::generator::{EnvelopeConfig, GeneratorState, SignalGenerator, ToneGenerator};
use crate::sequence::Pitch;

/// Peak sample value, kept just under `i16::MAX`
pub const MAX_AMPLITUDE: f64 = 32760.0;

/// Samples rendered per generator call
pub const FRAME_SIZE: usize = 64;

/// Default working sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Rendered 16-bit mono audio at a fixed sample rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// `len` samples of silence
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0; len], sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }
}

/// Number of samples covering `duration` seconds: `ceil(rate * duration)`
///
/// Non-positive or non-finite durations give zero samples.
pub fn sample_count(duration: f64, sample_rate: u32) -> usize {
    if !(duration.is_finite() && duration > 0.0) {
        return 0;
    }
    (sample_rate as f64 * duration).ceil() as usize
}

/// Scale a [-1, 1] value to a 16-bit sample
fn to_i16(value: f64) -> i16 {
    (MAX_AMPLITUDE * value.clamp(-1.0, 1.0)).round() as i16
}

/// Render one pitch for `duration` seconds
///
/// Rests come back as silence. Tones and chords are shaped by the
/// envelope in `config`; the peak never exceeds [`MAX_AMPLITUDE`].
///
/// # Example
/// ```
/// use nananana::generator::EnvelopeConfig;
/// use nananana::sequence::Pitch;
/// use nananana::synth::synthesize;
///
/// let buf = synthesize(&Pitch::Tone(440.0), 0.25, 44100, &EnvelopeConfig::default());
/// assert_eq!(buf.len(), 11025);
/// ```
pub fn synthesize(
    pitch: &Pitch,
    duration: f64,
    sample_rate: u32,
    config: &EnvelopeConfig,
) -> SampleBuffer {
    let total = sample_count(duration, sample_rate);

    let mut generator = match pitch {
        Pitch::Rest => return SampleBuffer::silence(total, sample_rate),
        Pitch::Tone(frequency) => ToneGenerator::sine(*frequency, total, sample_rate, config),
        Pitch::Chord(chord) => {
            ToneGenerator::chord(chord.frequencies(), total, sample_rate, config)
        }
    };

    let mut samples = Vec::with_capacity(total);
    let mut frame = [0.0f64; FRAME_SIZE];

    while samples.len() < total {
        let wanted = (total - samples.len()).min(FRAME_SIZE);
        let state = generator.process(&mut frame[..wanted]);
        samples.extend(frame[..wanted].iter().map(|&v| to_i16(v)));

        if state == GeneratorState::Complete {
            break;
        }
    }

    SampleBuffer::new(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::PianoEnvelope;

    fn config() -> EnvelopeConfig {
        EnvelopeConfig::default()
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(1.0, 44100), 44100);
        assert_eq!(sample_count(0.3, 44100), 13230);
        assert_eq!(sample_count(0.5, 44100), 22050);
        assert_eq!(sample_count(0.00001, 44100), 1);
        assert_eq!(sample_count(0.0, 44100), 0);
        assert_eq!(sample_count(-1.0, 44100), 0);
        assert_eq!(sample_count(f64::NAN, 44100), 0);
    }

    #[test]
    fn test_rest_is_silence() {
        for rate in [8000, 22050, 44100, 48000] {
            for duration in [0.0, 0.01, 0.22, 1.0] {
                let buf = synthesize(&Pitch::Rest, duration, rate, &config());
                assert_eq!(buf.len(), sample_count(duration, rate));
                assert_eq!(buf.sample_rate(), rate);
                assert!(buf.samples().iter().all(|&s| s == 0));
            }
        }
    }

    #[test]
    fn test_length_matches_duration() {
        let buf = synthesize(&Pitch::Tone(440.0), 0.22, 44100, &config());
        assert_eq!(buf.len(), sample_count(0.22, 44100));

        let chord = Pitch::chord(&[196.0, 293.66, 587.33]).unwrap();
        let buf = synthesize(&chord, 0.22, 44100, &config());
        assert_eq!(buf.len(), sample_count(0.22, 44100));
    }

    #[test]
    fn test_peak_within_max_amplitude() {
        let pitches = [
            Pitch::Tone(65.41),
            Pitch::Tone(440.0),
            Pitch::Tone(1046.5),
            Pitch::chord(&[196.0, 293.66, 587.33, 392.0, 783.99]).unwrap(),
            Pitch::chord(&[523.25, 261.63]).unwrap(),
        ];
        for pitch in &pitches {
            let buf = synthesize(pitch, 0.3, 44100, &config());
            assert!(
                buf.peak() as f64 <= MAX_AMPLITUDE,
                "{:?} peaked at {}",
                pitch,
                buf.peak()
            );
            assert!(buf.peak() > 0);
        }
    }

    #[test]
    fn test_single_tone_formula() {
        let rate = 44100;
        let buf = synthesize(&Pitch::Tone(440.0), 1.0, rate, &config());
        let env = PianoEnvelope::new(buf.len(), config());
        for i in [0usize, 10, 1000, 2205, 20000, 41895, 44099] {
            let wave = (2.0 * std::f64::consts::PI * 440.0 * (i as f64 / rate as f64)).sin();
            let expected = (MAX_AMPLITUDE * (env.level_at(i) * wave)).round() as i16;
            assert_eq!(buf.samples()[i], expected, "sample {}", i);
        }
    }

    #[test]
    fn test_envelope_shapes_output() {
        let buf = synthesize(&Pitch::Tone(440.0), 1.0, 44100, &config());
        assert_eq!(buf.samples()[0], 0);

        let peak_in = |range: std::ops::Range<usize>| {
            buf.samples()[range]
                .iter()
                .map(|s| s.unsigned_abs())
                .max()
                .unwrap()
        };
        // Loud after the attack, quieter in sustain, near silent at the end
        let attack_peak = peak_in(2205..2400);
        let sustain_peak = peak_in(20000..22000);
        let tail_peak = peak_in(44000..44100);
        assert!(attack_peak > sustain_peak);
        assert!(sustain_peak > tail_peak);
        assert!(tail_peak < 100);
    }

    #[test]
    fn test_zero_duration_note() {
        let buf = synthesize(&Pitch::Tone(440.0), 0.0, 44100, &config());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_buffer_accessors() {
        let buf = SampleBuffer::new(vec![1, -300, 20], 100);
        assert_eq!(buf.peak(), 300);
        assert!((buf.duration() - 0.03).abs() < 1e-12);
        assert_eq!(buf.samples(), &[1, -300, 20]);
    }
}
