//! Sequence assembler
//!
//! Renders every event of a [`Sequence`] and stitches the segments into
//! one continuous buffer. Consecutive segments overlap by a short linear
//! crossfade so there are no gaps or clicks at note boundaries.

use crate::generator::EnvelopeConfig;
use crate::sequence::{Event, Sequence, Voice};
use crate::synth::{sample_count, synthesize, SampleBuffer};

/// Gain applied to each hand of a two-hand event before summing
const HAND_GAIN: f64 = 0.5;

/// Configuration for assembling a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerConfig {
    /// Per-note envelope and timbre
    pub envelope: EnvelopeConfig,
    /// Crossfade between consecutive segments, in seconds
    pub crossfade_secs: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            envelope: EnvelopeConfig::default(),
            crossfade_secs: 0.010, // 441 samples at 44.1kHz
        }
    }
}

impl AssemblerConfig {
    /// Crossfade length in samples at `sample_rate`
    pub fn crossfade_samples(&self, sample_rate: u32) -> usize {
        if !(self.crossfade_secs.is_finite() && self.crossfade_secs > 0.0) {
            return 0;
        }
        (sample_rate as f64 * self.crossfade_secs).floor() as usize
    }
}

/// Saturate a mixed value to the 16-bit range
fn clamp16(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn render_voice(voice: &Voice, sample_rate: u32, envelope: &EnvelopeConfig) -> SampleBuffer {
    synthesize(voice.pitch(), voice.duration(), sample_rate, envelope)
}

/// Mix two hands sample by sample at half gain each
///
/// The shorter hand contributes silence past its own end.
pub fn mix_hands(left: &SampleBuffer, right: &SampleBuffer) -> SampleBuffer {
    let len = left.len().max(right.len());
    let at = |buf: &SampleBuffer, i: usize| buf.samples().get(i).copied().unwrap_or(0) as f64;

    let mixed = (0..len)
        .map(|i| clamp16(at(left, i) * HAND_GAIN + at(right, i) * HAND_GAIN))
        .collect();

    SampleBuffer::new(mixed, left.sample_rate())
}

/// Render one event to its own segment
///
/// Each hand of a two-hand event gets an envelope fitted to its own
/// duration before the hands are mixed.
pub fn render_event(event: &Event, sample_rate: u32, envelope: &EnvelopeConfig) -> SampleBuffer {
    match event {
        Event::Single(voice) => render_voice(voice, sample_rate, envelope),
        Event::TwoHand { left, right } => {
            let left = render_voice(left, sample_rate, envelope);
            let right = render_voice(right, sample_rate, envelope);
            mix_hands(&left, &right)
        }
    }
}

/// Render a whole sequence into one continuous buffer
///
/// The output holds at most `ceil(sample_rate * total_duration)` samples.
/// Each segment after the first overlaps the tail of the previous one by
/// the crossfade length, so `n` segments that fit come out
/// `sum(len) - (n - 1) * crossfade` samples long.
///
/// # Example
/// ```
/// use nananana::pipeline::{assemble, AssemblerConfig};
/// use nananana::sequence::{Event, Sequence};
///
/// let seq = Sequence::new(vec![
///     Event::note(392.00, 0.3).unwrap(),
///     Event::note(329.63, 0.3).unwrap(),
/// ]);
/// let buf = assemble(&seq, 44100, &AssemblerConfig::default());
/// assert_eq!(buf.len(), 2 * 13230 - 441);
/// ```
pub fn assemble(sequence: &Sequence, sample_rate: u32, config: &AssemblerConfig) -> SampleBuffer {
    let capacity = sample_count(sequence.total_duration(), sample_rate);
    let crossfade = config.crossfade_samples(sample_rate);

    let mut output = vec![0i16; capacity];
    let mut cursor = 0usize;
    let mut previous: Option<SampleBuffer> = None;

    for event in sequence {
        let segment = render_event(event, sample_rate, &config.envelope);

        let skip = match &previous {
            Some(prev) if crossfade > 0 => {
                crossfade_into(&mut output, cursor, prev, &segment, crossfade);
                crossfade
            }
            _ => 0,
        };

        for &sample in segment.samples().iter().skip(skip) {
            if cursor >= output.len() {
                break;
            }
            output[cursor] = sample;
            cursor += 1;
        }

        previous = Some(segment);
    }

    output.truncate(cursor);
    SampleBuffer::new(output, sample_rate)
}

/// Blend the head of `current` over the last `crossfade` written samples
///
/// `out = prev * (1 - t) + cur * t`, with `t` running from 0 towards 1.
/// Writes are bounds-checked against both the output and the cursor.
fn crossfade_into(
    output: &mut [i16],
    cursor: usize,
    previous: &SampleBuffer,
    current: &SampleBuffer,
    crossfade: usize,
) {
    let prev = previous.samples();
    let cur = current.samples();

    for i in 0..crossfade.min(cur.len()) {
        let Some(target) = (cursor + i).checked_sub(crossfade) else {
            continue;
        };
        if target >= cursor || target >= output.len() {
            continue;
        }
        let prev_sample = (prev.len() + i)
            .checked_sub(crossfade)
            .and_then(|idx| prev.get(idx))
            .copied()
            .unwrap_or(0) as f64;

        let t = i as f64 / crossfade as f64;
        output[target] = clamp16(prev_sample * (1.0 - t) + cur[i] as f64 * t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Pitch;

    const RATE: u32 = 44100;

    fn voice(freq: f64, duration: f64) -> Voice {
        Voice::new(Pitch::Tone(freq), duration).unwrap()
    }

    #[test]
    fn test_crossfade_samples() {
        let config = AssemblerConfig::default();
        assert_eq!(config.crossfade_samples(44100), 441);
        assert_eq!(config.crossfade_samples(48000), 480);

        let none = AssemblerConfig {
            crossfade_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(none.crossfade_samples(44100), 0);
    }

    #[test]
    fn test_single_event_equals_synthesize() {
        let config = AssemblerConfig::default();
        let event = Event::chord(&[196.0, 293.66, 587.33], 0.22).unwrap();
        let seq = Sequence::new(vec![event]);

        let assembled = assemble(&seq, RATE, &config);
        let direct = synthesize(
            &Pitch::chord(&[196.0, 293.66, 587.33]).unwrap(),
            0.22,
            RATE,
            &config.envelope,
        );
        assert_eq!(assembled, direct);
    }

    #[test]
    fn test_two_hand_join() {
        let config = AssemblerConfig::default();
        let event = Event::two_hand(voice(440.0, 0.2), voice(880.0, 0.5));
        let assembled = assemble(&Sequence::new(vec![event]), RATE, &config);

        let left_len = sample_count(0.2, RATE);
        assert_eq!(assembled.len(), sample_count(0.5, RATE));

        let left = synthesize(&Pitch::Tone(440.0), 0.2, RATE, &config.envelope);
        let right = synthesize(&Pitch::Tone(880.0), 0.5, RATE, &config.envelope);
        assert_eq!(left.len(), left_len);

        for i in 0..assembled.len() {
            let right_only = clamp16(right.samples()[i] as f64 * 0.5);
            if i >= left_len {
                assert_eq!(assembled.samples()[i], right_only, "sample {}", i);
            }
        }
        // The left hand is audible inside its own span
        assert!((0..left_len)
            .any(|i| assembled.samples()[i] != clamp16(right.samples()[i] as f64 * 0.5)));
    }

    #[test]
    fn test_mix_hands_pads_shorter_side() {
        let left = SampleBuffer::new(vec![1000, 1000], RATE);
        let right = SampleBuffer::new(vec![2000, 2000, 2000, 2000], RATE);
        let mixed = mix_hands(&left, &right);
        assert_eq!(mixed.samples(), &[1500, 1500, 1000, 1000]);
    }

    #[test]
    fn test_mix_hands_saturates() {
        let left = SampleBuffer::new(vec![i16::MAX, i16::MIN], RATE);
        let right = SampleBuffer::new(vec![i16::MAX, i16::MIN], RATE);
        let mixed = mix_hands(&left, &right);
        assert_eq!(mixed.samples(), &[i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_two_notes_overlap_by_crossfade() {
        let config = AssemblerConfig::default();
        let seq = Sequence::new(vec![
            Event::note(392.00, 0.3).unwrap(),
            Event::note(329.63, 0.3).unwrap(),
        ]);
        let assembled = assemble(&seq, RATE, &config);
        assert_eq!(assembled.len(), 26019);
        assert_eq!(assembled.len(), sample_count(0.6, RATE) - 441);

        // Samples before the crossfade window are the first note untouched
        let first = synthesize(&Pitch::Tone(392.0), 0.3, RATE, &config.envelope);
        assert_eq!(
            &assembled.samples()[..13230 - 441],
            &first.samples()[..13230 - 441]
        );

        // Samples after the window are the second note untouched
        let second = synthesize(&Pitch::Tone(329.63), 0.3, RATE, &config.envelope);
        assert_eq!(&assembled.samples()[13230..], &second.samples()[441..]);
    }

    #[test]
    fn test_crossfade_ramp() {
        let prev = SampleBuffer::new(vec![1000; 10], 1000);
        let cur = SampleBuffer::new(vec![-1000; 10], 1000);
        let mut output = vec![1000i16; 10];

        crossfade_into(&mut output, 10, &prev, &cur, 4);
        assert_eq!(&output[..6], &[1000; 6]);
        assert_eq!(&output[6..], &[1000, 500, 0, -500]);
    }

    #[test]
    fn test_crossfade_with_short_previous() {
        // A previous segment shorter than the crossfade blends against silence
        let prev = SampleBuffer::new(vec![800; 2], 1000);
        let cur = SampleBuffer::new(vec![400; 8], 1000);
        let mut output = vec![800i16; 2];

        crossfade_into(&mut output, 2, &prev, &cur, 4);
        // Only targets 0 and 1 exist; i = 2, 3 map there
        assert_eq!(output, vec![600, 500]);
    }

    #[test]
    fn test_rest_between_notes() {
        let config = AssemblerConfig {
            crossfade_secs: 0.0,
            ..Default::default()
        };
        let seq = Sequence::new(vec![
            Event::note(440.0, 0.1).unwrap(),
            Event::rest(0.1).unwrap(),
            Event::note(440.0, 0.1).unwrap(),
        ]);
        let assembled = assemble(&seq, RATE, &config);
        assert_eq!(assembled.len(), 3 * 4410);
        assert!(assembled.samples()[4410..8820].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let config = AssemblerConfig {
            crossfade_secs: 0.0,
            ..Default::default()
        };
        // Per-event ceilings add up to more than the ceiling of the sum
        let events = (0..10)
            .map(|_| Event::note(440.0, 0.00001).unwrap())
            .collect::<Vec<_>>();
        let seq = Sequence::new(events);
        let assembled = assemble(&seq, RATE, &config);
        assert_eq!(assembled.len(), sample_count(seq.total_duration(), RATE));
        assert!(assembled.len() < 10);
    }

    #[test]
    fn test_empty_sequence() {
        let assembled = assemble(&Sequence::default(), RATE, &AssemblerConfig::default());
        assert!(assembled.is_empty());
        assert_eq!(assembled.sample_rate(), RATE);
    }
}
