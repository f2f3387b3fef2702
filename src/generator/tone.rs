use super::envelope::{EnvelopeConfig, PianoEnvelope};
use super::{GeneratorState, SignalGenerator};
use std::f64::consts::PI;

/// Base weights of the 2x and 3x root overtones added for each chord tone
const TONE_OVERTONE_WEIGHTS: [f64; 2] = [0.3, 0.15];
/// Fixed 2x and 3x root overtones added to every chord
const GLOBAL_OVERTONE_WEIGHTS: [f64; 2] = [0.1, 0.05];
/// Slightly sharp partials that emulate string inharmonicity
const DETUNED_PARTIALS: [(f64, f64); 2] = [(2.01, 0.04), (3.02, 0.02)];
/// Richness above which the detuned partials are added
const DETUNE_THRESHOLD: f64 = 0.3;

/// One sine component of a tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub frequency: f64,
    pub weight: f64,
}

/// Sine or chord waveform shaped by a [`PianoEnvelope`]
///
/// Algorithm per sample:
/// 1. Sum the partials: s[n] = Σ weight[k] * sin(2π * freq[k] * n / sample_rate)
/// 2. Normalize: s[n] / Σ |weight[k]|, then clamp to [-1, 1]
/// 3. Output: y[n] = s[n] * E[n]
///
/// Output stays within [-1, 1].
pub struct ToneGenerator {
    partials: Vec<Partial>,
    normalization: f64,
    sample_rate: u32,
    envelope: PianoEnvelope,
    sample_count: usize,
}

impl ToneGenerator {
    /// A plain sine at one frequency
    pub fn sine(
        frequency: f64,
        total_samples: usize,
        sample_rate: u32,
        config: &EnvelopeConfig,
    ) -> Self {
        Self::from_partials(
            vec![Partial {
                frequency,
                weight: 1.0,
            }],
            total_samples,
            sample_rate,
            config,
        )
    }

    /// A chord voiced around its lowest tone
    ///
    /// Frequencies are sorted and only the lowest `max_chord_tones` are
    /// kept. A single remaining tone renders as a plain sine.
    ///
    /// # Example
    /// ```
    /// use nananana::generator::{EnvelopeConfig, ToneGenerator};
    ///
    /// let config = EnvelopeConfig::default();
    /// let chord = ToneGenerator::chord(&[196.0, 293.66, 587.33], 9702, 44100, &config);
    /// assert_eq!(chord.partials()[0].frequency, 196.0);
    /// ```
    pub fn chord(
        frequencies: &[f64],
        total_samples: usize,
        sample_rate: u32,
        config: &EnvelopeConfig,
    ) -> Self {
        let mut sorted = frequencies.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.truncate(config.max_chord_tones.max(1));

        let partials = match sorted.as_slice() {
            [] => Vec::new(),
            [single] => vec![Partial {
                frequency: *single,
                weight: 1.0,
            }],
            [root, upper @ ..] => chord_partials(*root, upper, sample_rate, config),
        };

        Self::from_partials(partials, total_samples, sample_rate, config)
    }

    fn from_partials(
        partials: Vec<Partial>,
        total_samples: usize,
        sample_rate: u32,
        config: &EnvelopeConfig,
    ) -> Self {
        let total = partials.iter().map(|p| p.weight.abs()).sum::<f64>();
        Self {
            partials,
            normalization: if total > 0.0 { total } else { 1.0 },
            sample_rate,
            envelope: PianoEnvelope::new(total_samples, config.clone()),
            sample_count: 0,
        }
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Divisor applied to the partial sum
    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Raw (pre-envelope) waveform value at sample `n`
    fn waveform(&self, n: usize) -> f64 {
        let time = n as f64 / self.sample_rate as f64;
        let sum: f64 = self
            .partials
            .iter()
            .map(|p| p.weight * (2.0 * PI * p.frequency * time).sin())
            .sum();
        (sum / self.normalization).clamp(-1.0, 1.0)
    }
}

/// Build the partial list for a chord of two or more tones
///
/// Higher chord tones are weighted softer, like the upper partials of a
/// struck string. Overtones at or above Nyquist are dropped.
fn chord_partials(
    root: f64,
    upper: &[f64],
    sample_rate: u32,
    config: &EnvelopeConfig,
) -> Vec<Partial> {
    let nyquist = sample_rate as f64 / 2.0;
    let richness = config.harmonic_richness.clamp(0.0, 1.0);
    let mut partials = vec![Partial {
        frequency: root,
        weight: 1.0,
    }];
    let overtone = |multiple: f64, weight: f64, partials: &mut Vec<Partial>| {
        let frequency = root * multiple;
        if frequency < nyquist && weight > 0.0 {
            partials.push(Partial { frequency, weight });
        }
    };

    for (idx, &frequency) in upper.iter().enumerate() {
        let rank = (idx + 1) as f64;
        let weight = 1.0 / (1.0 + 0.5 * rank);
        partials.push(Partial { frequency, weight });
        let scale = richness * weight;
        overtone(2.0, TONE_OVERTONE_WEIGHTS[0] * scale, &mut partials);
        overtone(3.0, TONE_OVERTONE_WEIGHTS[1] * scale, &mut partials);
    }

    overtone(2.0, GLOBAL_OVERTONE_WEIGHTS[0], &mut partials);
    overtone(3.0, GLOBAL_OVERTONE_WEIGHTS[1], &mut partials);

    if richness > DETUNE_THRESHOLD {
        for (multiple, weight) in DETUNED_PARTIALS {
            overtone(multiple, weight, &mut partials);
        }
    }

    partials
}

impl SignalGenerator for ToneGenerator {
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState {
        let state = self.envelope.process(buffer);

        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.waveform(self.sample_count + i);
        }
        self.sample_count += buffer.len();

        state
    }

    fn is_complete(&self) -> bool {
        self.envelope.is_complete()
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.sample_count = 0;
    }
}
