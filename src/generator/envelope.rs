use super::{GeneratorState, SignalGenerator};
use std::f64::consts::PI;

/// Longest attack, as a fraction of the note
const MAX_ATTACK_FRACTION: f64 = 0.05;
/// Allowed range for the decay fraction
const DECAY_FRACTION_RANGE: (f64, f64) = (0.15, 0.30);

/// Shape and timbre settings applied to every note
///
/// All positions are fractions of the note length, so the same config
/// works for any duration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeConfig {
    /// Attack length as a fraction of the note (capped at 5%)
    pub fade_in: f64,
    /// Decay length as a fraction of the note (clamped to 15%..30%)
    pub decay_fraction: f64,
    /// Position where the release begins (0.9 = last 10% of the note)
    pub release_start: f64,
    /// Level held during sustain (0.0 to 1.0)
    pub sustain_level: f64,
    /// How far the sustain sags by the end of the phase (0 = flat)
    pub decay_rate: f64,
    /// Exponent of the attack rise
    pub attack_curve: f64,
    /// Exponent of the release fall
    pub release_curve: f64,
    /// Weight of the overtones added to chords (0.0 to 1.0)
    pub harmonic_richness: f64,
    /// Most chord tones rendered at once
    pub max_chord_tones: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            fade_in: 0.05,
            decay_fraction: 0.2,
            release_start: 0.9,
            sustain_level: 0.7,
            decay_rate: 0.1,
            attack_curve: 0.7,
            release_curve: 2.0,
            harmonic_richness: 0.5,
            max_chord_tones: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Decay,
    Sustain,
    Release,
    Complete,
}

/// Phase boundaries, in samples, for one note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeShape {
    pub attack_end: usize,
    pub decay_end: usize,
    pub release_start: usize,
    pub total: usize,
}

impl EnvelopeShape {
    pub fn new(total: usize, config: &EnvelopeConfig) -> Self {
        let n = total as f64;
        let (min_decay, max_decay) = DECAY_FRACTION_RANGE;
        let attack_fraction = config.fade_in.clamp(0.0, MAX_ATTACK_FRACTION);
        let decay_fraction = config.decay_fraction.clamp(min_decay, max_decay);
        let release_fraction = config.release_start.clamp(0.0, 1.0);

        let attack_end = ((n * attack_fraction).ceil() as usize).min(total);
        let release_at = (n * release_fraction).floor() as usize;
        let release_start = release_at.clamp(attack_end, total);
        let decay_len = (n * decay_fraction).round() as usize;
        let decay_end = (attack_end + decay_len).min(release_start);

        Self {
            attack_end,
            decay_end,
            release_start,
            total,
        }
    }

    pub fn phase_at(&self, position: usize) -> EnvelopePhase {
        if position >= self.total {
            EnvelopePhase::Complete
        } else if position < self.attack_end {
            EnvelopePhase::Attack
        } else if position < self.decay_end {
            EnvelopePhase::Decay
        } else if position < self.release_start {
            EnvelopePhase::Sustain
        } else {
            EnvelopePhase::Release
        }
    }
}

/// Struck-string amplitude envelope
///
/// Four phases over a note of known length:
/// 1. Attack: rises as `(i / attack_len)^attack_curve`
/// 2. Decay: linear from 1.0 down to the sustain level
/// 3. Sustain: dips below the sustain level by up to `decay_rate`, back
///    at the sustain level when the release begins
/// 4. Release: falls as `sustain_level * (1 - progress)^release_curve`,
///    reaching ~0 at the end
///
/// Every phase boundary meets at the same level, so there is no step in
/// amplitude anywhere in the note.
pub struct PianoEnvelope {
    config: EnvelopeConfig,
    shape: EnvelopeShape,
    position: usize,
}

impl PianoEnvelope {
    /// Create an envelope for a note of `total_samples` samples
    ///
    /// # Example
    /// ```
    /// use nananana::generator::{EnvelopeConfig, PianoEnvelope};
    ///
    /// let env = PianoEnvelope::new(44100, EnvelopeConfig::default());
    /// assert_eq!(env.level_at(0), 0.0);
    /// ```
    pub fn new(total_samples: usize, config: EnvelopeConfig) -> Self {
        let shape = EnvelopeShape::new(total_samples, &config);
        Self {
            config,
            shape,
            position: 0,
        }
    }

    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }

    /// Current phase (based on the next sample to be produced)
    pub fn phase(&self) -> EnvelopePhase {
        self.shape.phase_at(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Sustain level `progress` of the way through the sustain phase
    ///
    /// The sag is deepest halfway and zero at both ends.
    fn sustain_level_at(&self, progress: f64) -> f64 {
        let sag = 1.0 - self.config.decay_rate * (PI * progress).sin();
        (self.config.sustain_level * sag).max(0.0)
    }

    /// Envelope level at an absolute sample position
    pub fn level_at(&self, position: usize) -> f64 {
        let shape = &self.shape;
        let level = match shape.phase_at(position) {
            EnvelopePhase::Attack => {
                let t = position as f64 / shape.attack_end as f64;
                t.powf(self.config.attack_curve)
            }
            EnvelopePhase::Decay => {
                let t = (position - shape.attack_end) as f64
                    / (shape.decay_end - shape.attack_end) as f64;
                1.0 + (self.config.sustain_level - 1.0) * t
            }
            EnvelopePhase::Sustain => {
                let p = (position - shape.decay_end) as f64
                    / (shape.release_start - shape.decay_end) as f64;
                self.sustain_level_at(p)
            }
            EnvelopePhase::Release => {
                let p = (position - shape.release_start) as f64
                    / (shape.total - shape.release_start) as f64;
                self.config.sustain_level * (1.0 - p).powf(self.config.release_curve)
            }
            EnvelopePhase::Complete => 0.0,
        };
        level.clamp(0.0, 1.0)
    }
}

impl SignalGenerator for PianoEnvelope {
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.level_at(self.position + i);
        }
        self.position = (self.position + buffer.len()).min(self.shape.total);

        if self.position >= self.shape.total {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.position >= self.shape.total
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}
