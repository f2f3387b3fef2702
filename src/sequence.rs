//! Musical sequence model
//!
//! A [`Sequence`] is an ordered list of [`Event`]s. Each event is either a
//! single voice or a two-hand pairing whose voices start together.
//! Every value is validated on construction and immutable afterwards.

use thiserror::Error;

use crate::notes::{frequency_of, NoteError};

/// Errors raised while building events
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    #[error("chord has no frequencies")]
    EmptyChord,
    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f64),
    #[error("invalid duration: {0} s")]
    InvalidDuration(f64),
    #[error("rest must have a positive duration, got {0} s")]
    EmptyRest(f64),
    #[error(transparent)]
    Note(#[from] NoteError),
}

fn is_audible(frequency: f64) -> bool {
    frequency.is_finite() && frequency > 0.0
}

/// A set of frequencies sounded together
///
/// Always holds at least one positive, finite frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    frequencies: Vec<f64>,
}

impl Chord {
    pub fn new(frequencies: Vec<f64>) -> Result<Self, SequenceError> {
        if frequencies.is_empty() {
            return Err(SequenceError::EmptyChord);
        }
        if let Some(&bad) = frequencies.iter().find(|&&f| !is_audible(f)) {
            return Err(SequenceError::InvalidFrequency(bad));
        }
        Ok(Self { frequencies })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// The lowest frequency
    pub fn root(&self) -> f64 {
        self.frequencies
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}

/// What sounds during a voice: silence, one frequency, or a chord
#[derive(Debug, Clone, PartialEq)]
pub enum Pitch {
    Rest,
    Tone(f64),
    Chord(Chord),
}

impl Pitch {
    pub fn tone(frequency: f64) -> Result<Self, SequenceError> {
        if !is_audible(frequency) {
            return Err(SequenceError::InvalidFrequency(frequency));
        }
        Ok(Pitch::Tone(frequency))
    }

    pub fn chord(frequencies: &[f64]) -> Result<Self, SequenceError> {
        Chord::new(frequencies.to_vec()).map(Pitch::Chord)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Pitch::Rest)
    }

    /// The single frequency a tone-only device should play
    ///
    /// Chords collapse to their lowest tone. Rests have none.
    pub fn representative_frequency(&self) -> Option<f64> {
        match self {
            Pitch::Rest => None,
            Pitch::Tone(freq) => Some(*freq),
            Pitch::Chord(chord) => Some(chord.root()),
        }
    }
}

/// A pitch held for a duration in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pitch: Pitch,
    duration: f64,
}

impl Voice {
    pub fn new(pitch: Pitch, duration: f64) -> Result<Self, SequenceError> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(SequenceError::InvalidDuration(duration));
        }
        if pitch.is_rest() && duration <= 0.0 {
            return Err(SequenceError::EmptyRest(duration));
        }
        if let Pitch::Tone(frequency) = pitch {
            if !is_audible(frequency) {
                return Err(SequenceError::InvalidFrequency(frequency));
            }
        }
        Ok(Self { pitch, duration })
    }

    pub fn pitch(&self) -> &Pitch {
        &self.pitch
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// One step of a sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A single voice
    Single(Voice),
    /// Left and right hands starting at the same time
    TwoHand { left: Voice, right: Voice },
}

impl Event {
    /// A single tone
    pub fn note(frequency: f64, duration: f64) -> Result<Self, SequenceError> {
        let voice = Voice::new(Pitch::tone(frequency)?, duration)?;
        Ok(Event::Single(voice))
    }

    /// A single tone looked up by note name, e.g. `G3` or `Db4`
    pub fn named(name: &str, duration: f64) -> Result<Self, SequenceError> {
        Self::note(frequency_of(name)?, duration)
    }

    /// A single chord
    pub fn chord(frequencies: &[f64], duration: f64) -> Result<Self, SequenceError> {
        let voice = Voice::new(Pitch::chord(frequencies)?, duration)?;
        Ok(Event::Single(voice))
    }

    /// Silence
    pub fn rest(duration: f64) -> Result<Self, SequenceError> {
        Ok(Event::Single(Voice::new(Pitch::Rest, duration)?))
    }

    pub fn two_hand(left: Voice, right: Voice) -> Self {
        Event::TwoHand { left, right }
    }

    /// Time the event occupies: the longer hand for two-hand events
    pub fn duration(&self) -> f64 {
        match self {
            Event::Single(voice) => voice.duration(),
            Event::TwoHand { left, right } => left.duration().max(right.duration()),
        }
    }
}

/// The whole piece, in playback order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    events: Vec<Event>,
}

impl Sequence {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of event durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(Event::duration).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl FromIterator<Event> for Sequence {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
