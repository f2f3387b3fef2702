//! Fixed note table
//!
//! Frequencies (Hz) for every pitch class in octaves 2 through 5, plus C6.
//! The table is a `const` and never changes at runtime.
//!
//! Note names:
//! - Naturals: C, D, E, F, G, A, B
//! - Sharps: C#, D#, F#, G#, A#
//! - Flats: Db, Eb, Gb, Ab, Bb (same keys as the sharps)
//! - Octave digit last, e.g. `G3`, `Db4`, `C#5`

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lowest octave in the table
pub const LOWEST_OCTAVE: u8 = 2;
/// Highest complete octave in the table
pub const HIGHEST_OCTAVE: u8 = 5;

/// Frequencies indexed by `[octave - 2][semitone]`
const FREQUENCIES: [[f64; 12]; 4] = [
    [
        65.41, 69.30, 73.42, 77.78, 82.41, 87.31, 92.50, 98.00, 103.83, 110.00, 116.54, 123.47,
    ],
    [
        130.81, 138.59, 146.83, 155.56, 164.81, 174.61, 185.00, 196.00, 207.65, 220.00, 233.08,
        246.94,
    ],
    [
        261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00, 466.16,
        493.88,
    ],
    [
        523.25, 554.37, 587.33, 622.25, 659.26, 698.46, 739.99, 783.99, 830.61, 880.00, 932.33,
        987.77,
    ],
];

/// The only octave-6 entry
const C6_FREQUENCY: f64 = 1046.50;

pub const C2: f64 = FREQUENCIES[0][0];
pub const DB2: f64 = FREQUENCIES[0][1];
pub const D2: f64 = FREQUENCIES[0][2];
pub const EB2: f64 = FREQUENCIES[0][3];
pub const E2: f64 = FREQUENCIES[0][4];
pub const F2: f64 = FREQUENCIES[0][5];
pub const GB2: f64 = FREQUENCIES[0][6];
pub const G2: f64 = FREQUENCIES[0][7];
pub const AB2: f64 = FREQUENCIES[0][8];
pub const A2: f64 = FREQUENCIES[0][9];
pub const BB2: f64 = FREQUENCIES[0][10];
pub const B2: f64 = FREQUENCIES[0][11];

pub const C3: f64 = FREQUENCIES[1][0];
pub const DB3: f64 = FREQUENCIES[1][1];
pub const D3: f64 = FREQUENCIES[1][2];
pub const EB3: f64 = FREQUENCIES[1][3];
pub const E3: f64 = FREQUENCIES[1][4];
pub const F3: f64 = FREQUENCIES[1][5];
pub const GB3: f64 = FREQUENCIES[1][6];
pub const G3: f64 = FREQUENCIES[1][7];
pub const AB3: f64 = FREQUENCIES[1][8];
pub const A3: f64 = FREQUENCIES[1][9];
pub const BB3: f64 = FREQUENCIES[1][10];
pub const B3: f64 = FREQUENCIES[1][11];

pub const C4: f64 = FREQUENCIES[2][0];
pub const DB4: f64 = FREQUENCIES[2][1];
pub const D4: f64 = FREQUENCIES[2][2];
pub const EB4: f64 = FREQUENCIES[2][3];
pub const E4: f64 = FREQUENCIES[2][4];
pub const F4: f64 = FREQUENCIES[2][5];
pub const GB4: f64 = FREQUENCIES[2][6];
pub const G4: f64 = FREQUENCIES[2][7];
pub const AB4: f64 = FREQUENCIES[2][8];
/// A440 concert pitch
pub const A4: f64 = FREQUENCIES[2][9];
pub const BB4: f64 = FREQUENCIES[2][10];
pub const B4: f64 = FREQUENCIES[2][11];

pub const C5: f64 = FREQUENCIES[3][0];
pub const DB5: f64 = FREQUENCIES[3][1];
pub const D5: f64 = FREQUENCIES[3][2];
pub const EB5: f64 = FREQUENCIES[3][3];
pub const E5: f64 = FREQUENCIES[3][4];
pub const F5: f64 = FREQUENCIES[3][5];
pub const GB5: f64 = FREQUENCIES[3][6];
pub const G5: f64 = FREQUENCIES[3][7];
pub const AB5: f64 = FREQUENCIES[3][8];
pub const A5: f64 = FREQUENCIES[3][9];
pub const BB5: f64 = FREQUENCIES[3][10];
pub const B5: f64 = FREQUENCIES[3][11];

pub const C6: f64 = C6_FREQUENCY;

/// Pitch classes (sharps and flats share a variant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// Convert pitch class to semitone number (C=0, C#=1, D=2, ...)
    pub fn semitone(&self) -> usize {
        match self {
            PitchClass::C => 0,
            PitchClass::CSharp => 1,
            PitchClass::D => 2,
            PitchClass::DSharp => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::FSharp => 6,
            PitchClass::G => 7,
            PitchClass::GSharp => 8,
            PitchClass::A => 9,
            PitchClass::ASharp => 10,
            PitchClass::B => 11,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "Db",
            PitchClass::D => "D",
            PitchClass::DSharp => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "Gb",
            PitchClass::G => "G",
            PitchClass::GSharp => "Ab",
            PitchClass::A => "A",
            PitchClass::ASharp => "Bb",
            PitchClass::B => "B",
        }
    }
}

impl FromStr for PitchClass {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(PitchClass::C),
            "c#" | "C#" | "db" | "Db" => Ok(PitchClass::CSharp),
            "d" | "D" => Ok(PitchClass::D),
            "d#" | "D#" | "eb" | "Eb" => Ok(PitchClass::DSharp),
            "e" | "E" => Ok(PitchClass::E),
            "f" | "F" => Ok(PitchClass::F),
            "f#" | "F#" | "gb" | "Gb" => Ok(PitchClass::FSharp),
            "g" | "G" => Ok(PitchClass::G),
            "g#" | "G#" | "ab" | "Ab" => Ok(PitchClass::GSharp),
            "a" | "A" => Ok(PitchClass::A),
            "a#" | "A#" | "bb" | "Bb" => Ok(PitchClass::ASharp),
            "b" | "B" => Ok(PitchClass::B),
            _ => Err(NoteError::InvalidPitchClass(s.to_string())),
        }
    }
}

/// Errors from note name lookup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NoteError {
    #[error("invalid pitch class: {0}")]
    InvalidPitchClass(String),
    #[error("invalid octave: {0}")]
    InvalidOctave(String),
    #[error("note {0} is outside the note table")]
    OutOfRange(String),
}

/// A musical note (pitch class and octave)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub octave: u8,
    pub pitch_class: PitchClass,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: u8) -> Self {
        Self {
            octave,
            pitch_class,
        }
    }

    /// Frequency in Hz, or `None` if the note is outside the table
    pub fn frequency(&self) -> Option<f64> {
        if self.octave == HIGHEST_OCTAVE + 1 && self.pitch_class == PitchClass::C {
            return Some(C6_FREQUENCY);
        }
        if !(LOWEST_OCTAVE..=HIGHEST_OCTAVE).contains(&self.octave) {
            return None;
        }
        Some(FREQUENCIES[(self.octave - LOWEST_OCTAVE) as usize][self.pitch_class.semitone()])
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = NoteError;

    /// Parse `<pitch class><octave>`, e.g. `G3`, `Db4`, `c#5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (pitch_part, octave_part) = match s.char_indices().last() {
            Some((idx, _)) => s.split_at(idx),
            None => return Err(NoteError::InvalidPitchClass(String::new())),
        };

        let octave = octave_part
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| NoteError::InvalidOctave(octave_part.to_string()))?
            as u8;
        let pitch_class = PitchClass::from_str(pitch_part)?;

        let note = Note::new(pitch_class, octave);
        if note.frequency().is_none() {
            return Err(NoteError::OutOfRange(s.to_string()));
        }
        Ok(note)
    }
}

/// Look up a note name directly as a frequency
pub fn frequency_of(name: &str) -> Result<f64, NoteError> {
    let note = Note::from_str(name)?;
    note.frequency().ok_or_else(|| NoteError::OutOfRange(name.to_string()))
}
