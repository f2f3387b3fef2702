//! Built-in sequences
//!
//! Every song is built from the note table and validated like any other
//! sequence, so the builders return `Result`.

use crate::notes::*;
use crate::sequence::{Event, Pitch, Sequence, SequenceError, Voice};

/// Length of one "na" in the theme
const NA: f64 = 0.22;

/// Upper voices of the eight "na"s, above a G3 pedal
const NA_TOPS: [[f64; 2]; 8] = [
    [D4, D5],
    [D4, D5],
    [DB4, DB5],
    [DB4, DB5],
    [C4, C5],
    [C4, C5],
    [DB4, DB5],
    [DB4, DB5],
];

/// "Batman" stabs layered over the first and third "na"
const BATMAN_STAB: [f64; 4] = [G4, D5, F5, G5];

fn na_phrase(with_batman: bool) -> Result<Vec<Event>, SequenceError> {
    NA_TOPS
        .iter()
        .enumerate()
        .map(|(i, &[mid, top])| {
            let mut chord = vec![G3, mid, top];
            if with_batman && (i == 0 || i == 2) {
                chord.extend_from_slice(&BATMAN_STAB);
            }
            Event::chord(&chord, NA)
        })
        .collect()
}

/// The default theme: "na na na na" chords, twice plain and twice with
/// the Batman stabs
pub fn theme() -> Result<Sequence, SequenceError> {
    let mut events = Vec::new();
    for with_batman in [false, true, false, true] {
        events.extend(na_phrase(with_batman)?);
    }
    Ok(Sequence::new(events))
}

/// Single-note melody ending with the "BAT-MAN!" octaves
pub fn basic() -> Result<Sequence, SequenceError> {
    let pairs = [(G4, E4), (AB4, F4), (A4, GB4), (G4, E4)];

    let mut events = Vec::new();
    for (high, low) in pairs {
        for _ in 0..2 {
            events.push(Event::note(high, 0.3)?);
            events.push(Event::note(low, 0.3)?);
        }
    }
    events.push(Event::chord(&[C5, C4], 0.6)?);
    events.push(Event::chord(&[G4, G3], 0.8)?);
    Ok(Sequence::new(events))
}

/// Two-hand arrangement: bass on the beat, chord stabs on top
pub fn piano() -> Result<Sequence, SequenceError> {
    let mut events = Vec::new();

    for with_batman in [false, true, false, true] {
        for (i, &[mid, top]) in NA_TOPS.iter().enumerate() {
            let bass = if i % 2 == 0 { G2 } else { G3 };
            let mut right = vec![mid, top];
            if with_batman && (i == 0 || i == 2) {
                right.extend_from_slice(&BATMAN_STAB);
            }
            events.push(Event::two_hand(
                Voice::new(Pitch::tone(bass)?, NA)?,
                Voice::new(Pitch::chord(&right)?, NA)?,
            ));
        }
    }

    events.push(Event::two_hand(
        Voice::new(Pitch::chord(&[C3, G3])?, 0.6)?,
        Voice::new(Pitch::chord(&[C4, E4, C5])?, 0.6)?,
    ));
    events.push(Event::two_hand(
        Voice::new(Pitch::chord(&[G2, D3])?, 0.8)?,
        Voice::new(Pitch::chord(&[G3, B3, G4])?, 0.8)?,
    ));
    Ok(Sequence::new(events))
}

/// A short tour of every event kind
pub fn demo() -> Result<Sequence, SequenceError> {
    let scale = ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"];

    let mut events = scale
        .iter()
        .map(|name| Event::named(name, 0.15))
        .collect::<Result<Vec<_>, _>>()?;
    events.push(Event::rest(0.2)?);
    events.push(Event::chord(&[C4, E4, G4], 0.5)?);
    events.push(Event::two_hand(
        Voice::new(Pitch::tone(C3)?, 0.6)?,
        Voice::new(Pitch::chord(&[E4, G4, C5])?, 0.4)?,
    ));
    Ok(Sequence::new(events))
}
