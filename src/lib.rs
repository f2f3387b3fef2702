//! Piano-style synthesis of the Batman theme
//!
//! Sequences of notes, chords and two-hand events are rendered to 16-bit
//! PCM, wrapped in WAV containers and handed to whatever audio player the
//! platform offers.

pub mod generator;
pub mod notes;
pub mod pipeline;
pub mod player;
pub mod sequence;
pub mod songs;
pub mod synth;
pub mod wav;
