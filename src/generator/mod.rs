pub mod envelope;
pub mod tone;

pub use envelope::{EnvelopeConfig, EnvelopePhase, PianoEnvelope};
pub use tone::ToneGenerator;

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has reached the end of its note
    Complete,
}

/// Core trait for all signal generators
///
/// Signal generators produce samples frame by frame for a note of known
/// length. Each generator owns its own position; nothing is shared.
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// # Arguments
    /// * `buffer` - Mutable slice to write samples into. The length determines frame size.
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the note has samples left
    /// * `GeneratorState::Complete` once the last sample of the note was written
    ///
    /// # Note
    /// Samples past the end of the note are filled with zeros.
    fn process(&mut self, buffer: &mut [f64]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to the start of the note
    fn reset(&mut self);
}
