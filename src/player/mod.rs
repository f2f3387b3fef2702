//! Audio output backends
//!
//! The synthesis core never talks to a sound device itself. It hands a
//! [`Sound`] to a [`PlayerBackend`], which either plays a WAV file through
//! an external program or sounds a single tone.
//!
//! The backend is picked once at startup by [`detect_backend`].

pub mod beep;
pub mod command;
pub mod tempfile;

use std::io;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

pub use beep::{BeepMethod, BeepPlayer};
pub use command::CommandPlayer;
pub use tempfile::TempWav;

/// What a backend can reproduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Arbitrary waveforms from WAV files
    Waveform,
    /// One frequency at a time
    ToneOnly,
}

/// A playback request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sound<'a> {
    /// Play a WAV file and wait for it to finish
    Wav(&'a Path),
    /// Sound one frequency for a duration
    Tone { frequency: f64, duration: Duration },
}

/// Error type for playback operations
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player program could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The player program exited unsuccessfully
    #[error("{program} exited with {status}")]
    PlayerFailed { program: String, status: String },
    /// The backend cannot reproduce this kind of sound
    #[error("{backend} cannot play {kind}")]
    Unsupported { backend: String, kind: &'static str },
    /// Writing the temporary file or the terminal failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for audio output backends
///
/// `play` blocks until the sound has finished. Backends are shared across
/// the two hands of a two-hand event, so they must be `Sync`.
pub trait PlayerBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// What this backend can play
    fn capability(&self) -> Capability;

    /// Play a sound and wait for it to finish
    fn play(&self, sound: Sound<'_>) -> Result<(), PlaybackError>;
}

/// Players tried on Unix systems other than macOS, in order
const UNIX_PLAYERS: [&str; 3] = ["aplay", "paplay", "ffplay"];

/// Pick the best backend for this platform
///
/// - Windows: console beep through PowerShell (tones only)
/// - macOS: `afplay`
/// - Other Unix: the first of `aplay`, `paplay`, `ffplay` on `PATH`
/// - Anything else: the terminal bell
pub fn detect_backend() -> Box<dyn PlayerBackend> {
    let backend: Box<dyn PlayerBackend> = if cfg!(windows) {
        Box::new(BeepPlayer::new(BeepMethod::PowerShell))
    } else if cfg!(target_os = "macos") {
        Box::new(CommandPlayer::afplay())
    } else {
        UNIX_PLAYERS
            .iter()
            .find(|program| command::find_on_path(program).is_some())
            .and_then(|program| CommandPlayer::preset(program))
            .map(|player| Box::new(player) as Box<dyn PlayerBackend>)
            .unwrap_or_else(|| Box::new(BeepPlayer::new(BeepMethod::TerminalBell)))
    };

    log::debug!(
        "selected player backend {} ({:?})",
        backend.name(),
        backend.capability()
    );
    backend
}
