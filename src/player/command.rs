//! File-based playback through an external program

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{Capability, PlaybackError, PlayerBackend, Sound};

/// Plays WAV files by running `<program> [args..] <file>` and waiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// macOS built-in player
    pub fn afplay() -> Self {
        Self::new("afplay", Vec::new())
    }

    /// Known players with the flags that make them play once, quietly
    pub fn preset(program: &str) -> Option<Self> {
        let args: &[&str] = match program {
            "afplay" | "paplay" => &[],
            "aplay" => &["-q"],
            "ffplay" => &["-nodisp", "-autoexit", "-loglevel", "quiet"],
            _ => return None,
        };
        let args = args.iter().map(|a| a.to_string()).collect();
        Some(Self::new(program, args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn run(&self, path: &Path) -> Result<(), PlaybackError> {
        log::trace!("run {} {:?} {}", self.program, self.args, path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| PlaybackError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::PlayerFailed {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl PlayerBackend for CommandPlayer {
    fn name(&self) -> &str {
        &self.program
    }

    fn capability(&self) -> Capability {
        Capability::Waveform
    }

    fn play(&self, sound: Sound<'_>) -> Result<(), PlaybackError> {
        match sound {
            Sound::Wav(path) => self.run(path),
            Sound::Tone { .. } => Err(PlaybackError::Unsupported {
                backend: self.program.clone(),
                kind: "bare tones",
            }),
        }
    }
}

/// Locate an executable on `PATH`
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
