//! Single-tone playback

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{Capability, PlaybackError, PlayerBackend, Sound};

/// Frequency range accepted by the Windows console beep
const BEEP_RANGE_HZ: (f64, f64) = (37.0, 32767.0);

const BELL: &[u8] = b"\x07";

/// How often a running beep process is checked
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepMethod {
    /// `[console]::beep(freq, ms)` through PowerShell
    PowerShell,
    /// ASCII BEL on stdout, then wait out the tone
    TerminalBell,
}

/// Tone-only backend
///
/// Cannot render chords or WAV data; the orchestrator sends it one
/// frequency per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPlayer {
    method: BeepMethod,
}

impl BeepPlayer {
    pub fn new(method: BeepMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> BeepMethod {
        self.method
    }

    fn powershell_beep(&self, frequency: f64, duration: Duration) -> Result<(), PlaybackError> {
        let mut command = Command::new("powershell");
        command.arg("-c").arg(beep_script(frequency, duration));
        run_bounded(&mut command, "powershell", duration)
    }
}

/// Run `command` for at most `limit`
///
/// A process that is still running at the deadline is left to finish on
/// its own; a background thread reaps it. Only an exit before the
/// deadline can report failure.
fn run_bounded(
    command: &mut Command,
    program: &str,
    limit: Duration,
) -> Result<(), PlaybackError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PlaybackError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            return Err(PlaybackError::PlayerFailed {
                program: program.to_string(),
                status: status.to_string(),
            });
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }

    log::trace!("{} still running after {:?}, detaching", program, limit);
    thread::spawn(move || {
        if let Err(e) = child.wait() {
            log::debug!("could not reap beep process: {}", e);
        }
    });
    Ok(())
}

/// PowerShell snippet for one console beep
fn beep_script(frequency: f64, duration: Duration) -> String {
    let hz = frequency.round().clamp(BEEP_RANGE_HZ.0, BEEP_RANGE_HZ.1) as u32;
    format!("[console]::beep({}, {})", hz, duration.as_millis())
}

/// Ring the bell on `out` and hold for `duration`
pub fn ring_bell(out: &mut impl Write, duration: Duration) -> io::Result<()> {
    out.write_all(BELL)?;
    out.flush()?;
    thread::sleep(duration);
    Ok(())
}

impl PlayerBackend for BeepPlayer {
    fn name(&self) -> &str {
        match self.method {
            BeepMethod::PowerShell => "powershell-beep",
            BeepMethod::TerminalBell => "terminal-bell",
        }
    }

    fn capability(&self) -> Capability {
        Capability::ToneOnly
    }

    fn play(&self, sound: Sound<'_>) -> Result<(), PlaybackError> {
        let (frequency, duration) = match sound {
            Sound::Tone {
                frequency,
                duration,
            } => (frequency, duration),
            Sound::Wav(_) => {
                return Err(PlaybackError::Unsupported {
                    backend: self.name().to_string(),
                    kind: "WAV files",
                })
            }
        };

        match self.method {
            BeepMethod::PowerShell => self.powershell_beep(frequency, duration),
            BeepMethod::TerminalBell => Ok(ring_bell(&mut io::stdout(), duration)?),
        }
    }
}
