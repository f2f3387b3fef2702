//! Scoped temporary WAV files
//!
//! A [`TempWav`] owns one file in the temp directory and deletes it when
//! dropped, whether or not playback succeeded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::synth::SampleBuffer;
use crate::wav::write_wav_16bit;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A WAV file that is removed on drop
#[derive(Debug)]
pub struct TempWav {
    path: PathBuf,
}

impl TempWav {
    /// Write `buffer` to a fresh file in `dir`
    ///
    /// Names look like `nananana-<prefix>-<pid>-<nanos>-<n>.wav`, so
    /// overlapping steps never share a file.
    pub fn create(dir: &Path, prefix: &str, buffer: &SampleBuffer) -> io::Result<Self> {
        let path = dir.join(unique_name(prefix));
        let temp = Self { path };
        write_wav_16bit(&temp.path, buffer)?;
        Ok(temp)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::debug!("could not remove {}: {}", self.path.display(), e);
        }
    }
}

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    format!("nananana-{}-{}-{}-{}.wav", prefix, pid, nanos, n)
}
