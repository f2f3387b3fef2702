//! WAV container for 16-bit mono PCM
//!
//! Writes the canonical 44-byte header followed by little-endian samples,
//! and reads that same layout back.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::synth::SampleBuffer;

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Errors from reading a WAV header
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WavError {
    #[error("file is {0} bytes, shorter than a WAV header")]
    Truncated(usize),
    #[error("missing {0} tag")]
    BadTag(&'static str),
    #[error("unsupported audio format {0} (only PCM)")]
    NotPcm(u16),
    #[error("unsupported layout: {channels} channel(s), {bits} bits")]
    UnsupportedLayout { channels: u16, bits: u16 },
    #[error("data chunk claims {claimed} bytes but {available} are present")]
    ShortData { claimed: u32, available: usize },
}

/// Fields of a canonical WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `num_samples` mono 16-bit samples
    pub fn mono_16bit(sample_rate: u32, num_samples: usize) -> Self {
        let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
        Self {
            format: PCM_FORMAT,
            channels: NUM_CHANNELS,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size: num_samples as u32 * block_align as u32,
        }
    }

    /// Number of samples the data chunk holds
    pub fn sample_count(&self) -> usize {
        self.data_size as usize / self.block_align.max(1) as usize
    }

    /// Write the 44 header bytes
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        // RIFF chunk
        w.write_all(b"RIFF")?;
        w.write_all(&(36 + self.data_size).to_le_bytes())?;
        w.write_all(b"WAVE")?;

        // fmt subchunk
        w.write_all(b"fmt ")?;
        w.write_all(&FMT_CHUNK_LEN.to_le_bytes())?;
        w.write_all(&self.format.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        w.write_all(&self.sample_rate.to_le_bytes())?;
        w.write_all(&self.byte_rate.to_le_bytes())?;
        w.write_all(&self.block_align.to_le_bytes())?;
        w.write_all(&self.bits_per_sample.to_le_bytes())?;

        // data subchunk
        w.write_all(b"data")?;
        w.write_all(&self.data_size.to_le_bytes())
    }

    /// Parse a canonical mono 16-bit PCM header
    ///
    /// Returns the header and the data bytes that follow it.
    pub fn parse(bytes: &[u8]) -> Result<(WavHeader, &[u8]), WavError> {
        if bytes.len() < HEADER_LEN {
            return Err(WavError::Truncated(bytes.len()));
        }
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        if &bytes[0..4] != b"RIFF" {
            return Err(WavError::BadTag("RIFF"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavError::BadTag("WAVE"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(WavError::BadTag("fmt "));
        }
        if &bytes[36..40] != b"data" {
            return Err(WavError::BadTag("data"));
        }

        let header = WavHeader {
            format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        };

        if header.format != PCM_FORMAT {
            return Err(WavError::NotPcm(header.format));
        }
        if header.channels != NUM_CHANNELS || header.bits_per_sample != BITS_PER_SAMPLE {
            return Err(WavError::UnsupportedLayout {
                channels: header.channels,
                bits: header.bits_per_sample,
            });
        }

        let data = &bytes[HEADER_LEN..];
        if data.len() < header.data_size as usize {
            return Err(WavError::ShortData {
                claimed: header.data_size,
                available: data.len(),
            });
        }

        Ok((header, &data[..header.data_size as usize]))
    }
}

/// Write a 16-bit mono PCM WAV stream
pub fn write_wav(w: &mut impl Write, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let header = WavHeader::mono_16bit(sample_rate, samples.len());
    header.write_to(w)?;
    for sample in samples {
        w.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}

/// Encode a buffer as a complete WAV file in memory
///
/// The result is always `44 + 2 * buffer.len()` bytes.
///
/// # Example
/// ```
/// use nananana::synth::SampleBuffer;
/// use nananana::wav::encode;
///
/// let bytes = encode(&SampleBuffer::silence(100, 44100));
/// assert_eq!(bytes.len(), 44 + 200);
/// ```
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + buffer.len() * 2);
    write_wav(&mut bytes, buffer.samples(), buffer.sample_rate())
        .expect("writing to a Vec<u8> cannot fail");
    bytes
}

/// Write a 16-bit PCM WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `buffer` - Rendered samples and their sample rate
pub fn write_wav_16bit(path: impl AsRef<Path>, buffer: &SampleBuffer) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_wav(&mut file, buffer.samples(), buffer.sample_rate())?;
    file.flush()
}
