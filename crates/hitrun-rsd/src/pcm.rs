//! Decoded PCM audio and WAV export.

use std::io::{self, Write};
use std::time::Duration;

use byteorder::{LittleEndian, WriteBytesExt};

/// Interleaved signed 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub channels: u16,
    pub sample_rate: u32,
    /// Samples interleaved by channel: `[L0, R0, L1, R1, ...]`.
    pub samples: Vec<i16>,
}

impl PcmBuffer {
    /// Size of the canonical WAV header written by [`PcmBuffer::write_wav`].
    pub const WAV_HEADER_SIZE: usize = 44;

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// De-interleave one channel.
    pub fn channel(&self, channel: u16) -> Option<Vec<i16>> {
        if channel >= self.channels {
            return None;
        }
        Some(
            self.samples
                .iter()
                .skip(channel as usize)
                .step_by(self.channels as usize)
                .copied()
                .collect(),
        )
    }

    /// Write a RIFF/WAVE file.
    ///
    /// Fails with [`io::ErrorKind::InvalidInput`] before writing anything
    /// when the format or length does not fit the RIFF header fields.
    pub fn write_wav<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let header = WavFormat::new(self)?;

        writer.write_all(b"RIFF")?;
        writer.write_u32::<LittleEndian>(header.riff_len)?;
        writer.write_all(b"WAVE")?;

        writer.write_all(b"fmt ")?;
        writer.write_u32::<LittleEndian>(16)?;
        writer.write_u16::<LittleEndian>(1)?;
        writer.write_u16::<LittleEndian>(self.channels)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u32::<LittleEndian>(header.byte_rate)?;
        writer.write_u16::<LittleEndian>(header.block_align)?;
        writer.write_u16::<LittleEndian>(16)?;

        writer.write_all(b"data")?;
        writer.write_u32::<LittleEndian>(header.data_len)?;
        for &sample in &self.samples {
            writer.write_i16::<LittleEndian>(sample)?;
        }
        Ok(())
    }

    pub fn to_wav(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::WAV_HEADER_SIZE + self.samples.len() * 2);
        self.write_wav(&mut out)?;
        Ok(out)
    }
}

/// Derived RIFF header fields, range-checked.
struct WavFormat {
    riff_len: u32,
    byte_rate: u32,
    block_align: u16,
    data_len: u32,
}

impl WavFormat {
    fn new(pcm: &PcmBuffer) -> io::Result<Self> {
        let block_align = u16::try_from(u32::from(pcm.channels) * 2)
            .map_err(|_| invalid_input(format!("{} channels do not fit a WAV block", pcm.channels)))?;
        let byte_rate = u32::try_from(u64::from(pcm.sample_rate) * u64::from(block_align))
            .map_err(|_| invalid_input(format!("sample rate {} is too high for WAV", pcm.sample_rate)))?;
        let data_len = (pcm.samples.len() as u64) * 2;
        let riff_len = u32::try_from(data_len + 36)
            .map_err(|_| invalid_input(format!("{data_len} bytes of audio exceed the WAV size limit")))?;
        Ok(Self {
            riff_len,
            byte_rate,
            block_align,
            data_len: riff_len - 36,
        })
    }
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> PcmBuffer {
        PcmBuffer {
            channels: 2,
            sample_rate: 4,
            samples: vec![1, -1, 2, -2, 3, -3, 4, -4],
        }
    }

    #[test]
    fn test_frames_and_duration() {
        let pcm = stereo();
        assert_eq!(pcm.frames(), 4);
        assert_eq!(pcm.duration(), Duration::from_secs(1));
        assert_eq!(pcm.channel(1), Some(vec![-1, -2, -3, -4]));
        assert_eq!(pcm.channel(2), None);
    }

    #[test]
    fn test_wav_header() {
        let wav = stereo().to_wav().unwrap();
        assert_eq!(wav.len(), PcmBuffer::WAV_HEADER_SIZE + 16);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 16);
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -1);
    }

    #[test]
    fn test_wav_rejects_unrepresentable_format() {
        let fast = PcmBuffer {
            channels: 2,
            sample_rate: u32::MAX,
            samples: vec![0; 4],
        };
        let err = fast.to_wav().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let wide = PcmBuffer {
            channels: u16::MAX,
            sample_rate: 8000,
            samples: Vec::new(),
        };
        let mut out = Vec::new();
        assert_eq!(wide.write_wav(&mut out).unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
