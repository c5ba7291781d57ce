//! RSD audio decoding.
//!
//! An RSD stream is a 20-byte header naming the codec, channel count, bit
//! depth and sample rate, padding up to offset `0x800`, then the audio
//! payload. Two codecs are handled:
//!
//! - `RSD4PCM `: little-endian PCM, 8 or 16 bit
//! - `RSD4RADP`: 4-bit adaptive delta PCM (see [`adpcm`])
//!
//! # Example
//!
//! ```no_run
//! let bytes = std::fs::read("theme.rsd")?;
//! let pcm = hitrun_rsd::decode(&bytes)?;
//! std::fs::write("theme.wav", pcm.to_wav()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adpcm;
mod error;
mod header;
mod pcm;

use std::io::Read;

use hitrun_common::ByteCursor;

pub use error::{Error, Result};
pub use header::{RsdFormat, RsdHeader};
pub use pcm::PcmBuffer;

/// Parsed header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsdInfo {
    pub format: RsdFormat,
    pub channels: u16,
    pub bits: u32,
    pub sample_rate: u32,
}

/// Read and validate the header of an RSD stream.
pub fn read_info(data: &[u8]) -> Result<RsdInfo> {
    if data.len() < RsdHeader::DATA_OFFSET {
        return Err(Error::Truncated {
            len: data.len(),
            needed: RsdHeader::DATA_OFFSET,
        });
    }

    let header: RsdHeader = ByteCursor::new(data).read_struct()?;
    let format = header.format().ok_or_else(|| Error::UnsupportedFormat(header.tag()))?;

    let channels = header.channels;
    let channels = match u16::try_from(channels) {
        Ok(0) | Err(_) => return Err(Error::InvalidChannelCount(channels)),
        Ok(n) => n,
    };

    Ok(RsdInfo {
        format,
        channels,
        bits: header.bits,
        sample_rate: header.sample_rate,
    })
}

/// Decode a complete RSD stream into PCM.
pub fn decode(data: &[u8]) -> Result<PcmBuffer> {
    let info = read_info(data)?;
    let payload = &data[RsdHeader::DATA_OFFSET..];

    let samples = match info.format {
        RsdFormat::Pcm => decode_pcm(payload, info.bits)?,
        RsdFormat::Radp => {
            if info.bits != 4 {
                tracing::debug!(bits = info.bits, "RADP stream declares unusual bit depth");
            }
            adpcm::decode(payload, info.channels as usize)
        }
    };

    tracing::debug!(
        format = %info.format,
        channels = info.channels,
        sample_rate = info.sample_rate,
        samples = samples.len(),
        "decoded RSD stream"
    );

    Ok(PcmBuffer {
        channels: info.channels,
        sample_rate: info.sample_rate,
        samples,
    })
}

/// Read a stream to the end and decode it.
pub fn decode_reader<R: Read>(mut reader: R) -> Result<PcmBuffer> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    decode(&data)
}

fn decode_pcm(payload: &[u8], bits: u32) -> Result<Vec<i16>> {
    match bits {
        16 => Ok(payload
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()),
        8 => Ok(payload.iter().map(|&b| ((b as i16) - 128) << 8).collect()),
        other => Err(Error::UnsupportedBitDepth(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(magic: &[u8; 8], channels: u32, bits: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        for v in [channels, bits, 22050] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.resize(RsdHeader::DATA_OFFSET, 0);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_pcm16() {
        let pcm = decode(&stream(RsdFormat::PCM_MAGIC, 1, 16, &[0x01, 0x00, 0xFF, 0xFF, 0x7F])).unwrap();
        assert_eq!(pcm.samples, vec![1, -1]);
        assert_eq!(pcm.sample_rate, 22050);
    }

    #[test]
    fn test_pcm8_is_rescaled() {
        let pcm = decode(&stream(RsdFormat::PCM_MAGIC, 1, 8, &[0x80, 0x00, 0xFF])).unwrap();
        assert_eq!(pcm.samples, vec![0, i16::MIN, 127 << 8]);
    }

    #[test]
    fn test_radp_silence() {
        let pcm = decode(&stream(RsdFormat::RADP_MAGIC, 2, 4, &[0u8; 80])).unwrap();
        assert_eq!(pcm.channels, 2);
        assert_eq!(pcm.frames(), 64);
        assert!(pcm.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            decode(&[0u8; 100]),
            Err(Error::Truncated { len: 100, needed: 0x800 })
        ));
        assert!(matches!(
            decode(&stream(b"RSD4VAG ", 1, 4, &[])),
            Err(Error::UnsupportedFormat(tag)) if tag == "RSD4VAG"
        ));
        assert!(matches!(
            decode(&stream(RsdFormat::RADP_MAGIC, 0, 4, &[])),
            Err(Error::InvalidChannelCount(0))
        ));
        assert!(matches!(
            decode(&stream(RsdFormat::PCM_MAGIC, 1, 24, &[])),
            Err(Error::UnsupportedBitDepth(24))
        ));
    }

    #[test]
    fn test_decode_reader() {
        let bytes = stream(RsdFormat::PCM_MAGIC, 2, 16, &[0u8; 8]);
        let pcm = decode_reader(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(pcm.frames(), 2);
    }
}
