use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Stream marker carried in the pack prefix.
pub const STREAM_MARKER: [u8; 4] = *b"CPng";

/// Flags word carried in the pack prefix.
pub const STREAM_FLAGS: u32 = 0x0004_0001;

/// State of a compressed pack chunk.
///
/// On disk the chunk is a 20-byte prefix (tag, size, uncompressed size,
/// stream marker, flags) followed by a zlib-framed DEFLATE stream holding
/// the serialized children. In memory the children live in the chunk tree;
/// `compressed` caches the current stream so an untouched pack re-emits
/// the exact bytes it was parsed from, whatever deflate implementation
/// produced them. The cache is rebuilt only when the subtree was mutated.
#[derive(Debug, Clone)]
pub struct Pack {
    /// Declared size of the decompressed child stream.
    pub uncompressed_size: u32,
    /// Marker bytes as stored; foreign values are preserved.
    pub marker: [u8; 4],
    /// Flags word as stored.
    pub flags: u32,
    pub(crate) compressed: Vec<u8>,
}

impl Pack {
    /// State for a freshly created, empty pack. The stream cache starts
    /// empty and is filled on the first serialization.
    pub fn new() -> Self {
        Self {
            uncompressed_size: 0,
            marker: STREAM_MARKER,
            flags: STREAM_FLAGS,
            compressed: Vec::new(),
        }
    }

    /// Current compressed stream bytes.
    pub fn compressed(&self) -> &[u8] {
        &self.compressed
    }
}

impl Default for Pack {
    fn default() -> Self {
        Self::new()
    }
}

/// Inflate a pack stream. `offset` is the absolute position of the stream
/// in the input, used only for error reporting.
pub fn inflate(stream: &[u8], offset: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(stream)
        .read_to_end(&mut out)
        .map_err(|e| Error::Compression {
            offset,
            message: e.to_string(),
        })?;
    Ok(out)
}

/// Deflate a child stream for writing.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|e| Error::Compression {
        offset: 0,
        message: e.to_string(),
    })?;
    encoder.finish().map_err(|e| Error::Compression {
        offset: 0,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_inflate_is_identity() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let compressed = deflate(&data).unwrap();
        assert_eq!(inflate(&compressed, 0).unwrap(), data);
    }

    #[test]
    fn empty_stream_round_trips() {
        let compressed = deflate(&[]).unwrap();
        assert_eq!(inflate(&compressed, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn corrupt_stream_reports_offset() {
        let err = inflate(&[0xDE, 0xAD, 0xBE, 0xEF], 0x30).unwrap_err();
        match err {
            Error::Compression { offset, .. } => assert_eq!(offset, 0x30),
            other => panic!("unexpected error: {other}"),
        }
    }
}
