use crate::cursor::{ByteOrder, Cursor};
use crate::error::Diagnostic;

/// Thumbnail chunk: a device-independent bitmap starting at payload
/// offset 0 (40-byte info header, then palette and pixel rows).
///
/// Only the info header is decoded; palette and pixels stay as raw payload
/// bytes on the node (`payload[header_size..]` for callers that want them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disp {
    /// Declared info-header size (40 for the standard layout).
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,
    pub compression: u32,
    /// Declared pixel-data size; may legitimately be zero for uncompressed rows.
    pub image_size: u32,
}

impl Disp {
    pub const INFO_HEADER_LEN: usize = 40;

    pub fn decode(
        payload: &[u8],
        order: ByteOrder,
        base_offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        if payload.len() < Self::INFO_HEADER_LEN {
            diagnostics.push(Diagnostic::new(
                base_offset,
                format!(
                    "short thumbnail header ({} bytes, expected at least {})",
                    payload.len(),
                    Self::INFO_HEADER_LEN
                ),
            ));
            return Self::empty();
        }

        let mut c = Cursor::new(payload, order);
        // Reads below stay inside the checked 40-byte prefix.
        let header_size = c.read_u32().unwrap_or(0);
        let width = c.read_i32().unwrap_or(0);
        let height = c.read_i32().unwrap_or(0);
        let planes = c.read_u16().unwrap_or(0);
        let bit_count = c.read_u16().unwrap_or(0);
        let compression = c.read_u32().unwrap_or(0);
        let image_size = c.read_u32().unwrap_or(0);

        Self {
            header_size,
            width,
            height,
            planes,
            bit_count,
            compression,
            image_size,
        }
    }

    pub fn empty() -> Self {
        Self {
            header_size: 0,
            width: 0,
            height: 0,
            planes: 0,
            bit_count: 0,
            compression: 0,
            image_size: 0,
        }
    }
}
