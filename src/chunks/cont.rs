use crate::cursor::{ByteOrder, Cursor, Writer};
use crate::error::Diagnostic;

// Payload offsets of the named header fields. Bytes between them are
// version-specific filler, preserved opaquely.
const FILE_ID_OFFSET: usize = 0;
const FILE_ID_LEN: usize = 32;
const OS_TYPE_OFFSET: usize = 32;
const OS_TYPE_LEN: usize = 16;
const BYTE_ORDER_OFFSET: usize = 48;
const UNIT_OFFSET: usize = 62;
const FACTOR_OFFSET: usize = 64;
const BBOX_OFFSET: usize = 96;
const TALLY_OFFSET: usize = 112;

/// Byte order marker stored inside the header of little-endian documents.
pub const ORDER_MARKER_LE: [u8; 4] = *b"2\0\0\0";
/// Byte order marker stored inside the header of big-endian documents.
pub const ORDER_MARKER_BE: [u8; 4] = *b"4\0\0\0";

/// Coordinate unit: millimeters.
pub const UNIT_MM: u16 = 35;

/// The `cont` document header.
///
/// Fields sit at fixed payload offsets; a short payload from an older
/// minor version decodes to sentinels (empty strings, zero numerics) with
/// a diagnostic rather than an error.
#[derive(Debug, Clone)]
pub struct Cont {
    /// File identification string, trailing NULs stripped.
    pub file_id: String,
    /// Originating OS string, trailing NULs stripped.
    pub os_type: String,
    /// Stored byte order marker.
    pub order_marker: [u8; 4],
    /// Coordinate unit code.
    pub unit: u16,
    /// Coordinate scale factor.
    pub factor: f64,
    /// Document bounding box, stored as x0, y1, x1, y0.
    pub bbox: [i32; 4],
    /// Count of top-level drawing instructions.
    pub instruction_count: u32,
}

impl Cont {
    /// Minimum payload length covering every named field.
    pub const PAYLOAD_LEN: usize = 116;

    /// Decode the header fields from a chunk payload.
    pub fn decode(
        payload: &[u8],
        order: ByteOrder,
        base_offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        if payload.len() < Self::PAYLOAD_LEN {
            diagnostics.push(Diagnostic::new(
                base_offset,
                format!(
                    "short document header ({} bytes, expected {}); missing fields defaulted",
                    payload.len(),
                    Self::PAYLOAD_LEN
                ),
            ));
        }

        let mut header = Self::empty(order);
        if payload.len() >= FILE_ID_OFFSET + FILE_ID_LEN {
            header.file_id = padded_str(&payload[FILE_ID_OFFSET..FILE_ID_OFFSET + FILE_ID_LEN]);
        }
        if payload.len() >= OS_TYPE_OFFSET + OS_TYPE_LEN {
            header.os_type = padded_str(&payload[OS_TYPE_OFFSET..OS_TYPE_OFFSET + OS_TYPE_LEN]);
        }
        if payload.len() >= BYTE_ORDER_OFFSET + 4 {
            header
                .order_marker
                .copy_from_slice(&payload[BYTE_ORDER_OFFSET..BYTE_ORDER_OFFSET + 4]);
        }
        if payload.len() >= UNIT_OFFSET + 2 {
            let mut c = Cursor::new(payload, order);
            c.seek(UNIT_OFFSET);
            header.unit = c.read_u16().unwrap_or(0);
        }
        if payload.len() >= FACTOR_OFFSET + 8 {
            let mut c = Cursor::new(payload, order);
            c.seek(FACTOR_OFFSET);
            header.factor = c.read_f64().unwrap_or(0.0);
        }
        if payload.len() >= BBOX_OFFSET + 16 {
            let mut c = Cursor::new(payload, order);
            c.seek(BBOX_OFFSET);
            for slot in header.bbox.iter_mut() {
                *slot = c.read_i32().unwrap_or(0);
            }
        }
        if payload.len() >= TALLY_OFFSET + 4 {
            let mut c = Cursor::new(payload, order);
            c.seek(TALLY_OFFSET);
            header.instruction_count = c.read_u32().unwrap_or(0);
        }
        header
    }

    /// Header with sentinel values for the given byte order.
    pub fn empty(order: ByteOrder) -> Self {
        Self {
            file_id: String::new(),
            os_type: String::new(),
            order_marker: marker_for(order),
            unit: 0,
            factor: 0.0,
            bbox: [0; 4],
            instruction_count: 0,
        }
    }

    /// Build a default payload for a freshly created document.
    pub fn default_payload(order: ByteOrder) -> Vec<u8> {
        let mut payload = vec![0u8; Self::PAYLOAD_LEN];
        patch_file_id(&mut payload, "CMX");
        patch_os_type(&mut payload, "Rust");
        payload[BYTE_ORDER_OFFSET..BYTE_ORDER_OFFSET + 4].copy_from_slice(&marker_for(order));
        let mut w = Writer::new(order);
        w.write_u16(UNIT_MM);
        w.write_f64(1.0);
        payload[UNIT_OFFSET..UNIT_OFFSET + 10].copy_from_slice(&w.into_bytes());
        payload
    }
}

/// Marker value matching a document byte order.
pub fn marker_for(order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::Little => ORDER_MARKER_LE,
        ByteOrder::Big => ORDER_MARKER_BE,
    }
}

fn padded_str(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn ensure_len(payload: &mut Vec<u8>, len: usize) {
    if payload.len() < len {
        payload.resize(len, 0);
    }
}

fn patch_fixed_str(payload: &mut Vec<u8>, offset: usize, width: usize, value: &str) {
    ensure_len(payload, offset + width);
    let slot = &mut payload[offset..offset + width];
    slot.fill(0);
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    slot[..n].copy_from_slice(&bytes[..n]);
}

pub fn patch_file_id(payload: &mut Vec<u8>, value: &str) {
    patch_fixed_str(payload, FILE_ID_OFFSET, FILE_ID_LEN, value);
}

pub fn patch_os_type(payload: &mut Vec<u8>, value: &str) {
    patch_fixed_str(payload, OS_TYPE_OFFSET, OS_TYPE_LEN, value);
}

pub fn patch_unit(payload: &mut Vec<u8>, order: ByteOrder, unit: u16) {
    ensure_len(payload, UNIT_OFFSET + 2);
    let mut w = Writer::new(order);
    w.write_u16(unit);
    payload[UNIT_OFFSET..UNIT_OFFSET + 2].copy_from_slice(&w.into_bytes());
}

pub fn patch_factor(payload: &mut Vec<u8>, order: ByteOrder, factor: f64) {
    ensure_len(payload, FACTOR_OFFSET + 8);
    let mut w = Writer::new(order);
    w.write_f64(factor);
    payload[FACTOR_OFFSET..FACTOR_OFFSET + 8].copy_from_slice(&w.into_bytes());
}

pub fn patch_bbox(payload: &mut Vec<u8>, order: ByteOrder, bbox: [i32; 4]) {
    ensure_len(payload, BBOX_OFFSET + 16);
    let mut w = Writer::new(order);
    for v in bbox {
        w.write_i32(v);
    }
    payload[BBOX_OFFSET..BBOX_OFFSET + 16].copy_from_slice(&w.into_bytes());
}

pub fn patch_instruction_count(payload: &mut Vec<u8>, order: ByteOrder, count: u32) {
    ensure_len(payload, TALLY_OFFSET + 4);
    let mut w = Writer::new(order);
    w.write_u32(count);
    payload[TALLY_OFFSET..TALLY_OFFSET + 4].copy_from_slice(&w.into_bytes());
}
