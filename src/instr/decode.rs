use crate::cursor::{ByteOrder, Cursor};
use crate::error::{Diagnostic, Error, Result};
use crate::instr::code::InstrCode;

/// One length-prefixed record in the page instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRecord {
    /// Byte offset of the record within the page payload.
    pub offset: usize,
    /// Raw instruction id as stored on disk.
    pub code: i16,
    /// Operand bytes after the 4-byte record header, kept opaque.
    pub payload: Vec<u8>,
}

impl InstructionRecord {
    /// Resolved code, if the id is in the known table.
    pub fn instr(&self) -> Option<InstrCode> {
        InstrCode::from_i16(self.code)
    }

    /// Total on-disk length of this record, header included.
    pub fn byte_len(&self) -> usize {
        4 + self.payload.len()
    }
}

/// A node in the decoded instruction tree.
///
/// `Begin*` records own their children; the matching `End*` record is kept
/// as the last child so the byte stream can be reconstructed exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionNode {
    pub record: InstructionRecord,
    pub children: Vec<InstructionNode>,
}

impl InstructionNode {
    fn leaf(record: InstructionRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }
}

/// Decode a page payload into a tree of instruction nodes.
///
/// `base_offset` is the absolute position of the payload in the input; it
/// only shifts the offsets reported in errors and diagnostics. The scan
/// stops exactly at the end of `payload` and never reads past it.
pub fn decode(
    payload: &[u8],
    order: ByteOrder,
    base_offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<InstructionNode>> {
    let mut cursor = Cursor::new(payload, order);
    let mut top: Vec<InstructionNode> = Vec::new();
    let mut stack: Vec<InstructionNode> = Vec::new();

    while !cursor.is_empty() {
        let record_offset = cursor.position();
        let abs_offset = base_offset + record_offset;
        let length = cursor.read_u16().map_err(|e| at_record(abs_offset, e))? as usize;
        if length < 4 {
            return Err(Error::TruncatedInput {
                offset: abs_offset,
                need: 4,
                have: length,
            });
        }
        let code = cursor.read_i16().map_err(|e| at_record(abs_offset, e))?;
        let body = cursor
            .read_bytes(length - 4)
            .map_err(|e| at_record(abs_offset, e))?
            .to_vec();

        let record = InstructionRecord {
            offset: record_offset,
            code,
            payload: body,
        };
        let instr = record.instr();

        if instr.is_some_and(|i| i.opens_scope()) {
            stack.push(InstructionNode::leaf(record));
        } else if instr.is_some_and(|i| i.closes_scope()) {
            match stack.pop() {
                Some(mut open) => {
                    // The End record stays as a terminal child for
                    // bit-exact reconstruction.
                    open.children.push(InstructionNode::leaf(record));
                    attach(&mut stack, &mut top, open);
                }
                None => {
                    diagnostics.push(Diagnostic::new(
                        abs_offset,
                        format!("unbalanced {} record", describe(code)),
                    ));
                    attach(&mut stack, &mut top, InstructionNode::leaf(record));
                }
            }
        } else {
            attach(&mut stack, &mut top, InstructionNode::leaf(record));
        }
    }

    // Unclosed scopes: keep what was read, note the inconsistency.
    while let Some(open) = stack.pop() {
        diagnostics.push(Diagnostic::new(
            base_offset + open.record.offset,
            format!("{} record never closed", describe(open.record.code)),
        ));
        attach(&mut stack, &mut top, open);
    }

    Ok(top)
}

fn attach(stack: &mut [InstructionNode], top: &mut Vec<InstructionNode>, node: InstructionNode) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => top.push(node),
    }
}

fn at_record(offset: usize, err: Error) -> Error {
    match err {
        Error::TruncatedInput { need, have, .. } => Error::TruncatedInput { offset, need, have },
        other => other,
    }
}

fn describe(code: i16) -> String {
    match InstrCode::from_i16(code) {
        Some(instr) => instr.name().to_string(),
        None => format!("instruction {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Writer;

    fn record(w: &mut Writer, code: i16, payload: &[u8]) {
        w.write_u16((4 + payload.len()) as u16);
        w.write_i16(code);
        w.write_bytes(payload);
    }

    #[test]
    fn nesting_builds_a_tree() {
        let mut w = Writer::new(ByteOrder::Little);
        record(&mut w, InstrCode::BeginLayer as i16, &[0u8; 6]); // 10 bytes
        record(&mut w, InstrCode::PolyCurve as i16, &[0u8; 16]); // 20 bytes
        record(&mut w, InstrCode::EndLayer as i16, &[0u8; 2]); // 6 bytes
        let bytes = w.into_bytes();

        let mut diags = Vec::new();
        let tree = decode(&bytes, ByteOrder::Little, 0, &mut diags).unwrap();
        assert!(diags.is_empty());
        assert_eq!(tree.len(), 1);

        let layer = &tree[0];
        assert_eq!(layer.record.instr(), Some(InstrCode::BeginLayer));
        assert_eq!(layer.children.len(), 2);
        assert_eq!(layer.children[0].record.instr(), Some(InstrCode::PolyCurve));
        assert_eq!(layer.children[1].record.instr(), Some(InstrCode::EndLayer));
    }

    #[test]
    fn unknown_id_is_an_opaque_leaf() {
        let mut w = Writer::new(ByteOrder::Little);
        record(&mut w, 12345, &[0xAA, 0xBB]);
        let bytes = w.into_bytes();

        let mut diags = Vec::new();
        let tree = decode(&bytes, ByteOrder::Little, 0, &mut diags).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].record.code, 12345);
        assert!(tree[0].record.instr().is_none());
        assert_eq!(tree[0].record.payload, vec![0xAA, 0xBB]);
    }

    #[test]
    fn unbalanced_end_recovers_with_diagnostic() {
        let mut w = Writer::new(ByteOrder::Little);
        record(&mut w, InstrCode::EndLayer as i16, &[]);
        let bytes = w.into_bytes();

        let mut diags = Vec::new();
        let tree = decode(&bytes, ByteOrder::Little, 0, &mut diags).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("EndLayer"));
    }

    #[test]
    fn overrunning_record_is_truncated_input() {
        let mut w = Writer::new(ByteOrder::Little);
        w.write_u16(40); // claims 36 payload bytes
        w.write_i16(InstrCode::PolyCurve as i16);
        w.write_bytes(&[0u8; 4]);
        let bytes = w.into_bytes();

        let mut diags = Vec::new();
        let err = decode(&bytes, ByteOrder::Little, 100, &mut diags).unwrap_err();
        match err {
            Error::TruncatedInput { offset, .. } => assert_eq!(offset, 100),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undersized_length_field_is_rejected() {
        let mut w = Writer::new(ByteOrder::Little);
        w.write_u16(2);
        w.write_i16(0);
        let bytes = w.into_bytes();

        let mut diags = Vec::new();
        assert!(decode(&bytes, ByteOrder::Little, 0, &mut diags).is_err());
    }
}
