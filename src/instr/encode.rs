use crate::cursor::{ByteOrder, Writer};
use crate::instr::decode::InstructionNode;

/// Encode an instruction tree back into a page payload.
///
/// This is the inverse of [`decode`](crate::instr::decode::decode): each
/// node emits its own record, then its children in order. `End*` records
/// were kept as terminal children by the decoder, so no closing record is
/// synthesized here.
pub fn encode(nodes: &[InstructionNode], order: ByteOrder) -> Vec<u8> {
    let mut w = Writer::new(order);
    for node in nodes {
        encode_node(node, &mut w);
    }
    w.into_bytes()
}

fn encode_node(node: &InstructionNode, w: &mut Writer) {
    w.write_u16(node.record.byte_len() as u16);
    w.write_i16(node.record.code);
    w.write_bytes(&node.record.payload);
    for child in &node.children {
        encode_node(child, w);
    }
}

/// Verify that encoding a decoded tree reproduces the original payload.
///
/// Returns `true` if the round-trip is byte-identical.
pub fn verify_round_trip(original: &[u8], nodes: &[InstructionNode], order: ByteOrder) -> bool {
    encode(nodes, order) == original
}
