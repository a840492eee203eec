use crate::cursor::ByteOrder;
use crate::error::Diagnostic;
use crate::instr::{decode, encode, InstructionNode};

/// A page leaf: the container sees an opaque payload, but the payload is
/// an instruction stream with its own push/pop tree.
#[derive(Debug, Clone)]
pub struct Page {
    pub instructions: Vec<InstructionNode>,
    /// Set when the instruction stream was structurally malformed; the
    /// node's raw payload is then the only authoritative form and the
    /// instruction tree is empty.
    pub opaque: bool,
}

impl Page {
    pub fn decode(
        payload: &[u8],
        order: ByteOrder,
        base_offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        match decode::decode(payload, order, base_offset, diagnostics) {
            Ok(instructions) => Self {
                instructions,
                opaque: false,
            },
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    base_offset,
                    format!("malformed page instruction stream, kept verbatim: {err}"),
                ));
                Self {
                    instructions: Vec::new(),
                    opaque: true,
                }
            }
        }
    }

    /// Rebuild the payload from the instruction tree.
    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        encode::encode(&self.instructions, order)
    }

    /// Number of top-level instructions.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}
