//! The page instruction grammar.
//!
//! A `page` chunk is a leaf at the container level, but its payload is a
//! second, independent format: a sequence of length-prefixed instruction
//! records forming a push/pop tree (`Begin*` opens a node, `End*` closes
//! it). Record payloads beyond the 4-byte header are opaque byte blobs;
//! decoding stops at structural recognition.

pub mod code;
pub mod decode;
pub mod encode;

pub use code::InstrCode;
pub use decode::{decode, InstructionNode, InstructionRecord};
pub use encode::{encode, verify_round_trip};
