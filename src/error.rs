use thiserror::Error;

use crate::registry::Tag;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    TruncatedInput {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("chunk {tag} at offset {offset:#x} declares {declared} bytes but only {available} remain")]
    CorruptContainer {
        tag: Tag,
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("required chunk {tag} not found")]
    MissingChunk { tag: Tag },

    #[error("not a CMX/CDR document: signature {found:?}")]
    InvalidSignature { found: [u8; 4] },

    #[error("compressed stream at offset {offset:#x}: {message}")]
    Compression { offset: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal problem noticed while decoding.
///
/// Structural errors abort the parse as `Error`; everything recoverable
/// (unknown color model, short legacy header, foreign pack marker, ...)
/// lands here instead, attached to the document.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Absolute byte offset of the problem in the input, where known.
    pub offset: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}: {}", self.offset, self.message)
    }
}
