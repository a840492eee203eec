//! Reader/writer for the CorelDRAW-family CMX/CDR container format.
//!
//! The format is a RIFF-style tagged-chunk container: little-endian under
//! a `RIFF` root, big-endian under `RIFX`, with a `CMX1` form type for
//! plain documents and `CDRX` for documents whose content sits inside a
//! DEFLATE-compressed `pack` chunk. Page chunks carry a second,
//! independent grammar of length-prefixed drawing-instruction records.
//!
//! Three-layer architecture:
//! - **Layer 1** (`cursor`/`tree`): byte primitives and the generic chunk
//!   tree: parse, size/offset bookkeeping, serialization, padding.
//! - **Layer 2** (`chunks`/`instr`/`color`): typed decoders for the known
//!   chunk formats, the page instruction grammar, and legacy colors.
//! - **Layer 3** (`document`): the root document, with signature detection,
//!   find/mutate accessors, diagnostics.
//!
//! Parsing then serializing an unmodified document reproduces the input
//! bit for bit, pad bytes and foreign compression streams included.
//! Chunks with unrecognized tags pass through verbatim.
//!
//! ```no_run
//! use cmx::CmxDoc;
//!
//! let data = std::fs::read("drawing.cmx").unwrap();
//! let mut doc = CmxDoc::parse(&data).unwrap();
//! for diag in doc.diagnostics() {
//!     eprintln!("[cmx] {diag}");
//! }
//! let out = doc.serialize().unwrap();
//! assert_eq!(out, data);
//! ```

pub mod chunks;
pub mod color;
pub mod cursor;
pub mod document;
pub mod error;
pub mod instr;
pub mod registry;
pub mod tree;

pub use cursor::ByteOrder;
pub use document::CmxDoc;
pub use error::{Diagnostic, Error, Result};
pub use registry::{ChunkKind, Tag};
pub use tree::{ChunkNode, ChunkTree, NodeId};
