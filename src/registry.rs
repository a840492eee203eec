//! Chunk tag registry.
//!
//! A 4-byte tag resolves to one of a closed set of chunk kinds. Unknown
//! tags resolve to [`ChunkKind::Unknown`], which preserves the chunk's
//! bytes verbatim across a parse/serialize cycle. The format is only
//! partially documented, so an unrecognized chunk must never be lost.

/// A 4-byte chunk identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const RIFF: Tag = Tag(*b"RIFF");
    pub const RIFX: Tag = Tag(*b"RIFX");
    pub const LIST: Tag = Tag(*b"LIST");
    pub const PACK: Tag = Tag(*b"pack");
    pub const CONT: Tag = Tag(*b"cont");
    pub const CCMM: Tag = Tag(*b"ccmm");
    pub const DISP: Tag = Tag(*b"disp");
    pub const IKEY: Tag = Tag(*b"ikey");
    pub const ICMT: Tag = Tag(*b"icmt");
    pub const PAGE: Tag = Tag(*b"page");
    pub const RCLR: Tag = Tag(*b"rclr");

    /// Root form type of a plain document.
    pub const FORM_CMX: Tag = Tag(*b"CMX1");
    /// Root form type of a compressed document.
    pub const FORM_CDRX: Tag = Tag(*b"CDRX");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Tag as a string (for display).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl From<&[u8; 4]> for Tag {
    fn from(b: &[u8; 4]) -> Self {
        Tag(*b)
    }
}

/// The closed set of chunk kinds this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Container chunk (`RIFF`/`RIFX`/`LIST`): 4-byte subtype name, then children.
    List,
    /// Compressed pack: children stored as a deflated byte stream.
    Pack,
    /// Document header (`cont`).
    Header,
    /// Embedded raw color-profile dump (`ccmm`).
    Profile,
    /// Thumbnail bitmap (`disp`).
    Thumbnail,
    /// Free-text metadata (`ikey`/`icmt`).
    Note,
    /// Page leaf carrying the drawing-instruction stream.
    Page,
    /// Color table (`rclr`).
    ColorTable,
    /// Anything else: raw bytes, preserved verbatim.
    Unknown,
}

impl ChunkKind {
    pub fn from_tag(tag: Tag) -> Self {
        match &tag.0 {
            b"RIFF" | b"RIFX" | b"LIST" => Self::List,
            b"pack" => Self::Pack,
            b"cont" => Self::Header,
            b"ccmm" => Self::Profile,
            b"disp" => Self::Thumbnail,
            b"ikey" | b"icmt" => Self::Note,
            b"page" => Self::Page,
            b"rclr" => Self::ColorTable,
            _ => Self::Unknown,
        }
    }

    /// Whether chunks of this kind carry child chunks.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Pack)
    }
}
