//! The root document.
//!
//! Byte order and compression mode are decided once, from the root
//! signature (`RIFF` little-endian vs `RIFX` big-endian; form type `CMX1`
//! plain vs `CDRX` compressed), and threaded through every read and write
//! beneath the root. The rest of the API is a thin layer over the chunk
//! tree: find chunks, read typed bodies, mutate through setters, serialize.

use crate::chunks::{cont, pack, ChunkBody, Cont, Disp, Note, Pack, Page, Rclr, RclrEntry};
use crate::color::ColorTable;
use crate::cursor::{ByteOrder, Writer};
use crate::error::{Diagnostic, Error, Result};
use crate::instr::InstructionNode;
use crate::registry::{ChunkKind, Tag};
use crate::tree::{ChunkNode, ChunkTree, NodeId, ParseCtx};

pub struct CmxDoc {
    tree: ChunkTree,
    root: NodeId,
    order: ByteOrder,
    compressed: bool,
    diagnostics: Vec<Diagnostic>,
}

impl CmxDoc {
    /// Parse a whole document from its file bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::TruncatedInput {
                offset: 0,
                need: 12,
                have: data.len(),
            });
        }
        let order = match &data[..4] {
            b"RIFF" => ByteOrder::Little,
            b"RIFX" => ByteOrder::Big,
            other => {
                return Err(Error::InvalidSignature {
                    found: [other[0], other[1], other[2], other[3]],
                })
            }
        };

        let mut diagnostics = Vec::new();
        let mut tree = ChunkTree::new();
        let (root, total) = {
            let mut ctx = ParseCtx {
                order,
                diagnostics: &mut diagnostics,
            };
            tree.parse_chunk(data, 0, None, &mut ctx)?
        };

        let compressed = match tree.node(root).name() {
            Some(name) if name == Tag::FORM_CMX => false,
            Some(name) if name == Tag::FORM_CDRX => true,
            Some(name) => return Err(Error::InvalidSignature { found: name.0 }),
            None => return Err(Error::InvalidSignature { found: [0; 4] }),
        };

        let padded = total + total % 2;
        if data.len() > padded {
            diagnostics.push(Diagnostic::new(
                padded,
                format!("{} trailing bytes after the root chunk ignored", data.len() - padded),
            ));
        }

        let doc = Self {
            tree,
            root,
            order,
            compressed,
            diagnostics,
        };

        // The header is mandatory, unless the only place it could live is
        // a pack whose stream failed, which is a recorded sub-tree failure
        // rather than a reason to reject the surviving siblings.
        if doc.find_by_tag(Tag::CONT).is_none() && !doc.has_failed_pack() {
            return Err(Error::MissingChunk { tag: Tag::CONT });
        }
        Ok(doc)
    }

    /// Build a minimal in-memory document: root container and a default
    /// header, inside a pack when `compressed` is set.
    pub fn new(order: ByteOrder, compressed: bool) -> Self {
        let mut tree = ChunkTree::new();

        let (root_tag, form) = match (order, compressed) {
            (ByteOrder::Little, false) => (Tag::RIFF, Tag::FORM_CMX),
            (ByteOrder::Little, true) => (Tag::RIFF, Tag::FORM_CDRX),
            (ByteOrder::Big, false) => (Tag::RIFX, Tag::FORM_CMX),
            (ByteOrder::Big, true) => (Tag::RIFX, Tag::FORM_CDRX),
        };
        let mut w = Writer::new(order);
        w.write_tag(root_tag);
        w.write_u32(0);
        w.write_tag(form);
        let root = tree.add_new(
            root_tag,
            w.into_bytes(),
            ChunkBody::List { name: Some(form) },
            None,
        );

        let container = if compressed {
            let mut w = Writer::new(order);
            w.write_tag(Tag::PACK);
            w.write_u32(0);
            w.write_u32(0);
            w.write_bytes(&pack::STREAM_MARKER);
            w.write_u32(pack::STREAM_FLAGS);
            tree.add_new(Tag::PACK, w.into_bytes(), ChunkBody::Pack(Pack::new()), Some(root))
        } else {
            root
        };

        let payload = Cont::default_payload(order);
        let mut scratch = Vec::new();
        let header = Cont::decode(&payload, order, 0, &mut scratch);
        let mut w = Writer::new(order);
        w.write_tag(Tag::CONT);
        w.write_u32(payload.len() as u32);
        w.write_bytes(&payload);
        tree.add_new(
            Tag::CONT,
            w.into_bytes(),
            ChunkBody::Header(header),
            Some(container),
        );

        Self {
            tree,
            root,
            order,
            compressed,
            diagnostics: Vec::new(),
        }
    }

    /// Finalize every chunk bottom-up (sizes, pack streams) and emit the
    /// document bytes.
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        self.tree.update(self.root, self.order)?;
        let mut w = Writer::new(self.order);
        self.tree.serialize_node(self.root, &mut w);
        Ok(w.into_bytes())
    }

    // ---- read access ------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn tree(&self) -> &ChunkTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> &ChunkNode {
        self.tree.node(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.node(id).children()
    }

    pub fn get_size(&self, id: NodeId) -> usize {
        self.tree.get_size(id)
    }

    pub fn get_offset(&self, id: NodeId) -> usize {
        self.tree.get_offset(id)
    }

    /// Problems recovered during parse, in input order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// First chunk with the given tag, depth-first from the root.
    pub fn find_by_tag(&self, tag: Tag) -> Option<NodeId> {
        self.find_from(self.root, &|node| node.tag() == tag)
    }

    /// First container with the given subtype name, depth-first.
    pub fn find_by_name(&self, name: Tag) -> Option<NodeId> {
        self.find_from(self.root, &|node| node.name() == Some(name))
    }

    fn find_from(&self, id: NodeId, pred: &dyn Fn(&ChunkNode) -> bool) -> Option<NodeId> {
        let node = self.tree.node(id);
        if pred(node) {
            return Some(id);
        }
        node.children()
            .iter()
            .find_map(|&child| self.find_from(child, pred))
    }

    /// The document header, if present.
    pub fn header(&self) -> Option<&Cont> {
        let id = self.find_by_tag(Tag::CONT)?;
        match self.tree.node(id).body() {
            ChunkBody::Header(cont) => Some(cont),
            _ => None,
        }
    }

    /// The normalized color table from the first `rclr` chunk; empty when
    /// the document has none.
    pub fn color_table(&self) -> ColorTable {
        match self.find_by_tag(Tag::RCLR) {
            Some(id) => match self.tree.node(id).body() {
                ChunkBody::Colors(rclr) => rclr.color_table(self.order),
                _ => ColorTable::new(),
            },
            None => ColorTable::new(),
        }
    }

    fn has_failed_pack(&self) -> bool {
        self.tree
            .iter()
            .any(|(_, node)| node.tag() == Tag::PACK && matches!(node.body(), ChunkBody::Unknown))
    }

    // ---- mutation ---------------------------------------------------

    /// Replace the text of an `ikey`/`icmt` chunk.
    ///
    /// Panics if `id` is not a note chunk.
    pub fn set_note_text(&mut self, id: NodeId, text: &str) {
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Note(note) = body else {
            panic!("chunk is not a note");
        };
        note.text = text.to_string();
        raw.truncate(8);
        raw.extend_from_slice(&Note::encode(text));
    }

    /// Replace the raw profile bytes of a `ccmm` chunk.
    ///
    /// Panics if `id` is not a profile chunk.
    pub fn set_profile(&mut self, id: NodeId, bytes: &[u8]) {
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Profile = body else {
            panic!("chunk is not a color profile");
        };
        raw.truncate(8);
        raw.extend_from_slice(bytes);
    }

    /// Replace the DIB bytes of a `disp` chunk and re-decode its header.
    ///
    /// Panics if `id` is not a thumbnail chunk.
    pub fn set_thumbnail(&mut self, id: NodeId, dib: &[u8]) {
        let order = self.order;
        let mut scratch = Vec::new();
        let decoded = Disp::decode(dib, order, 0, &mut scratch);
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Thumbnail(disp) = body else {
            panic!("chunk is not a thumbnail");
        };
        *disp = decoded;
        raw.truncate(8);
        raw.extend_from_slice(dib);
    }

    /// Replace a page's instruction tree; the payload is rebuilt from it.
    ///
    /// Panics if `id` is not a page chunk.
    pub fn set_instructions(&mut self, id: NodeId, instructions: Vec<InstructionNode>) {
        let order = self.order;
        let encoded = crate::instr::encode(&instructions, order);
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Page(page) = body else {
            panic!("chunk is not a page");
        };
        *page = Page {
            instructions,
            opaque: false,
        };
        raw.truncate(8);
        raw.extend_from_slice(&encoded);
    }

    /// Replace the entries of an `rclr` color table chunk.
    ///
    /// Panics if `id` is not a color table chunk.
    pub fn set_colors(&mut self, id: NodeId, entries: Vec<RclrEntry>) {
        let order = self.order;
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Colors(rclr) = body else {
            panic!("chunk is not a color table");
        };
        *rclr = Rclr {
            entries,
            opaque: false,
        };
        let encoded = rclr.encode(order);
        raw.truncate(8);
        raw.extend_from_slice(&encoded);
    }

    /// Replace the payload of an unknown passthrough chunk.
    ///
    /// Panics if `id` is a known chunk kind.
    pub fn set_unknown_payload(&mut self, id: NodeId, payload: &[u8]) {
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Unknown = body else {
            panic!("chunk is not an unknown passthrough");
        };
        raw.truncate(8);
        raw.extend_from_slice(payload);
    }

    /// Patch the document bounding box in the header chunk.
    pub fn set_bbox(&mut self, id: NodeId, bbox: [i32; 4]) {
        let order = self.order;
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Header(header) = body else {
            panic!("chunk is not a document header");
        };
        header.bbox = bbox;
        let mut payload = raw.split_off(8);
        cont::patch_bbox(&mut payload, order, bbox);
        raw.append(&mut payload);
    }

    /// Patch the coordinate unit and scale factor in the header chunk.
    pub fn set_unit(&mut self, id: NodeId, unit: u16, factor: f64) {
        let order = self.order;
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Header(header) = body else {
            panic!("chunk is not a document header");
        };
        header.unit = unit;
        header.factor = factor;
        let mut payload = raw.split_off(8);
        cont::patch_unit(&mut payload, order, unit);
        cont::patch_factor(&mut payload, order, factor);
        raw.append(&mut payload);
    }

    /// Patch the top-level instruction tally in the header chunk.
    pub fn set_instruction_count(&mut self, id: NodeId, count: u32) {
        let order = self.order;
        let (raw, body) = self.tree.touch(id);
        let ChunkBody::Header(header) = body else {
            panic!("chunk is not a document header");
        };
        header.instruction_count = count;
        let mut payload = raw.split_off(8);
        cont::patch_instruction_count(&mut payload, order, count);
        raw.append(&mut payload);
    }

    /// Append a new `LIST` container under `parent`.
    ///
    /// Panics if `parent` is a leaf.
    pub fn append_list(&mut self, parent: NodeId, name: Tag) -> NodeId {
        self.assert_container(parent);
        let mut w = Writer::new(self.order);
        w.write_tag(Tag::LIST);
        w.write_u32(0);
        w.write_tag(name);
        self.tree.add_new(
            Tag::LIST,
            w.into_bytes(),
            ChunkBody::List { name: Some(name) },
            Some(parent),
        )
    }

    /// Append a new, empty compressed pack under `parent`.
    ///
    /// Panics if `parent` is a leaf.
    pub fn append_pack(&mut self, parent: NodeId) -> NodeId {
        self.assert_container(parent);
        let mut w = Writer::new(self.order);
        w.write_tag(Tag::PACK);
        w.write_u32(0);
        w.write_u32(0);
        w.write_bytes(&pack::STREAM_MARKER);
        w.write_u32(pack::STREAM_FLAGS);
        self.tree
            .add_new(Tag::PACK, w.into_bytes(), ChunkBody::Pack(Pack::new()), Some(parent))
    }

    /// Append a note chunk (`ikey` or `icmt`) under `parent`.
    ///
    /// Panics if `parent` is a leaf or `tag` is not a note tag.
    pub fn append_note(&mut self, parent: NodeId, tag: Tag, text: &str) -> NodeId {
        self.assert_container(parent);
        if ChunkKind::from_tag(tag) != ChunkKind::Note {
            panic!("{tag} is not a note tag");
        }
        let payload = Note::encode(text);
        let raw = self.leaf_raw(tag, &payload);
        self.tree.add_new(
            tag,
            raw,
            ChunkBody::Note(Note {
                text: text.to_string(),
            }),
            Some(parent),
        )
    }

    /// Append a page chunk with the given instruction tree under `parent`.
    ///
    /// Panics if `parent` is a leaf.
    pub fn append_page(&mut self, parent: NodeId, instructions: Vec<InstructionNode>) -> NodeId {
        self.assert_container(parent);
        let payload = crate::instr::encode(&instructions, self.order);
        let raw = self.leaf_raw(Tag::PAGE, &payload);
        self.tree.add_new(
            Tag::PAGE,
            raw,
            ChunkBody::Page(Page {
                instructions,
                opaque: false,
            }),
            Some(parent),
        )
    }

    /// Append an `rclr` color table chunk under `parent`.
    ///
    /// Panics if `parent` is a leaf.
    pub fn append_color_table(&mut self, parent: NodeId, entries: Vec<RclrEntry>) -> NodeId {
        self.assert_container(parent);
        let rclr = Rclr {
            entries,
            opaque: false,
        };
        let payload = rclr.encode(self.order);
        let raw = self.leaf_raw(Tag::RCLR, &payload);
        self.tree
            .add_new(Tag::RCLR, raw, ChunkBody::Colors(rclr), Some(parent))
    }

    /// Append a leaf chunk with an arbitrary tag and payload. The payload
    /// is decoded according to the tag's registered kind; unregistered
    /// tags become passthrough chunks.
    ///
    /// Panics if `parent` is a leaf or `tag` names a container kind.
    pub fn append_chunk(&mut self, parent: NodeId, tag: Tag, payload: &[u8]) -> NodeId {
        self.assert_container(parent);
        let kind = ChunkKind::from_tag(tag);
        if kind.is_container() {
            panic!("{tag} is a container tag; use append_list or append_pack");
        }
        let order = self.order;
        let mut scratch = Vec::new();
        let body = match kind {
            ChunkKind::Header => ChunkBody::Header(Cont::decode(payload, order, 0, &mut scratch)),
            ChunkKind::Profile => ChunkBody::Profile,
            ChunkKind::Thumbnail => {
                ChunkBody::Thumbnail(Disp::decode(payload, order, 0, &mut scratch))
            }
            ChunkKind::Note => ChunkBody::Note(Note::decode(payload)),
            ChunkKind::Page => ChunkBody::Page(Page::decode(payload, order, 0, &mut scratch)),
            ChunkKind::ColorTable => {
                ChunkBody::Colors(Rclr::decode(payload, order, 0, &mut scratch))
            }
            ChunkKind::Unknown => ChunkBody::Unknown,
            ChunkKind::List | ChunkKind::Pack => unreachable!(),
        };
        self.diagnostics.extend(scratch);
        let raw = self.leaf_raw(tag, payload);
        self.tree.add_new(tag, raw, body, Some(parent))
    }

    /// Detach a chunk (and its subtree) from the document.
    ///
    /// Panics if `id` is the root.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            panic!("cannot remove the root chunk");
        }
        self.tree.detach(id);
    }

    fn leaf_raw(&self, tag: Tag, payload: &[u8]) -> Vec<u8> {
        let mut w = Writer::with_capacity(self.order, 8 + payload.len());
        w.write_tag(tag);
        w.write_u32(payload.len() as u32);
        w.write_bytes(payload);
        w.into_bytes()
    }

    fn assert_container(&self, id: NodeId) {
        if self.tree.node(id).is_leaf() {
            panic!("chunk {} is not a container", self.tree.node(id).tag());
        }
    }
}

impl std::fmt::Debug for CmxDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmxDoc")
            .field("byte_order", &self.order)
            .field("compressed", &self.compressed)
            .field("chunks", &self.tree.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
