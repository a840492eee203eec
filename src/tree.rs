//! The generic chunk tree.
//!
//! Chunks live in an arena (`Vec<ChunkNode>`) and reference each other by
//! [`NodeId`]; each node stores its parent's index, so offset queries chase
//! indices instead of holding live back-pointers. A node's `raw` holds its
//! own header+payload bytes exactly as on disk; children serialize
//! separately and concatenate after it.

use crate::chunks::{ChunkBody, Cont, Disp, Note, Pack, Page, Rclr};
use crate::cursor::{patch_u32_at, u32_at, ByteOrder, Writer};
use crate::error::{Diagnostic, Error, Result};
use crate::registry::{ChunkKind, Tag};

/// Index of a chunk in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One chunk: tag, raw header+payload bytes, decoded body, tree links.
#[derive(Debug)]
pub struct ChunkNode {
    tag: Tag,
    raw: Vec<u8>,
    body: ChunkBody,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dirty: bool,
}

impl ChunkNode {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The chunk's own bytes (header + payload, children excluded).
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Payload bytes after the 8-byte tag+size header.
    pub fn payload(&self) -> &[u8] {
        &self.raw[8.min(self.raw.len())..]
    }

    pub fn body(&self) -> &ChunkBody {
        &self.body
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        !self.body.is_container()
    }

    /// Container subtype name, if any.
    pub fn name(&self) -> Option<Tag> {
        self.body.name()
    }
}

/// Shared parse state: the document byte order and the diagnostics sink.
pub(crate) struct ParseCtx<'a> {
    pub order: ByteOrder,
    pub diagnostics: &'a mut Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct ChunkTree {
    nodes: Vec<ChunkNode>,
}

impl ChunkTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &ChunkNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ChunkNode {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn add(
        &mut self,
        tag: Tag,
        raw: Vec<u8>,
        body: ChunkBody,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ChunkNode {
            tag,
            raw,
            body,
            parent,
            children: Vec::new(),
            dirty: false,
        });
        if let Some(p) = parent {
            self.node_mut(p).children.push(id);
        }
        id
    }

    /// Create a node marked dirty (in-memory, not yet serialized).
    pub(crate) fn add_new(
        &mut self,
        tag: Tag,
        raw: Vec<u8>,
        body: ChunkBody,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.add(tag, raw, body, parent);
        self.node_mut(id).dirty = true;
        id
    }

    /// Mutable access for setters; marks the node dirty.
    pub(crate) fn touch(&mut self, id: NodeId) -> (&mut Vec<u8>, &mut ChunkBody) {
        let node = self.node_mut(id);
        node.dirty = true;
        (&mut node.raw, &mut node.body)
    }

    /// Detach a node from its parent. The node stays in the arena but is
    /// no longer reachable from the root.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(p) = self.node(id).parent {
            self.node_mut(p).children.retain(|&c| c != id);
            self.node_mut(p).dirty = true;
            self.node_mut(id).parent = None;
        }
    }

    // ---- parsing ----------------------------------------------------

    /// Parse one chunk from the start of `input`.
    ///
    /// `base` is the absolute offset of `input` in the document, used for
    /// error/diagnostic positions. Returns the new node and the number of
    /// bytes the chunk spans, excluding any trailing pad byte.
    pub(crate) fn parse_chunk(
        &mut self,
        input: &[u8],
        base: usize,
        parent: Option<NodeId>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<(NodeId, usize)> {
        if input.len() < 8 {
            return Err(Error::TruncatedInput {
                offset: base,
                need: 8,
                have: input.len(),
            });
        }
        let tag = Tag([input[0], input[1], input[2], input[3]]);
        let size = u32_at(input, 4, ctx.order) as usize;
        if size > input.len() - 8 {
            return Err(Error::CorruptContainer {
                tag,
                offset: base,
                declared: size,
                available: input.len() - 8,
            });
        }
        let region = &input[8..8 + size];
        let total = 8 + size;

        let id = match ChunkKind::from_tag(tag) {
            ChunkKind::List => self.parse_list(tag, region, base, parent, ctx)?,
            ChunkKind::Pack => self.parse_pack(tag, region, base, parent, ctx)?,
            ChunkKind::Header => {
                let body = ChunkBody::Header(Cont::decode(
                    region,
                    ctx.order,
                    base + 8,
                    ctx.diagnostics,
                ));
                self.add(tag, input[..total].to_vec(), body, parent)
            }
            ChunkKind::Profile => self.add(tag, input[..total].to_vec(), ChunkBody::Profile, parent),
            ChunkKind::Thumbnail => {
                let body = ChunkBody::Thumbnail(Disp::decode(
                    region,
                    ctx.order,
                    base + 8,
                    ctx.diagnostics,
                ));
                self.add(tag, input[..total].to_vec(), body, parent)
            }
            ChunkKind::Note => {
                let body = ChunkBody::Note(Note::decode(region));
                self.add(tag, input[..total].to_vec(), body, parent)
            }
            ChunkKind::Page => {
                let body =
                    ChunkBody::Page(Page::decode(region, ctx.order, base + 8, ctx.diagnostics));
                self.add(tag, input[..total].to_vec(), body, parent)
            }
            ChunkKind::ColorTable => {
                let body =
                    ChunkBody::Colors(Rclr::decode(region, ctx.order, base + 8, ctx.diagnostics));
                self.add(tag, input[..total].to_vec(), body, parent)
            }
            ChunkKind::Unknown => self.add(tag, input[..total].to_vec(), ChunkBody::Unknown, parent),
        };

        Ok((id, total))
    }

    fn parse_list(
        &mut self,
        tag: Tag,
        region: &[u8],
        base: usize,
        parent: Option<NodeId>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<NodeId> {
        if region.is_empty() {
            // Size-zero container: no name, no children.
            let mut raw = Vec::with_capacity(8);
            raw.extend_from_slice(tag.as_bytes());
            raw.extend_from_slice(&[0u8; 4]);
            patch_u32_at(&mut raw, 4, 0, ctx.order);
            return Ok(self.add(tag, raw, ChunkBody::List { name: None }, parent));
        }
        if region.len() < 4 {
            return Err(Error::TruncatedInput {
                offset: base + 8,
                need: 4,
                have: region.len(),
            });
        }
        let name = Tag([region[0], region[1], region[2], region[3]]);
        let mut raw = Vec::with_capacity(12);
        raw.extend_from_slice(tag.as_bytes());
        raw.extend_from_slice(&[0u8; 4]);
        patch_u32_at(&mut raw, 4, region.len() as u32, ctx.order);
        raw.extend_from_slice(name.as_bytes());

        let id = self.add(tag, raw, ChunkBody::List { name: Some(name) }, parent);
        self.parse_children(&region[4..], base + 12, id, ctx)?;
        Ok(id)
    }

    fn parse_pack(
        &mut self,
        tag: Tag,
        region: &[u8],
        base: usize,
        parent: Option<NodeId>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<NodeId> {
        let total = 8 + region.len();
        if region.len() < 12 {
            ctx.diagnostics.push(Diagnostic::new(
                base,
                format!("pack chunk too short for its stream prefix ({} bytes)", region.len()),
            ));
            let mut raw = [&tag.0[..], &[0u8; 4], region].concat();
            patch_u32_at(&mut raw, 4, region.len() as u32, ctx.order);
            return Ok(self.add(tag, raw, ChunkBody::Unknown, parent));
        }

        let uncompressed_size = u32_at(region, 0, ctx.order);
        let marker = [region[4], region[5], region[6], region[7]];
        let flags = u32_at(region, 8, ctx.order);
        if marker != crate::chunks::pack::STREAM_MARKER {
            ctx.diagnostics.push(Diagnostic::new(
                base + 12,
                format!("unexpected pack stream marker {:?}", Tag(marker)),
            ));
        }

        let stream = &region[12..];
        let inflated = match crate::chunks::pack::inflate(stream, base + 20) {
            Ok(buf) => buf,
            Err(err) => {
                // Fatal for this sub-tree only: keep the bytes verbatim so
                // siblings still parse and the document still round-trips.
                ctx.diagnostics
                    .push(Diagnostic::new(base + 20, err.to_string()));
                let mut raw = Vec::with_capacity(total);
                raw.extend_from_slice(tag.as_bytes());
                raw.extend_from_slice(&[0u8; 4]);
                patch_u32_at(&mut raw, 4, region.len() as u32, ctx.order);
                raw.extend_from_slice(region);
                return Ok(self.add(tag, raw, ChunkBody::Unknown, parent));
            }
        };
        if inflated.len() != uncompressed_size as usize {
            ctx.diagnostics.push(Diagnostic::new(
                base + 8,
                format!(
                    "pack declares {} uncompressed bytes but the stream holds {}",
                    uncompressed_size,
                    inflated.len()
                ),
            ));
        }

        let mut raw = Vec::with_capacity(20);
        raw.extend_from_slice(tag.as_bytes());
        raw.extend_from_slice(&[0u8; 4]);
        patch_u32_at(&mut raw, 4, region.len() as u32, ctx.order);
        raw.extend_from_slice(&region[..12]);

        let body = ChunkBody::Pack(Pack {
            uncompressed_size,
            marker,
            flags,
            compressed: stream.to_vec(),
        });
        let id = self.add(tag, raw, body, parent);

        // Offsets restart at zero inside the decompressed stream.
        let mark = self.nodes.len();
        if let Err(err) = self.parse_children(&inflated, 0, id, ctx) {
            ctx.diagnostics.push(Diagnostic::new(
                base + 20,
                format!("corrupt pack contents, kept verbatim: {err}"),
            ));
            self.nodes.truncate(mark);
            let mut raw = [&tag.0[..], &[0u8; 4], region].concat();
            patch_u32_at(&mut raw, 4, region.len() as u32, ctx.order);
            let node = self.node_mut(id);
            node.children.clear();
            node.body = ChunkBody::Unknown;
            node.raw = raw;
        }
        Ok(id)
    }

    /// Parse a sequence of sibling chunks filling `region`.
    pub(crate) fn parse_children(
        &mut self,
        region: &[u8],
        base: usize,
        parent: NodeId,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<()> {
        let mut pos = 0;
        while pos < region.len() {
            let (_, total) = self.parse_chunk(&region[pos..], base + pos, Some(parent), ctx)?;
            pos += total;
            // Odd-length chunks are followed by a pad byte, which belongs
            // to the parent's span but not to the chunk's size field.
            if total % 2 != 0 && pos < region.len() {
                pos += 1;
            }
        }
        Ok(())
    }

    // ---- sizes and offsets ------------------------------------------

    /// Total serialized length of a chunk including all descendants (and
    /// their pad bytes), excluding the chunk's own trailing pad.
    pub fn get_size(&self, id: NodeId) -> usize {
        let node = self.node(id);
        match &node.body {
            ChunkBody::Pack(pack) => node.raw.len() + pack.compressed.len(),
            _ => {
                node.raw.len()
                    + node
                        .children
                        .iter()
                        .map(|&c| self.padded_size(c))
                        .sum::<usize>()
            }
        }
    }

    /// Serialized length including the trailing pad byte, if any: the
    /// stride from this chunk's offset to its next sibling's.
    pub fn padded_size(&self, id: NodeId) -> usize {
        let size = self.get_size(id);
        size + size % 2
    }

    /// Byte offset of a chunk from the start of its serialization domain
    /// (the document, or the decompressed stream of the nearest pack).
    pub fn get_offset(&self, id: NodeId) -> usize {
        let node = self.node(id);
        let Some(parent) = node.parent else {
            return 0;
        };
        let parent_node = self.node(parent);
        // A pack's children restart at zero inside its decompressed stream.
        let mut offset = if matches!(parent_node.body, ChunkBody::Pack(_)) {
            0
        } else {
            self.get_offset(parent) + parent_node.raw.len()
        };
        for &sibling in &parent_node.children {
            if sibling == id {
                break;
            }
            offset += self.padded_size(sibling);
        }
        offset
    }

    // ---- finalization and serialization -----------------------------

    /// Bottom-up finalize: recompute every size field and recompress packs
    /// whose subtree changed. Returns whether this subtree had changes.
    pub(crate) fn update(&mut self, id: NodeId, order: ByteOrder) -> Result<bool> {
        let children = self.node(id).children.clone();
        let mut changed = self.node(id).dirty;
        for &child in &children {
            changed |= self.update(child, order)?;
        }

        let rebuild_stream = match &self.node(id).body {
            ChunkBody::Pack(pack) => changed || pack.compressed.is_empty(),
            _ => false,
        };
        if rebuild_stream {
            let mut w = Writer::new(order);
            for &child in &children {
                self.serialize_node(child, &mut w);
            }
            let stream = w.into_bytes();
            let compressed = crate::chunks::pack::deflate(&stream)?;
            let node = self.node_mut(id);
            if let ChunkBody::Pack(pack) = &mut node.body {
                pack.uncompressed_size = stream.len() as u32;
                pack.compressed = compressed;
            }
            patch_u32_at(&mut node.raw, 8, stream.len() as u32, order);
        }

        let size = (self.get_size(id) - 8) as u32;
        let node = self.node_mut(id);
        patch_u32_at(&mut node.raw, 4, size, order);
        node.dirty = false;
        Ok(changed)
    }

    /// Emit a finalized chunk: own bytes, then children (or the compressed
    /// stream for packs), then the pad byte if the total length is odd.
    pub(crate) fn serialize_node(&self, id: NodeId, w: &mut Writer) {
        let node = self.node(id);
        w.write_bytes(&node.raw);
        match &node.body {
            ChunkBody::Pack(pack) => w.write_bytes(&pack.compressed),
            _ => {
                for &child in &node.children {
                    self.serialize_node(child, w);
                }
            }
        }
        if self.get_size(id) % 2 != 0 {
            w.write_u8(0);
        }
    }

    /// Number of nodes in the arena (reachable or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every node in the arena, reachable or not.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ChunkNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }
}
