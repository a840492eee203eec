use cmx::chunks::cont::Cont;
use cmx::chunks::note::Note;
use cmx::chunks::ChunkBody;
use cmx::cursor::Writer;
use cmx::instr::InstrCode;
use cmx::{ByteOrder, CmxDoc, Error, Tag};

fn chunk(order: ByteOrder, tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut w = Writer::new(order);
    w.write_bytes(tag);
    w.write_u32(payload.len() as u32);
    w.write_bytes(payload);
    w.into_bytes()
}

fn list(order: ByteOrder, tag: &[u8; 4], name: &[u8; 4], children: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + children.len());
    payload.extend_from_slice(name);
    payload.extend_from_slice(children);
    chunk(order, tag, &payload)
}

fn padded(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() % 2 != 0 {
        bytes.push(0);
    }
    bytes
}

fn instruction_stream(order: ByteOrder) -> Vec<u8> {
    let mut w = Writer::new(order);
    for (code, body) in [
        (InstrCode::BeginLayer as i16, vec![0u8; 6]),
        (InstrCode::PolyCurve as i16, vec![0u8; 16]),
        (InstrCode::EndLayer as i16, vec![0u8; 2]),
    ] {
        w.write_u16((4 + body.len()) as u16);
        w.write_i16(code);
        w.write_bytes(&body);
    }
    w.into_bytes()
}

fn plain_document(order: ByteOrder) -> Vec<u8> {
    let root_tag = match order {
        ByteOrder::Little => b"RIFF",
        ByteOrder::Big => b"RIFX",
    };
    let mut children = Vec::new();
    children.extend(padded(chunk(order, b"cont", &Cont::default_payload(order))));
    children.extend(padded(list(
        order,
        b"LIST",
        b"info",
        &padded(chunk(order, b"ikey", &Note::encode("hello"))),
    )));
    children.extend(padded(chunk(order, b"page", &instruction_stream(order))));
    children.extend(padded(chunk(order, b"oddz", &[1, 2, 3])));
    list(order, root_tag, b"CMX1", &children)
}

#[test]
fn plain_little_endian_round_trips() {
    let data = plain_document(ByteOrder::Little);
    let mut doc = CmxDoc::parse(&data).expect("parse");
    assert_eq!(doc.byte_order(), ByteOrder::Little);
    assert!(!doc.is_compressed());
    assert!(doc.diagnostics().is_empty());

    assert_eq!(doc.serialize().expect("serialize"), data);
}

#[test]
fn plain_big_endian_round_trips() {
    let data = plain_document(ByteOrder::Big);
    let mut doc = CmxDoc::parse(&data).expect("parse");
    assert_eq!(doc.byte_order(), ByteOrder::Big);
    assert_eq!(doc.serialize().expect("serialize"), data);
}

#[test]
fn parsed_bodies_are_typed() {
    let data = plain_document(ByteOrder::Little);
    let doc = CmxDoc::parse(&data).expect("parse");

    let header = doc.header().expect("header");
    assert_eq!(header.file_id, "CMX");
    assert_eq!(header.unit, cmx::chunks::cont::UNIT_MM);
    assert_eq!(header.factor, 1.0);

    let info = doc.find_by_name(Tag(*b"info")).expect("info list");
    assert_eq!(doc.node(info).tag(), Tag::LIST);

    let ikey = doc.find_by_tag(Tag::IKEY).expect("ikey");
    match doc.node(ikey).body() {
        ChunkBody::Note(note) => assert_eq!(note.text, "hello"),
        other => panic!("unexpected body: {other:?}"),
    }

    let page = doc.find_by_tag(Tag::PAGE).expect("page");
    match doc.node(page).body() {
        ChunkBody::Page(page) => {
            assert!(!page.opaque);
            assert_eq!(page.instruction_count(), 1);
            let layer = &page.instructions[0];
            assert_eq!(layer.record.instr(), Some(InstrCode::BeginLayer));
            assert_eq!(layer.children.len(), 2);
        }
        other => panic!("unexpected body: {other:?}"),
    }
}

#[test]
fn unknown_tag_passes_through_verbatim() {
    let data = plain_document(ByteOrder::Little);
    let mut doc = CmxDoc::parse(&data).expect("parse");

    let unknown = doc.find_by_tag(Tag(*b"oddz")).expect("unknown chunk");
    assert!(matches!(doc.node(unknown).body(), ChunkBody::Unknown));
    assert_eq!(doc.node(unknown).payload(), &[1, 2, 3]);

    assert_eq!(doc.serialize().expect("serialize"), data);
}

#[test]
fn size_invariant_matches_declared_fields() {
    let data = plain_document(ByteOrder::Little);
    let doc = CmxDoc::parse(&data).expect("parse");

    // Every chunk's recomputed size equals the size field stored in its
    // raw header bytes.
    for (id, node) in doc.tree().iter() {
        let declared = u32::from_le_bytes(node.raw()[4..8].try_into().unwrap()) as usize;
        assert_eq!(doc.get_size(id) - 8, declared, "chunk {}", node.tag());
    }
}

#[test]
fn offsets_are_additive_over_siblings() {
    let data = plain_document(ByteOrder::Little);
    let doc = CmxDoc::parse(&data).expect("parse");

    let root = doc.root();
    let children = doc.children(root);
    assert!(children.len() >= 2);
    for pair in children.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert_eq!(
            doc.get_offset(b),
            doc.get_offset(a) + doc.tree().padded_size(a)
        );
    }

    // First child starts right after the root's 12-byte header.
    assert_eq!(doc.get_offset(children[0]), 12);

    // Offsets point at the chunk's tag bytes in the file.
    for &child in children {
        let off = doc.get_offset(child);
        assert_eq!(&data[off..off + 4], doc.node(child).tag().as_bytes());
    }
}

#[test]
fn serialized_chunks_have_even_stride() {
    let data = plain_document(ByteOrder::Big);
    let doc = CmxDoc::parse(&data).expect("parse");
    for (id, _) in doc.tree().iter() {
        assert_eq!(doc.tree().padded_size(id) % 2, 0);
    }
}

#[test]
fn size_zero_container_round_trips() {
    let order = ByteOrder::Little;
    let mut children = Vec::new();
    children.extend(padded(chunk(order, b"cont", &Cont::default_payload(order))));
    children.extend(chunk(order, b"LIST", &[])); // size-zero container
    let data = list(order, b"RIFF", b"CMX1", &children);

    let mut doc = CmxDoc::parse(&data).expect("parse");
    let empty = doc
        .children(doc.root())
        .iter()
        .copied()
        .find(|&id| doc.node(id).tag() == Tag::LIST)
        .expect("empty list");
    assert_eq!(doc.get_size(empty), 8);
    assert!(doc.node(empty).name().is_none());
    assert!(doc.children(empty).is_empty());

    assert_eq!(doc.serialize().expect("serialize"), data);
}

#[test]
fn truncated_input_is_rejected() {
    let data = plain_document(ByteOrder::Little);
    match CmxDoc::parse(&data[..10]) {
        Err(Error::TruncatedInput { offset, .. }) => assert_eq!(offset, 0),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn oversized_declared_size_is_corrupt_container() {
    let order = ByteOrder::Little;
    let mut data = plain_document(order);
    // Inflate the root size field beyond the file length.
    let huge = (data.len() as u32) * 2;
    data[4..8].copy_from_slice(&huge.to_le_bytes());

    match CmxDoc::parse(&data) {
        Err(Error::CorruptContainer { tag, offset, .. }) => {
            assert_eq!(tag, Tag::RIFF);
            assert_eq!(offset, 0);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn oversized_child_reports_its_offset() {
    let order = ByteOrder::Little;
    let mut bad_child = chunk(order, b"cont", &Cont::default_payload(order));
    // Claim more payload than the parent region holds.
    bad_child[4..8].copy_from_slice(&1000u32.to_le_bytes());
    let data = list(order, b"RIFF", b"CMX1", &bad_child);

    match CmxDoc::parse(&data) {
        Err(Error::CorruptContainer { tag, offset, .. }) => {
            assert_eq!(tag, Tag::CONT);
            assert_eq!(offset, 12);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn foreign_signature_is_rejected() {
    match CmxDoc::parse(b"OGGSxxxxxxxxxxxx") {
        Err(Error::InvalidSignature { found }) => assert_eq!(&found, b"OGGS"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn foreign_form_type_is_rejected() {
    let data = list(ByteOrder::Little, b"RIFF", b"WAVE", &[]);
    match CmxDoc::parse(&data) {
        Err(Error::InvalidSignature { found }) => assert_eq!(&found, b"WAVE"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_header_is_rejected() {
    let order = ByteOrder::Little;
    let children = padded(list(
        order,
        b"LIST",
        b"info",
        &padded(chunk(order, b"ikey", &Note::encode("no header"))),
    ));
    let data = list(order, b"RIFF", b"CMX1", &children);

    match CmxDoc::parse(&data) {
        Err(Error::MissingChunk { tag }) => assert_eq!(tag, Tag::CONT),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn trailing_bytes_are_diagnosed_not_fatal() {
    let mut data = plain_document(ByteOrder::Little);
    data.extend_from_slice(&[0u8; 6]);
    let doc = CmxDoc::parse(&data).expect("parse");
    assert!(doc
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("trailing bytes")));
}
