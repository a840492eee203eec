//! Fixture generator for cmx tests.
//!
//! Generates small synthetic CMX/CDRX documents into `tests/fixtures/`.
//! These are committed to the repo and serve as:
//!
//!   1. Regression inputs for the parser integration tests.
//!   2. Reference files for cross-checking against other CMX tooling.
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin gen_fixtures
//! ```

use cmx::chunks::rclr::RclrEntry;
use cmx::color::ColorModel;
use cmx::cursor::Writer;
use cmx::instr::{decode, InstrCode};
use cmx::{ByteOrder, CmxDoc, Tag};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn main() -> std::io::Result<()> {
    std::fs::create_dir_all(FIXTURES_DIR)?;

    write("plain_le.cmx", build_plain(ByteOrder::Little))?;
    write("plain_be.cmx", build_plain(ByteOrder::Big))?;
    write("compressed_le.cdrx", build_compressed(ByteOrder::Little))?;
    write("unknown_chunk.cmx", build_with_unknown())?;
    Ok(())
}

fn write(name: &str, data: Vec<u8>) -> std::io::Result<()> {
    let path = format!("{FIXTURES_DIR}/{name}");
    std::fs::write(&path, &data)?;
    println!("{path}: {} bytes", data.len());
    Ok(())
}

/// Plain document: header, metadata list, one page, a color table.
fn build_plain(order: ByteOrder) -> Vec<u8> {
    let mut doc = CmxDoc::new(order, false);
    let root = doc.root();

    let info = doc.append_list(root, Tag(*b"info"));
    doc.append_note(info, Tag::IKEY, "fixture");
    doc.append_note(info, Tag::ICMT, "generated by gen_fixtures");

    doc.append_color_table(
        root,
        vec![
            RclrEntry {
                model: ColorModel::Rgb,
                usage: 0,
                body: vec![255, 0, 0, 0],
            },
            RclrEntry {
                model: ColorModel::Gray,
                usage: 0,
                body: vec![128],
            },
        ],
    );

    doc.append_page(root, page_instructions(order));
    doc.serialize().expect("fixture serialization")
}

/// Compressed document: the same content inside a pack chunk.
fn build_compressed(order: ByteOrder) -> Vec<u8> {
    let mut doc = CmxDoc::new(order, true);
    let pack = doc.find_by_tag(Tag::PACK).expect("fresh pack");

    let info = doc.append_list(pack, Tag(*b"info"));
    doc.append_note(info, Tag::IKEY, "compressed fixture");
    doc.append_page(pack, page_instructions(order));
    doc.serialize().expect("fixture serialization")
}

/// Document carrying a fabricated chunk tag that must pass through.
fn build_with_unknown() -> Vec<u8> {
    let mut doc = CmxDoc::new(ByteOrder::Little, false);
    let root = doc.root();
    doc.append_chunk(root, Tag(*b"zXy9"), &[0xDE, 0xAD, 0xBE, 0xEF, 0x01]);
    doc.serialize().expect("fixture serialization")
}

/// BeginPage > BeginLayer > Rectangle+PolyCurve > EndLayer > EndPage.
fn page_instructions(order: ByteOrder) -> Vec<decode::InstructionNode> {
    let mut w = Writer::new(order);
    for (code, body) in [
        (InstrCode::BeginPage as i16, vec![0u8; 12]),
        (InstrCode::BeginLayer as i16, vec![0u8; 6]),
        (InstrCode::Rectangle as i16, vec![0x11u8; 8]),
        (InstrCode::PolyCurve as i16, vec![0x22u8; 16]),
        (InstrCode::EndLayer as i16, vec![]),
        (InstrCode::EndPage as i16, vec![]),
    ] {
        w.write_u16((4 + body.len()) as u16);
        w.write_i16(code);
        w.write_bytes(&body);
    }
    let payload = w.into_bytes();
    let mut diags = Vec::new();
    decode::decode(&payload, order, 0, &mut diags).expect("fixture instruction stream")
}
