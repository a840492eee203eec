use crate::color::{decode_color, Color, ColorModel, ColorTable};
use crate::cursor::{ByteOrder, Cursor, Writer};
use crate::error::Diagnostic;

/// One entry in the `rclr` color table chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RclrEntry {
    pub model: ColorModel,
    /// Usage/palette byte, kept as stored.
    pub usage: u8,
    /// Model-width color body.
    pub body: Vec<u8>,
}

impl RclrEntry {
    /// Normalize this entry into a color.
    pub fn color(&self, order: ByteOrder) -> Color {
        decode_color(self.model, &self.body, order)
    }
}

/// The `rclr` color table: u16 entry count, then per entry a model byte,
/// a usage byte, and the model-width color body. Instruction records refer
/// to entries by 1-based index.
#[derive(Debug, Clone, Default)]
pub struct Rclr {
    pub entries: Vec<RclrEntry>,
    /// Set when the entry list could not be scanned to the declared count;
    /// the node's raw payload then stays authoritative.
    pub opaque: bool,
}

impl Rclr {
    pub fn decode(
        payload: &[u8],
        order: ByteOrder,
        base_offset: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut c = Cursor::new(payload, order);
        let count = match c.read_u16() {
            Ok(v) => v as usize,
            Err(_) => {
                diagnostics.push(Diagnostic::new(base_offset, "empty color table chunk"));
                return Self {
                    entries: Vec::new(),
                    opaque: true,
                };
            }
        };

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let entry_offset = base_offset + c.position();
            let Ok(model_byte) = c.read_u8() else {
                diagnostics.push(Diagnostic::new(
                    entry_offset,
                    format!("color table truncated at entry {} of {count}", index + 1),
                ));
                return Self {
                    entries,
                    opaque: true,
                };
            };
            let model = ColorModel::from_u8(model_byte);
            if let ColorModel::Raw(v) = model {
                // Width unknown: the rest of the table cannot be scanned.
                diagnostics.push(Diagnostic::new(
                    entry_offset,
                    format!("unknown color model {v} at entry {}; rest kept verbatim", index + 1),
                ));
                return Self {
                    entries,
                    opaque: true,
                };
            }
            let Ok(usage) = c.read_u8() else {
                diagnostics.push(Diagnostic::new(
                    entry_offset,
                    format!("color table truncated at entry {} of {count}", index + 1),
                ));
                return Self {
                    entries,
                    opaque: true,
                };
            };
            let Ok(body) = c.read_bytes(model.width()) else {
                diagnostics.push(Diagnostic::new(
                    entry_offset,
                    format!("color table truncated at entry {} of {count}", index + 1),
                ));
                return Self {
                    entries,
                    opaque: true,
                };
            };
            entries.push(RclrEntry {
                model,
                usage,
                body: body.to_vec(),
            });
        }

        Self {
            entries,
            opaque: false,
        }
    }

    /// Rebuild the payload from the entry list.
    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let mut w = Writer::new(order);
        w.write_u16(self.entries.len() as u16);
        for entry in &self.entries {
            w.write_u8(entry.model.as_u8());
            w.write_u8(entry.usage);
            w.write_bytes(&entry.body);
        }
        w.into_bytes()
    }

    /// Normalize all entries into the document color table.
    pub fn color_table(&self, order: ByteOrder) -> ColorTable {
        let mut table = ColorTable::new();
        for entry in &self.entries {
            table.push(entry.color(order));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorSpace;

    #[test]
    fn table_round_trips() {
        let table = Rclr {
            entries: vec![
                RclrEntry {
                    model: ColorModel::Rgb,
                    usage: 0,
                    body: vec![255, 0, 0, 0],
                },
                RclrEntry {
                    model: ColorModel::Gray,
                    usage: 1,
                    body: vec![128],
                },
            ],
            opaque: false,
        };
        let payload = table.encode(ByteOrder::Little);

        let mut diags = Vec::new();
        let parsed = Rclr::decode(&payload, ByteOrder::Little, 0, &mut diags);
        assert!(diags.is_empty());
        assert!(!parsed.opaque);
        assert_eq!(parsed.entries, table.entries);
        assert_eq!(parsed.encode(ByteOrder::Little), payload);

        let colors = parsed.color_table(ByteOrder::Little);
        assert_eq!(colors.get(1).unwrap().space, ColorSpace::Rgb);
        assert_eq!(colors.get(1).unwrap().values, vec![1.0, 0.0, 0.0]);
        assert_eq!(colors.get(2).unwrap().space, ColorSpace::Gray);
    }

    #[test]
    fn truncated_table_keeps_prefix_with_diagnostic() {
        let mut payload = Rclr {
            entries: vec![RclrEntry {
                model: ColorModel::Rgb,
                usage: 0,
                body: vec![1, 2, 3, 0],
            }],
            opaque: false,
        }
        .encode(ByteOrder::Little);
        // Claim a second entry that is not there.
        payload[0] = 2;

        let mut diags = Vec::new();
        let parsed = Rclr::decode(&payload, ByteOrder::Little, 0, &mut diags);
        assert!(parsed.opaque);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn unknown_model_stops_the_scan() {
        let payload = [1u8, 0, 200, 0, 0, 0];
        let mut diags = Vec::new();
        let parsed = Rclr::decode(&payload, ByteOrder::Little, 0, &mut diags);
        assert!(parsed.opaque);
        assert!(parsed.entries.is_empty());
        assert!(diags[0].message.contains("unknown color model 200"));
    }
}
