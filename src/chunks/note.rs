/// Free-text metadata (`ikey` keywords / `icmt` comments).
///
/// The payload is the text padded with NULs up to the next 32-byte
/// boundary; the padding always includes at least one NUL, so a text whose
/// length is an exact multiple of 32 still grows by a full block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub text: String,
}

impl Note {
    pub fn decode(payload: &[u8]) -> Self {
        let end = payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |pos| pos + 1);
        Self {
            text: String::from_utf8_lossy(&payload[..end]).into_owned(),
        }
    }

    /// Encode the text into a padded payload.
    pub fn encode(text: &str) -> Vec<u8> {
        let len = text.len();
        let padded = (len / 32 + 1) * 32;
        let mut payload = Vec::with_capacity(padded);
        payload.extend_from_slice(text.as_bytes());
        payload.resize(padded, 0);
        payload
    }
}
