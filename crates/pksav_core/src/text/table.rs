use std::collections::HashMap;

use serde::Deserialize;

use crate::core_api::CoreError;

/// A code-unit table supplied at runtime, used for the Japanese and Korean
/// encodings whose glyph sets are data rather than logic.
///
/// Codes whose high byte is listed in `lead_bytes` are read as two bytes;
/// this is how the Korean generation 2 encoding mixes single-byte Western
/// glyphs with double-byte Hangul.
#[derive(Debug, Clone, Default)]
pub struct CharTable {
    to_char: HashMap<u16, char>,
    to_code: HashMap<char, u16>,
    lead_bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct CharTableFile {
    #[serde(default)]
    lead_bytes: Vec<u8>,
    chars: HashMap<String, String>,
}

impl CharTable {
    pub fn from_pairs<I>(pairs: I, lead_bytes: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (u16, char)>,
    {
        let mut table = Self {
            lead_bytes,
            ..Self::default()
        };
        for (code, c) in pairs {
            table.to_char.insert(code, c);
            table.to_code.entry(c).or_insert(code);
        }
        table
    }

    /// Parses `{"lead_bytes": [..], "chars": {"00A1": "あ", ..}}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CoreError> {
        let file: CharTableFile = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::resource(format!("invalid character table: {e}")))?;
        let mut pairs = Vec::with_capacity(file.chars.len());
        for (code, glyph) in file.chars {
            let code = u16::from_str_radix(&code, 16)
                .map_err(|e| CoreError::resource(format!("bad code {code:?}: {e}")))?;
            let mut glyphs = glyph.chars();
            match (glyphs.next(), glyphs.next()) {
                (Some(c), None) => pairs.push((code, c)),
                _ => {
                    return Err(CoreError::resource(format!(
                        "code {code:04X} must map to exactly one character"
                    )));
                }
            }
        }
        Ok(Self::from_pairs(pairs, file.lead_bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.to_char.is_empty()
    }

    pub fn char_for(&self, code: u16) -> Option<char> {
        self.to_char.get(&code).copied()
    }

    pub fn code_for(&self, c: char) -> Option<u16> {
        self.to_code.get(&c).copied()
    }

    /// Decodes single- or double-byte codes until `terminator`.
    pub fn decode_bytes(&self, bytes: &[u8], terminator: u8) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == terminator {
                break;
            }
            let code = if self.lead_bytes.contains(&b) && i + 1 < bytes.len() {
                i += 1;
                (u16::from(b) << 8) | u16::from(bytes[i])
            } else {
                u16::from(b)
            };
            match self.char_for(code) {
                Some(c) => out.push(c),
                None => break,
            }
            i += 1;
        }
        out
    }

    /// Encodes into `dest`, writing `terminator` if room remains and padding
    /// with `filler`. Characters with no code, and double-byte codes that do
    /// not fit, end the string.
    pub fn encode_bytes(&self, dest: &mut [u8], s: &str, terminator: u8, filler: u8) {
        dest.fill(filler);
        let mut pos = 0;
        for c in s.chars() {
            let Some(code) = self.code_for(c) else {
                break;
            };
            let width = if code > 0xFF { 2 } else { 1 };
            if pos + width > dest.len().saturating_sub(1) {
                break;
            }
            if width == 2 {
                dest[pos] = (code >> 8) as u8;
                pos += 1;
            }
            dest[pos] = code as u8;
            pos += 1;
        }
        if pos < dest.len() {
            dest[pos] = terminator;
        }
    }

    /// Decodes 16-bit little-endian codes until `terminator`.
    pub fn decode_u16(&self, bytes: &[u8], terminator: u16) -> String {
        let mut out = String::new();
        for unit in bytes.chunks_exact(2) {
            let code = u16::from_le_bytes([unit[0], unit[1]]);
            if code == terminator {
                break;
            }
            match self.char_for(code) {
                Some(c) => out.push(c),
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_width_decoding() {
        let table =
            CharTable::from_pairs([(0x80, 'A'), (0x0123, '가'), (0x0124, '나')], vec![0x01]);
        let bytes = [0x80, 0x01, 0x23, 0x01, 0x24, 0x50, 0x80];
        assert_eq!(table.decode_bytes(&bytes, 0x50), "A가나");

        let mut dest = [0u8; 6];
        table.encode_bytes(&mut dest, "A가나", 0x50, 0x50);
        assert_eq!(dest, [0x80, 0x01, 0x23, 0x01, 0x24, 0x50]);

        let mut short = [0u8; 5];
        table.encode_bytes(&mut short, "A가나", 0x50, 0x50);
        assert_eq!(short, [0x80, 0x01, 0x23, 0x50, 0x50]);
    }

    #[test]
    fn parses_json_tables() {
        let json = r#"{"chars": {"0001": "あ", "0002": "い"}}"#.as_bytes();
        let table = CharTable::from_json(json).expect("valid table");
        assert_eq!(table.decode_u16(&[1, 0, 2, 0, 0xFF, 0xFF], 0xFFFF), "あい");
        assert!(CharTable::from_json(br#"{"chars": {"zz": "a"}}"#).is_err());
    }
}
