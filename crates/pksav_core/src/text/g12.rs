//! Game Boy character set shared by generations 1 and 2.

use super::{CharTable, TRADE_OT};

pub const TERMINATOR: u8 = 0x50;
pub const TRADE_OT_BYTE: u8 = 0x5D;

const PUNCTUATION: [(u8, char); 22] = [
    (0x7F, ' '),
    (0x9A, '('),
    (0x9B, ')'),
    (0x9C, ':'),
    (0x9D, ';'),
    (0x9E, '['),
    (0x9F, ']'),
    (0xBA, 'é'),
    (0xC0, 'Ä'),
    (0xC1, 'Ö'),
    (0xC2, 'Ü'),
    (0xC3, 'ä'),
    (0xC4, 'ö'),
    (0xC5, 'ü'),
    (0xE0, '\''),
    (0xE3, '-'),
    (0xE6, '?'),
    (0xE7, '!'),
    (0xE8, '.'),
    (0xEF, '♂'),
    (0xF3, '/'),
    (0xF4, ','),
];

pub fn char_for(code: u8) -> Option<char> {
    match code {
        0x80..=0x99 => Some(char::from(b'A' + (code - 0x80))),
        0xA0..=0xB9 => Some(char::from(b'a' + (code - 0xA0))),
        0xF6..=0xFF => Some(char::from(b'0' + (code - 0xF6))),
        0xF1 => Some('×'),
        0xF5 => Some('♀'),
        _ => PUNCTUATION
            .iter()
            .find(|(b, _)| *b == code)
            .map(|&(_, c)| c),
    }
}

pub fn code_for(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(0x80 + (c as u8 - b'A')),
        'a'..='z' => Some(0xA0 + (c as u8 - b'a')),
        '0'..='9' => Some(0xF6 + (c as u8 - b'0')),
        '×' => Some(0xF1),
        '♀' => Some(0xF5),
        _ => PUNCTUATION
            .iter()
            .find(|(_, g)| *g == c)
            .map(|&(b, _)| b),
    }
}

/// Decodes the international table.
pub fn decode(bytes: &[u8]) -> String {
    let mut out = String::new();
    for &b in bytes {
        if b == TERMINATOR {
            break;
        }
        if b == TRADE_OT_BYTE {
            out.push(TRADE_OT);
            continue;
        }
        match char_for(b) {
            Some(c) => out.push(c),
            None => break,
        }
    }
    out
}

/// Encodes into a fixed field; at most `dest.len() - 1` glyphs fit because
/// the terminator is mandatory.
pub fn encode(dest: &mut [u8], s: &str) {
    dest.fill(TERMINATOR);
    let room = dest.len().saturating_sub(1);
    let mut pos = 0;
    for c in s.chars() {
        if pos >= room {
            break;
        }
        let code = if c == TRADE_OT {
            TRADE_OT_BYTE
        } else {
            match code_for(c) {
                Some(code) => code,
                None => break,
            }
        };
        dest[pos] = code;
        pos += 1;
    }
}

/// Decodes using a runtime table (Japanese kana, Korean Hangul).
pub fn decode_with(table: &CharTable, bytes: &[u8]) -> String {
    if bytes.first() == Some(&TRADE_OT_BYTE) {
        return TRADE_OT.to_string();
    }
    table.decode_bytes(bytes, TERMINATOR)
}

pub fn encode_with(table: &CharTable, dest: &mut [u8], s: &str) {
    if s.starts_with(TRADE_OT) {
        dest.fill(TERMINATOR);
        if let Some(first) = dest.first_mut() {
            *first = TRADE_OT_BYTE;
        }
        return;
    }
    table.encode_bytes(dest, s, TERMINATOR, TERMINATOR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_until_terminator() {
        let bytes = [0x81, 0x8B, 0x94, 0x84, 0x50, 0x80];
        assert_eq!(decode(&bytes), "BLUE");
        assert_eq!(decode(&[0xF6, 0xFF, 0xEF, 0xF5]), "09♂♀");
    }

    #[test]
    fn unmapped_byte_ends_the_string() {
        assert_eq!(decode(&[0x80, 0x01, 0x81]), "A");
    }

    #[test]
    fn encode_truncates_and_terminates() {
        let mut field = [0u8; 6];
        encode(&mut field, "PIKACHU");
        assert_eq!(decode(&field), "PIKAC");
        assert_eq!(field[5], TERMINATOR);
    }

    #[test]
    fn trade_placeholder_round_trips() {
        let mut field = [0u8; 11];
        encode(&mut field, &TRADE_OT.to_string());
        assert_eq!(field[0], TRADE_OT_BYTE);
        assert_eq!(decode(&field), TRADE_OT.to_string());
        assert_eq!(super::super::strip_trade_ot(&decode(&field)), "");
    }
}
