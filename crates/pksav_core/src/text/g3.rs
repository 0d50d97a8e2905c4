//! Generation 3 international character set.

pub const TERMINATOR: u8 = 0xFF;

const GLYPHS: [(u8, char); 76] = [
    (0x00, ' '),
    (0x01, 'À'),
    (0x02, 'Á'),
    (0x03, 'Â'),
    (0x04, 'Ç'),
    (0x05, 'È'),
    (0x06, 'É'),
    (0x07, 'Ê'),
    (0x08, 'Ë'),
    (0x09, 'Ì'),
    (0x0B, 'Î'),
    (0x0C, 'Ï'),
    (0x0D, 'Ò'),
    (0x0E, 'Ó'),
    (0x0F, 'Ô'),
    (0x10, 'Œ'),
    (0x11, 'Ù'),
    (0x12, 'Ú'),
    (0x13, 'Û'),
    (0x14, 'Ñ'),
    (0x15, 'ß'),
    (0x16, 'à'),
    (0x17, 'á'),
    (0x19, 'ç'),
    (0x1A, 'è'),
    (0x1B, 'é'),
    (0x1C, 'ê'),
    (0x1D, 'ë'),
    (0x1E, 'ì'),
    (0x20, 'î'),
    (0x21, 'ï'),
    (0x22, 'ò'),
    (0x23, 'ó'),
    (0x24, 'ô'),
    (0x25, 'œ'),
    (0x26, 'ù'),
    (0x27, 'ú'),
    (0x28, 'û'),
    (0x29, 'ñ'),
    (0x2A, 'º'),
    (0x2B, 'ª'),
    (0x2D, '&'),
    (0x2E, '+'),
    (0x35, '='),
    (0x36, ';'),
    (0x51, '¿'),
    (0x52, '¡'),
    (0x5A, 'Í'),
    (0x5B, '%'),
    (0x5C, '('),
    (0x5D, ')'),
    (0x68, 'â'),
    (0x6F, 'í'),
    (0xAB, '!'),
    (0xAC, '?'),
    (0xAD, '.'),
    (0xAE, '-'),
    (0xAF, '·'),
    (0xB0, '…'),
    (0xB1, '“'),
    (0xB2, '”'),
    (0xB3, '‘'),
    (0xB4, '’'),
    (0xB5, '♂'),
    (0xB6, '♀'),
    (0xB8, ','),
    (0xB9, '×'),
    (0xBA, '/'),
    (0xEF, '►'),
    (0xF0, ':'),
    (0xF1, 'Ä'),
    (0xF2, 'Ö'),
    (0xF3, 'Ü'),
    (0xF4, 'ä'),
    (0xF5, 'ö'),
    (0xF6, 'ü'),
];

pub fn char_for(code: u8) -> Option<char> {
    match code {
        0xA1..=0xAA => Some(char::from(b'0' + (code - 0xA1))),
        0xBB..=0xD4 => Some(char::from(b'A' + (code - 0xBB))),
        0xD5..=0xEE => Some(char::from(b'a' + (code - 0xD5))),
        _ => GLYPHS.iter().find(|(b, _)| *b == code).map(|&(_, c)| c),
    }
}

pub fn code_for(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(0xA1 + (c as u8 - b'0')),
        'A'..='Z' => Some(0xBB + (c as u8 - b'A')),
        'a'..='z' => Some(0xD5 + (c as u8 - b'a')),
        _ => GLYPHS.iter().find(|(_, g)| *g == c).map(|&(b, _)| b),
    }
}

pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != TERMINATOR)
        .map_while(|&b| char_for(b))
        .collect()
}

/// Names that fill the field exactly carry no terminator.
pub fn encode(dest: &mut [u8], s: &str) {
    dest.fill(TERMINATOR);
    for (slot, c) in dest.iter_mut().zip(s.chars()) {
        match code_for(c) {
            Some(code) => *slot = code,
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_letters_and_symbols() {
        let bytes = [0xC7, 0xD5, 0xE1, 0xE7, 0xB5, 0xFF, 0xC7];
        assert_eq!(decode(&bytes), "Mams♂");
    }

    #[test]
    fn full_field_has_no_terminator() {
        let mut field = [0u8; 7];
        encode(&mut field, "MAXIMUM");
        assert!(!field.contains(&TERMINATOR));
        assert_eq!(decode(&field), "MAXIMUM");
        encode(&mut field, "LONGERNAME");
        assert_eq!(decode(&field), "LONGERN");
    }
}
