//! Generation 4 16-bit character set (Western glyphs). Japanese and Korean
//! glyphs come from a [`CharTable`] loaded at runtime.

use super::CharTable;

pub const TERMINATOR: u16 = 0xFFFF;
pub const NEWLINE: u16 = 0xE000;

const PUNCTUATION: [(u16, char); 36] = [
    (0x019F, 'Œ'),
    (0x01A0, 'œ'),
    (0x01A1, 'Ş'),
    (0x01A2, 'ş'),
    (0x01A3, 'ª'),
    (0x01A4, 'º'),
    (0x01A9, '¡'),
    (0x01AA, '¿'),
    (0x01AB, '!'),
    (0x01AC, '?'),
    (0x01AD, ','),
    (0x01AE, '.'),
    (0x01AF, '…'),
    (0x01B0, '·'),
    (0x01B1, '/'),
    (0x01B2, '‘'),
    (0x01B3, '’'),
    (0x01B4, '“'),
    (0x01B5, '”'),
    (0x01B6, '„'),
    (0x01B7, '«'),
    (0x01B8, '»'),
    (0x01B9, '('),
    (0x01BA, ')'),
    (0x01BB, '♂'),
    (0x01BC, '♀'),
    (0x01BD, '+'),
    (0x01BE, '-'),
    (0x01BF, '*'),
    (0x01C0, '#'),
    (0x01C1, '='),
    (0x01C2, '&'),
    (0x01C3, '~'),
    (0x01C4, ':'),
    (0x01C5, ';'),
    (0x01DE, ' '),
];

pub fn char_for(code: u16) -> Option<char> {
    let offset = |base: u16, start: u32| char::from_u32(start + u32::from(code - base));
    match code {
        0x0121..=0x012A => offset(0x0121, '0' as u32),
        0x012B..=0x0144 => offset(0x012B, 'A' as u32),
        0x0145..=0x015E => offset(0x0145, 'a' as u32),
        0x015F..=0x019E => offset(0x015F, 0xC0),
        NEWLINE => Some('\n'),
        _ => PUNCTUATION
            .iter()
            .find(|(b, _)| *b == code)
            .map(|&(_, c)| c),
    }
}

pub fn code_for(c: char) -> Option<u16> {
    let cp = c as u32;
    match c {
        '0'..='9' => Some(0x0121 + (cp - '0' as u32) as u16),
        'A'..='Z' => Some(0x012B + (cp - 'A' as u32) as u16),
        'a'..='z' => Some(0x0145 + (cp - 'a' as u32) as u16),
        '\u{C0}'..='\u{FF}' => Some(0x015F + (cp - 0xC0) as u16),
        '\n' => Some(NEWLINE),
        _ => PUNCTUATION
            .iter()
            .find(|(_, g)| *g == c)
            .map(|&(b, _)| b),
    }
}

fn units(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(2)
        .map(|u| u16::from_le_bytes([u[0], u[1]]))
}

pub fn decode(bytes: &[u8]) -> String {
    units(bytes)
        .take_while(|&u| u != TERMINATOR)
        .map_while(char_for)
        .collect()
}

/// Like [`decode`] but consults `table` before the built-in glyphs.
pub fn decode_with(table: &CharTable, bytes: &[u8]) -> String {
    units(bytes)
        .take_while(|&u| u != TERMINATOR)
        .map_while(|u| table.char_for(u).or_else(|| char_for(u)))
        .collect()
}

fn encode_units<F>(dest: &mut [u8], s: &str, lookup: F)
where
    F: Fn(char) -> Option<u16>,
{
    dest.fill(0);
    let capacity = dest.len() / 2;
    let room = capacity.saturating_sub(1);
    let mut pos = 0;
    for c in s.chars().take(room) {
        let Some(code) = lookup(c) else {
            break;
        };
        dest[pos * 2..pos * 2 + 2].copy_from_slice(&code.to_le_bytes());
        pos += 1;
    }
    if pos < capacity {
        dest[pos * 2..pos * 2 + 2].copy_from_slice(&TERMINATOR.to_le_bytes());
    }
}

pub fn encode(dest: &mut [u8], s: &str) {
    encode_units(dest, s, code_for)
}

pub fn encode_with(table: &CharTable, dest: &mut [u8], s: &str) {
    encode_units(dest, s, |c| table.code_for(c).or_else(|| code_for(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_and_accents_round_trip() {
        let mut field = [0u8; 22];
        encode(&mut field, "Évoli ♀!");
        assert_eq!(decode(&field), "Évoli ♀!");
        assert_eq!(u16::from_le_bytes([field[0], field[1]]), 0x0168);
    }

    #[test]
    fn terminator_is_mandatory() {
        let mut field = [0u8; 8];
        encode(&mut field, "ABCDE");
        assert_eq!(decode(&field), "ABC");
        assert_eq!(u16::from_le_bytes([field[6], field[7]]), TERMINATOR);
    }
}
