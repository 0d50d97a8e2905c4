//! Per-generation character encodings.
//!
//! Decoders stop at the terminator or at the first code with no table entry;
//! an unknown code is treated as the end of the string, never as an error.
//! Encoders truncate to the field and pad the remainder with the format's
//! filler.

pub mod g12;
pub mod g3;
pub mod g4;
pub mod table;
pub mod utf16;

pub use table::CharTable;

/// Stands in for the "current trade partner" marker used as an OT name in
/// the Game Boy games.
pub const TRADE_OT: char = '\u{E0FF}';

/// Removes the trade placeholder from decoded text.
pub fn strip_trade_ot(s: &str) -> String {
    s.chars().filter(|&c| c != TRADE_OT).collect()
}

const SWAP_45: [(char, char); 5] = [
    ('\u{2642}', '\u{246D}'),
    ('\u{2640}', '\u{246E}'),
    ('\u{00D7}', '\u{2467}'),
    ('\u{00F7}', '\u{2468}'),
    ('\u{2026}', '\u{246C}'),
];

const SWAP_67: [(char, char); 4] = [
    ('\u{2642}', '\u{E08E}'),
    ('\u{2640}', '\u{E08F}'),
    ('\u{2605}', '\u{E090}'),
    ('\u{2606}', '\u{E091}'),
];

fn swap(pairs: &[(char, char)], c: char) -> char {
    for &(a, b) in pairs {
        if c == a {
            return b;
        }
        if c == b {
            return a;
        }
    }
    c
}

/// Exchanges the symbols whose code points differ between the generation 4
/// font and the generation 5 font. Applying it twice is the identity.
pub fn swap45_char(c: char) -> char {
    swap(&SWAP_45, c)
}

/// Same as [`swap45_char`] for the 3DS private-use glyphs.
pub fn swap67_char(c: char) -> char {
    swap(&SWAP_67, c)
}

pub fn swap45(s: &str) -> String {
    s.chars().map(swap45_char).collect()
}

pub fn swap67(s: &str) -> String {
    s.chars().map(swap67_char).collect()
}

/// Half-width ASCII to the full-width forms used by Japanese games.
pub fn to_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

pub fn to_halfwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_are_involutions() {
        for &(a, b) in SWAP_45.iter().chain(SWAP_67.iter()) {
            for c in [a, b] {
                assert_eq!(swap45_char(swap45_char(c)), c);
                assert_eq!(swap67_char(swap67_char(c)), c);
            }
        }
        assert_eq!(swap45_char('\u{2642}'), '\u{246D}');
        assert_eq!(swap67_char('\u{E08F}'), '\u{2640}');
        assert_eq!(swap45_char('A'), 'A');
    }

    #[test]
    fn full_width_round_trip() {
        let wide = to_fullwidth("AB 12!");
        assert_eq!(wide, "ＡＢ\u{3000}１２！");
        assert_eq!(to_halfwidth(&wide), "AB 12!");
    }
}
