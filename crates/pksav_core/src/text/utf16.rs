//! UTF-16LE strings used from generation 5 on. Generation 5 terminates with
//! 0xFFFF, later generations with 0x0000.

use crate::generation::Generation;

pub fn terminator(generation: Generation) -> u16 {
    if generation <= Generation::Five {
        0xFFFF
    } else {
        0x0000
    }
}

pub fn decode(bytes: &[u8], terminator: u16) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|u| u16::from_le_bytes([u[0], u[1]]))
        .take_while(|&u| u != terminator);
    char::decode_utf16(units).map_while(Result::ok).collect()
}

/// Always leaves room for the terminator.
pub fn encode(dest: &mut [u8], s: &str, terminator: u16) {
    dest.fill(0);
    let capacity = dest.len() / 2;
    let room = capacity.saturating_sub(1);
    let mut pos = 0;
    for c in s.chars() {
        let mut buf = [0u16; 2];
        let encoded = c.encode_utf16(&mut buf);
        if pos + encoded.len() > room {
            break;
        }
        for unit in encoded.iter() {
            dest[pos * 2..pos * 2 + 2].copy_from_slice(&unit.to_le_bytes());
            pos += 1;
        }
    }
    if pos < capacity {
        dest[pos * 2..pos * 2 + 2].copy_from_slice(&terminator.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_five_uses_ffff() {
        let mut field = [0u8; 8];
        encode(&mut field, "Zoé", terminator(Generation::Five));
        assert_eq!(&field[6..8], &[0xFF, 0xFF]);
        assert_eq!(decode(&field, 0xFFFF), "Zoé");
    }

    #[test]
    fn truncates_to_field() {
        let mut field = [0u8; 6];
        encode(&mut field, "Pikachu", 0);
        assert_eq!(decode(&field, 0), "Pi");
    }
}
