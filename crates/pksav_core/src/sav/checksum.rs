//! Checksums used by the save containers.

use crate::endian::u32_le;

/// CRC-16/CCITT-FALSE (polynomial 0x1021, initial 0xFFFF, no reflection).
/// Generations 4 to 6.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in data {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                crc << 1 ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Reflected CRC-16 (polynomial 0xA001) with inverted input and output.
/// Generation 7.
pub fn crc16_invert(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in data {
        crc ^= u16::from(b);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { crc >> 1 ^ 0xA001 } else { crc >> 1 };
        }
    }
    !crc
}

/// Generation 3 sector checksum: 32-bit word sum folded to 16 bits.
pub fn sector_sum(data: &[u8]) -> u16 {
    let sum = data
        .chunks_exact(4)
        .enumerate()
        .fold(0u32, |acc, (i, _)| acc.wrapping_add(u32_le(data, i * 4)));
    ((sum >> 16) as u16).wrapping_add(sum as u16)
}

/// Generation 1: one's complement of the 8-bit byte sum.
pub fn gb_sum8(data: &[u8]) -> u8 {
    !data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Generation 2: 16-bit byte sum.
pub fn gb_sum16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccitt_check_value() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn inverted_crc_check_value() {
        // CRC-16/MODBUS of the check string is 0x4B37.
        assert_eq!(crc16_invert(b"123456789"), !0x4B37);
    }

    #[test]
    fn sector_sum_folds_halves() {
        let data = [0xFF, 0xFF, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00];
        // 0x0001FFFF + 1 = 0x00020000 -> 0x0002 + 0x0000
        assert_eq!(sector_sum(&data), 2);
    }

    #[test]
    fn game_boy_sums() {
        assert_eq!(gb_sum8(&[1, 2, 3]), !6);
        assert_eq!(gb_sum16(&[0xFF; 3]), 0x2FD);
    }
}
