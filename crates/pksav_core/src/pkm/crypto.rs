//! Record ciphers and block shuffling shared by the generation 3+ formats.

use crate::endian::{set_u16_le, set_u32_le, u16_le, u32_le};

/// For shuffle value `sv`, entries `4 * sv .. 4 * sv + 4` name the stored
/// block that holds logical block 0, 1, 2 and 3.
pub const BLOCK_POSITION: [u8; 96] = [
    0, 1, 2, 3, 0, 1, 3, 2, 0, 2, 1, 3, 0, 3, 1, 2, 0, 2, 3, 1, 0, 3, 2, 1, 1, 0, 2, 3, 1, 0, 3, 2,
    2, 0, 1, 3, 3, 0, 1, 2, 2, 0, 3, 1, 3, 0, 2, 1, 1, 2, 0, 3, 1, 3, 0, 2, 2, 1, 0, 3, 3, 1, 0, 2,
    2, 3, 0, 1, 3, 2, 0, 1, 1, 2, 3, 0, 1, 3, 2, 0, 2, 1, 3, 0, 3, 1, 2, 0, 2, 3, 1, 0, 3, 2, 1, 0,
];

/// Shuffle value that undoes the permutation selected by the index.
pub const BLOCK_POSITION_INVERT: [u8; 24] = [
    0, 1, 2, 4, 3, 5, 6, 7, 12, 18, 13, 19, 8, 10, 14, 20, 16, 22, 9, 11, 15, 21, 17, 23,
];

pub const LCG_MULT: u32 = 0x41C6_4E6D;
pub const LCG_ADD: u32 = 0x6073;

pub fn lcg_next(seed: u32) -> u32 {
    seed.wrapping_mul(LCG_MULT).wrapping_add(LCG_ADD)
}

/// Rearranges the four `block_size` blocks starting at `start` so that
/// block `i` becomes the stored block `BLOCK_POSITION[4 * sv + i]`.
pub fn shuffle(data: &mut [u8], start: usize, sv: usize, block_size: usize) {
    let sv = sv % 24;
    let end = start + 4 * block_size;
    let original = data[start..end].to_vec();
    for block in 0..4 {
        let from = usize::from(BLOCK_POSITION[sv * 4 + block]) * block_size;
        let to = start + block * block_size;
        data[to..to + block_size].copy_from_slice(&original[from..from + block_size]);
    }
}

/// Undoes [`shuffle`] for the same `sv`.
pub fn unshuffle_inverse(data: &mut [u8], start: usize, sv: usize, block_size: usize) {
    shuffle(
        data,
        start,
        usize::from(BLOCK_POSITION_INVERT[sv % 24]),
        block_size,
    )
}

/// XORs every 16-bit word of `data[start..end]` with the high half of the
/// advancing LCG seeded by `seed`. Applying it twice restores the input.
pub fn lcg_crypt(data: &mut [u8], start: usize, end: usize, seed: u32) {
    let mut seed = seed;
    let mut offset = start;
    while offset + 2 <= end {
        seed = lcg_next(seed);
        let word = u16_le(data, offset) ^ (seed >> 16) as u16;
        set_u16_le(data, offset, word);
        offset += 2;
    }
}

/// Generation 3 XOR over 32-bit words with a constant key.
pub fn xor_words(data: &mut [u8], start: usize, end: usize, key: u32) {
    let mut offset = start;
    while offset + 4 <= end {
        let word = u32_le(data, offset) ^ key;
        set_u32_le(data, offset, word);
        offset += 4;
    }
}

/// 16-bit rolling sum of little-endian words in `data[start..end]`.
pub fn sum16(data: &[u8], start: usize, end: usize) -> u16 {
    data[start..end]
        .chunks_exact(2)
        .fold(0u16, |acc, w| acc.wrapping_add(u16::from_le_bytes([w[0], w[1]])))
}

/// Boundaries of one LCG-encrypted format.
#[derive(Debug, Clone, Copy)]
pub struct LcgLayout {
    pub block_size: usize,
    pub box_len: usize,
    pub party_len: usize,
    /// Shuffle value from the seed word (PID or encryption constant).
    pub shuffle_of: fn(u32) -> usize,
    /// Whether the box region is seeded by the checksum (gen 4/5) rather
    /// than by the encryption constant (gen 6+).
    pub seed_with_checksum: bool,
}

pub const DATA_START: usize = 8;

impl LcgLayout {
    fn box_seed(&self, data: &[u8]) -> u32 {
        if self.seed_with_checksum {
            u32::from(u16_le(data, 6))
        } else {
            u32_le(data, 0)
        }
    }

    pub fn decrypt(&self, data: &mut [u8]) {
        let key = u32_le(data, 0);
        let sv = (self.shuffle_of)(key);
        let seed = self.box_seed(data);
        lcg_crypt(data, DATA_START, self.box_len, seed);
        shuffle(data, DATA_START, sv, self.block_size);
        if data.len() >= self.party_len && self.party_len > self.box_len {
            lcg_crypt(data, self.box_len, self.party_len, key);
        }
    }

    pub fn encrypt(&self, data: &mut [u8]) {
        let key = u32_le(data, 0);
        let sv = (self.shuffle_of)(key);
        unshuffle_inverse(data, DATA_START, sv, self.block_size);
        let seed = self.box_seed(data);
        lcg_crypt(data, DATA_START, self.box_len, seed);
        if data.len() >= self.party_len && self.party_len > self.box_len {
            lcg_crypt(data, self.box_len, self.party_len, key);
        }
    }
}

pub fn shuffle_45(pid: u32) -> usize {
    (((pid & 0x3E000) >> 0xD) % 24) as usize
}

pub fn shuffle_6plus(ec: u32) -> usize {
    (((ec >> 0xD) & 0x1F) % 24) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_table_undoes_every_permutation() {
        for sv in 0..24 {
            let mut data: Vec<u8> = (0..16).collect();
            shuffle(&mut data, 0, sv, 4);
            unshuffle_inverse(&mut data, 0, sv, 4);
            assert_eq!(data, (0..16).collect::<Vec<u8>>(), "sv {sv}");
        }
    }

    #[test]
    fn lcg_stream_is_an_involution() {
        let mut data: Vec<u8> = (0..64).collect();
        lcg_crypt(&mut data, 8, 64, 0xDEAD_BEEF);
        assert_ne!(data, (0..64).collect::<Vec<u8>>());
        lcg_crypt(&mut data, 8, 64, 0xDEAD_BEEF);
        assert_eq!(data, (0..64).collect::<Vec<u8>>());
    }

    #[test]
    fn first_lcg_word_matches_known_value() {
        assert_eq!(lcg_next(0), 0x6073);
        assert_eq!(lcg_next(1), 0x41C6_AEE0);
    }
}
