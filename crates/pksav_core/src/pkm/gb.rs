//! Determinant values and stat experience shared by the Game Boy records.

use crate::endian::{set_u16_be, u16_be};
use crate::stats::Stat;

/// Stat experience slot: HP, Atk, Def, Spe, then one Special for both.
pub(crate) fn stat_exp_index(stat: Stat) -> usize {
    match stat {
        Stat::Hp => 0,
        Stat::Atk => 1,
        Stat::Def => 2,
        Stat::Spe => 3,
        Stat::SpA | Stat::SpD => 4,
    }
}

/// Reads one DV from the big-endian word at `offset`. HP has no storage of
/// its own and is assembled from the low bit of the other four.
pub(crate) fn dv(data: &[u8], offset: usize, stat: Stat) -> u8 {
    let word = u16_be(data, offset);
    let nibble = |shift: u16| ((word >> shift) & 0xF) as u8;
    match stat {
        Stat::Atk => nibble(12),
        Stat::Def => nibble(8),
        Stat::Spe => nibble(4),
        Stat::SpA | Stat::SpD => nibble(0),
        Stat::Hp => {
            (nibble(12) & 1) << 3 | (nibble(8) & 1) << 2 | (nibble(4) & 1) << 1 | nibble(0) & 1
        }
    }
}

pub(crate) fn set_dv(data: &mut [u8], offset: usize, stat: Stat, value: u8) {
    let value = u16::from(value.min(15));
    let word = u16_be(data, offset);
    let put = |word: u16, shift: u16, v: u16| word & !(0xF << shift) | v << shift;
    let word = match stat {
        Stat::Atk => put(word, 12, value),
        Stat::Def => put(word, 8, value),
        Stat::Spe => put(word, 4, value),
        Stat::SpA | Stat::SpD => put(word, 0, value),
        Stat::Hp => {
            let mut w = word;
            for (bit, shift) in [(3, 12), (2, 8), (1, 4), (0, 0)] {
                w = w & !(1 << shift) | (value >> bit & 1) << shift;
            }
            w
        }
    };
    set_u16_be(data, offset, word);
}

const SHINY_ATTACK: [u8; 8] = [2, 3, 6, 7, 10, 11, 14, 15];

pub(crate) fn is_shiny(data: &[u8], offset: usize) -> bool {
    dv(data, offset, Stat::Def) == 10
        && dv(data, offset, Stat::Spe) == 10
        && dv(data, offset, Stat::SpA) == 10
        && SHINY_ATTACK.contains(&dv(data, offset, Stat::Atk))
}

pub(crate) fn set_shiny(data: &mut [u8], offset: usize, shiny: bool) {
    if shiny == is_shiny(data, offset) {
        return;
    }
    if shiny {
        set_dv(data, offset, Stat::Def, 10);
        set_dv(data, offset, Stat::Spe, 10);
        set_dv(data, offset, Stat::SpA, 10);
        if !SHINY_ATTACK.contains(&dv(data, offset, Stat::Atk)) {
            set_dv(data, offset, Stat::Atk, 10);
        }
    } else {
        set_dv(data, offset, Stat::Def, 11);
    }
}

/// Hidden Power type index from the Atk and Def DVs.
pub(crate) fn hp_type(data: &[u8], offset: usize) -> u8 {
    (dv(data, offset, Stat::Atk) & 3) << 2 | dv(data, offset, Stat::Def) & 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_dv_is_assembled_from_low_bits() {
        let mut data = [0u8; 2];
        set_dv(&mut data, 0, Stat::Atk, 15);
        set_dv(&mut data, 0, Stat::SpA, 1);
        assert_eq!(data, [0xF0, 0x01]);
        assert_eq!(dv(&data, 0, Stat::Hp), 0b1001);
        set_dv(&mut data, 0, Stat::Hp, 0b0110);
        assert_eq!(dv(&data, 0, Stat::Atk), 14);
        assert_eq!(dv(&data, 0, Stat::Def), 1);
        assert_eq!(dv(&data, 0, Stat::Spe), 1);
        assert_eq!(dv(&data, 0, Stat::SpD), 0);
    }

    #[test]
    fn shiny_dvs() {
        let mut data = [0u8; 2];
        set_shiny(&mut data, 0, true);
        assert_eq!(data, [0xAA, 0xAA]);
        assert!(is_shiny(&data, 0));
        set_shiny(&mut data, 0, false);
        assert!(!is_shiny(&data, 0));
    }
}
