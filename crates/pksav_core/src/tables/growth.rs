//! Experience curves. Each growth rate maps level 1..=100 to the minimum
//! experience required to reach it.

use serde::{Deserialize, Serialize};

pub const MAX_LEVEL: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthRate {
    MediumFast,
    Erratic,
    Fluctuating,
    MediumSlow,
    Fast,
    Slow,
}

impl GrowthRate {
    /// Personal-table encoding. Out-of-range values fall back to medium fast.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Erratic,
            2 => Self::Fluctuating,
            3 => Self::MediumSlow,
            4 => Self::Fast,
            5 => Self::Slow,
            _ => Self::MediumFast,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

const fn curve(rate: usize, n: i64) -> u32 {
    if n <= 1 {
        return 0;
    }
    let cube = n * n * n;
    let value = match rate {
        1 => {
            if n <= 50 {
                cube * (100 - n) / 50
            } else if n <= 68 {
                cube * (150 - n) / 100
            } else if n <= 98 {
                cube * ((1911 - 10 * n) / 3) / 500
            } else {
                cube * (160 - n) / 100
            }
        }
        2 => {
            if n <= 15 {
                cube * ((n + 1) / 3 + 24) / 50
            } else if n <= 36 {
                cube * (n + 14) / 50
            } else {
                cube * (n / 2 + 32) / 50
            }
        }
        3 => 6 * cube / 5 - 15 * n * n + 100 * n - 140,
        4 => 4 * cube / 5,
        5 => 5 * cube / 4,
        _ => cube,
    };
    value as u32
}

const fn build() -> [[u32; MAX_LEVEL as usize]; 6] {
    let mut table = [[0u32; MAX_LEVEL as usize]; 6];
    let mut rate = 0;
    while rate < 6 {
        let mut level = 1;
        while level <= MAX_LEVEL as usize {
            table[rate][level - 1] = curve(rate, level as i64);
            level += 1;
        }
        rate += 1;
    }
    table
}

static EXP_TABLE: [[u32; MAX_LEVEL as usize]; 6] = build();

/// Minimum experience for `level`, clamped to 1..=100.
pub fn exp_for_level(rate: GrowthRate, level: u8) -> u32 {
    let level = level.clamp(1, MAX_LEVEL);
    EXP_TABLE[rate as usize][usize::from(level - 1)]
}

/// Highest level whose threshold `exp` reaches.
pub fn level_for_exp(rate: GrowthRate, exp: u32) -> u8 {
    let curve = &EXP_TABLE[rate as usize];
    let mut level = 1u8;
    while usize::from(level) < curve.len() && exp >= curve[usize::from(level)] {
        level += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_endpoints() {
        assert_eq!(exp_for_level(GrowthRate::MediumFast, 100), 1_000_000);
        assert_eq!(exp_for_level(GrowthRate::Erratic, 100), 600_000);
        assert_eq!(exp_for_level(GrowthRate::Fluctuating, 100), 1_640_000);
        assert_eq!(exp_for_level(GrowthRate::MediumSlow, 100), 1_059_860);
        assert_eq!(exp_for_level(GrowthRate::Fast, 100), 800_000);
        assert_eq!(exp_for_level(GrowthRate::Slow, 100), 1_250_000);
    }

    #[test]
    fn medium_slow_starts_at_zero() {
        assert_eq!(exp_for_level(GrowthRate::MediumSlow, 1), 0);
        assert_eq!(exp_for_level(GrowthRate::MediumSlow, 2), 9);
        assert_eq!(exp_for_level(GrowthRate::MediumSlow, 3), 57);
    }

    #[test]
    fn level_search_is_inverse_of_threshold() {
        for rate in 0..6 {
            let rate = GrowthRate::from_raw(rate);
            for level in 1..=100u8 {
                let exp = exp_for_level(rate, level);
                assert_eq!(level_for_exp(rate, exp), level);
                if level > 1 {
                    assert_eq!(level_for_exp(rate, exp - 1), level - 1);
                }
            }
        }
        assert_eq!(level_for_exp(GrowthRate::Fast, u32::MAX), 100);
    }
}
