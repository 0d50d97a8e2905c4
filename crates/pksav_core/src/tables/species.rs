//! Species index translation for the formats whose on-disk ordering is not
//! the national dex order. Generation 2 already stores national numbers.

/// Generation 1 internal species index to national dex number.
pub const G1_TO_NATIONAL: [u16; 191] = [
    0, 112, 115, 32, 35, 21, 100, 34, 80, 2, 103, 108, 102, 88, 94, 29, 31, 104, 111, 131, 59, 151,
    130, 90, 72, 92, 123, 120, 9, 127, 114, 0, 0, 58, 95, 22, 16, 79, 64, 75, 113, 67, 122, 106,
    107, 24, 47, 54, 96, 76, 0, 126, 0, 125, 82, 109, 0, 56, 86, 50, 128, 0, 0, 0, 83, 48, 149, 0,
    0, 0, 84, 60, 124, 146, 144, 145, 132, 52, 98, 0, 0, 0, 37, 38, 25, 26, 0, 0, 147, 148, 140,
    141, 116, 117, 0, 0, 27, 28, 138, 139, 39, 40, 133, 136, 135, 134, 66, 41, 23, 46, 61, 62, 13,
    14, 15, 0, 85, 57, 51, 49, 87, 0, 0, 10, 11, 12, 68, 0, 55, 97, 42, 150, 143, 129, 0, 0, 89, 0,
    99, 91, 0, 101, 36, 110, 53, 105, 0, 93, 63, 65, 17, 18, 121, 1, 3, 73, 0, 118, 119, 0, 0, 0, 0,
    77, 78, 19, 20, 33, 30, 74, 137, 142, 0, 81, 0, 0, 4, 7, 5, 8, 6, 0, 0, 0, 0, 43, 44, 45, 69,
    70, 71,
];

/// Generation 3 internal indices 277..=411 to national dex number.
pub const G3_TO_NATIONAL_HIGH: [u16; 135] = [
    252, 253, 254, 255, 256, 257, 258, 259, 260, 261, 262, 263, 264, 265, 266, 267, 268, 269, 270,
    271, 272, 273, 274, 275, 290, 291, 292, 276, 277, 285, 286, 327, 278, 279, 283, 284, 320, 321,
    300, 301, 352, 343, 344, 299, 324, 302, 339, 340, 370, 341, 342, 349, 350, 318, 319, 328, 329,
    330, 296, 297, 309, 310, 322, 323, 363, 364, 365, 331, 332, 361, 362, 337, 338, 298, 325, 326,
    311, 312, 303, 307, 308, 333, 334, 360, 355, 356, 315, 287, 288, 289, 316, 317, 357, 293, 294,
    295, 366, 367, 368, 359, 353, 354, 336, 335, 369, 304, 305, 306, 351, 313, 314, 345, 346, 347,
    348, 280, 281, 282, 371, 372, 373, 374, 375, 376, 377, 378, 379, 382, 383, 384, 380, 381, 385,
    386, 358,
];

const G3_HIGH_START: u16 = 277;
const G3_LAST_SHARED: u16 = 251;

pub fn g1_to_national(index: u8) -> u16 {
    G1_TO_NATIONAL.get(usize::from(index)).copied().unwrap_or(0)
}

pub fn national_to_g1(species: u16) -> u8 {
    if species == 0 {
        return 0;
    }
    G1_TO_NATIONAL
        .iter()
        .position(|&n| n == species)
        .map_or(0, |i| i as u8)
}

pub fn g3_to_national(index: u16) -> u16 {
    if index <= G3_LAST_SHARED {
        return index;
    }
    index
        .checked_sub(G3_HIGH_START)
        .and_then(|i| G3_TO_NATIONAL_HIGH.get(usize::from(i)))
        .copied()
        .unwrap_or(0)
}

pub fn national_to_g3(species: u16) -> u16 {
    if species <= G3_LAST_SHARED {
        return species;
    }
    G3_TO_NATIONAL_HIGH
        .iter()
        .position(|&n| n == species)
        .map_or(0, |i| i as u16 + G3_HIGH_START)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_gen1_indices() {
        assert_eq!(g1_to_national(0x99), 1);
        assert_eq!(g1_to_national(0x01), 112);
        assert_eq!(g1_to_national(0x15), 151);
        assert_eq!(g1_to_national(0x1F), 0);
        assert_eq!(g1_to_national(0xFF), 0);
        assert_eq!(national_to_g1(25), 0x54);
        assert_eq!(national_to_g1(152), 0);
    }

    #[test]
    fn every_gen1_species_round_trips() {
        for national in 1..=151u16 {
            let index = national_to_g1(national);
            assert_ne!(index, 0, "national {national}");
            assert_eq!(g1_to_national(index), national);
        }
        for index in 0..=u8::MAX {
            let national = g1_to_national(index);
            if national != 0 {
                assert_eq!(national_to_g1(national), index);
            }
        }
    }

    #[test]
    fn every_gen3_species_round_trips() {
        for national in 1..=386u16 {
            assert_eq!(g3_to_national(national_to_g3(national)), national);
        }
        assert_eq!(national_to_g3(387), 0);
    }

    #[test]
    fn gen3_hoenn_block_is_reordered() {
        assert_eq!(g3_to_national(277), 252);
        assert_eq!(g3_to_national(411), 358);
        assert_eq!(g3_to_national(260), 0);
        assert_eq!(national_to_g3(358), 411);
        assert_eq!(national_to_g3(25), 25);
        assert_eq!(national_to_g3(387), 0);
    }
}
