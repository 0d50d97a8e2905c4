//! Item index translation for generations 1 to 3. From generation 4 on the
//! games store national item ids directly. Items with no later counterpart
//! map to 0.

/// Generation 1 item index to national item id.
pub const G1_TO_NATIONAL: [u16; 256] = [
    0, 1, 2, 3, 4, 442, 450, 0, 5, 0, 81, 18, 19, 20, 21, 22, 23, 24, 25, 26, 17, 0, 0, 0, 0, 0, 0,
    0, 0, 78, 79, 103, 82, 83, 84, 45, 46, 47, 48, 49, 50, 102, 101, 467, 0, 0, 60, 85, 475, 92, 0,
    63, 27, 28, 29, 55, 76, 77, 56, 0, 30, 31, 32, 456, 0, 57, 58, 59, 61, 444, 0, 0, 0, 0, 0, 0,
    445, 446, 447, 51, 38, 39, 40, 41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 420, 421,
    422, 423, 424, 328, 329, 330, 331, 332, 333, 334, 335, 336, 337, 338, 339, 340, 341, 342, 343,
    344, 345, 346, 347, 348, 349, 350, 351, 352, 353, 354, 355, 356, 357, 358, 359, 360, 361, 362,
    363, 364, 365, 366, 367, 368, 369, 370, 371, 372, 373, 374, 375, 376, 377, 0, 0, 0, 0, 0,
];

/// Generation 2 item index to national item id.
pub const G2_TO_NATIONAL: [u16; 256] = [
    0, 1, 2, 213, 3, 4, 0, 450, 81, 18, 19, 20, 21, 22, 23, 24, 25, 26, 17, 78, 79, 41, 82, 83, 84,
    0, 45, 46, 47, 48, 256, 49, 50, 60, 85, 257, 92, 63, 27, 28, 29, 55, 76, 77, 56, 0, 30, 31, 32,
    57, 0, 58, 59, 61, 444, 471, 0, 216, 445, 446, 0, 447, 51, 38, 39, 40, 478, 464, 456, 484, 474,
    482, 33, 217, 151, 0, 237, 244, 149, 152, 153, 245, 221, 156, 150, 485, 86, 87, 222, 487, 0,
    223, 486, 488, 224, 243, 248, 490, 241, 491, 0, 489, 240, 473, 0, 259, 228, 246, 242, 157, 88,
    89, 229, 247, 504, 0, 472, 239, 258, 230, 0, 34, 35, 36, 37, 238, 231, 475, 481, 0, 479, 90, 91,
    476, 480, 0, 0, 0, 249, 43, 232, 0, 0, 233, 250, 0, 234, 0, 0, 0, 154, 235, 0, 0, 0, 0, 44, 495,
    0, 493, 494, 492, 0, 236, 497, 498, 496, 0, 0, 80, 0, 0, 252, 155, 158, 477, 0, 500, 483, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 328, 329, 330, 331, 0, 332, 333, 334, 335, 336, 337, 338, 339,
    340, 341, 342, 343, 344, 345, 346, 347, 348, 349, 350, 351, 352, 353, 354, 355, 0, 356, 357,
    358, 359, 360, 361, 362, 363, 364, 365, 366, 367, 368, 369, 370, 371, 372, 373, 374, 375, 376,
    377, 420, 421, 422, 423, 424, 425, 426, 0, 0, 0, 0, 0, 0,
];

/// Generation 3 item index to national item id.
pub const G3_TO_NATIONAL: [u16; 377] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29,
    30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 65, 66, 67, 68, 69, 43, 44, 70, 71, 72, 73,
    74, 75, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 45, 46, 47, 48, 49, 50, 51, 52, 53, 0, 55, 56, 57, 58,
    59, 60, 61, 63, 64, 0, 76, 77, 78, 79, 0, 0, 0, 0, 0, 0, 80, 81, 82, 83, 84, 85, 0, 0, 0, 0, 86,
    87, 0, 88, 89, 90, 91, 92, 93, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    149, 150, 151, 152, 153, 154, 155, 156, 157, 158, 159, 160, 161, 162, 163, 164, 165, 166, 167,
    168, 169, 170, 171, 172, 173, 174, 175, 176, 177, 178, 179, 180, 181, 182, 183, 201, 202, 203,
    204, 205, 206, 207, 208, 0, 0, 0, 213, 214, 215, 216, 217, 218, 219, 220, 221, 222, 223, 224,
    225, 226, 227, 228, 229, 230, 231, 232, 233, 234, 235, 236, 237, 238, 239, 240, 241, 242, 243,
    244, 245, 246, 247, 248, 249, 250, 251, 252, 253, 254, 255, 256, 257, 258, 259, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 260, 261, 262, 263, 264, 0,
    444, 0, 445, 446, 447, 456, 457, 0, 0, 0, 0, 476, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 463,
    99, 100, 0, 328, 329, 330, 331, 332, 333, 334, 335, 336, 337, 338, 339, 340, 341, 342, 343, 344,
    345, 346, 347, 348, 349, 350, 351, 352, 353, 354, 355, 356, 357, 358, 359, 360, 361, 362, 363,
    364, 365, 366, 367, 368, 369, 370, 371, 372, 373, 374, 375, 376, 377, 420, 421, 422, 423, 424,
    425, 426, 427, 0, 0, 459, 0, 467, 0, 0, 103, 475, 0, 101, 102, 0, 450, 442, 443, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0,
];

fn to_national(table: &[u16], index: u16) -> u16 {
    table.get(usize::from(index)).copied().unwrap_or(0)
}

fn from_national(table: &[u16], item: u16) -> u16 {
    if item == 0 {
        return 0;
    }
    table.iter().position(|&n| n == item).map_or(0, |i| i as u16)
}

pub fn g1_to_national(index: u8) -> u16 {
    to_national(&G1_TO_NATIONAL, u16::from(index))
}

pub fn national_to_g1(item: u16) -> u8 {
    from_national(&G1_TO_NATIONAL, item) as u8
}

pub fn g2_to_national(index: u8) -> u16 {
    to_national(&G2_TO_NATIONAL, u16::from(index))
}

pub fn national_to_g2(item: u16) -> u8 {
    from_national(&G2_TO_NATIONAL, item) as u8
}

pub fn g3_to_national(index: u16) -> u16 {
    to_national(&G3_TO_NATIONAL, index)
}

pub fn national_to_g3(item: u16) -> u16 {
    from_national(&G3_TO_NATIONAL, item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balls_keep_their_ids() {
        for ball in 1..=12u16 {
            assert_eq!(g3_to_national(ball), ball);
        }
    }

    #[test]
    fn berries_and_machines_shift() {
        assert_eq!(g3_to_national(133), 149);
        assert_eq!(g3_to_national(175), 208);
        assert_eq!(g3_to_national(289), 328);
        assert_eq!(g3_to_national(346), 427);
        assert_eq!(national_to_g3(213), 179);
        assert_eq!(g2_to_national(173), 155);
        assert_eq!(national_to_g2(157), 109);
        assert_eq!(g1_to_national(20), 17);
    }

    #[test]
    fn unmapped_items_are_zero() {
        assert_eq!(g3_to_national(52), 0);
        assert_eq!(g3_to_national(1000), 0);
        assert_eq!(national_to_g3(13), 0);
        assert_eq!(national_to_g1(0), 0);
    }
}
