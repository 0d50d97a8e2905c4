//! Fixed-width integer, float and BCD codecs over raw byte buffers.
//!
//! Every function here is total over its fixed-width domain. Callers are
//! responsible for passing buffers that are long enough; an undersized
//! buffer is a programming error and panics like any slice index would.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub trait Primitive: Copy {
    const WIDTH: usize;

    fn read<O: ByteOrder>(bytes: &[u8]) -> Self;
    fn write<O: ByteOrder>(dest: &mut [u8], value: Self);
}

impl Primitive for u8 {
    const WIDTH: usize = 1;

    fn read<O: ByteOrder>(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write<O: ByteOrder>(dest: &mut [u8], value: Self) {
        dest[0] = value;
    }
}

impl Primitive for i8 {
    const WIDTH: usize = 1;

    fn read<O: ByteOrder>(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write<O: ByteOrder>(dest: &mut [u8], value: Self) {
        dest[0] = value as u8;
    }
}

macro_rules! primitive {
    ($ty:ty, $width:expr, $read:ident, $write:ident) => {
        impl Primitive for $ty {
            const WIDTH: usize = $width;

            fn read<O: ByteOrder>(bytes: &[u8]) -> Self {
                O::$read(&bytes[..$width])
            }

            fn write<O: ByteOrder>(dest: &mut [u8], value: Self) {
                O::$write(&mut dest[..$width], value)
            }
        }
    };
}

primitive!(u16, 2, read_u16, write_u16);
primitive!(i16, 2, read_i16, write_i16);
primitive!(u32, 4, read_u32, write_u32);
primitive!(i32, 4, read_i32, write_i32);
primitive!(u64, 8, read_u64, write_u64);
primitive!(i64, 8, read_i64, write_i64);
primitive!(f32, 4, read_f32, write_f32);
primitive!(f64, 8, read_f64, write_f64);

/// Decodes a `T` stored in byte order `O` at the start of `bytes`.
pub fn convert_to<T: Primitive, O: ByteOrder>(bytes: &[u8]) -> T {
    T::read::<O>(bytes)
}

/// Encodes `value` in byte order `O` at the start of `dest`.
pub fn convert_from<T: Primitive, O: ByteOrder>(dest: &mut [u8], value: T) {
    T::write::<O>(dest, value)
}

pub fn u16_le(data: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&data[offset..offset + 2])
}

pub fn u32_le(data: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&data[offset..offset + 4])
}

pub fn u64_le(data: &[u8], offset: usize) -> u64 {
    LittleEndian::read_u64(&data[offset..offset + 8])
}

pub fn u16_be(data: &[u8], offset: usize) -> u16 {
    BigEndian::read_u16(&data[offset..offset + 2])
}

pub fn u32_be(data: &[u8], offset: usize) -> u32 {
    BigEndian::read_u32(&data[offset..offset + 4])
}

pub fn set_u16_le(data: &mut [u8], offset: usize, value: u16) {
    LittleEndian::write_u16(&mut data[offset..offset + 2], value)
}

pub fn set_u32_le(data: &mut [u8], offset: usize, value: u32) {
    LittleEndian::write_u32(&mut data[offset..offset + 4], value)
}

pub fn set_u64_le(data: &mut [u8], offset: usize, value: u64) {
    LittleEndian::write_u64(&mut data[offset..offset + 8], value)
}

pub fn set_u16_be(data: &mut [u8], offset: usize, value: u16) {
    BigEndian::write_u16(&mut data[offset..offset + 2], value)
}

pub fn set_u32_be(data: &mut [u8], offset: usize, value: u32) {
    BigEndian::write_u32(&mut data[offset..offset + 4], value)
}

/// Three-byte big-endian value, used for experience in the Game Boy formats.
pub fn u24_be(data: &[u8], offset: usize) -> u32 {
    BigEndian::read_u24(&data[offset..offset + 3])
}

/// Values above 0xFFFFFF are clamped.
pub fn set_u24_be(data: &mut [u8], offset: usize, value: u32) {
    BigEndian::write_u24(&mut data[offset..offset + 3], value.min(0xFF_FFFF))
}

/// Reads packed binary-coded decimal, two digits per byte, most significant
/// digit first. Nibbles above 9 are read as 9.
pub fn bcd_decode(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| {
        let hi = u32::from((b >> 4).min(9));
        let lo = u32::from((b & 0xF).min(9));
        acc.wrapping_mul(100).wrapping_add(hi * 10 + lo)
    })
}

/// Writes `value` as packed BCD filling `dest`; digits that do not fit are
/// dropped from the top, so callers clamp to the field's maximum first.
pub fn bcd_encode(dest: &mut [u8], value: u32) {
    let mut rest = value;
    for byte in dest.iter_mut().rev() {
        let lo = (rest % 10) as u8;
        rest /= 10;
        let hi = (rest % 10) as u8;
        rest /= 10;
        *byte = (hi << 4) | lo;
    }
}

/// Largest value a BCD field of `len` bytes can hold.
pub fn bcd_max(len: usize) -> u32 {
    10u32.saturating_pow(2 * len as u32).saturating_sub(1)
}

pub fn get_bits(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & mask(width)
}

pub fn set_bits(word: u32, shift: u32, width: u32, value: u32) -> u32 {
    let m = mask(width) << shift;
    (word & !m) | ((value << shift) & m)
}

fn mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

pub fn flag(data: &[u8], offset: usize, bit: usize) -> bool {
    (data[offset + bit / 8] >> (bit % 8)) & 1 == 1
}

pub fn set_flag(data: &mut [u8], offset: usize, bit: usize, value: bool) {
    let byte = &mut data[offset + bit / 8];
    let m = 1u8 << (bit % 8);
    if value {
        *byte |= m;
    } else {
        *byte &= !m;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_round_trip_in_both_orders() {
        let mut buf = [0u8; 8];
        convert_from::<u32, BigEndian>(&mut buf, 0x1234_5678);
        assert_eq!(&buf[..4], &[0x12, 0x34, 0x56, 0x78]);
        convert_from::<u32, LittleEndian>(&mut buf, 0x1234_5678);
        assert_eq!(&buf[..4], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(convert_to::<u32, LittleEndian>(&buf), 0x1234_5678);

        convert_from::<f32, BigEndian>(&mut buf, 1.5);
        assert_eq!(convert_to::<f32, BigEndian>(&buf), 1.5);
        convert_from::<i16, LittleEndian>(&mut buf, -2);
        assert_eq!(&buf[..2], &[0xFE, 0xFF]);
    }

    #[test]
    fn bcd_packs_two_digits_per_byte() {
        let mut buf = [0u8; 3];
        bcd_encode(&mut buf, 123_456);
        assert_eq!(buf, [0x12, 0x34, 0x56]);
        assert_eq!(bcd_decode(&buf), 123_456);
        assert_eq!(bcd_max(3), 999_999);
    }

    #[test]
    fn bit_fields_leave_neighbours_alone() {
        let word = set_bits(0xFFFF_FFFF, 5, 5, 0);
        assert_eq!(word, 0xFFFF_FC1F);
        assert_eq!(get_bits(set_bits(word, 5, 5, 17), 5, 5), 17);
    }

    #[test]
    fn u24_is_three_bytes_big_endian() {
        let mut buf = [0u8; 4];
        set_u24_be(&mut buf, 1, 0x01_0203);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(u24_be(&buf, 1), 0x01_0203);
    }
}
