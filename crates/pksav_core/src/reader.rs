use std::io::{self, Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};

/// Sequential little-endian reader for tables whose length is only known
/// once a terminating entry is found.
pub struct LittleEndianReader<R> {
    inner: R,
}

impl<R: Read + Seek> LittleEndianReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        self.inner.read_u16::<LittleEndian>()
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        self.inner.read_u32::<LittleEndian>()
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::LittleEndianReader;

    #[test]
    fn reads_little_endian_fields() {
        let bytes = vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 9];
        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        assert_eq!(r.read_u16().expect("u16"), 0x1234);
        assert_eq!(r.read_u32().expect("u32"), 0x1234_5678);
        assert_eq!(r.position().expect("position"), 6);
        assert!(r.read_u16().is_err());
    }
}
