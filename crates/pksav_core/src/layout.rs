use crate::core_api::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: &ByteRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// A named region of a save image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: u16,
    pub range: ByteRange,
}

/// The set of regions a container found in its image.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    pub image_len: usize,
    pub regions: Vec<Region>,
}

impl RegionMap {
    pub fn new(image_len: usize) -> Self {
        Self {
            image_len,
            regions: Vec::new(),
        }
    }

    pub fn push(&mut self, id: u16, range: ByteRange) {
        self.regions.push(Region { id, range });
    }

    pub fn get(&self, id: u16) -> Option<ByteRange> {
        self.regions.iter().find(|r| r.id == id).map(|r| r.range)
    }

    /// Regions must be in ascending order, must not overlap and must lie
    /// inside the image.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut expected = 0usize;
        for region in &self.regions {
            if region.range.end < region.range.start {
                return Err(CoreError::new(
                    CoreErrorCode::Parse,
                    format!(
                        "invalid range for region {}: {:#x}..{:#x}",
                        region.id, region.range.start, region.range.end
                    ),
                ));
            }
            if region.range.start < expected {
                return Err(CoreError::new(
                    CoreErrorCode::Parse,
                    format!(
                        "region {} at {:#x} overlaps previous region ending at {:#x}",
                        region.id, region.range.start, expected
                    ),
                ));
            }
            expected = region.range.end;
        }

        if expected > self.image_len {
            return Err(CoreError::new(
                CoreErrorCode::Parse,
                format!(
                    "regions end at {:#x}, past image length {:#x}",
                    expected, self.image_len
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_overlap_and_overflow() {
        let mut map = RegionMap::new(0x100);
        map.push(0, ByteRange::new(0, 0x40));
        map.push(1, ByteRange::new(0x40, 0x40));
        assert!(map.validate().is_ok());
        assert_eq!(map.get(1), Some(ByteRange { start: 0x40, end: 0x80 }));

        map.push(2, ByteRange::new(0x70, 0x10));
        assert!(map.validate().is_err());

        let mut map = RegionMap::new(0x100);
        map.push(0, ByteRange::new(0xF0, 0x20));
        assert!(map.validate().is_err());
    }
}
