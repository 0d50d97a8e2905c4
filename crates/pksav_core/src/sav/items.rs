//! Item stacks and bag pouches. Every format converts to and from the
//! national-id [`ItemStack`]; the on-disk shape is an [`ItemFormat`].

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, check_index};
use crate::endian::{get_bits, set_bits, set_u16_le, set_u32_le, u16_le, u32_le};
use crate::tables::items;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PouchKind {
    Items,
    KeyItems,
    Balls,
    Tms,
    Trs,
    Berries,
    Medicine,
    Mail,
    BattleItems,
    Treasures,
    Ingredients,
    ZCrystals,
    Pc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: u16,
    pub count: u16,
    /// Generation 7 and 8 "new" marker.
    pub is_new: bool,
    /// Generation 8 favorite marker.
    pub favorite: bool,
    /// Generation 7 free-space ordering value.
    pub free_space: u16,
}

impl ItemStack {
    pub fn new(item: u16, count: u16) -> Self {
        Self {
            item,
            count,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item == 0 || self.count == 0
    }
}

/// Stored representation of one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFormat {
    /// Generation 1: local index byte, count byte.
    Gb1,
    /// Generation 2: local index byte, count byte.
    Gb2,
    /// Generation 2 key items: local index byte only.
    Gb2Key,
    /// Generation 3: local index, count XORed with the security key.
    Gen3 { key: u16 },
    /// Generations 4 to 6: national id, count.
    Plain,
    /// Generation 7: id bits 0-9, count 10-19, free space 20-29, new bit 30.
    Packed7,
    /// Generation 8: id bits 0-10, count 15-24, new bit 30, favorite bit 31.
    Packed8,
}

impl ItemFormat {
    pub fn size(self) -> usize {
        match self {
            Self::Gb1 | Self::Gb2 => 2,
            Self::Gb2Key => 1,
            Self::Gen3 { .. } | Self::Plain | Self::Packed7 | Self::Packed8 => 4,
        }
    }

    pub fn read(self, data: &[u8]) -> ItemStack {
        match self {
            Self::Gb1 => ItemStack::new(items::g1_to_national(data[0]), u16::from(data[1])),
            Self::Gb2 => ItemStack::new(items::g2_to_national(data[0]), u16::from(data[1])),
            Self::Gb2Key => ItemStack::new(items::g2_to_national(data[0]), 1),
            Self::Gen3 { key } => ItemStack::new(
                items::g3_to_national(u16_le(data, 0)),
                u16_le(data, 2) ^ key,
            ),
            Self::Plain => ItemStack::new(u16_le(data, 0), u16_le(data, 2)),
            Self::Packed7 => {
                let v = u32_le(data, 0);
                ItemStack {
                    item: get_bits(v, 0, 10) as u16,
                    count: get_bits(v, 10, 10) as u16,
                    free_space: get_bits(v, 20, 10) as u16,
                    is_new: get_bits(v, 30, 1) != 0,
                    favorite: false,
                }
            }
            Self::Packed8 => {
                let v = u32_le(data, 0);
                ItemStack {
                    item: get_bits(v, 0, 11) as u16,
                    count: get_bits(v, 15, 10) as u16,
                    free_space: 0,
                    is_new: get_bits(v, 30, 1) != 0,
                    favorite: get_bits(v, 31, 1) != 0,
                }
            }
        }
    }

    pub fn write(self, stack: &ItemStack, dest: &mut [u8]) {
        let stack = if stack.is_empty() {
            ItemStack::default()
        } else {
            *stack
        };
        match self {
            Self::Gb1 => {
                dest[0] = items::national_to_g1(stack.item);
                dest[1] = stack.count.min(99) as u8;
            }
            Self::Gb2 => {
                dest[0] = items::national_to_g2(stack.item);
                dest[1] = stack.count.min(99) as u8;
            }
            Self::Gb2Key => dest[0] = items::national_to_g2(stack.item),
            Self::Gen3 { key } => {
                // items the games never had leave the slot empty
                let index = items::national_to_g3(stack.item);
                let count = if index == 0 { 0 } else { stack.count };
                set_u16_le(dest, 0, index);
                set_u16_le(dest, 2, count ^ key);
            }
            Self::Plain => {
                set_u16_le(dest, 0, stack.item);
                set_u16_le(dest, 2, stack.count);
            }
            Self::Packed7 => {
                let mut v = set_bits(0, 0, 10, u32::from(stack.item));
                v = set_bits(v, 10, 10, u32::from(stack.count));
                v = set_bits(v, 20, 10, u32::from(stack.free_space));
                v = set_bits(v, 30, 1, u32::from(stack.is_new));
                set_u32_le(dest, 0, v);
            }
            Self::Packed8 => {
                let mut v = set_bits(0, 0, 11, u32::from(stack.item));
                v = set_bits(v, 15, 10, u32::from(stack.count));
                v = set_bits(v, 30, 1, u32::from(stack.is_new));
                v = set_bits(v, 31, 1, u32::from(stack.favorite));
                set_u32_le(dest, 0, v);
            }
        }
    }
}

/// Public description of one pouch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pouch {
    pub kind: PouchKind,
    pub capacity: usize,
}

/// Where a pouch lives inside its container's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PouchLayout {
    pub kind: PouchKind,
    pub offset: usize,
    pub capacity: usize,
    pub format: ItemFormat,
    /// Game Boy lists: a count byte, then the entries, then 0xFF.
    pub counted: bool,
}

const LIST_END: u8 = 0xFF;

impl PouchLayout {
    pub const fn new(kind: PouchKind, offset: usize, capacity: usize, format: ItemFormat) -> Self {
        Self {
            kind,
            offset,
            capacity,
            format,
            counted: false,
        }
    }

    pub const fn counted(
        kind: PouchKind,
        offset: usize,
        capacity: usize,
        format: ItemFormat,
    ) -> Self {
        Self {
            kind,
            offset,
            capacity,
            format,
            counted: true,
        }
    }

    pub fn with_format(mut self, format: ItemFormat) -> Self {
        self.format = format;
        self
    }

    pub fn pouch(&self) -> Pouch {
        Pouch {
            kind: self.kind,
            capacity: self.capacity,
        }
    }

    /// Bytes the pouch occupies, including the count and terminator of
    /// counted lists.
    pub fn len(&self) -> usize {
        let entries = self.capacity * self.format.size();
        if self.counted { entries + 2 } else { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    fn entry_offset(&self, slot: usize) -> usize {
        let base = if self.counted { self.offset + 1 } else { self.offset };
        base + slot * self.format.size()
    }

    fn list_count(&self, data: &[u8]) -> usize {
        usize::from(data[self.offset]).min(self.capacity)
    }

    pub fn item(&self, data: &[u8], slot: usize) -> Result<ItemStack, CoreError> {
        check_index("pouch slot", slot, self.capacity)?;
        if self.counted && slot >= self.list_count(data) {
            return Ok(ItemStack::default());
        }
        let at = self.entry_offset(slot);
        Ok(self.format.read(&data[at..at + self.format.size()]))
    }

    /// Writes one stack. Counted lists stay compact: an empty stack removes
    /// the entry and a stack past the end is appended.
    pub fn set_item(
        &self,
        data: &mut [u8],
        slot: usize,
        stack: &ItemStack,
    ) -> Result<(), CoreError> {
        check_index("pouch slot", slot, self.capacity)?;
        let size = self.format.size();
        if !self.counted {
            let at = self.entry_offset(slot);
            self.format.write(stack, &mut data[at..at + size]);
            return Ok(());
        }

        let count = self.list_count(data);
        let count = if stack.is_empty() {
            if slot >= count {
                return Ok(());
            }
            let from = self.entry_offset(slot + 1);
            let to = self.entry_offset(count);
            data.copy_within(from..to, self.entry_offset(slot));
            count - 1
        } else if slot >= count {
            let at = self.entry_offset(count);
            self.format.write(stack, &mut data[at..at + size]);
            count + 1
        } else {
            let at = self.entry_offset(slot);
            self.format.write(stack, &mut data[at..at + size]);
            count
        };
        data[self.offset] = count as u8;
        let end = self.entry_offset(count);
        data[end] = LIST_END;
        Ok(())
    }

    pub fn stacks(&self, data: &[u8]) -> Vec<ItemStack> {
        (0..self.capacity)
            .filter_map(|slot| self.item(data, slot).ok())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Pouch an item is filed under when a save receives it from a gift.
pub fn pouch_for(item: u16) -> PouchKind {
    match item {
        1..=16 | 492..=500 | 576 | 851 => PouchKind::Balls,
        17..=54 => PouchKind::Medicine,
        149..=212 => PouchKind::Berries,
        328..=427 => PouchKind::Tms,
        _ => PouchKind::Items,
    }
}
