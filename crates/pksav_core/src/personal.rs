//! Per-species base data ("personal" tables), one fixed-size record per
//! entry. Record 0 is the null species; alternate forms are appended after
//! the last species and reached through each record's form-stats index.

use crate::core_api::{CoreError, CoreErrorCode};
use crate::endian::u16_le;
use crate::generation::Generation;
use crate::stats::Stat;
use crate::tables::growth::GrowthRate;

#[derive(Debug, Clone, Copy)]
struct Layout {
    size: usize,
    stats: [usize; 6],
    type1: usize,
    type2: usize,
    catch_rate: usize,
    gender: Option<usize>,
    hatch_cycles: Option<usize>,
    friendship: Option<usize>,
    growth: usize,
    abilities: [Option<usize>; 3],
    wide_abilities: bool,
    items: [Option<usize>; 3],
    wide_items: bool,
    form_stats: Option<usize>,
    form_count: Option<usize>,
    pokedex: Option<usize>,
    wide_dex: bool,
    armor_dex: Option<usize>,
    crown_dex: Option<usize>,
}

const GEN1: Layout = Layout {
    size: 0x1C,
    stats: [1, 2, 3, 4, 5, 5],
    type1: 6,
    type2: 7,
    catch_rate: 8,
    gender: None,
    hatch_cycles: None,
    friendship: None,
    growth: 0x13,
    abilities: [None, None, None],
    wide_abilities: false,
    items: [None, None, None],
    wide_items: false,
    form_stats: None,
    form_count: None,
    pokedex: Some(0),
    wide_dex: false,
    armor_dex: None,
    crown_dex: None,
};

const GEN2: Layout = Layout {
    size: 0x20,
    stats: [1, 2, 3, 4, 5, 6],
    type1: 7,
    type2: 8,
    catch_rate: 9,
    gender: Some(0x0D),
    hatch_cycles: Some(0x0F),
    friendship: None,
    growth: 0x16,
    abilities: [None, None, None],
    wide_abilities: false,
    items: [Some(0x0B), Some(0x0C), None],
    wide_items: false,
    form_stats: None,
    form_count: None,
    pokedex: Some(0),
    wide_dex: false,
    armor_dex: None,
    crown_dex: None,
};

const GEN3: Layout = Layout {
    size: 0x1C,
    stats: [0, 1, 2, 3, 4, 5],
    type1: 6,
    type2: 7,
    catch_rate: 8,
    gender: Some(0x10),
    hatch_cycles: Some(0x11),
    friendship: Some(0x12),
    growth: 0x13,
    abilities: [Some(0x16), Some(0x17), None],
    wide_abilities: false,
    items: [Some(0x0C), Some(0x0E), None],
    wide_items: true,
    form_stats: None,
    form_count: None,
    pokedex: None,
    wide_dex: false,
    armor_dex: None,
    crown_dex: None,
};

const GEN4: Layout = Layout {
    size: 0x2C,
    ..GEN3
};

const GEN5: Layout = Layout {
    size: 0x4C,
    stats: [0, 1, 2, 3, 4, 5],
    type1: 6,
    type2: 7,
    catch_rate: 8,
    gender: Some(0x12),
    hatch_cycles: Some(0x13),
    friendship: Some(0x14),
    growth: 0x15,
    abilities: [Some(0x18), Some(0x19), Some(0x1A)],
    wide_abilities: false,
    items: [Some(0x0C), Some(0x0E), Some(0x10)],
    wide_items: true,
    form_stats: Some(0x1C),
    form_count: Some(0x20),
    pokedex: None,
    wide_dex: false,
    armor_dex: None,
    crown_dex: None,
};

const GEN6: Layout = Layout { size: 0x50, ..GEN5 };

const GEN7: Layout = Layout { size: 0x54, ..GEN5 };

const GEN8: Layout = Layout {
    size: 0xB0,
    abilities: [Some(0x18), Some(0x1A), Some(0x1C)],
    wide_abilities: true,
    form_stats: Some(0x1E),
    form_count: Some(0x20),
    pokedex: Some(0x5C),
    wide_dex: true,
    armor_dex: Some(0xAC),
    crown_dex: Some(0xAE),
    ..GEN5
};

fn layout(generation: Generation) -> &'static Layout {
    match generation {
        Generation::One => &GEN1,
        Generation::Two => &GEN2,
        Generation::Three => &GEN3,
        Generation::Four => &GEN4,
        Generation::Five => &GEN5,
        Generation::Six => &GEN6,
        Generation::Seven => &GEN7,
        Generation::Eight => &GEN8,
    }
}

/// A view of one personal record.
#[derive(Debug, Clone, Copy)]
pub struct PersonalInfo<'a> {
    layout: &'static Layout,
    data: &'a [u8],
}

impl PersonalInfo<'_> {
    pub fn base_stat(&self, stat: Stat) -> u8 {
        self.data[self.layout.stats[stat.index()]]
    }

    pub fn type1(&self) -> u8 {
        self.data[self.layout.type1]
    }

    pub fn type2(&self) -> u8 {
        self.data[self.layout.type2]
    }

    pub fn catch_rate(&self) -> u8 {
        self.data[self.layout.catch_rate]
    }

    /// 0 all male, 254 all female, 255 genderless. Generation 1 has no
    /// genders and reports 255.
    pub fn gender_ratio(&self) -> u8 {
        self.layout.gender.map_or(255, |o| self.data[o])
    }

    pub fn hatch_cycles(&self) -> u8 {
        self.layout.hatch_cycles.map_or(0, |o| self.data[o])
    }

    pub fn base_friendship(&self) -> u8 {
        self.layout.friendship.map_or(70, |o| self.data[o])
    }

    pub fn growth_rate(&self) -> GrowthRate {
        GrowthRate::from_raw(self.data[self.layout.growth])
    }

    /// Ability for slot 0, 1 or 2 (hidden). Missing slots read as 0.
    pub fn ability(&self, slot: usize) -> u16 {
        match self.layout.abilities.get(slot).copied().flatten() {
            Some(o) if self.layout.wide_abilities => u16_le(self.data, o),
            Some(o) => u16::from(self.data[o]),
            None => 0,
        }
    }

    pub fn held_item(&self, slot: usize) -> u16 {
        match self.layout.items.get(slot).copied().flatten() {
            Some(o) if self.layout.wide_items => u16_le(self.data, o),
            Some(o) => u16::from(self.data[o]),
            None => 0,
        }
    }

    pub fn form_stats_index(&self) -> u16 {
        self.layout.form_stats.map_or(0, |o| u16_le(self.data, o))
    }

    pub fn form_count(&self) -> u8 {
        self.layout.form_count.map_or(1, |o| self.data[o].max(1))
    }

    /// Regional dex number; generations 1 and 2 store the national one.
    pub fn pokedex_index(&self) -> u16 {
        match self.layout.pokedex {
            Some(o) if self.layout.wide_dex => u16_le(self.data, o),
            Some(o) => u16::from(self.data[o]),
            None => 0,
        }
    }

    pub fn armor_dex_index(&self) -> u16 {
        self.layout.armor_dex.map_or(0, |o| u16_le(self.data, o))
    }

    pub fn crown_dex_index(&self) -> u16 {
        self.layout.crown_dex.map_or(0, |o| u16_le(self.data, o))
    }
}

#[derive(Debug, Clone)]
pub struct PersonalTable {
    generation: Generation,
    data: Vec<u8>,
}

impl PersonalTable {
    pub fn record_size(generation: Generation) -> usize {
        layout(generation).size
    }

    /// Fails with `Resource` when the blob is empty or not a whole number of
    /// records; that means a corrupted deployment, not bad save data.
    pub fn from_bytes(generation: Generation, data: Vec<u8>) -> Result<Self, CoreError> {
        let size = Self::record_size(generation);
        if data.is_empty() || data.len() % size != 0 {
            return Err(CoreError::new(
                CoreErrorCode::Resource,
                format!(
                    "{generation} personal table is {} bytes, \
                     not a multiple of the {size}-byte record",
                    data.len()
                ),
            ));
        }
        Ok(Self { generation, data })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.data.len() / Self::record_size(self.generation)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Out-of-range indices yield the null record.
    pub fn get(&self, index: usize) -> PersonalInfo<'_> {
        let layout = layout(self.generation);
        let index = if index < self.len() { index } else { 0 };
        let start = index * layout.size;
        PersonalInfo {
            layout,
            data: &self.data[start..start + layout.size],
        }
    }

    pub fn contains(&self, species: u16) -> bool {
        species != 0 && usize::from(species) < self.len()
    }

    /// Record for `species` in `form`, following the form-stats index for
    /// alternate forms.
    pub fn info(&self, species: u16, form: u8) -> PersonalInfo<'_> {
        let base = self.get(usize::from(species));
        if form == 0 || form >= base.form_count() {
            return base;
        }
        match base.form_stats_index() {
            0 => base,
            first => self.get(usize::from(first) + usize::from(form) - 1),
        }
    }

    /// Whether `species` in `form` exists in this table's game.
    pub fn has_form(&self, species: u16, form: u8) -> bool {
        self.contains(species) && form < self.get(usize::from(species)).form_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_tables() {
        let err = PersonalTable::from_bytes(Generation::Three, vec![0; 0x1C * 2 + 1])
            .expect_err("size mismatch must fail");
        assert_eq!(err.code, CoreErrorCode::Resource);
        assert!(PersonalTable::from_bytes(Generation::Three, Vec::new()).is_err());
    }

    #[test]
    fn follows_form_stats_index() {
        let size = PersonalTable::record_size(Generation::Seven);
        let mut data = vec![0u8; size * 4];
        data[size] = 50;
        data[size + 0x1C] = 2;
        data[size + 0x20] = 3;
        data[size * 2] = 60;
        data[size * 3] = 70;
        let table = PersonalTable::from_bytes(Generation::Seven, data).expect("valid table");
        assert_eq!(table.info(1, 0).base_stat(Stat::Hp), 50);
        assert_eq!(table.info(1, 1).base_stat(Stat::Hp), 60);
        assert_eq!(table.info(1, 2).base_stat(Stat::Hp), 70);
        assert_eq!(table.info(1, 3).base_stat(Stat::Hp), 50);
        assert!(table.has_form(1, 2));
        assert!(!table.has_form(1, 3));
        assert!(!table.contains(9));
    }
}
