//! Ribbons in one canonical order, and where each generation keeps them.

use serde::{Deserialize, Serialize};

use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ribbon {
    ChampionKalos,
    ChampionG3Hoenn,
    ChampionSinnoh,
    BestFriends,
    Training,
    BattlerSkillful,
    BattlerExpert,
    Effort,
    Alert,
    Shock,
    Downcast,
    Careless,
    Relax,
    Snooze,
    Smile,
    Gorgeous,
    Royal,
    GorgeousRoyal,
    Artist,
    Footprint,
    Record,
    Legend,
    Country,
    National,
    Earth,
    World,
    Classic,
    Premier,
    Event,
    Birthday,
    Special,
    Souvenir,
    Wishing,
    ChampionBattle,
    ChampionRegional,
    ChampionNational,
    ChampionWorld,
    MemoryContest,
    MemoryBattle,
    ChampionG6Hoenn,
    ContestStar,
    MasterCoolness,
    MasterBeauty,
    MasterCuteness,
    MasterCleverness,
    MasterToughness,
    ChampionAlola,
    BattleRoyale,
    BattleTreeGreat,
    BattleTreeMaster,
    ChampionGalar,
    TowerMaster,
    MasterRank,
    MarkLunchtime,
    MarkSleepyTime,
    MarkDusk,
    MarkDawn,
    G3Cool,
    G3CoolSuper,
    G3CoolHyper,
    G3CoolMaster,
    G3Beauty,
    G3BeautySuper,
    G3BeautyHyper,
    G3BeautyMaster,
    G3Cute,
    G3CuteSuper,
    G3CuteHyper,
    G3CuteMaster,
    G3Smart,
    G3SmartSuper,
    G3SmartHyper,
    G3SmartMaster,
    G3Tough,
    G3ToughSuper,
    G3ToughHyper,
    G3ToughMaster,
    G4Cool,
    G4CoolGreat,
    G4CoolUltra,
    G4CoolMaster,
    G4Beauty,
    G4BeautyGreat,
    G4BeautyUltra,
    G4BeautyMaster,
    G4Cute,
    G4CuteGreat,
    G4CuteUltra,
    G4CuteMaster,
    G4Smart,
    G4SmartGreat,
    G4SmartUltra,
    G4SmartMaster,
    G4Tough,
    G4ToughGreat,
    G4ToughUltra,
    G4ToughMaster,
    Winning,
    Victory,
    Ability,
    AbilityGreat,
    AbilityDouble,
    AbilityMulti,
    AbilityPair,
    AbilityWorld,
}

use Ribbon::*;

impl Ribbon {
    pub const ALL: [Ribbon; 105] = [
        ChampionKalos, ChampionG3Hoenn, ChampionSinnoh, BestFriends, Training, BattlerSkillful,
        BattlerExpert, Effort, Alert, Shock, Downcast, Careless, Relax, Snooze, Smile, Gorgeous,
        Royal, GorgeousRoyal, Artist, Footprint, Record, Legend, Country, National, Earth, World,
        Classic, Premier, Event, Birthday, Special, Souvenir, Wishing, ChampionBattle,
        ChampionRegional, ChampionNational, ChampionWorld, MemoryContest, MemoryBattle,
        ChampionG6Hoenn, ContestStar, MasterCoolness, MasterBeauty, MasterCuteness,
        MasterCleverness, MasterToughness, ChampionAlola, BattleRoyale, BattleTreeGreat,
        BattleTreeMaster, ChampionGalar, TowerMaster, MasterRank, MarkLunchtime, MarkSleepyTime,
        MarkDusk, MarkDawn, G3Cool, G3CoolSuper, G3CoolHyper, G3CoolMaster, G3Beauty,
        G3BeautySuper, G3BeautyHyper, G3BeautyMaster, G3Cute, G3CuteSuper, G3CuteHyper,
        G3CuteMaster, G3Smart, G3SmartSuper, G3SmartHyper, G3SmartMaster, G3Tough, G3ToughSuper,
        G3ToughHyper, G3ToughMaster, G4Cool, G4CoolGreat, G4CoolUltra, G4CoolMaster, G4Beauty,
        G4BeautyGreat, G4BeautyUltra, G4BeautyMaster, G4Cute, G4CuteGreat, G4CuteUltra,
        G4CuteMaster, G4Smart, G4SmartGreat, G4SmartUltra, G4SmartMaster, G4Tough, G4ToughGreat,
        G4ToughUltra, G4ToughMaster, Winning, Victory, Ability, AbilityGreat, AbilityDouble,
        AbilityMulti, AbilityPair, AbilityWorld,
    ];

    /// Position in the canonical order; also the id used for localization.
    pub fn index(self) -> u16 {
        self as u16
    }

    pub fn localize(self, registry: &TableRegistry, language: Language) -> String {
        registry.localize(language, "ribbons", self.index())
    }
}

/// Where a generation stores one ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibbonSlot {
    Flag { offset: usize, bit: u8 },
    /// Generation 3 contest ribbons: a 3-bit rank inside the ribbon word.
    /// The ribbon is held when the rank reaches `level`.
    Rank { offset: usize, shift: u8, level: u8 },
    /// Byte counter; the ribbon is held when it is non-zero.
    Counter { offset: usize },
}

struct Row {
    offset: usize,
    bits: [Option<Ribbon>; 8],
}

const fn row(offset: usize, bits: [Option<Ribbon>; 8]) -> Row {
    Row { offset, bits }
}

const N: Option<Ribbon> = None;

const fn s(r: Ribbon) -> Option<Ribbon> {
    Some(r)
}

#[rustfmt::skip]
static GEN4_ROWS: [Row; 11] = [
    row(0x24, [s(ChampionSinnoh), s(Ability), s(AbilityGreat), s(AbilityDouble), s(AbilityMulti), s(AbilityPair), s(AbilityWorld), s(Alert)]),
    row(0x25, [s(Shock), s(Downcast), s(Careless), s(Relax), s(Snooze), s(Smile), s(Gorgeous), s(Royal)]),
    row(0x26, [s(GorgeousRoyal), s(Footprint), s(Record), s(Event), s(Legend), s(ChampionWorld), s(Birthday), s(Special)]),
    row(0x27, [s(Souvenir), s(Wishing), s(Classic), s(Premier), N, N, N, N]),
    row(0x3C, [s(G3Cool), s(G3CoolSuper), s(G3CoolHyper), s(G3CoolMaster), s(G3Beauty), s(G3BeautySuper), s(G3BeautyHyper), s(G3BeautyMaster)]),
    row(0x3D, [s(G3Cute), s(G3CuteSuper), s(G3CuteHyper), s(G3CuteMaster), s(G3Smart), s(G3SmartSuper), s(G3SmartHyper), s(G3SmartMaster)]),
    row(0x3E, [s(G3Tough), s(G3ToughSuper), s(G3ToughHyper), s(G3ToughMaster), s(ChampionG3Hoenn), s(Winning), s(Victory), s(Artist)]),
    row(0x3F, [s(Effort), s(ChampionBattle), s(ChampionRegional), s(ChampionNational), s(Country), s(National), s(Earth), s(World)]),
    row(0x60, [s(G4Cool), s(G4CoolGreat), s(G4CoolUltra), s(G4CoolMaster), s(G4Beauty), s(G4BeautyGreat), s(G4BeautyUltra), s(G4BeautyMaster)]),
    row(0x61, [s(G4Cute), s(G4CuteGreat), s(G4CuteUltra), s(G4CuteMaster), s(G4Smart), s(G4SmartGreat), s(G4SmartUltra), s(G4SmartMaster)]),
    row(0x62, [s(G4Tough), s(G4ToughGreat), s(G4ToughUltra), s(G4ToughMaster), N, N, N, N]),
];

// Rows for generation 6 onward, relative to the start of the ribbon area.
#[rustfmt::skip]
static MODERN_ROWS: [Row; 7] = [
    row(0, [s(ChampionKalos), s(ChampionG3Hoenn), s(ChampionSinnoh), s(BestFriends), s(Training), s(BattlerSkillful), s(BattlerExpert), s(Effort)]),
    row(1, [s(Alert), s(Shock), s(Downcast), s(Careless), s(Relax), s(Snooze), s(Smile), s(Gorgeous)]),
    row(2, [s(Royal), s(GorgeousRoyal), s(Artist), s(Footprint), s(Record), s(Legend), s(Country), s(National)]),
    row(3, [s(Earth), s(World), s(Classic), s(Premier), s(Event), s(Birthday), s(Special), s(Souvenir)]),
    row(4, [s(Wishing), s(ChampionBattle), s(ChampionRegional), s(ChampionNational), s(ChampionWorld), N, s(ChampionG6Hoenn), s(ContestStar)]),
    row(5, [s(MasterCoolness), s(MasterBeauty), s(MasterCuteness), s(MasterCleverness), s(MasterToughness), s(ChampionAlola), s(BattleRoyale), s(BattleTreeGreat)]),
    row(6, [s(BattleTreeMaster), s(ChampionGalar), s(TowerMaster), s(MasterRank), s(MarkLunchtime), s(MarkSleepyTime), s(MarkDusk), s(MarkDawn)]),
];

const G3_RIBBON_WORD: usize = 0x4C;

const G3_CONTEST: [[Ribbon; 4]; 5] = [
    [G3Cool, G3CoolSuper, G3CoolHyper, G3CoolMaster],
    [G3Beauty, G3BeautySuper, G3BeautyHyper, G3BeautyMaster],
    [G3Cute, G3CuteSuper, G3CuteHyper, G3CuteMaster],
    [G3Smart, G3SmartSuper, G3SmartHyper, G3SmartMaster],
    [G3Tough, G3ToughSuper, G3ToughHyper, G3ToughMaster],
];

const G3_FLAGS: [Ribbon; 12] = [
    ChampionG3Hoenn, Winning, Victory, Artist, Effort, ChampionBattle, ChampionRegional,
    ChampionNational, Country, National, Earth, World,
];

fn find_in_rows(rows: &[Row], base: usize, ribbon: Ribbon) -> Option<RibbonSlot> {
    rows.iter().find_map(|r| {
        r.bits
            .iter()
            .position(|b| *b == Some(ribbon))
            .map(|bit| RibbonSlot::Flag {
                offset: base + r.offset,
                bit: bit as u8,
            })
    })
}

fn gen3_slot(ribbon: Ribbon) -> Option<RibbonSlot> {
    for (category, ranks) in G3_CONTEST.iter().enumerate() {
        if let Some(level) = ranks.iter().position(|r| *r == ribbon) {
            return Some(RibbonSlot::Rank {
                offset: G3_RIBBON_WORD,
                shift: (category * 3) as u8,
                level: level as u8 + 1,
            });
        }
    }
    G3_FLAGS.iter().position(|r| *r == ribbon).map(|i| {
        let bit = 15 + i;
        RibbonSlot::Flag {
            offset: G3_RIBBON_WORD + bit / 8,
            bit: (bit % 8) as u8,
        }
    })
}

fn modern_slot(generation: Generation, ribbon: Ribbon) -> Option<RibbonSlot> {
    let (base, rows, memory) = match generation {
        Generation::Six => (0x30, 6, 0x38),
        Generation::Seven => (0x30, 7, 0x38),
        _ => (0x34, 7, 0x3C),
    };
    match ribbon {
        MemoryContest => return Some(RibbonSlot::Counter { offset: memory }),
        MemoryBattle => return Some(RibbonSlot::Counter { offset: memory + 1 }),
        _ => {}
    }
    let slot = find_in_rows(&MODERN_ROWS[..rows], base, ribbon)?;
    // The last row a generation stores is only partly its own.
    if let RibbonSlot::Flag { offset, bit } = slot {
        let cut = match generation {
            Generation::Six => Some((5, 5)),
            Generation::Seven => Some((6, 1)),
            _ => None,
        };
        if cut.is_some_and(|(row, first)| offset == base + row && bit >= first) {
            return None;
        }
    }
    Some(slot)
}

/// Storage location of `ribbon` in a decrypted record of `generation`.
pub fn slot(generation: Generation, ribbon: Ribbon) -> Option<RibbonSlot> {
    match generation {
        Generation::One | Generation::Two => None,
        Generation::Three => gen3_slot(ribbon),
        Generation::Four | Generation::Five => find_in_rows(&GEN4_ROWS, 0, ribbon),
        _ => modern_slot(generation, ribbon),
    }
}

pub fn read(data: &[u8], slot: RibbonSlot) -> bool {
    match slot {
        RibbonSlot::Flag { offset, bit } => data[offset] >> bit & 1 == 1,
        RibbonSlot::Rank {
            offset,
            shift,
            level,
        } => rank(data, offset, shift) >= level,
        RibbonSlot::Counter { offset } => data[offset] != 0,
    }
}

pub fn write(data: &mut [u8], slot: RibbonSlot, value: bool) {
    match slot {
        RibbonSlot::Flag { offset, bit } => {
            if value {
                data[offset] |= 1 << bit;
            } else {
                data[offset] &= !(1 << bit);
            }
        }
        RibbonSlot::Rank {
            offset,
            shift,
            level,
        } => {
            let current = rank(data, offset, shift);
            let next = if value {
                current.max(level)
            } else {
                current.min(level - 1)
            };
            let mut word = crate::endian::u32_le(data, offset);
            word = crate::endian::set_bits(word, u32::from(shift), 3, u32::from(next));
            crate::endian::set_u32_le(data, offset, word);
        }
        RibbonSlot::Counter { offset } => {
            if value {
                data[offset] = data[offset].max(1);
            } else {
                data[offset] = 0;
            }
        }
    }
}

fn rank(data: &[u8], offset: usize, shift: u8) -> u8 {
    crate::endian::get_bits(crate::endian::u32_le(data, offset), u32::from(shift), 3) as u8
}

/// Ribbons a generation can store.
pub fn supported(generation: Generation) -> impl Iterator<Item = Ribbon> {
    Ribbon::ALL
        .into_iter()
        .filter(move |r| slot(generation, *r).is_some())
}

/// Ribbons currently held by a decrypted record.
pub fn held(generation: Generation, data: &[u8]) -> Vec<Ribbon> {
    supported(generation)
        .filter(|r| slot(generation, *r).is_some_and(|s| read(data, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_list_matches_discriminants() {
        for (i, r) in Ribbon::ALL.iter().enumerate() {
            assert_eq!(r.index() as usize, i);
        }
    }

    #[test]
    fn gen3_contest_ranks_nest() {
        let mut data = vec![0u8; 80];
        let hyper = slot(Generation::Three, G3BeautyHyper).unwrap();
        write(&mut data, hyper, true);
        assert!(read(&data, slot(Generation::Three, G3Beauty).unwrap()));
        assert!(read(&data, slot(Generation::Three, G3BeautySuper).unwrap()));
        assert!(!read(&data, slot(Generation::Three, G3BeautyMaster).unwrap()));
        assert!(!read(&data, slot(Generation::Three, G3Cool).unwrap()));
        write(&mut data, slot(Generation::Three, G3BeautySuper).unwrap(), false);
        assert!(read(&data, slot(Generation::Three, G3Beauty).unwrap()));
        assert!(!read(&data, hyper));
    }

    #[test]
    fn gen3_flags_start_at_bit_15() {
        assert_eq!(
            slot(Generation::Three, ChampionG3Hoenn),
            Some(RibbonSlot::Flag { offset: 0x4D, bit: 7 })
        );
        assert_eq!(
            slot(Generation::Three, World),
            Some(RibbonSlot::Flag { offset: 0x4F, bit: 2 })
        );
    }

    #[test]
    fn alola_ribbons_need_generation_7() {
        assert!(slot(Generation::Six, ChampionAlola).is_none());
        assert!(slot(Generation::Six, MasterToughness).is_some());
        assert_eq!(
            slot(Generation::Seven, ChampionAlola),
            Some(RibbonSlot::Flag { offset: 0x35, bit: 5 })
        );
        assert_eq!(
            slot(Generation::Eight, ChampionGalar),
            Some(RibbonSlot::Flag { offset: 0x3A, bit: 1 })
        );
        assert!(slot(Generation::Seven, ChampionGalar).is_none());
        assert!(slot(Generation::Two, Event).is_none());
    }

    #[test]
    fn last_rows_of_generations_6_and_7_are_stored() {
        assert_eq!(
            slot(Generation::Six, MasterToughness),
            Some(RibbonSlot::Flag { offset: 0x35, bit: 4 })
        );
        assert!(slot(Generation::Six, BattleRoyale).is_none());
        assert_eq!(
            slot(Generation::Seven, BattleTreeMaster),
            Some(RibbonSlot::Flag { offset: 0x36, bit: 0 })
        );
        assert!(slot(Generation::Seven, TowerMaster).is_none());

        let mut data = vec![0u8; 0x40];
        let s = slot(Generation::Six, MasterToughness).unwrap();
        write(&mut data, s, true);
        assert!(read(&data, s));
        assert_eq!(data[0x35], 0x10);
    }

    #[test]
    fn flag_write_leaves_neighbours_alone() {
        let mut data = vec![0xFFu8; 0x64];
        let s = slot(Generation::Four, Footprint).unwrap();
        write(&mut data, s, false);
        assert_eq!(data[0x26], 0xFD);
        assert!(!read(&data, s));
        assert!(read(&data, slot(Generation::Four, Record).unwrap()));
    }
}
