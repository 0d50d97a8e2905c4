//! Ruby/Sapphire, Emerald and FireRed/LeafGreen saves.
//!
//! The flash holds two copies of the game, each fourteen 4 KiB sectors
//! written in a rotating order. Every sector carries a footer with its
//! logical id, a word-sum checksum and the save counter; the copy with the
//! newer counter is the live one. PC storage is split across sectors 5 to
//! 13 and is handled as one contiguous buffer.

use std::cmp::Ordering;

use crate::core_api::{CoreError, PlayTime, TrainerInfo, check_index};
use crate::endian::{set_u16_le, set_u32_le, u16_le, u32_le};
use crate::generation::{Game, Generation, Language};
use crate::pkm::{self, Pkm, pk3};
use crate::registry::TableRegistry;
use crate::text::g3;

use super::checksum::sector_sum;
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::{
    PARTY_SLOTS, SaveFile, check_slot, check_species, compare_counters, dex_bit,
    ensure_editing, pouch_at, put_party_slot, read_slot, set_dex_bit,
};

pub const SIZE: usize = 0x20000;
pub const SIZE_TRAILER: usize = 0x20010;
pub const SIZE_HALF: usize = 0x10000;

const SECTOR_SIZE: usize = 0x1000;
const SECTOR_COUNT: usize = 14;
const HALF_B: usize = 0xE000;
const SECTOR_ID: usize = 0xFF4;
const SECTOR_CHECKSUM: usize = 0xFF6;
const SECTOR_SIGNATURE: usize = 0xFF8;
const SECTOR_COUNTER: usize = 0xFFC;
const SIGNATURE: u32 = 0x0801_2025;
const CHECKED_LEN: [usize; SECTOR_COUNT] = [
    0xF2C, 0xF80, 0xF80, 0xF80, 0xF08, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80,
    0x7D0,
];

const STORAGE_FIRST_SECTOR: usize = 5;
const STORAGE_CHUNK: usize = 0xF80;
const BOX_COUNT: usize = 14;
const BOX_SLOTS: usize = 30;
const BOX_DATA: usize = 4;
const BOX_NAMES: usize = 0x8344;
const BOX_NAME_LEN: usize = 9;

const OT_NAME: std::ops::Range<usize> = 0x00..0x07;
const GENDER: usize = 0x08;
const TID: usize = 0x0A;
const SID: usize = 0x0C;
const PLAY_TIME: usize = 0x0E;
const GAME_CODE: usize = 0xAC;
const DEX_UNOWN_PID: usize = 0x1C;
const DEX_SPINDA_PID: usize = 0x20;
const DEX_OWNED: usize = 0x28;
const DEX_SEEN: usize = 0x5C;
const BATTLE_POINTS: usize = 0xEB8;
const COINS_MAX: u16 = 9999;
const MONEY_MAX: u32 = 999_999;

/// Sector 1 and 4 offsets that move between the three games.
struct Layout {
    game: Game,
    party: usize,
    money: usize,
    pc_items: PouchLayout,
    pouches: [(PouchKind, usize, usize); 5],
    seen_copies: [(usize, usize); 2],
}

const RS: Layout = Layout {
    game: Game::RubySapphire,
    party: 0x234,
    money: 0x490,
    pc_items: PouchLayout::new(PouchKind::Pc, 0x498, 50, ItemFormat::Gen3 { key: 0 }),
    pouches: [
        (PouchKind::Items, 0x560, 20),
        (PouchKind::KeyItems, 0x5B0, 20),
        (PouchKind::Balls, 0x600, 16),
        (PouchKind::Tms, 0x640, 64),
        (PouchKind::Berries, 0x740, 46),
    ],
    seen_copies: [(1, 0x938), (4, 0xC0C)],
};

const EMERALD: Layout = Layout {
    game: Game::Emerald,
    party: 0x234,
    money: 0x490,
    pc_items: PouchLayout::new(PouchKind::Pc, 0x498, 50, ItemFormat::Gen3 { key: 0 }),
    pouches: [
        (PouchKind::Items, 0x560, 30),
        (PouchKind::KeyItems, 0x5D8, 30),
        (PouchKind::Balls, 0x650, 16),
        (PouchKind::Tms, 0x690, 64),
        (PouchKind::Berries, 0x790, 46),
    ],
    seen_copies: [(1, 0x988), (4, 0xCA4)],
};

const FRLG: Layout = Layout {
    game: Game::FireRedLeafGreen,
    party: 0x34,
    money: 0x290,
    pc_items: PouchLayout::new(PouchKind::Pc, 0x298, 30, ItemFormat::Gen3 { key: 0 }),
    pouches: [
        (PouchKind::Items, 0x310, 42),
        (PouchKind::KeyItems, 0x3B8, 30),
        (PouchKind::Balls, 0x430, 13),
        (PouchKind::Tms, 0x464, 58),
        (PouchKind::Berries, 0x54C, 43),
    ],
    seen_copies: [(1, 0x5F8), (4, 0xB98)],
};

/// One complete copy of the game: absolute sector offsets by logical id.
#[derive(Debug, Clone, Copy)]
struct Half {
    sectors: [usize; SECTOR_COUNT],
    counter: u32,
}

fn read_half(data: &[u8], base: usize) -> Option<Half> {
    let mut sectors = [usize::MAX; SECTOR_COUNT];
    let mut counter = 0;
    for i in 0..SECTOR_COUNT {
        let at = base + i * SECTOR_SIZE;
        if u32_le(data, at + SECTOR_SIGNATURE) != SIGNATURE {
            return None;
        }
        let id = usize::from(u16_le(data, at + SECTOR_ID));
        if id >= SECTOR_COUNT || sectors[id] != usize::MAX {
            return None;
        }
        sectors[id] = at;
        counter = u32_le(data, at + SECTOR_COUNTER);
    }
    Some(Half { sectors, counter })
}

/// Picks the live copy. Both complete: the newer counter, ties to the
/// second copy. One complete: that one.
fn select_half(a: Option<Half>, b: Option<Half>) -> Option<Half> {
    match (a, b) {
        (Some(a), Some(b)) => Some(match compare_counters(a.counter, b.counter) {
            Ordering::Greater => a,
            _ => b,
        }),
        (a, b) => a.or(b),
    }
}

#[derive(Clone)]
pub struct Sav3 {
    data: Vec<u8>,
    layout: &'static Layout,
    half: Half,
    security_key: u32,
    editing: bool,
}

impl std::fmt::Debug for Sav3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav3")
            .field("game", &self.layout.game)
            .field("counter", &self.half.counter)
            .field("editing", &self.editing)
            .finish()
    }
}

impl Sav3 {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        let half = match data.len() {
            SIZE | SIZE_TRAILER => {
                select_half(read_half(&data, 0), read_half(&data, HALF_B))?
            }
            SIZE_HALF => read_half(&data, 0)?,
            _ => return None,
        };
        let s0 = half.sectors[0];
        let (layout, security_key) = match u32_le(&data, s0 + GAME_CODE) {
            0 => (&RS, 0),
            1 => (&FRLG, u32_le(&data, s0 + 0xAF8)),
            key => (&EMERALD, key),
        };
        for (id, &at) in half.sectors.iter().enumerate() {
            if sector_sum(&data[at..at + CHECKED_LEN[id]]) != u16_le(&data, at + SECTOR_CHECKSUM) {
                log::warn!("sector {id} checksum mismatch");
            }
        }
        let sav = Self {
            data,
            layout,
            half,
            security_key,
            editing: true,
        };
        if sav.raw_party_count() > PARTY_SLOTS {
            return None;
        }
        log::debug!(
            "{} save, counter {}, sector 0 at {:#x}",
            layout.game,
            half.counter,
            half.sectors[0]
        );
        Some(sav)
    }

    fn sector(&self, id: usize) -> &[u8] {
        let at = self.half.sectors[id];
        &self.data[at..at + SECTOR_SIZE]
    }

    fn sector_mut(&mut self, id: usize) -> &mut [u8] {
        let at = self.half.sectors[id];
        &mut self.data[at..at + SECTOR_SIZE]
    }

    pub fn save_counter(&self) -> u32 {
        self.half.counter
    }

    fn storage_read(&self, offset: usize, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut pos = offset;
        while out.len() < len {
            let sector = STORAGE_FIRST_SECTOR + pos / STORAGE_CHUNK;
            let within = pos % STORAGE_CHUNK;
            let n = (STORAGE_CHUNK - within).min(len - out.len());
            out.extend_from_slice(&self.sector(sector)[within..within + n]);
            pos += n;
        }
        out
    }

    fn storage_write(&mut self, offset: usize, bytes: &[u8]) {
        let mut pos = offset;
        let mut rest = bytes;
        while !rest.is_empty() {
            let sector = STORAGE_FIRST_SECTOR + pos / STORAGE_CHUNK;
            let within = pos % STORAGE_CHUNK;
            let n = (STORAGE_CHUNK - within).min(rest.len());
            self.sector_mut(sector)[within..within + n].copy_from_slice(&rest[..n]);
            pos += n;
            rest = &rest[n..];
        }
    }

    fn slot_offset(box_index: usize, slot: usize) -> usize {
        BOX_DATA + (box_index * BOX_SLOTS + slot) * pk3::BOX_LEN
    }

    pub fn current_box(&self) -> usize {
        u32_le(&self.storage_read(0, 4), 0) as usize
    }

    pub fn box_name(&self, box_index: usize) -> Result<String, CoreError> {
        check_index("box", box_index, BOX_COUNT)?;
        let raw = self.storage_read(BOX_NAMES + box_index * BOX_NAME_LEN, BOX_NAME_LEN);
        Ok(g3::decode(&raw))
    }

    fn raw_party_count(&self) -> usize {
        u32_le(self.sector(1), self.layout.party) as usize
    }

    fn party_slots_mut(&mut self) -> &mut [u8] {
        let start = self.layout.party + 4;
        &mut self.sector_mut(1)[start..start + PARTY_SLOTS * pk3::PARTY_LEN]
    }

    fn pouch_layouts(&self) -> Vec<PouchLayout> {
        let key = self.security_key as u16;
        let mut layouts: Vec<PouchLayout> = self
            .layout
            .pouches
            .iter()
            .map(|&(kind, offset, capacity)| {
                PouchLayout::new(kind, offset, capacity, ItemFormat::Gen3 { key })
            })
            .collect();
        layouts.push(self.layout.pc_items);
        layouts
    }

    pub fn coins(&self) -> u16 {
        u16_le(self.sector(1), self.layout.money + 4) ^ self.security_key as u16
    }

    pub fn set_coins(&mut self, coins: u16) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_coins")?;
        let value = coins.min(COINS_MAX) ^ self.security_key as u16;
        let at = self.layout.money + 4;
        set_u16_le(self.sector_mut(1), at, value);
        Ok(())
    }

    /// Battle Frontier points; only Emerald has them.
    pub fn battle_points(&self) -> Option<u16> {
        (self.layout.game == Game::Emerald).then(|| u16_le(self.sector(0), BATTLE_POINTS))
    }

    /// Encrypted stored form of `pkm`, zeroed when the record is empty.
    fn stored(pkm: &dyn Pkm, len: usize) -> Result<Vec<u8>, CoreError> {
        let mut out = vec![0u8; len];
        if pkm.is_empty() {
            return Ok(out);
        }
        if pkm.generation() != Generation::Three {
            return Err(CoreError::unsupported(format!(
                "a {} record cannot be stored in a generation 3 save; convert it first",
                pkm.generation()
            )));
        }
        let mut owned = pkm.to_owned_pkm();
        owned.refresh_checksum();
        let sealed = owned.encrypted_bytes();
        let n = sealed.len().min(len);
        out[..n].copy_from_slice(&sealed[..n]);
        Ok(out)
    }
}

impl SaveFile for Sav3 {
    fn game(&self) -> Game {
        self.layout.game
    }

    fn is_editing(&self) -> bool {
        self.editing
    }

    fn begin_editing(&mut self) -> Result<(), CoreError> {
        self.editing = true;
        Ok(())
    }

    fn finish_editing(&mut self) -> Result<(), CoreError> {
        ensure_editing(self.editing, "finish_editing")?;
        self.resign()?;
        self.editing = false;
        Ok(())
    }

    fn resign(&mut self) -> Result<(), CoreError> {
        for id in 0..SECTOR_COUNT {
            let at = self.half.sectors[id];
            let sum = sector_sum(&self.data[at..at + CHECKED_LEN[id]]);
            set_u16_le(&mut self.data, at + SECTOR_CHECKSUM, sum);
        }
        log::debug!("{} save resigned", self.layout.game);
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn into_bytes(self: Box<Self>) -> Vec<u8> {
        self.data
    }

    fn trainer(&self) -> Result<TrainerInfo, CoreError> {
        let s0 = self.sector(0);
        let mut info = TrainerInfo::new(
            g3::decode(&s0[OT_NAME]),
            u16_le(s0, TID),
            u16_le(s0, SID),
            self.version(),
        );
        info.gender = s0[GENDER];
        info.language = Language::English;
        info.money = u32_le(self.sector(1), self.layout.money) ^ self.security_key;
        info.play_time = PlayTime {
            hours: u16_le(s0, PLAY_TIME),
            minutes: s0[PLAY_TIME + 2],
            seconds: s0[PLAY_TIME + 3],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        g3::encode(&mut self.sector_mut(0)[OT_NAME], name);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        let value = money.min(MONEY_MAX) ^ self.security_key;
        let at = self.layout.money;
        set_u32_le(self.sector_mut(1), at, value);
        Ok(())
    }

    fn box_count(&self) -> usize {
        BOX_COUNT
    }

    fn slots_per_box(&self) -> usize {
        BOX_SLOTS
    }

    fn party_count(&self) -> Result<usize, CoreError> {
        Ok(self.raw_party_count().min(PARTY_SLOTS))
    }

    fn pkm(&self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let raw = self.storage_read(Self::slot_offset(box_index, slot), pk3::BOX_LEN);
        read_slot(Generation::Three, &raw)
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let stored = Self::stored(pkm, pk3::BOX_LEN)?;
        self.storage_write(Self::slot_offset(box_index, slot), &stored);
        Ok(())
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_index("party slot", slot, PARTY_SLOTS)?;
        if slot >= self.party_count()? {
            return Ok(pkm::blank(Generation::Three, true));
        }
        let at = self.layout.party + 4 + slot * pk3::PARTY_LEN;
        read_slot(Generation::Three, &self.sector(1)[at..at + pk3::PARTY_LEN])
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let record = if pkm.is_empty() {
            None
        } else {
            Some(Self::stored(pkm, pk3::PARTY_LEN)?)
        };
        let count = self.party_count()?;
        let count = put_party_slot(
            self.party_slots_mut(),
            pk3::PARTY_LEN,
            count,
            slot,
            record.as_deref(),
        )?;
        let at = self.layout.party;
        set_u32_le(self.sector_mut(1), at, count as u32);
        Ok(())
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(Generation::Three, species)?;
        let first_sighting = !dex_bit(self.sector(0), DEX_SEEN, species);
        let pid_slot = match species {
            201 => Some(DEX_UNOWN_PID),
            327 => Some(DEX_SPINDA_PID),
            _ => None,
        };
        if let (true, Some(at)) = (first_sighting, pid_slot) {
            set_u32_le(self.sector_mut(0), at, pkm.pid());
        }
        set_dex_bit(self.sector_mut(0), DEX_OWNED, species, true);
        set_dex_bit(self.sector_mut(0), DEX_SEEN, species, true);
        for (sector, offset) in self.layout.seen_copies {
            set_dex_bit(self.sector_mut(sector), offset, species, true);
        }
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Three, species)?;
        Ok(dex_bit(self.sector(0), DEX_OWNED, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Three, species)?;
        Ok(dex_bit(self.sector(0), DEX_SEEN, species))
    }

    fn pouches(&self) -> Vec<Pouch> {
        self.pouch_layouts().iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        let layouts = self.pouch_layouts();
        pouch_at(&layouts, pouch)?.item(self.sector(1), slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        let layouts = self.pouch_layouts();
        let layout = *pouch_at(&layouts, pouch)?;
        layout.set_item(self.sector_mut(1), slot, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes one complete copy with the sectors rotated by `rotation`.
    fn write_half(data: &mut [u8], base: usize, counter: u32, rotation: usize, game_code: u32) {
        for i in 0..SECTOR_COUNT {
            let id = (i + rotation) % SECTOR_COUNT;
            let at = base + i * SECTOR_SIZE;
            if id == 0 {
                set_u32_le(data, at + GAME_CODE, game_code);
            }
            set_u16_le(data, at + SECTOR_ID, id as u16);
            set_u32_le(data, at + SECTOR_SIGNATURE, SIGNATURE);
            set_u32_le(data, at + SECTOR_COUNTER, counter);
            let sum = sector_sum(&data[at..at + CHECKED_LEN[id]]);
            set_u16_le(data, at + SECTOR_CHECKSUM, sum);
        }
    }

    fn image(counters: [Option<u32>; 2], game_code: u32) -> Vec<u8> {
        let mut data = vec![0u8; SIZE];
        for (half, counter) in counters.into_iter().enumerate() {
            if let Some(counter) = counter {
                write_half(&mut data, half * HALF_B, counter, half * 3, game_code);
            }
        }
        data
    }

    fn mudkip() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Three, false);
        pk.set_species(258);
        pk.set_pid(0x1234_5678);
        pk.set_tid(4321);
        pk.set_nickname("MUDKIP");
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn newer_counter_wins_and_ties_go_to_the_second_copy() {
        let sav = Sav3::new(image([Some(5), Some(7)], 0)).unwrap();
        assert_eq!(sav.save_counter(), 7);
        assert!(sav.half.sectors[0] >= HALF_B);

        let sav = Sav3::new(image([Some(9), Some(9)], 0)).unwrap();
        assert!(sav.half.sectors[0] >= HALF_B);

        let sav = Sav3::new(image([Some(0), Some(u32::MAX)], 0)).unwrap();
        assert_eq!(sav.save_counter(), 0);
    }

    #[test]
    fn incomplete_copy_is_skipped() {
        let mut data = image([Some(5), Some(7)], 0);
        let b_sector0 = (0..SECTOR_COUNT)
            .map(|i| HALF_B + i * SECTOR_SIZE)
            .find(|&at| u16_le(&data, at + SECTOR_ID) == 0)
            .unwrap();
        set_u16_le(&mut data, b_sector0 + SECTOR_ID, 1);
        let sav = Sav3::new(data).unwrap();
        assert_eq!(sav.save_counter(), 5);
        assert!(Sav3::new(vec![0u8; SIZE]).is_none());
    }

    #[test]
    fn game_code_selects_the_layout() {
        assert_eq!(Sav3::new(image([Some(1), None], 0)).unwrap().game(), Game::RubySapphire);
        assert_eq!(
            Sav3::new(image([Some(1), None], 1)).unwrap().game(),
            Game::FireRedLeafGreen
        );
        let emerald = Sav3::new(image([Some(1), None], 0xA5A5_0F0F)).unwrap();
        assert_eq!(emerald.game(), Game::Emerald);
        assert_eq!(emerald.battle_points(), Some(0));
    }

    #[test]
    fn money_and_bag_are_keyed() {
        let mut sav = Sav3::new(image([Some(1), None], 0xA5A5_0F0F)).unwrap();
        sav.set_money(3000).unwrap();
        sav.set_coins(20_000).unwrap();
        let raw = u32_le(sav.sector(1), EMERALD.money);
        assert_eq!(raw, 3000 ^ 0xA5A5_0F0F);
        assert_eq!(sav.trainer().unwrap().money, 3000);
        assert_eq!(sav.coins(), COINS_MAX);

        sav.set_item(2, 0, &ItemStack::new(4, 5)).unwrap();
        assert_eq!(sav.item(2, 0).unwrap(), ItemStack::new(4, 5));
        let pc = sav.pouches().len() - 1;
        sav.set_item(pc, 0, &ItemStack::new(13, 1)).unwrap();
        assert_eq!(u16_le(sav.sector(1), EMERALD.pc_items.offset + 2), 1);
    }

    #[test]
    fn box_records_cross_sector_boundaries() {
        let mut sav = Sav3::new(image([Some(1), Some(2)], 0)).unwrap();
        // box 1 slot 19 straddles sectors 5 and 6
        let (b, s) = (1, 19);
        let at = Sav3::slot_offset(b, s);
        assert!(at < STORAGE_CHUNK && at + pk3::BOX_LEN > STORAGE_CHUNK);

        sav.set_pkm(b, s, mudkip().as_ref()).unwrap();
        sav.finish_editing().unwrap();
        let reopened = Sav3::new(sav.data).unwrap();
        let pk = reopened.pkm(b, s).unwrap();
        assert_eq!(pk.species(), 258);
        assert_eq!(pk.nickname(), "MUDKIP");
        assert!(pk.is_valid_checksum());
        assert!(reopened.pkm(0, 0).unwrap().is_empty());
    }

    #[test]
    fn party_and_dex_updates() {
        let mut sav = Sav3::new(image([Some(1), None], 1)).unwrap();
        let pk = mudkip();
        sav.set_party_pkm(3, pk.as_ref()).unwrap();
        assert_eq!(sav.party_count().unwrap(), 1);
        assert_eq!(sav.party_pkm(0).unwrap().species(), 258);
        assert!(sav.party_pkm(1).unwrap().is_empty());

        sav.dex_update(pk.as_ref(), &TableRegistry::new()).unwrap();
        assert!(sav.dex_caught(258).unwrap());
        assert!(dex_bit(sav.sector(4), FRLG.seen_copies[1].1, 258));

        let mut unown = pkm::blank(Generation::Three, false);
        unown.set_species(201);
        unown.set_pid(0xCAFE);
        sav.dex_update(unown.as_ref(), &TableRegistry::new()).unwrap();
        assert_eq!(u32_le(sav.sector(0), DEX_UNOWN_PID), 0xCAFE);

        sav.set_party_pkm(0, sav.empty_pkm().as_ref()).unwrap();
        assert_eq!(sav.party_count().unwrap(), 0);
    }

    #[test]
    fn foreign_records_are_refused() {
        let mut sav = Sav3::new(image([Some(1), None], 0)).unwrap();
        let mut pk = pkm::blank(Generation::Four, false);
        pk.set_species(1);
        assert!(sav.set_pkm(0, 0, pk.as_ref()).is_err());
        sav.finish_editing().unwrap();
        assert!(sav.set_pkm(0, 0, mudkip().as_ref()).is_err());
    }
}
