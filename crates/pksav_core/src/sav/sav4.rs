//! Diamond/Pearl, Platinum and HeartGold/SoulSilver saves.
//!
//! The image holds two partitions, each with a general block and a storage
//! block. Every block ends in a footer carrying two save counters, its
//! size, a per-game magic and a CRC-16; the live copy of each block is
//! picked independently by counter.

use std::cmp::Ordering;

use crate::core_api::{CoreError, PlayTime, TrainerInfo, check_index};
use crate::endian::{set_u16_le, set_u32_le, u16_le, u32_le};
use crate::generation::{Game, Generation, Language};
use crate::pkm::{self, Pkm, pk4};
use crate::registry::TableRegistry;
use crate::text::g4;

use super::checksum::crc16_ccitt;
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::{
    PARTY_SLOTS, SaveFile, check_slot, check_species, compare_counters, dex_bit,
    ensure_editing, open_slot, pouch_at, put_party_slot, read_slot, seal_slot, set_dex_bit,
    stored_form, view_slot,
};

pub const SIZE: usize = 0x80000;
pub const SIZE_TRAILER: usize = 0x80010;

const PARTITION: usize = 0x40000;
const FOOTER_LEN: usize = 0x14;
const FOOTER_SAVE_COUNT: usize = 0x00;
const FOOTER_COUNTER: usize = 0x04;
const FOOTER_SIZE: usize = 0x08;
const FOOTER_MAGIC: usize = 0x0C;
const FOOTER_CRC: usize = 0x12;

const BOX_COUNT: usize = 18;
const BOX_SLOTS: usize = 30;
const MONEY_MAX: u32 = 999_999;

const DEX_MAGIC: u32 = 0xBEEF_CAFE;
const DEX_CAUGHT: usize = 0x04;
const DEX_SEEN: usize = 0x44;

const NAME_LEN: usize = 0x10;

struct Layout {
    game: Game,
    magic: u32,
    general_size: usize,
    storage_offset: usize,
    storage_size: usize,
    /// Start of box 0 inside the storage block, and the distance between boxes.
    box_start: usize,
    box_stride: usize,
    trainer: usize,
    party: usize,
    dex: usize,
    pouches: [PouchLayout; 8],
}

const fn plain(kind: PouchKind, offset: usize, capacity: usize) -> PouchLayout {
    PouchLayout::new(kind, offset, capacity, ItemFormat::Plain)
}

const DP: Layout = Layout {
    game: Game::DiamondPearl,
    magic: 0x2006_0623,
    general_size: 0xC100,
    storage_offset: 0xC100,
    storage_size: 0x121E0,
    box_start: 4,
    box_stride: BOX_SLOTS * pk4::BOX_LEN,
    trainer: 0x64,
    party: 0x98,
    dex: 0x12DC,
    pouches: [
        plain(PouchKind::Items, 0x624, 165),
        plain(PouchKind::KeyItems, 0x8B8, 50),
        plain(PouchKind::Tms, 0x980, 100),
        plain(PouchKind::Mail, 0xB10, 12),
        plain(PouchKind::Medicine, 0xB40, 40),
        plain(PouchKind::Berries, 0xBE0, 64),
        plain(PouchKind::Balls, 0xCE0, 15),
        plain(PouchKind::BattleItems, 0xD1C, 30),
    ],
};

const PT: Layout = Layout {
    game: Game::Platinum,
    magic: 0x2007_0903,
    general_size: 0xCF2C,
    storage_offset: 0xCF2C,
    storage_size: 0x121E4,
    box_start: 4,
    box_stride: BOX_SLOTS * pk4::BOX_LEN,
    trainer: 0x68,
    party: 0xA0,
    dex: 0x1328,
    pouches: [
        plain(PouchKind::Items, 0x630, 165),
        plain(PouchKind::KeyItems, 0x8C4, 50),
        plain(PouchKind::Tms, 0x98C, 100),
        plain(PouchKind::Mail, 0xB1C, 12),
        plain(PouchKind::Medicine, 0xB4C, 40),
        plain(PouchKind::Berries, 0xBEC, 64),
        plain(PouchKind::Balls, 0xCEC, 15),
        plain(PouchKind::BattleItems, 0xD28, 30),
    ],
};

const HGSS: Layout = Layout {
    game: Game::HeartGoldSoulSilver,
    magic: 0x2008_1116,
    general_size: 0xF628,
    storage_offset: 0xF700,
    storage_size: 0x12310,
    box_start: 0,
    box_stride: 0x1000,
    trainer: 0x64,
    party: 0x98,
    dex: 0x12B0,
    pouches: [
        plain(PouchKind::Items, 0x644, 165),
        plain(PouchKind::KeyItems, 0x8D8, 50),
        plain(PouchKind::Tms, 0x9A0, 101),
        plain(PouchKind::Mail, 0xB34, 12),
        plain(PouchKind::Medicine, 0xB64, 40),
        plain(PouchKind::Berries, 0xC04, 64),
        plain(PouchKind::Balls, 0xD04, 24),
        plain(PouchKind::BattleItems, 0xD64, 30),
    ],
};

/// Footer of the block at `start`, if it carries the expected size and
/// magic. Returns the block's save counter.
/// Save count and block counter of a valid footer.
fn block_counters(data: &[u8], start: usize, size: usize, magic: u32) -> Option<(u32, u32)> {
    let footer = start + size - FOOTER_LEN;
    let ok = u32_le(data, footer + FOOTER_SIZE) as usize == size
        && u32_le(data, footer + FOOTER_MAGIC) == magic;
    ok.then(|| {
        (
            u32_le(data, footer + FOOTER_SAVE_COUNT),
            u32_le(data, footer + FOOTER_COUNTER),
        )
    })
}

/// Absolute start of the live copy of a block at `offset` in each partition.
/// The save count decides, then the block counter; a full tie keeps the
/// first partition.
fn live_block(data: &[u8], offset: usize, size: usize, magic: u32) -> Option<usize> {
    let a = block_counters(data, offset, size, magic);
    let b = block_counters(data, PARTITION + offset, size, magic);
    match (a, b) {
        (Some(a), Some(b)) => {
            let order = compare_counters(a.0, b.0).then_with(|| compare_counters(a.1, b.1));
            Some(if order == Ordering::Less {
                PARTITION + offset
            } else {
                offset
            })
        }
        (Some(_), None) => Some(offset),
        (None, Some(_)) => Some(PARTITION + offset),
        (None, None) => None,
    }
}

#[derive(Clone)]
pub struct Sav4 {
    data: Vec<u8>,
    layout: &'static Layout,
    general: usize,
    storage: usize,
    editing: bool,
}

impl std::fmt::Debug for Sav4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav4")
            .field("game", &self.layout.game)
            .field("general", &self.general)
            .field("storage", &self.storage)
            .field("editing", &self.editing)
            .finish()
    }
}

impl Sav4 {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        if data.len() != SIZE && data.len() != SIZE_TRAILER {
            return None;
        }
        let (layout, general) = [&DP, &PT, &HGSS].into_iter().find_map(|l| {
            live_block(&data, 0, l.general_size, l.magic).map(|general| (l, general))
        })?;
        let storage = live_block(&data, layout.storage_offset, layout.storage_size, layout.magic)
            .unwrap_or(general + layout.storage_offset);
        let mut sav = Self {
            data,
            layout,
            general,
            storage,
            editing: false,
        };
        if sav.raw_party_count() > PARTY_SLOTS {
            return None;
        }
        log::debug!(
            "{} save, general block at {:#x}, storage at {:#x}",
            layout.game,
            general,
            storage
        );
        sav.begin_editing().ok()?;
        Some(sav)
    }

    fn g(&self, offset: usize) -> usize {
        self.general + offset
    }

    fn trainer_at(&self, offset: usize) -> usize {
        self.g(self.layout.trainer + offset)
    }

    fn raw_party_count(&self) -> usize {
        u32_le(&self.data, self.g(self.layout.party - 4)) as usize
    }

    fn slot_offset(&self, box_index: usize, slot: usize) -> usize {
        self.storage
            + self.layout.box_start
            + box_index * self.layout.box_stride
            + slot * pk4::BOX_LEN
    }

    fn party_offset(&self, slot: usize) -> usize {
        self.g(self.layout.party) + slot * pk4::PARTY_LEN
    }

    /// Every record slot in the live blocks, as (offset, length).
    fn slots(&self) -> Vec<(usize, usize)> {
        let boxes = (0..BOX_COUNT)
            .flat_map(|b| (0..BOX_SLOTS).map(move |s| (b, s)))
            .map(|(b, s)| (self.slot_offset(b, s), pk4::BOX_LEN));
        let party = (0..PARTY_SLOTS).map(|s| (self.party_offset(s), pk4::PARTY_LEN));
        boxes.chain(party).collect()
    }

    fn dex_at(&self) -> usize {
        self.g(self.layout.dex)
    }

    fn sign_block(&mut self, start: usize, size: usize) {
        let footer = start + size - FOOTER_LEN;
        let crc = crc16_ccitt(&self.data[start..footer]);
        set_u16_le(&mut self.data, footer + FOOTER_CRC, crc);
    }

    pub fn current_box(&self) -> usize {
        if self.layout.box_start == 0 {
            0
        } else {
            u32_le(&self.data, self.storage) as usize
        }
    }
}

impl SaveFile for Sav4 {
    fn game(&self) -> Game {
        self.layout.game
    }

    fn is_editing(&self) -> bool {
        self.editing
    }

    fn begin_editing(&mut self) -> Result<(), CoreError> {
        if self.editing {
            return Ok(());
        }
        for (at, len) in self.slots() {
            open_slot(Generation::Four, &mut self.data[at..at + len]);
        }
        self.editing = true;
        Ok(())
    }

    fn finish_editing(&mut self) -> Result<(), CoreError> {
        ensure_editing(self.editing, "finish_editing")?;
        for (at, len) in self.slots() {
            seal_slot(Generation::Four, &mut self.data[at..at + len]);
        }
        self.editing = false;
        self.resign()
    }

    fn resign(&mut self) -> Result<(), CoreError> {
        let l = self.layout;
        self.sign_block(self.general, l.general_size);
        self.sign_block(self.storage, l.storage_size);
        log::debug!("{} save resigned", l.game);
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn into_bytes(self: Box<Self>) -> Vec<u8> {
        self.data
    }

    fn trainer(&self) -> Result<TrainerInfo, CoreError> {
        let name_at = self.trainer_at(0);
        let d = &self.data;
        let mut info = TrainerInfo::new(
            g4::decode(&d[name_at..name_at + NAME_LEN]),
            u16_le(d, self.trainer_at(0x10)),
            u16_le(d, self.trainer_at(0x12)),
            self.version(),
        );
        info.money = u32_le(d, self.trainer_at(0x14));
        info.gender = d[self.trainer_at(0x18)];
        info.language = Language::from_raw(d[self.trainer_at(0x19)]).unwrap_or(Language::English);
        info.play_time = PlayTime {
            hours: u16_le(d, self.trainer_at(0x22)),
            minutes: d[self.trainer_at(0x24)],
            seconds: d[self.trainer_at(0x25)],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        let at = self.trainer_at(0);
        g4::encode(&mut self.data[at..at + NAME_LEN], name);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        let at = self.trainer_at(0x14);
        set_u32_le(&mut self.data, at, money.min(MONEY_MAX));
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
        let at = self.slot_offset(box_index, slot);
        read_slot(Generation::Four, &self.data[at..at + pk4::BOX_LEN])
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = self.slot_offset(box_index, slot);
        let dest = &mut self.data[at..at + pk4::BOX_LEN];
        if pkm.is_empty() {
            dest.fill(0);
        } else {
            dest.copy_from_slice(&stored_form(Generation::Four, pkm, false)?);
        }
        Ok(())
    }

    fn pkm_view(&mut self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm + '_>, CoreError> {
        ensure_editing(self.editing, "pkm_view")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = self.slot_offset(box_index, slot);
        view_slot(Generation::Four, &mut self.data[at..at + pk4::BOX_LEN])
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_index("party slot", slot, PARTY_SLOTS)?;
        if slot >= self.party_count()? {
            return Ok(pkm::blank(Generation::Four, true));
        }
        let at = self.party_offset(slot);
        read_slot(Generation::Four, &self.data[at..at + pk4::PARTY_LEN])
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let record = if pkm.is_empty() {
            None
        } else {
            Some(stored_form(Generation::Four, pkm, true)?)
        };
        let count = self.party_count()?;
        let start = self.party_offset(0);
        let slots = &mut self.data[start..start + PARTY_SLOTS * pk4::PARTY_LEN];
        let count = put_party_slot(slots, pk4::PARTY_LEN, count, slot, record.as_deref())?;
        let at = self.g(self.layout.party - 4);
        set_u32_le(&mut self.data, at, count as u32);
        Ok(())
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(Generation::Four, species)?;
        let dex = self.dex_at();
        set_u32_le(&mut self.data, dex, DEX_MAGIC);
        set_dex_bit(&mut self.data, dex + DEX_CAUGHT, species, true);
        set_dex_bit(&mut self.data, dex + DEX_SEEN, species, true);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Four, species)?;
        Ok(dex_bit(&self.data, self.dex_at() + DEX_CAUGHT, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Four, species)?;
        Ok(dex_bit(&self.data, self.dex_at() + DEX_SEEN, species))
    }

    fn pouches(&self) -> Vec<Pouch> {
        self.layout.pouches.iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        let layout = pouch_at(&self.layout.pouches, pouch)?;
        layout.item(&self.data[self.general..], slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        let layout = pouch_at(&self.layout.pouches, pouch)?;
        let general = self.general;
        layout.set_item(&mut self.data[general..], slot, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_footer(data: &mut [u8], start: usize, size: usize, magic: u32, counter: u32) {
        let footer = start + size - FOOTER_LEN;
        set_u32_le(data, footer + FOOTER_COUNTER, counter);
        set_u32_le(data, footer + FOOTER_SIZE, size as u32);
        set_u32_le(data, footer + FOOTER_MAGIC, magic);
    }

    fn image(layout: &Layout, counters: [u32; 2]) -> Vec<u8> {
        let mut data = vec![0u8; SIZE];
        for (p, counter) in counters.into_iter().enumerate() {
            let base = p * PARTITION;
            write_footer(&mut data, base, layout.general_size, layout.magic, counter);
            write_footer(
                &mut data,
                base + layout.storage_offset,
                layout.storage_size,
                layout.magic,
                counter,
            );
        }
        data
    }

    fn turtwig() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Four, false);
        pk.set_species(387);
        pk.set_pid(0x0BAD_F00D);
        pk.set_nickname("Turtwig");
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn detects_each_game_by_block_size() {
        assert_eq!(Sav4::new(image(&DP, [1, 0])).unwrap().game(), Game::DiamondPearl);
        assert_eq!(Sav4::new(image(&PT, [1, 0])).unwrap().game(), Game::Platinum);
        assert_eq!(
            Sav4::new(image(&HGSS, [1, 0])).unwrap().game(),
            Game::HeartGoldSoulSilver
        );
        assert!(Sav4::new(vec![0; SIZE]).is_none());
    }

    #[test]
    fn newer_partition_is_live() {
        let sav = Sav4::new(image(&PT, [3, 4])).unwrap();
        assert_eq!(sav.general, PARTITION);
        let sav = Sav4::new(image(&PT, [4, 3])).unwrap();
        assert_eq!(sav.general, 0);
    }

    #[test]
    fn block_counter_wraps_around() {
        let sav = Sav4::new(image(&PT, [u32::MAX, 0])).unwrap();
        assert_eq!(sav.general, PARTITION);
        assert_eq!(sav.storage, PARTITION + PT.storage_offset);
        let sav = Sav4::new(image(&PT, [0, u32::MAX])).unwrap();
        assert_eq!(sav.general, 0);
    }

    #[test]
    fn save_count_outranks_block_counter() {
        let mut data = image(&PT, [9, 2]);
        let footer = PARTITION + PT.general_size - FOOTER_LEN;
        set_u32_le(&mut data, footer + FOOTER_SAVE_COUNT, 1);
        let sav = Sav4::new(data).unwrap();
        assert_eq!(sav.general, PARTITION);
        assert_eq!(sav.storage, PT.storage_offset);
    }

    #[test]
    fn tied_counters_keep_the_first_partition() {
        let sav = Sav4::new(image(&PT, [6, 6])).unwrap();
        assert_eq!(sav.general, 0);
        assert_eq!(sav.storage, PT.storage_offset);
    }

    #[test]
    fn records_are_sealed_on_finish_and_reopen() {
        let mut sav = Sav4::new(image(&HGSS, [1, 0])).unwrap();
        sav.set_pkm(2, 29, turtwig().as_ref()).unwrap();
        sav.set_party_pkm(0, turtwig().as_ref()).unwrap();
        sav.set_money(5_000_000).unwrap();
        sav.finish_editing().unwrap();

        let at = sav.slot_offset(2, 29);
        assert_ne!(u32_le(&sav.data, at + 0x64), 0);
        let footer = sav.storage + HGSS.storage_size - FOOTER_LEN;
        assert_eq!(
            u16_le(&sav.data, footer + FOOTER_CRC),
            crc16_ccitt(&sav.data[sav.storage..footer])
        );

        let reopened = Sav4::new(sav.data).unwrap();
        let pk = reopened.pkm(2, 29).unwrap();
        assert_eq!(pk.species(), 387);
        assert_eq!(pk.nickname(), "Turtwig");
        assert!(pk.is_valid_checksum());
        assert_eq!(reopened.party_count().unwrap(), 1);
        assert!(reopened.party_pkm(0).unwrap().is_party());
        assert_eq!(reopened.trainer().unwrap().money, MONEY_MAX);
    }

    #[test]
    fn views_edit_the_image_in_place() {
        let mut sav = Sav4::new(image(&DP, [1, 0])).unwrap();
        sav.set_pkm(0, 0, turtwig().as_ref()).unwrap();
        {
            let mut view = sav.pkm_view(0, 0).unwrap();
            view.set_held_item(1);
            view.refresh_checksum();
        }
        assert_eq!(sav.pkm(0, 0).unwrap().held_item(), 1);
        sav.finish_editing().unwrap();
        assert!(sav.pkm_view(0, 0).is_err());
        assert_eq!(sav.pkm(0, 0).unwrap().held_item(), 1);
    }

    #[test]
    fn dex_and_bag_live_in_the_general_block() {
        let mut sav = Sav4::new(image(&PT, [1, 2])).unwrap();
        sav.dex_update(turtwig().as_ref(), &TableRegistry::new()).unwrap();
        assert!(sav.dex_caught(387).unwrap());
        assert!(!sav.dex_seen(388).unwrap());
        assert_eq!(u32_le(&sav.data, PARTITION + PT.dex), DEX_MAGIC);

        sav.set_item(6, 0, &ItemStack::new(4, 30)).unwrap();
        assert_eq!(u16_le(&sav.data, PARTITION + 0xCEC + 2), 30);
        assert_eq!(sav.pouches()[6].kind, PouchKind::Balls);
    }
}
