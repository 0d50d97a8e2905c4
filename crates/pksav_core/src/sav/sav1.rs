//! Red/Blue/Yellow save (international layout). The current box lives in
//! the main bank while the game runs; the copy in the box banks is stale
//! until the player switches boxes, so both are kept in sync on resign.

use crate::core_api::{CoreError, CoreErrorCode, PlayTime, TrainerInfo};
use crate::endian::{bcd_decode, bcd_encode, bcd_max, u16_be};
use crate::generation::{Game, Generation, Language};
use crate::pkm::pk1::{self, DATA_BOX_LEN, DATA_PARTY_LEN, NAME_LEN};
use crate::pkm::{Pk1, Pkm};
use crate::registry::TableRegistry;
use crate::text::g12;

use super::checksum::gb_sum8;
use super::gb::{GbEntry, GbList};
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::{SaveFile, check_slot, check_species, dex_bit, ensure_editing, pouch_at, set_dex_bit};

pub const SIZE: usize = 0x8000;
pub const SIZE_RTC: usize = 0x802C;

const OT_NAME: usize = 0x2598;
const DEX_OWNED: usize = 0x25A3;
const DEX_SEEN: usize = 0x25B6;
const MONEY: usize = 0x25F3;
const TID: usize = 0x2605;
const CURRENT_BOX_INDEX: usize = 0x284C;
const PLAY_TIME: usize = 0x2CED;
const PARTY: GbList = GbList::new(0x2F2C, 6, DATA_PARTY_LEN, NAME_LEN);
const CURRENT_BOX: usize = 0x30C0;
const MAIN: std::ops::Range<usize> = 0x2598..0x3523;
const CHECKSUM: usize = 0x3523;

const BOX_COUNT: usize = 12;
const BOX_SLOTS: usize = 20;
const BOX_SIZE: usize = 0x462;
const BOXES_PER_BANK: usize = 6;
const BANKS: [usize; 2] = [0x4000, 0x6000];

const POUCHES: [PouchLayout; 2] = [
    PouchLayout::counted(PouchKind::Items, 0x25C9, 20, ItemFormat::Gb1),
    PouchLayout::counted(PouchKind::Pc, 0x27E6, 50, ItemFormat::Gb1),
];

#[derive(Debug, Clone)]
pub struct Sav1 {
    data: Vec<u8>,
    editing: bool,
}

impl Sav1 {
    /// Accepts the plain and RTC-trailer sizes when the main checksum holds.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        if data.len() != SIZE && data.len() != SIZE_RTC {
            return None;
        }
        if gb_sum8(&data[MAIN]) != data[CHECKSUM] {
            log::trace!("generation 1 main checksum mismatch");
            return None;
        }
        let sav = Self {
            data,
            editing: true,
        };
        if sav.data[PARTY.offset] > 6 || sav.current_box() >= BOX_COUNT {
            return None;
        }
        Some(sav)
    }

    pub fn current_box(&self) -> usize {
        usize::from(self.data[CURRENT_BOX_INDEX] & 0x7F)
    }

    fn box_list(&self, box_index: usize) -> GbList {
        let offset = if box_index == self.current_box() {
            CURRENT_BOX
        } else {
            bank_offset(box_index)
        };
        GbList::new(offset, BOX_SLOTS, DATA_BOX_LEN, NAME_LEN)
    }

    fn read_entry(entry: Option<GbEntry<'_>>, party: bool) -> Result<Box<dyn Pkm>, CoreError> {
        let Some(e) = entry else {
            return Ok(Box::new(Pk1::blank(party)));
        };
        let pk = Pk1::from_parts(e.data, e.ot_name, e.nickname).ok_or_else(|| {
            CoreError::new(CoreErrorCode::Parse, "malformed generation 1 list entry")
        })?;
        Ok(Box::new(pk))
    }

    fn write_entry(
        list: &GbList,
        d: &mut [u8],
        slot: usize,
        pkm: &dyn Pkm,
    ) -> Result<(), CoreError> {
        if pkm.is_empty() {
            return list.remove(d, slot);
        }
        let (data, ot, nick) = split_record(pkm, list.data_len)?;
        let entry = GbEntry {
            list_species: data[0],
            data: &data,
            ot_name: ot,
            nickname: nick,
        };
        list.put(d, slot, &entry)?;
        Ok(())
    }
}

fn bank_offset(box_index: usize) -> usize {
    BANKS[box_index / BOXES_PER_BANK] + (box_index % BOXES_PER_BANK) * BOX_SIZE
}

/// Splits a generation 1 record into its list parts, resizing the data
/// block to `data_len`. A box block grown to party size carries its level
/// into the party level byte.
fn split_record(pkm: &dyn Pkm, data_len: usize) -> Result<(Vec<u8>, &[u8], &[u8]), CoreError> {
    if pkm.generation() != Generation::One {
        return Err(CoreError::unsupported(format!(
            "a {} record cannot be stored in a generation 1 save",
            pkm.generation()
        )));
    }
    let bytes = pkm.bytes();
    if bytes.len() != pk1::BOX_LEN && bytes.len() != pk1::PARTY_LEN {
        return Err(CoreError::unsupported(
            "Japanese records cannot be stored in an international save",
        ));
    }
    let own_len = bytes.len() - 2 * NAME_LEN;
    let mut data = vec![0u8; data_len];
    let n = own_len.min(data_len);
    data[..n].copy_from_slice(&bytes[..n]);
    if data_len == DATA_PARTY_LEN && own_len == DATA_BOX_LEN {
        data[0x21] = data[0x03];
    }
    let ot = &bytes[own_len..own_len + NAME_LEN];
    let nick = &bytes[own_len + NAME_LEN..own_len + 2 * NAME_LEN];
    Ok((data, ot, nick))
}

impl SaveFile for Sav1 {
    fn game(&self) -> Game {
        Game::RedBlueYellow
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
        let current = self.current_box();
        let bank_copy = bank_offset(current);
        self.data
            .copy_within(CURRENT_BOX..CURRENT_BOX + BOX_SIZE, bank_copy);

        for (bank_index, &bank) in BANKS.iter().enumerate() {
            let boxes_end = bank + BOXES_PER_BANK * BOX_SIZE;
            for i in 0..BOXES_PER_BANK {
                let start = bank + i * BOX_SIZE;
                self.data[boxes_end + 1 + i] = gb_sum8(&self.data[start..start + BOX_SIZE]);
            }
            self.data[boxes_end] = gb_sum8(&self.data[bank..boxes_end]);
            log::trace!("bank {} resigned", bank_index + 2);
        }
        self.data[CHECKSUM] = gb_sum8(&self.data[MAIN]);
        log::debug!("generation 1 save resigned");
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn into_bytes(self: Box<Self>) -> Vec<u8> {
        self.data
    }

    fn trainer(&self) -> Result<TrainerInfo, CoreError> {
        let name = g12::decode(&self.data[OT_NAME..OT_NAME + NAME_LEN]);
        let mut info = TrainerInfo::new(name, u16_be(&self.data, TID), 0, self.version());
        info.language = Language::English;
        info.money = bcd_decode(&self.data[MONEY..MONEY + 3]);
        info.play_time = PlayTime {
            hours: u16::from(self.data[PLAY_TIME]),
            minutes: self.data[PLAY_TIME + 2],
            seconds: self.data[PLAY_TIME + 3],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        g12::encode(&mut self.data[OT_NAME..OT_NAME + NAME_LEN], name);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        bcd_encode(&mut self.data[MONEY..MONEY + 3], money.min(bcd_max(3)));
        Ok(())
    }

    fn box_count(&self) -> usize {
        BOX_COUNT
    }

    fn slots_per_box(&self) -> usize {
        BOX_SLOTS
    }

    fn party_count(&self) -> Result<usize, CoreError> {
        Ok(PARTY.count(&self.data))
    }

    fn empty_pkm(&self) -> Box<dyn Pkm> {
        Box::new(Pk1::blank(false))
    }

    fn pkm(&self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let list = self.box_list(box_index);
        Self::read_entry(list.entry(&self.data, slot)?, false)
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let list = self.box_list(box_index);
        Self::write_entry(&list, &mut self.data, slot, pkm)
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        Self::read_entry(PARTY.entry(&self.data, slot)?, true)
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        Self::write_entry(&PARTY, &mut self.data, slot, pkm)
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        let species = pkm.species();
        check_species(Generation::One, species)?;
        set_dex_bit(&mut self.data, DEX_OWNED, species, true);
        set_dex_bit(&mut self.data, DEX_SEEN, species, true);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::One, species)?;
        Ok(dex_bit(&self.data, DEX_OWNED, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::One, species)?;
        Ok(dex_bit(&self.data, DEX_SEEN, species))
    }

    fn pouches(&self) -> Vec<Pouch> {
        POUCHES.iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        pouch_at(&POUCHES, pouch)?.item(&self.data, slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        pouch_at(&POUCHES, pouch)?.set_item(&mut self.data, slot, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Sav1 {
        let mut sav = Sav1 {
            data: vec![0; SIZE],
            editing: true,
        };
        PARTY.clear(&mut sav.data);
        for b in 0..BOX_COUNT {
            GbList::new(bank_offset(b), BOX_SLOTS, DATA_BOX_LEN, NAME_LEN).clear(&mut sav.data);
        }
        GbList::new(CURRENT_BOX, BOX_SLOTS, DATA_BOX_LEN, NAME_LEN).clear(&mut sav.data);
        for pouch in &POUCHES {
            sav.data[pouch.offset + 1] = 0xFF;
        }
        sav.resign().unwrap();
        Sav1::new(sav.data).unwrap()
    }

    fn pikachu(level: u8) -> Pk1 {
        let mut pk = Pk1::blank(false);
        pk.set_species(25);
        pk.set_box_level(level);
        pk.set_ot_name("ASH");
        pk.set_nickname("PIKACHU");
        pk
    }

    #[test]
    fn rejects_bad_checksum_and_size() {
        assert!(Sav1::new(vec![0; SIZE]).is_none());
        assert!(Sav1::new(vec![0; 0x7FFF]).is_none());
        let mut data = fresh().data;
        data[OT_NAME] ^= 1;
        assert!(Sav1::new(data).is_none());
    }

    #[test]
    fn box_list_appends_and_compacts() {
        let mut sav = fresh();
        sav.set_pkm(3, 7, &pikachu(5)).unwrap();
        let first = sav.pkm(3, 0).unwrap();
        assert_eq!(first.species(), 25);
        assert_eq!(first.nickname(), "PIKACHU");
        assert!(sav.pkm(3, 1).unwrap().is_empty());

        sav.set_pkm(3, 0, sav.empty_pkm().as_ref()).unwrap();
        assert!(sav.pkm(3, 0).unwrap().is_empty());
        assert!(sav.pkm(12, 0).is_err());
        assert!(sav.pkm(0, 20).is_err());
    }

    #[test]
    fn party_records_gain_the_box_level() {
        let mut sav = fresh();
        sav.set_party_pkm(0, &pikachu(12)).unwrap();
        let pk = sav.party_pkm(0).unwrap();
        assert!(pk.is_party());
        assert_eq!(pk.party_level(), 12);
        assert_eq!(sav.party_count().unwrap(), 1);
    }

    #[test]
    fn trainer_money_is_bcd() {
        let mut sav = fresh();
        sav.set_money(1_234_567).unwrap();
        assert_eq!(&sav.data[MONEY..MONEY + 3], &[0x99, 0x99, 0x99]);
        sav.set_ot_name("RED").unwrap();
        let trainer = sav.trainer().unwrap();
        assert_eq!(trainer.ot_name, "RED");
        assert_eq!(trainer.money, 999_999);
    }

    #[test]
    fn resign_keeps_image_loadable_and_locks_editing() {
        let mut sav = fresh();
        sav.set_pkm(0, 0, &pikachu(5)).unwrap();
        sav.dex_update(&pikachu(5), &TableRegistry::new()).unwrap();
        sav.finish_editing().unwrap();
        assert!(sav.set_money(1).is_err());

        let reopened = Sav1::new(sav.data.clone()).unwrap();
        assert_eq!(reopened.pkm(0, 0).unwrap().species(), 25);
        assert!(reopened.dex_caught(25).unwrap());
        assert!(!reopened.dex_seen(26).unwrap());
        assert!(reopened.dex_caught(152).is_err());
    }

    #[test]
    fn bag_is_a_counted_list() {
        let mut sav = fresh();
        sav.set_item(0, 5, &ItemStack::new(4, 10)).unwrap();
        assert_eq!(sav.item(0, 0).unwrap(), ItemStack::new(4, 10));
        assert!(sav.item(2, 0).is_err());
    }
}
