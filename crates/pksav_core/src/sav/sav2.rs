//! Gold/Silver and Crystal saves (international layout). Like generation 1
//! the current box is worked on in the main bank and copied back to its
//! bank slot on resign; the main bank is also mirrored as a backup.

use crate::core_api::{CoreError, CoreErrorCode, PlayTime, TrainerInfo};
use crate::endian::{set_u16_le, set_u24_be, u16_be, u16_le, u24_be};
use crate::generation::{Game, Generation, Language};
use crate::pkm::pk2::{self, DATA_BOX_LEN, DATA_PARTY_LEN, EGG_MARKER, NAME_LEN};
use crate::pkm::{Pk2, Pkm};
use crate::registry::TableRegistry;
use crate::text::g12;

use super::checksum::gb_sum16;
use super::gb::{GbEntry, GbList};
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::{SaveFile, check_slot, check_species, dex_bit, ensure_editing, pouch_at, set_dex_bit};

pub const SIZE: usize = 0x8000;
pub const SIZE_VC: usize = 0x8010;
pub const SIZE_RTC: usize = 0x802C;

const TID: usize = 0x2009;
const OT_NAME: usize = 0x200B;
const CHECKED_START: usize = 0x2009;
const MONEY_MAX: u32 = 999_999;

const BOX_COUNT: usize = 14;
const BOX_SLOTS: usize = 20;
const BOX_SIZE: usize = 0x450;
const BOXES_PER_BANK: usize = 7;
const BANKS: [usize; 2] = [0x4000, 0x6000];

/// Offsets that differ between Gold/Silver and Crystal.
struct Layout {
    game: Game,
    play_time: usize,
    money: usize,
    pouches: [PouchLayout; 4],
    box_index: usize,
    party: usize,
    dex_caught: usize,
    dex_seen: usize,
    current_box: usize,
    /// Last byte covered by the checksum.
    checked_end: usize,
    checksum: usize,
    backup_checksum: usize,
    /// (source, destination, length) of each backup copy.
    mirrors: &'static [(usize, usize, usize)],
    gender: Option<usize>,
}

const GS: Layout = Layout {
    game: Game::GoldSilver,
    play_time: 0x2053,
    money: 0x23DB,
    pouches: [
        PouchLayout::counted(PouchKind::Items, 0x241F, 20, ItemFormat::Gb2),
        PouchLayout::counted(PouchKind::KeyItems, 0x2449, 25, ItemFormat::Gb2Key),
        PouchLayout::counted(PouchKind::Balls, 0x2464, 12, ItemFormat::Gb2),
        PouchLayout::counted(PouchKind::Pc, 0x247E, 50, ItemFormat::Gb2),
    ],
    box_index: 0x2724,
    party: 0x288A,
    dex_caught: 0x2A4C,
    dex_seen: 0x2A6C,
    current_box: 0x2D6C,
    checked_end: 0x2D68,
    checksum: 0x2D69,
    backup_checksum: 0x7E6D,
    mirrors: &[
        (0x2009, 0x15C7, 0x222F - 0x2009),
        (0x222F, 0x3D69, 0x23D9 - 0x222F),
        (0x23D9, 0x0C6B, 0x2856 - 0x23D9),
        (0x2856, 0x7E39, 0x288A - 0x2856),
        (0x288A, 0x10E8, 0x2D69 - 0x288A),
    ],
    gender: None,
};

const CRYSTAL: Layout = Layout {
    game: Game::Crystal,
    play_time: 0x2052,
    money: 0x23DC,
    pouches: [
        PouchLayout::counted(PouchKind::Items, 0x2420, 20, ItemFormat::Gb2),
        PouchLayout::counted(PouchKind::KeyItems, 0x244A, 25, ItemFormat::Gb2Key),
        PouchLayout::counted(PouchKind::Balls, 0x2465, 12, ItemFormat::Gb2),
        PouchLayout::counted(PouchKind::Pc, 0x247F, 50, ItemFormat::Gb2),
    ],
    box_index: 0x2700,
    party: 0x2865,
    dex_caught: 0x2A27,
    dex_seen: 0x2A47,
    current_box: 0x2D10,
    checked_end: 0x2B82,
    checksum: 0x2D0D,
    backup_checksum: 0x1F0D,
    mirrors: &[(0x2009, 0x1209, 0xB7A)],
    gender: Some(0x3E3D),
};

impl Layout {
    fn party(&self) -> GbList {
        GbList::new(self.party, 6, DATA_PARTY_LEN, NAME_LEN)
    }

    fn stored_checksum(&self, d: &[u8]) -> u16 {
        u16_le(d, self.checksum)
    }

    fn computed_checksum(&self, d: &[u8]) -> u16 {
        gb_sum16(&d[CHECKED_START..=self.checked_end])
    }
}

#[derive(Clone)]
pub struct Sav2 {
    data: Vec<u8>,
    layout: &'static Layout,
    editing: bool,
}

impl std::fmt::Debug for Sav2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav2")
            .field("game", &self.layout.game)
            .field("editing", &self.editing)
            .finish()
    }
}

impl Sav2 {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        if ![SIZE, SIZE_VC, SIZE_RTC].contains(&data.len()) {
            return None;
        }
        let layout = [&GS, &CRYSTAL]
            .into_iter()
            .find(|l| l.stored_checksum(&data) == l.computed_checksum(&data))?;
        let sav = Self {
            data,
            layout,
            editing: true,
        };
        if sav.data[layout.party] > 6 || sav.current_box() >= BOX_COUNT {
            return None;
        }
        log::trace!("generation 2 image matched {}", layout.game);
        Some(sav)
    }

    pub fn current_box(&self) -> usize {
        usize::from(self.data[self.layout.box_index] & 0x7F)
    }

    fn box_list(&self, box_index: usize) -> GbList {
        let offset = if box_index == self.current_box() {
            self.layout.current_box
        } else {
            bank_offset(box_index)
        };
        GbList::new(offset, BOX_SLOTS, DATA_BOX_LEN, NAME_LEN)
    }

    fn read_entry(entry: Option<GbEntry<'_>>, party: bool) -> Result<Box<dyn Pkm>, CoreError> {
        let Some(e) = entry else {
            return Ok(Box::new(Pk2::blank(party)));
        };
        let pk = Pk2::from_parts(e.data, e.ot_name, e.nickname)
            .ok_or_else(|| {
                CoreError::new(CoreErrorCode::Parse, "malformed generation 2 list entry")
            })?
            .with_egg(e.list_species == EGG_MARKER);
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
        if pkm.generation() != Generation::Two {
            return Err(CoreError::unsupported(format!(
                "a {} record cannot be stored in a generation 2 save",
                pkm.generation()
            )));
        }
        let bytes = pkm.bytes();
        if bytes.len() != pk2::BOX_LEN && bytes.len() != pk2::PARTY_LEN {
            return Err(CoreError::unsupported(
                "Japanese records cannot be stored in an international save",
            ));
        }
        let own_len = bytes.len() - 2 * NAME_LEN;
        let mut data = vec![0u8; list.data_len];
        let n = own_len.min(list.data_len);
        data[..n].copy_from_slice(&bytes[..n]);
        let list_species = if pkm.is_egg() { EGG_MARKER } else { data[0] };
        let entry = GbEntry {
            list_species,
            data: &data,
            ot_name: &bytes[own_len..own_len + NAME_LEN],
            nickname: &bytes[own_len + NAME_LEN..own_len + 2 * NAME_LEN],
        };
        list.put(d, slot, &entry)?;
        Ok(())
    }
}

fn bank_offset(box_index: usize) -> usize {
    BANKS[box_index / BOXES_PER_BANK] + (box_index % BOXES_PER_BANK) * BOX_SIZE
}

impl SaveFile for Sav2 {
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
        let l = self.layout;
        let current = l.current_box;
        let to = bank_offset(self.current_box());
        self.data.copy_within(current..current + BOX_SIZE, to);
        let sum = l.computed_checksum(&self.data);
        set_u16_le(&mut self.data, l.checksum, sum);
        for &(from, to, len) in l.mirrors {
            self.data.copy_within(from..from + len, to);
        }
        set_u16_le(&mut self.data, l.backup_checksum, sum);
        log::debug!("{} save resigned, checksum {:#06x}", l.game, sum);
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn into_bytes(self: Box<Self>) -> Vec<u8> {
        self.data
    }

    fn trainer(&self) -> Result<TrainerInfo, CoreError> {
        let l = self.layout;
        let name = g12::decode(&self.data[OT_NAME..OT_NAME + NAME_LEN]);
        let mut info = TrainerInfo::new(name, u16_be(&self.data, TID), 0, self.version());
        info.language = Language::English;
        info.money = u24_be(&self.data, l.money);
        info.gender = l.gender.map_or(0, |at| self.data[at] & 1);
        info.play_time = PlayTime {
            hours: u16_be(&self.data, l.play_time),
            minutes: self.data[l.play_time + 2],
            seconds: self.data[l.play_time + 3],
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
        set_u24_be(&mut self.data, self.layout.money, money.min(MONEY_MAX));
        Ok(())
    }

    fn box_count(&self) -> usize {
        BOX_COUNT
    }

    fn slots_per_box(&self) -> usize {
        BOX_SLOTS
    }

    fn party_count(&self) -> Result<usize, CoreError> {
        Ok(self.layout.party().count(&self.data))
    }

    fn empty_pkm(&self) -> Box<dyn Pkm> {
        Box::new(Pk2::blank(false))
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
        Self::read_entry(self.layout.party().entry(&self.data, slot)?, true)
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let list = self.layout.party();
        Self::write_entry(&list, &mut self.data, slot, pkm)
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(Generation::Two, species)?;
        set_dex_bit(&mut self.data, self.layout.dex_caught, species, true);
        set_dex_bit(&mut self.data, self.layout.dex_seen, species, true);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Two, species)?;
        Ok(dex_bit(&self.data, self.layout.dex_caught, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Two, species)?;
        Ok(dex_bit(&self.data, self.layout.dex_seen, species))
    }

    fn pouches(&self) -> Vec<Pouch> {
        self.layout.pouches.iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        pouch_at(&self.layout.pouches, pouch)?.item(&self.data, slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        pouch_at(&self.layout.pouches, pouch)?.set_item(&mut self.data, slot, stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(layout: &'static Layout) -> Sav2 {
        let mut sav = Sav2 {
            data: vec![0; SIZE],
            layout,
            editing: true,
        };
        layout.party().clear(&mut sav.data);
        for b in 0..BOX_COUNT {
            GbList::new(bank_offset(b), BOX_SLOTS, DATA_BOX_LEN, NAME_LEN).clear(&mut sav.data);
        }
        GbList::new(layout.current_box, BOX_SLOTS, DATA_BOX_LEN, NAME_LEN).clear(&mut sav.data);
        for pouch in &layout.pouches {
            sav.data[pouch.offset + 1] = 0xFF;
        }
        sav.resign().unwrap();
        Sav2::new(sav.data).unwrap()
    }

    fn togepi_egg() -> Pk2 {
        let mut pk = Pk2::blank(false);
        pk.set_species(175);
        pk.set_egg(true);
        pk.set_ot_name("GOLD");
        pk.set_nickname("EGG");
        pk
    }

    #[test]
    fn detects_each_layout_by_checksum() {
        assert_eq!(fresh(&GS).game(), Game::GoldSilver);
        assert_eq!(fresh(&CRYSTAL).game(), Game::Crystal);
        assert!(Sav2::new(vec![0xAA; SIZE]).is_none());
    }

    #[test]
    fn eggs_use_the_list_marker() {
        let mut sav = fresh(&CRYSTAL);
        sav.set_party_pkm(0, &togepi_egg()).unwrap();
        assert_eq!(sav.data[CRYSTAL.party + 1], EGG_MARKER);
        let pk = sav.party_pkm(0).unwrap();
        assert!(pk.is_egg());
        assert_eq!(pk.species(), 175);
    }

    #[test]
    fn resign_writes_both_checksums_and_the_backup() {
        let mut sav = fresh(&GS);
        sav.set_money(2_000_000).unwrap();
        sav.set_pkm(8, 0, &togepi_egg()).unwrap();
        sav.finish_editing().unwrap();
        assert_eq!(u24_be(&sav.data, GS.money), MONEY_MAX);
        assert_eq!(
            u16_le(&sav.data, GS.checksum),
            u16_le(&sav.data, GS.backup_checksum)
        );
        assert_eq!(
            &sav.data[0x23D9..0x2856],
            &sav.data[0x0C6B..0x0C6B + (0x2856 - 0x23D9)]
        );
        let (current, bank) = (GS.current_box, bank_offset(sav.current_box()));
        assert_eq!(
            &sav.data[current..current + BOX_SIZE],
            &sav.data[bank..bank + BOX_SIZE]
        );
        let reopened = Sav2::new(sav.data).unwrap();
        assert!(reopened.pkm(8, 0).unwrap().is_egg());
        assert_eq!(reopened.trainer().unwrap().money, MONEY_MAX);
    }

    #[test]
    fn key_items_have_no_count() {
        let mut sav = fresh(&GS);
        sav.set_item(1, 0, &ItemStack::new(216, 1)).unwrap();
        assert_eq!(sav.item(1, 0).unwrap().item, 216);
        assert_eq!(sav.item(1, 0).unwrap().count, 1);
        assert_eq!(sav.pouches()[1].kind, PouchKind::KeyItems);
    }

    #[test]
    fn eggs_do_not_touch_the_dex() {
        let mut sav = fresh(&CRYSTAL);
        sav.dex_update(&togepi_egg(), &TableRegistry::new()).unwrap();
        assert!(!sav.dex_seen(175).unwrap());
        assert!(sav.dex_seen(252).is_err());
    }
}
