//! Black/White and Black 2/White 2 saves. Data lives in fixed blocks, each
//! followed by its CRC-16; a checksum table repeats every block CRC and is
//! signed itself, which is also how the two layouts are told apart.

use crate::core_api::{CoreError, PlayTime, TrainerInfo, check_index};
use crate::endian::{set_u16_le, set_u32_le, u16_le, u32_le};
use crate::generation::{Game, GameVersion, Generation, Language};
use crate::pkm::{self, Pkm, pk5};
use crate::registry::TableRegistry;
use crate::text::utf16;

use super::checksum::crc16_ccitt;
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::{
    PARTY_SLOTS, SaveFile, check_slot, check_species, dex_bit, ensure_editing, open_slot,
    pouch_at, put_party_slot, read_slot, seal_slot, set_dex_bit, stored_form, view_slot,
};

pub const SIZE: usize = 0x80000;
pub const SIZE_TRAILER: usize = 0x80010;

const BOX_COUNT: usize = 24;
const BOX_SLOTS: usize = 30;
const MONEY_MAX: u32 = 9_999_999;
const NAME_LEN: usize = 0x10;

const PARTY_COUNT: usize = 4;
const PARTY_SLOTS_AT: usize = 8;
const DEX_CAUGHT: usize = 0x08;
const DEX_SEEN: usize = 0x5C;

#[derive(Debug, Clone, Copy)]
struct Block {
    id: usize,
    offset: usize,
    len: usize,
}

impl Block {
    const fn new(id: usize, offset: usize, len: usize) -> Self {
        Self { id, offset, len }
    }

    fn crc_at(&self) -> usize {
        self.offset + self.len + 2
    }
}

const fn box_block(index: usize) -> Block {
    Block::new(1 + index, 0x400 + 0x1000 * index, 0xFF0)
}

const ITEMS: Block = Block::new(25, 0x18400, 0x9EC);
const PARTY: Block = Block::new(26, 0x18E00, 0x534);
const TRAINER: Block = Block::new(27, 0x19400, 0xB0);

const POUCHES: [PouchLayout; 5] = [
    PouchLayout::new(PouchKind::Items, 0x18400, 310, ItemFormat::Plain),
    PouchLayout::new(PouchKind::KeyItems, 0x188D8, 83, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Tms, 0x18A24, 109, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Medicine, 0x18BD8, 48, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Berries, 0x18C98, 64, ItemFormat::Plain),
];

struct Layout {
    game: Game,
    misc: Block,
    dex: Block,
    table: usize,
    table_len: usize,
}

impl Layout {
    fn table_crc_at(&self) -> usize {
        self.table + self.table_len + 2
    }

    fn table_valid(&self, data: &[u8]) -> bool {
        let stored = u16_le(data, self.table_crc_at());
        stored == crc16_ccitt(&data[self.table..self.table + self.table_len])
    }
}

const BW: Layout = Layout {
    game: Game::BlackWhite,
    misc: Block::new(52, 0x21200, 0xEC),
    dex: Block::new(56, 0x21600, 0x328),
    table: 0x23F00,
    table_len: 0x8C,
};

const B2W2: Layout = Layout {
    game: Game::Black2White2,
    misc: Block::new(51, 0x21100, 0xF0),
    dex: Block::new(54, 0x21400, 0x328),
    table: 0x25F00,
    table_len: 0x94,
};

#[derive(Clone)]
pub struct Sav5 {
    data: Vec<u8>,
    layout: &'static Layout,
    editing: bool,
}

impl std::fmt::Debug for Sav5 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav5")
            .field("game", &self.layout.game)
            .field("editing", &self.editing)
            .finish()
    }
}

impl Sav5 {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        if data.len() != SIZE && data.len() != SIZE_TRAILER {
            return None;
        }
        let layout = [&BW, &B2W2].into_iter().find(|l| l.table_valid(&data))?;
        let mut sav = Self {
            data,
            layout,
            editing: false,
        };
        if sav.raw_party_count() > PARTY_SLOTS {
            return None;
        }
        for block in sav.blocks() {
            let stored = u16_le(&sav.data, block.crc_at());
            if stored != crc16_ccitt(&sav.data[block.offset..block.offset + block.len]) {
                log::warn!("block {} at {:#x} fails its checksum", block.id, block.offset);
            }
        }
        log::debug!("{} save", layout.game);
        sav.begin_editing().ok()?;
        Some(sav)
    }

    fn blocks(&self) -> Vec<Block> {
        let mut blocks: Vec<Block> = (0..BOX_COUNT).map(box_block).collect();
        blocks.extend([ITEMS, PARTY, TRAINER, self.layout.misc, self.layout.dex]);
        blocks
    }

    fn raw_party_count(&self) -> usize {
        u32_le(&self.data, PARTY.offset + PARTY_COUNT) as usize
    }

    fn slot_offset(box_index: usize, slot: usize) -> usize {
        box_block(box_index).offset + slot * pk5::BOX_LEN
    }

    fn party_offset(slot: usize) -> usize {
        PARTY.offset + PARTY_SLOTS_AT + slot * pk5::PARTY_LEN
    }

    fn slots() -> impl Iterator<Item = (usize, usize)> {
        let boxes = (0..BOX_COUNT)
            .flat_map(|b| (0..BOX_SLOTS).map(move |s| (b, s)))
            .map(|(b, s)| (Self::slot_offset(b, s), pk5::BOX_LEN));
        let party = (0..PARTY_SLOTS).map(|s| (Self::party_offset(s), pk5::PARTY_LEN));
        boxes.chain(party)
    }

    fn trainer_at(offset: usize) -> usize {
        TRAINER.offset + offset
    }
}

impl SaveFile for Sav5 {
    fn game(&self) -> Game {
        self.layout.game
    }

    fn version(&self) -> GameVersion {
        GameVersion::from_raw(self.data[Self::trainer_at(0x1F)])
            .filter(|v| v.game() == Some(self.layout.game))
            .unwrap_or_else(|| self.layout.game.default_version())
    }

    fn is_editing(&self) -> bool {
        self.editing
    }

    fn begin_editing(&mut self) -> Result<(), CoreError> {
        if self.editing {
            return Ok(());
        }
        for (at, len) in Self::slots() {
            open_slot(Generation::Five, &mut self.data[at..at + len]);
        }
        self.editing = true;
        Ok(())
    }

    fn finish_editing(&mut self) -> Result<(), CoreError> {
        ensure_editing(self.editing, "finish_editing")?;
        for (at, len) in Self::slots() {
            seal_slot(Generation::Five, &mut self.data[at..at + len]);
        }
        self.editing = false;
        self.resign()
    }

    fn resign(&mut self) -> Result<(), CoreError> {
        let l = self.layout;
        for block in self.blocks() {
            let crc = crc16_ccitt(&self.data[block.offset..block.offset + block.len]);
            set_u16_le(&mut self.data, block.crc_at(), crc);
            set_u16_le(&mut self.data, l.table + block.id * 2, crc);
        }
        let table_crc = crc16_ccitt(&self.data[l.table..l.table + l.table_len]);
        set_u16_le(&mut self.data, l.table_crc_at(), table_crc);
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
        let d = &self.data;
        let name_at = Self::trainer_at(4);
        let terminator = utf16::terminator(Generation::Five);
        let mut info = TrainerInfo::new(
            utf16::decode(&d[name_at..name_at + NAME_LEN], terminator),
            u16_le(d, Self::trainer_at(0x14)),
            u16_le(d, Self::trainer_at(0x16)),
            self.version(),
        );
        info.language = Language::from_raw(d[Self::trainer_at(0x1E)]).unwrap_or(Language::English);
        info.gender = d[Self::trainer_at(0x21)];
        info.money = u32_le(d, self.layout.misc.offset);
        info.play_time = PlayTime {
            hours: u16_le(d, Self::trainer_at(0x24)),
            minutes: d[Self::trainer_at(0x26)],
            seconds: d[Self::trainer_at(0x27)],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        let at = Self::trainer_at(4);
        let terminator = utf16::terminator(Generation::Five);
        utf16::encode(&mut self.data[at..at + NAME_LEN], name, terminator);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        let at = self.layout.misc.offset;
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
        let at = Self::slot_offset(box_index, slot);
        read_slot(Generation::Five, &self.data[at..at + pk5::BOX_LEN])
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = Self::slot_offset(box_index, slot);
        let dest = &mut self.data[at..at + pk5::BOX_LEN];
        if pkm.is_empty() {
            dest.fill(0);
        } else {
            dest.copy_from_slice(&stored_form(Generation::Five, pkm, false)?);
        }
        Ok(())
    }

    fn pkm_view(&mut self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm + '_>, CoreError> {
        ensure_editing(self.editing, "pkm_view")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = Self::slot_offset(box_index, slot);
        view_slot(Generation::Five, &mut self.data[at..at + pk5::BOX_LEN])
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_index("party slot", slot, PARTY_SLOTS)?;
        if slot >= self.party_count()? {
            return Ok(pkm::blank(Generation::Five, true));
        }
        let at = Self::party_offset(slot);
        read_slot(Generation::Five, &self.data[at..at + pk5::PARTY_LEN])
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let record = if pkm.is_empty() {
            None
        } else {
            Some(stored_form(Generation::Five, pkm, true)?)
        };
        let count = self.party_count()?;
        let start = Self::party_offset(0);
        let slots = &mut self.data[start..start + PARTY_SLOTS * pk5::PARTY_LEN];
        let count = put_party_slot(slots, pk5::PARTY_LEN, count, slot, record.as_deref())?;
        set_u32_le(&mut self.data, PARTY.offset + PARTY_COUNT, count as u32);
        Ok(())
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(Generation::Five, species)?;
        let dex = self.layout.dex.offset;
        set_dex_bit(&mut self.data, dex + DEX_CAUGHT, species, true);
        set_dex_bit(&mut self.data, dex + DEX_SEEN, species, true);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Five, species)?;
        Ok(dex_bit(&self.data, self.layout.dex.offset + DEX_CAUGHT, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(Generation::Five, species)?;
        Ok(dex_bit(&self.data, self.layout.dex.offset + DEX_SEEN, species))
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

    fn image(layout: &Layout) -> Vec<u8> {
        let mut data = vec![0u8; SIZE];
        let crc = crc16_ccitt(&data[layout.table..layout.table + layout.table_len]);
        set_u16_le(&mut data, layout.table_crc_at(), crc);
        data
    }

    fn snivy() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Five, false);
        pk.set_species(495);
        pk.set_pid(0x5555_AAAA);
        pk.set_nickname("Snivy");
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn signed_table_identifies_the_layout() {
        assert_eq!(Sav5::new(image(&BW)).unwrap().game(), Game::BlackWhite);
        assert_eq!(Sav5::new(image(&B2W2)).unwrap().game(), Game::Black2White2);
        assert!(Sav5::new(vec![0; SIZE]).is_none());
    }

    #[test]
    fn resign_mirrors_block_crcs_into_the_table() {
        let mut sav = Sav5::new(image(&B2W2)).unwrap();
        sav.set_pkm(23, 29, snivy().as_ref()).unwrap();
        sav.finish_editing().unwrap();

        let last_box = box_block(23);
        let crc = u16_le(&sav.data, last_box.crc_at());
        assert_eq!(crc, crc16_ccitt(&sav.data[last_box.offset..last_box.offset + last_box.len]));
        assert_eq!(u16_le(&sav.data, B2W2.table + 24 * 2), crc);
        assert!(B2W2.table_valid(&sav.data));

        let reopened = Sav5::new(sav.data).unwrap();
        let pk = reopened.pkm(23, 29).unwrap();
        assert_eq!(pk.species(), 495);
        assert_eq!(pk.nickname(), "Snivy");
    }

    #[test]
    fn trainer_block_fields() {
        let mut data = image(&BW);
        data[Sav5::trainer_at(0x1F)] = GameVersion::White.raw();
        data[Sav5::trainer_at(0x1E)] = Language::French.raw();
        let mut sav = Sav5::new(data).unwrap();
        sav.set_ot_name("Tcheren").unwrap();
        sav.set_money(12_345).unwrap();
        let trainer = sav.trainer().unwrap();
        assert_eq!(trainer.ot_name, "Tcheren");
        assert_eq!(trainer.money, 12_345);
        assert_eq!(trainer.language, Language::French);
        assert_eq!(trainer.version, GameVersion::White);
    }

    #[test]
    fn party_and_dex() {
        let mut sav = Sav5::new(image(&BW)).unwrap();
        sav.set_party_pkm(2, snivy().as_ref()).unwrap();
        assert_eq!(sav.party_count().unwrap(), 1);
        assert_eq!(sav.party_pkm(0).unwrap().species(), 495);
        sav.dex_update(snivy().as_ref(), &TableRegistry::new()).unwrap();
        assert!(sav.dex_caught(495).unwrap());
        assert!(sav.dex_seen(650).is_err());
        sav.set_item(3, 0, &ItemStack::new(17, 3)).unwrap();
        assert_eq!(sav.item(3, 0).unwrap(), ItemStack::new(17, 3));
    }
}
