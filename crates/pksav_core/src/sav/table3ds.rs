//! 3DS save images (X/Y through Ultra Sun/Ultra Moon). The image is a run
//! of 0x200-aligned blocks described by a table in the last 0x200 bytes:
//! a "BEEF" magic, then one entry per block holding its length, id and
//! checksum. X/Y and Sun/Moon differ in block ids and the checksum used.

use std::io::Cursor;

use crate::core_api::{CoreError, PlayTime, TrainerInfo, check_index};
use crate::endian::{set_u16_le, set_u32_le, u16_le, u32_le};
use crate::generation::{Game, GameVersion, Generation, Language};
use crate::gift::Gift;
use crate::layout::{ByteRange, RegionMap};
use crate::pkm::{self, Pkm};
use crate::reader::LittleEndianReader;
use crate::registry::TableRegistry;
use crate::text::utf16;

use super::items::{ItemStack, Pouch, PouchLayout};
use super::{
    PARTY_SLOTS, SaveFile, check_slot, check_species, dex_bit, ensure_editing, open_slot,
    pouch_at, put_party_slot, read_slot, seal_slot, set_dex_bit, stored_form, view_slot,
};

const BEEF: u32 = 0x4245_4546;
const TABLE_LEN: usize = 0x200;
const MAGIC_AT: usize = 0x10;
const ENTRIES_AT: usize = 0x14;
const ENTRY_LEN: usize = 8;
const ALIGN: usize = 0x200;

const BOX_SLOTS: usize = 30;
const MONEY_MAX: u32 = 9_999_999;
const NAME_LEN: usize = 0x1A;
const CARD_FLAGS_LEN: usize = 0x100;
const CARD_LEN: usize = crate::gift::wc6::LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockInfo {
    pub id: u16,
    pub offset: usize,
    pub len: usize,
    /// Where the block's checksum is kept in the table.
    pub checksum_at: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct BlockTable {
    blocks: Vec<BlockInfo>,
}

impl BlockTable {
    pub fn read(data: &[u8]) -> Option<Self> {
        let len = data.len();
        let table = len.checked_sub(TABLE_LEN)?;
        if u32_le(data, table + MAGIC_AT) != BEEF {
            return None;
        }
        let entries_at = table + ENTRIES_AT;
        let mut reader = LittleEndianReader::new(Cursor::new(&data[entries_at..]));
        let mut map = RegionMap::new(table);
        let mut blocks = Vec::new();
        let mut offset = 0;
        // entries run until a zero length or the end of the table
        while let (Ok(block_len), Ok(id), Ok(at)) =
            (reader.read_u32(), reader.read_u16(), reader.position())
        {
            if block_len == 0 || reader.read_u16().is_err() {
                break;
            }
            let block_len = block_len as usize;
            map.push(id, ByteRange::new(offset, block_len));
            blocks.push(BlockInfo {
                id,
                offset,
                len: block_len,
                checksum_at: entries_at + at as usize,
            });
            offset = (offset + block_len).div_ceil(ALIGN) * ALIGN;
        }
        if let Err(e) = map.validate() {
            log::debug!("3DS block table rejected: {e}");
            return None;
        }
        Some(Self { blocks })
    }

    pub fn get(&self, id: u16) -> Option<&BlockInfo> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Absolute offset of `len` bytes at `rel` inside block `id`, if the
    /// block is that long.
    pub fn locate(&self, id: u16, rel: usize, len: usize) -> Option<usize> {
        let block = self.get(id)?;
        (rel + len <= block.len).then_some(block.offset + rel)
    }

    pub fn resign(&self, data: &mut [u8], checksum: fn(&[u8]) -> u16) {
        for b in &self.blocks {
            let sum = checksum(&data[b.offset..b.offset + b.len]);
            set_u16_le(data, b.checksum_at, sum);
        }
    }

    /// Ids of the blocks whose stored checksum does not match.
    pub fn invalid_blocks(&self, data: &[u8], checksum: fn(&[u8]) -> u16) -> Vec<u16> {
        self.blocks
            .iter()
            .filter(|b| checksum(&data[b.offset..b.offset + b.len]) != u16_le(data, b.checksum_at))
            .map(|b| b.id)
            .collect()
    }
}

/// Block ids and offsets of one 3DS game.
pub(crate) struct Layout3ds {
    pub game: Game,
    pub size: usize,
    pub box_count: usize,
    pub checksum: fn(&[u8]) -> u16,
    pub bag: u16,
    pub pouches: &'static [PouchLayout],
    pub status: u16,
    pub language_at: usize,
    pub ot_name_at: usize,
    pub play_time: u16,
    pub misc: u16,
    pub money_at: usize,
    pub party: u16,
    pub dex: u16,
    pub dex_caught_at: usize,
    pub dex_seen_at: usize,
    pub cards: u16,
    pub card_slots: usize,
    pub boxes: u16,
}

impl Layout3ds {
    fn generation(&self) -> Generation {
        self.game.generation()
    }

    fn box_len(&self) -> usize {
        // X/Y through Ultra Sun/Ultra Moon share the record size
        pkm::pk6::BOX_LEN
    }

    fn party_len(&self) -> usize {
        pkm::pk6::PARTY_LEN
    }

    fn party_count_at(&self) -> usize {
        PARTY_SLOTS * self.party_len()
    }

    fn pouch_span(&self) -> usize {
        self.pouches
            .iter()
            .map(|p| p.offset + p.len())
            .max()
            .unwrap_or(0)
    }
}

/// A 3DS save. `GEN` is 6 for X/Y and Omega Ruby/Alpha Sapphire, 7 for
/// Sun/Moon and Ultra Sun/Ultra Moon.
#[derive(Clone)]
pub struct Sav3ds<const GEN: u8> {
    data: Vec<u8>,
    layout: &'static Layout3ds,
    table: BlockTable,
    editing: bool,
}

impl<const GEN: u8> std::fmt::Debug for Sav3ds<GEN> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav3ds")
            .field("game", &self.layout.game)
            .field("blocks", &self.table.blocks.len())
            .field("editing", &self.editing)
            .finish()
    }
}

impl<const GEN: u8> Sav3ds<GEN> {
    pub(crate) fn open(data: Vec<u8>, layouts: &[&'static Layout3ds]) -> Option<Self> {
        let layout = *layouts.iter().find(|l| l.size == data.len())?;
        let table = BlockTable::read(&data)?;
        let l = layout;
        let fits = [
            table.locate(l.bag, 0, l.pouch_span()),
            table.locate(l.status, l.ot_name_at, NAME_LEN),
            table.locate(l.status, l.language_at, 1),
            table.locate(l.play_time, 0, 4),
            table.locate(l.misc, l.money_at, 4),
            table.locate(l.party, 0, l.party_count_at() + 1),
            table.locate(l.dex, l.dex_seen_at, 1),
            table.locate(l.cards, 0, CARD_FLAGS_LEN + l.card_slots * CARD_LEN),
            table.locate(l.boxes, 0, l.box_count * BOX_SLOTS * l.box_len()),
        ];
        if fits.iter().any(Option::is_none) {
            log::debug!("{} block table is missing a required block", l.game);
            return None;
        }
        let bad = table.invalid_blocks(&data, l.checksum);
        if !bad.is_empty() {
            log::warn!("{} blocks failing their checksum: {:?}", l.game, bad);
        }
        let mut sav = Self {
            data,
            layout,
            table,
            editing: false,
        };
        if sav.raw_party_count() > PARTY_SLOTS {
            return None;
        }
        log::debug!("{} save with {} blocks", l.game, sav.table.blocks.len());
        sav.begin_editing().ok()?;
        Some(sav)
    }

    /// Absolute offset inside a block the constructor already checked.
    fn at(&self, id: u16, rel: usize) -> usize {
        self.table.get(id).map_or(0, |b| b.offset) + rel
    }

    fn raw_party_count(&self) -> usize {
        usize::from(self.data[self.at(self.layout.party, self.layout.party_count_at())])
    }

    fn slot_offset(&self, box_index: usize, slot: usize) -> usize {
        let index = box_index * BOX_SLOTS + slot;
        self.at(self.layout.boxes, index * self.layout.box_len())
    }

    fn party_offset(&self, slot: usize) -> usize {
        self.at(self.layout.party, slot * self.layout.party_len())
    }

    fn slots(&self) -> Vec<(usize, usize)> {
        let l = self.layout;
        let boxes = (0..l.box_count)
            .flat_map(|b| (0..BOX_SLOTS).map(move |s| (b, s)))
            .map(|(b, s)| (self.slot_offset(b, s), l.box_len()));
        let party = (0..PARTY_SLOTS).map(|s| (self.party_offset(s), l.party_len()));
        boxes.chain(party).collect()
    }

    fn status_at(&self, rel: usize) -> usize {
        self.at(self.layout.status, rel)
    }

    fn card_flag(&self, card_id: u16) -> Option<(usize, usize)> {
        let bit = usize::from(card_id);
        (bit < CARD_FLAGS_LEN * 8).then(|| (self.at(self.layout.cards, bit / 8), bit % 8))
    }

    /// Whether the received flag for `card_id` is set.
    pub fn card_received(&self, card_id: u16) -> bool {
        self.card_flag(card_id)
            .is_some_and(|(at, bit)| self.data[at] >> bit & 1 != 0)
    }

    /// Raw bytes of every stored wonder card.
    pub fn stored_cards(&self) -> Vec<&[u8]> {
        (0..self.layout.card_slots)
            .map(|i| self.at(self.layout.cards, CARD_FLAGS_LEN + i * CARD_LEN))
            .map(|at| &self.data[at..at + CARD_LEN])
            .filter(|card| card.iter().any(|&b| b != 0))
            .collect()
    }
}

impl<const GEN: u8> SaveFile for Sav3ds<GEN> {
    fn game(&self) -> Game {
        self.layout.game
    }

    fn version(&self) -> GameVersion {
        GameVersion::from_raw(self.data[self.status_at(4)])
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
        let generation = self.layout.generation();
        for (at, len) in self.slots() {
            open_slot(generation, &mut self.data[at..at + len]);
        }
        self.editing = true;
        Ok(())
    }

    fn finish_editing(&mut self) -> Result<(), CoreError> {
        ensure_editing(self.editing, "finish_editing")?;
        let generation = self.layout.generation();
        for (at, len) in self.slots() {
            seal_slot(generation, &mut self.data[at..at + len]);
        }
        self.editing = false;
        self.resign()
    }

    fn resign(&mut self) -> Result<(), CoreError> {
        self.table.resign(&mut self.data, self.layout.checksum);
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
        let l = self.layout;
        let d = &self.data;
        let name_at = self.status_at(l.ot_name_at);
        let mut info = TrainerInfo::new(
            utf16::decode(&d[name_at..name_at + NAME_LEN], 0),
            u16_le(d, self.status_at(0)),
            u16_le(d, self.status_at(2)),
            self.version(),
        );
        info.gender = d[self.status_at(5)];
        info.language =
            Language::from_raw(d[self.status_at(l.language_at)]).unwrap_or(Language::English);
        info.money = u32_le(d, self.at(l.misc, l.money_at));
        let time = self.at(l.play_time, 0);
        info.play_time = PlayTime {
            hours: u16_le(d, time),
            minutes: d[time + 2],
            seconds: d[time + 3],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        let at = self.status_at(self.layout.ot_name_at);
        utf16::encode(&mut self.data[at..at + NAME_LEN], name, 0);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        let at = self.at(self.layout.misc, self.layout.money_at);
        set_u32_le(&mut self.data, at, money.min(MONEY_MAX));
        Ok(())
    }

    fn box_count(&self) -> usize {
        self.layout.box_count
    }

    fn slots_per_box(&self) -> usize {
        BOX_SLOTS
    }

    fn party_count(&self) -> Result<usize, CoreError> {
        Ok(self.raw_party_count().min(PARTY_SLOTS))
    }

    fn pkm(&self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_slot(self.layout.box_count, BOX_SLOTS, box_index, slot)?;
        let at = self.slot_offset(box_index, slot);
        read_slot(self.layout.generation(), &self.data[at..at + self.layout.box_len()])
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(self.layout.box_count, BOX_SLOTS, box_index, slot)?;
        let at = self.slot_offset(box_index, slot);
        let len = self.layout.box_len();
        if pkm.is_empty() {
            self.data[at..at + len].fill(0);
        } else {
            let stored = stored_form(self.layout.generation(), pkm, false)?;
            self.data[at..at + len].copy_from_slice(&stored);
        }
        Ok(())
    }

    fn pkm_view(&mut self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm + '_>, CoreError> {
        ensure_editing(self.editing, "pkm_view")?;
        check_slot(self.layout.box_count, BOX_SLOTS, box_index, slot)?;
        let at = self.slot_offset(box_index, slot);
        let len = self.layout.box_len();
        view_slot(self.layout.generation(), &mut self.data[at..at + len])
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_index("party slot", slot, PARTY_SLOTS)?;
        let generation = self.layout.generation();
        if slot >= self.party_count()? {
            return Ok(pkm::blank(generation, true));
        }
        let at = self.party_offset(slot);
        read_slot(generation, &self.data[at..at + self.layout.party_len()])
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let record = if pkm.is_empty() {
            None
        } else {
            Some(stored_form(self.layout.generation(), pkm, true)?)
        };
        let count = self.party_count()?;
        let len = self.layout.party_len();
        let start = self.party_offset(0);
        let slots = &mut self.data[start..start + PARTY_SLOTS * len];
        let count = put_party_slot(slots, len, count, slot, record.as_deref())?;
        let at = self.at(self.layout.party, self.layout.party_count_at());
        self.data[at] = count as u8;
        Ok(())
    }

    fn dex_update(&mut self, pkm: &dyn Pkm, _registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(self.layout.generation(), species)?;
        let caught = self.at(self.layout.dex, self.layout.dex_caught_at);
        let seen = self.at(self.layout.dex, self.layout.dex_seen_at);
        set_dex_bit(&mut self.data, caught, species, true);
        set_dex_bit(&mut self.data, seen, species, true);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        check_species(self.layout.generation(), species)?;
        let at = self.at(self.layout.dex, self.layout.dex_caught_at);
        Ok(dex_bit(&self.data, at, species))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        check_species(self.layout.generation(), species)?;
        let at = self.at(self.layout.dex, self.layout.dex_seen_at);
        Ok(dex_bit(&self.data, at, species))
    }

    fn pouches(&self) -> Vec<Pouch> {
        self.layout.pouches.iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        let layout = pouch_at(self.layout.pouches, pouch)?;
        layout.item(&self.data[self.at(self.layout.bag, 0)..], slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        let layout = pouch_at(self.layout.pouches, pouch)?;
        let bag = self.at(self.layout.bag, 0);
        layout.set_item(&mut self.data[bag..], slot, stack)
    }

    /// Sets the card's received flag and files the card in the first free
    /// card slot. Cards are kept only once a slot is free.
    fn record_gift(&mut self, gift: &dyn Gift) -> Result<(), CoreError> {
        if let Some((at, bit)) = self.card_flag(gift.card_id()) {
            self.data[at] |= 1 << bit;
        }
        let bytes = gift.bytes();
        if bytes.len() != CARD_LEN {
            return Ok(());
        }
        let free = (0..self.layout.card_slots)
            .map(|i| self.at(self.layout.cards, CARD_FLAGS_LEN + i * CARD_LEN))
            .find(|&at| self.data[at..at + CARD_LEN].iter().all(|&b| b == 0));
        match free {
            Some(at) => self.data[at..at + CARD_LEN].copy_from_slice(bytes),
            None => log::warn!("no free card slot for card {}", gift.card_id()),
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// An image of `size` bytes whose table lists blocks of `lens`, ids in
    /// order.
    pub(crate) fn build_image(size: usize, lens: &[usize]) -> Vec<u8> {
        let mut data = vec![0u8; size];
        let table = size - TABLE_LEN;
        set_u32_le(&mut data, table + MAGIC_AT, BEEF);
        for (id, &len) in lens.iter().enumerate() {
            let entry = table + ENTRIES_AT + id * ENTRY_LEN;
            set_u32_le(&mut data, entry, len as u32);
            set_u16_le(&mut data, entry + 4, id as u16);
        }
        data
    }

    /// Minimum block lengths a layout needs, by id.
    pub(crate) fn block_lens(l: &Layout3ds) -> Vec<usize> {
        let needs = [
            (l.bag, l.pouch_span()),
            (l.status, l.ot_name_at + NAME_LEN),
            (l.play_time, 4),
            (l.misc, l.money_at + 4),
            (l.party, l.party_count_at() + 4),
            (l.dex, l.dex_seen_at + 0x70),
            (l.cards, CARD_FLAGS_LEN + l.card_slots * CARD_LEN),
            (l.boxes, l.box_count * BOX_SLOTS * l.box_len()),
        ];
        let count = needs.iter().map(|&(id, _)| usize::from(id) + 1).max().unwrap_or(0);
        let mut lens = vec![0x10; count];
        for (id, len) in needs {
            lens[usize::from(id)] = lens[usize::from(id)].max(len);
        }
        lens
    }

    #[test]
    fn blocks_are_aligned_and_validated() {
        let data = build_image(0x2000, &[0x10, 0x201, 0x30]);
        let table = BlockTable::read(&data).unwrap();
        assert_eq!(table.get(1).unwrap().offset, 0x200);
        assert_eq!(table.get(2).unwrap().offset, 0x600);
        assert_eq!(table.locate(2, 0x20, 0x10), Some(0x620));
        assert_eq!(table.locate(2, 0x28, 0x10), None);

        let too_long = build_image(0x800, &[0x500, 0x200]);
        assert!(BlockTable::read(&too_long).is_none());

        let mut no_magic = data.clone();
        no_magic[0x2000 - TABLE_LEN + MAGIC_AT] = 0;
        assert!(BlockTable::read(&no_magic).is_none());
    }

    #[test]
    fn resign_fixes_every_checksum() {
        let mut data = build_image(0x1000, &[0x10, 0x20]);
        let table = BlockTable::read(&data).unwrap();
        data[0x200] = 7;
        let sum = crate::sav::checksum::crc16_ccitt;
        assert_eq!(table.invalid_blocks(&data, sum), vec![0, 1]);
        table.resign(&mut data, sum);
        assert!(table.invalid_blocks(&data, sum).is_empty());
    }
}
