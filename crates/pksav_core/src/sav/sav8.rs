//! Sword/Shield saves. There is no fixed size: every patch added blocks, so
//! an image is recognized by its block stream parsing cleanly once the
//! outer layer is stripped.

use std::borrow::Cow;

use log::{debug, warn};

use crate::core_api::{CoreError, CoreErrorCode, PlayTime, TrainerInfo, check_index};
use crate::endian::{set_u32_le, u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Game, GameVersion, Generation, Language};
use crate::pkm::{self, Pkm, pk8};
use crate::registry::{SwishKeys, TableRegistry};
use crate::text::utf16;

use super::dex8::DexEntry8;
use super::items::{ItemFormat, ItemStack, Pouch, PouchKind, PouchLayout};
use super::swsh::{self, BlockStore};
use super::{
    PARTY_SLOTS, SaveFile, check_slot, check_species, ensure_editing, open_slot, pouch_at,
    put_party_slot, read_slot, seal_slot, stored_form, view_slot,
};

/// Keys of the blocks this container reads.
pub mod keys {
    pub const BOX: u32 = 0x0D66_012C;
    pub const PARTY: u32 = 0x2985_FE5D;
    pub const MY_STATUS: u32 = 0xF25C_070E;
    pub const MONEY: u32 = 0x3B4D_705E;
    pub const PLAY_TIME: u32 = 0x8CBB_FD90;
    pub const ITEMS: u32 = 0x1177_C2C4;
    pub const ZUKAN: u32 = 0x4716_C404;
    pub const ZUKAN_ARMOR: u32 = 0x3F93_6BA9;
    pub const ZUKAN_CROWN: u32 = 0x3C93_66F0;
}

pub const BOX_COUNT: usize = 32;
pub const BOX_SLOTS: usize = 30;
/// Boxed records keep their party stats.
pub const SLOT_LEN: usize = pk8::PARTY_LEN;
pub const PARTY_COUNT_AT: usize = PARTY_SLOTS * SLOT_LEN;

pub const TID_AT: usize = 0xA0;
pub const SID_AT: usize = 0xA2;
pub const GAME_AT: usize = 0xA4;
pub const GENDER_AT: usize = 0xA5;
pub const LANGUAGE_AT: usize = 0xA7;
pub const OT_AT: usize = 0xB0;
pub const NAME_LEN: usize = 0x1A;

const MONEY_MAX: u32 = 9_999_999;

const fn packed(kind: PouchKind, offset: usize, capacity: usize) -> PouchLayout {
    PouchLayout::new(kind, offset, capacity, ItemFormat::Packed8)
}

pub const POUCHES: [PouchLayout; 10] = [
    packed(PouchKind::Medicine, 0x000, 60),
    packed(PouchKind::Balls, 0x0F0, 30),
    packed(PouchKind::BattleItems, 0x168, 20),
    packed(PouchKind::Berries, 0x1B8, 80),
    packed(PouchKind::Items, 0x2F8, 550),
    packed(PouchKind::Tms, 0xB90, 110),
    packed(PouchKind::Trs, 0xD48, 50),
    packed(PouchKind::Treasures, 0xE10, 100),
    packed(PouchKind::Ingredients, 0xFA0, 60),
    packed(PouchKind::KeyItems, 0x1090, 64),
];

/// Regional dex numbers of one species; zero when absent from that dex.
#[derive(Debug, Clone, Copy, Default)]
struct DexIndex {
    galar: u16,
    armor: u16,
    crown: u16,
}

#[derive(Clone)]
pub struct Sav8 {
    blocks: BlockStore,
    image: Vec<u8>,
    keys: SwishKeys,
    dex_index: Option<Vec<DexIndex>>,
    editing: bool,
}

impl std::fmt::Debug for Sav8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sav8")
            .field("blocks", &self.blocks.len())
            .field("len", &self.image.len())
            .field("editing", &self.editing)
            .finish()
    }
}

impl Sav8 {
    /// Opens an image with the static keys. The registry's generation 8
    /// personal table, when present, supplies the regional dex numbers.
    pub fn new(data: Vec<u8>, keys: &SwishKeys, registry: &TableRegistry) -> Option<Self> {
        let payload = swsh::decrypt_image(&data, keys)?;
        let blocks = match BlockStore::parse(payload) {
            Ok(blocks) => blocks,
            Err(e) => {
                debug!("not a Sword/Shield image: {e}");
                return None;
            }
        };
        let pouch_span = POUCHES.iter().map(|p| p.offset + p.len()).max().unwrap_or(0);
        let needs = [
            (keys::BOX, BOX_COUNT * BOX_SLOTS * SLOT_LEN),
            (keys::PARTY, PARTY_COUNT_AT + 1),
            (keys::MY_STATUS, OT_AT + NAME_LEN),
            (keys::MONEY, 4),
            (keys::PLAY_TIME, 4),
            (keys::ITEMS, pouch_span),
        ];
        for (key, len) in needs {
            if blocks.block_len(key).is_none_or(|have| have < len) {
                debug!("Sword/Shield block {key:08x} missing or shorter than {len:#x}");
                return None;
            }
        }
        if !swsh::is_signed(&data, keys) {
            warn!("Sword/Shield signature does not match the {}-byte image", data.len());
        }

        let dex_index = registry.personal(Generation::Eight).ok().map(|table| {
            (0..=Generation::Eight.max_species())
                .map(|species| {
                    if !table.contains(species) {
                        return DexIndex::default();
                    }
                    let info = table.info(species, 0);
                    DexIndex {
                        galar: info.pokedex_index(),
                        armor: info.armor_dex_index(),
                        crown: info.crown_dex_index(),
                    }
                })
                .collect()
        });

        let mut sav = Self {
            blocks,
            image: data,
            keys: keys.clone(),
            dex_index,
            editing: false,
        };
        if sav.raw_party_count().ok()? > PARTY_SLOTS {
            return None;
        }
        debug!("Sword/Shield save with {} blocks", sav.blocks.len());
        sav.begin_editing().ok()?;
        Some(sav)
    }

    fn block(&self, key: u32) -> Result<Cow<'_, [u8]>, CoreError> {
        self.blocks.get(key).ok_or_else(|| missing(key))
    }

    fn block_mut(&mut self, key: u32) -> Result<&mut [u8], CoreError> {
        self.blocks.get_mut(key).ok_or_else(|| missing(key))
    }

    /// Plain body of any block, by key.
    pub fn raw_block(&self, key: u32) -> Option<Cow<'_, [u8]>> {
        self.blocks.get(key)
    }

    fn raw_party_count(&self) -> Result<usize, CoreError> {
        Ok(usize::from(self.block(keys::PARTY)?[PARTY_COUNT_AT]))
    }

    fn for_each_slot(&mut self, f: fn(Generation, &mut [u8])) -> Result<(), CoreError> {
        for key in [keys::BOX, keys::PARTY] {
            let count = if key == keys::BOX { BOX_COUNT * BOX_SLOTS } else { PARTY_SLOTS };
            let block = self.block_mut(key)?;
            for slot in block[..count * SLOT_LEN].chunks_exact_mut(SLOT_LEN) {
                f(Generation::Eight, slot);
            }
        }
        Ok(())
    }

    /// Block and entry index holding `species`, first match of Galar,
    /// Isle of Armor, Crown Tundra.
    fn dex_location(&self, species: u16) -> Result<Option<(u32, usize)>, CoreError> {
        let index = self.dex_index.as_ref().ok_or_else(|| {
            CoreError::resource("the Sword/Shield dex needs the generation 8 personal table")
        })?;
        let Some(entry) = index.get(usize::from(species)) else {
            return Ok(None);
        };
        let found = [
            (keys::ZUKAN, entry.galar),
            (keys::ZUKAN_ARMOR, entry.armor),
            (keys::ZUKAN_CROWN, entry.crown),
        ]
        .into_iter()
        .find(|&(key, number)| number != 0 && self.blocks.contains(key))
        .map(|(key, number)| (key, usize::from(number - 1)));
        Ok(found)
    }

    /// Dex entry for `species`, if it is in a regional dex this save has.
    pub fn dex_entry(&self, species: u16) -> Result<Option<DexEntry8>, CoreError> {
        check_species(Generation::Eight, species)?;
        let Some((key, index)) = self.dex_location(species)? else {
            return Ok(None);
        };
        let block = self.block(key)?;
        let at = index * DexEntry8::LEN;
        check_index("dex entry", index, block.len() / DexEntry8::LEN)?;
        Ok(Some(DexEntry8::read(&block[at..at + DexEntry8::LEN])))
    }
}

fn missing(key: u32) -> CoreError {
    CoreError::new(CoreErrorCode::Parse, format!("block {key:08x} is missing"))
}

impl SaveFile for Sav8 {
    fn game(&self) -> Game {
        Game::SwordShield
    }

    fn version(&self) -> GameVersion {
        self.block(keys::MY_STATUS)
            .ok()
            .and_then(|status| GameVersion::from_raw(status[GAME_AT]))
            .filter(|v| v.game() == Some(Game::SwordShield))
            .unwrap_or(GameVersion::Sword)
    }

    fn is_editing(&self) -> bool {
        self.editing
    }

    fn begin_editing(&mut self) -> Result<(), CoreError> {
        if self.editing {
            return Ok(());
        }
        self.for_each_slot(open_slot)?;
        self.editing = true;
        Ok(())
    }

    fn finish_editing(&mut self) -> Result<(), CoreError> {
        ensure_editing(self.editing, "finish_editing")?;
        self.for_each_slot(seal_slot)?;
        self.editing = false;
        self.resign()
    }

    /// Re-encrypts the blocks and re-signs the image. Slots opened for
    /// editing would be written in the clear, so this runs only between
    /// editing sessions.
    fn resign(&mut self) -> Result<(), CoreError> {
        if self.editing {
            return Err(CoreError::new(
                CoreErrorCode::InvalidState,
                "Sword/Shield saves are re-signed by finish_editing",
            ));
        }
        self.blocks.seal();
        self.image = swsh::encrypt_image(&self.blocks.to_bytes(), &self.keys);
        debug!("Sword/Shield save resigned, {} bytes", self.image.len());
        Ok(())
    }

    /// The image as of the last `finish_editing`.
    fn bytes(&self) -> &[u8] {
        &self.image
    }

    fn into_bytes(self: Box<Self>) -> Vec<u8> {
        self.image
    }

    fn trainer(&self) -> Result<TrainerInfo, CoreError> {
        let status = self.block(keys::MY_STATUS)?;
        let mut info = TrainerInfo::new(
            utf16::decode(&status[OT_AT..OT_AT + NAME_LEN], 0),
            u16_le(&status, TID_AT),
            u16_le(&status, SID_AT),
            self.version(),
        );
        info.gender = status[GENDER_AT];
        info.language = Language::from_raw(status[LANGUAGE_AT]).unwrap_or(Language::English);
        info.money = u32_le(&self.block(keys::MONEY)?, 0);
        let time = self.block(keys::PLAY_TIME)?;
        info.play_time = PlayTime {
            hours: u16_le(&time, 0),
            minutes: time[2],
            seconds: time[3],
        };
        Ok(info)
    }

    fn set_ot_name(&mut self, name: &str) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_ot_name")?;
        let status = self.block_mut(keys::MY_STATUS)?;
        utf16::encode(&mut status[OT_AT..OT_AT + NAME_LEN], name, 0);
        Ok(())
    }

    fn set_money(&mut self, money: u32) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_money")?;
        set_u32_le(self.block_mut(keys::MONEY)?, 0, money.min(MONEY_MAX));
        Ok(())
    }

    fn box_count(&self) -> usize {
        BOX_COUNT
    }

    fn slots_per_box(&self) -> usize {
        BOX_SLOTS
    }

    fn party_count(&self) -> Result<usize, CoreError> {
        Ok(self.raw_party_count()?.min(PARTY_SLOTS))
    }

    fn empty_pkm(&self) -> Box<dyn Pkm> {
        pkm::blank(Generation::Eight, true)
    }

    fn pkm(&self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = (box_index * BOX_SLOTS + slot) * SLOT_LEN;
        read_slot(Generation::Eight, &self.block(keys::BOX)?[at..at + SLOT_LEN])
    }

    fn set_pkm(&mut self, box_index: usize, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_pkm")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let stored = if pkm.is_empty() {
            vec![0; SLOT_LEN]
        } else {
            stored_form(Generation::Eight, pkm, true)?
        };
        let at = (box_index * BOX_SLOTS + slot) * SLOT_LEN;
        self.block_mut(keys::BOX)?[at..at + SLOT_LEN].copy_from_slice(&stored);
        Ok(())
    }

    fn pkm_view(&mut self, box_index: usize, slot: usize) -> Result<Box<dyn Pkm + '_>, CoreError> {
        ensure_editing(self.editing, "pkm_view")?;
        check_slot(BOX_COUNT, BOX_SLOTS, box_index, slot)?;
        let at = (box_index * BOX_SLOTS + slot) * SLOT_LEN;
        let boxes = self.block_mut(keys::BOX)?;
        view_slot(Generation::Eight, &mut boxes[at..at + SLOT_LEN])
    }

    fn party_pkm(&self, slot: usize) -> Result<Box<dyn Pkm>, CoreError> {
        check_index("party slot", slot, PARTY_SLOTS)?;
        if slot >= self.party_count()? {
            return Ok(pkm::blank(Generation::Eight, true));
        }
        let at = slot * SLOT_LEN;
        read_slot(Generation::Eight, &self.block(keys::PARTY)?[at..at + SLOT_LEN])
    }

    fn set_party_pkm(&mut self, slot: usize, pkm: &dyn Pkm) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_party_pkm")?;
        let record = if pkm.is_empty() {
            None
        } else {
            Some(stored_form(Generation::Eight, pkm, true)?)
        };
        let count = self.party_count()?;
        let party = self.block_mut(keys::PARTY)?;
        let count = put_party_slot(
            &mut party[..PARTY_COUNT_AT],
            SLOT_LEN,
            count,
            slot,
            record.as_deref(),
        )?;
        party[PARTY_COUNT_AT] = count as u8;
        Ok(())
    }

    /// Species outside every regional dex the save carries are skipped.
    fn dex_update(&mut self, pkm: &dyn Pkm, registry: &TableRegistry) -> Result<(), CoreError> {
        ensure_editing(self.editing, "dex_update")?;
        if pkm.is_egg() {
            return Ok(());
        }
        let species = pkm.species();
        check_species(Generation::Eight, species)?;
        let Some((key, index)) = self.dex_location(species)? else {
            debug!("species {species} is in no Sword/Shield regional dex");
            return Ok(());
        };
        let female = matches!(pkm.gender(registry), Ok(Gender::Female));
        let (form, shiny, language) = (pkm.form(), pkm.is_shiny(), pkm.language());

        let block = self.block_mut(key)?;
        check_index("dex entry", index, block.len() / DexEntry8::LEN)?;
        let raw = &mut block[index * DexEntry8::LEN..(index + 1) * DexEntry8::LEN];
        let mut entry = DexEntry8::read(raw);
        if !entry.obtained {
            entry.display_form = u16::from(form);
            entry.display_shiny = shiny;
            entry.display_gender = u8::from(female);
        }
        entry.obtained = true;
        entry.set_seen_form(form, female, shiny);
        entry.set_language(language);
        entry.write(raw);
        Ok(())
    }

    fn dex_caught(&self, species: u16) -> Result<bool, CoreError> {
        Ok(self.dex_entry(species)?.is_some_and(|e| e.obtained))
    }

    fn dex_seen(&self, species: u16) -> Result<bool, CoreError> {
        Ok(self.dex_entry(species)?.is_some_and(|e| e.is_seen()))
    }

    fn pouches(&self) -> Vec<Pouch> {
        POUCHES.iter().map(PouchLayout::pouch).collect()
    }

    fn item(&self, pouch: usize, slot: usize) -> Result<ItemStack, CoreError> {
        let layout = pouch_at(&POUCHES, pouch)?;
        layout.item(&self.block(keys::ITEMS)?, slot)
    }

    fn set_item(&mut self, pouch: usize, slot: usize, stack: &ItemStack) -> Result<(), CoreError> {
        ensure_editing(self.editing, "set_item")?;
        let layout = pouch_at(&POUCHES, pouch)?;
        layout.set_item(self.block_mut(keys::ITEMS)?, slot, stack)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::personal::PersonalTable;
    use crate::sav::swsh::tests::test_keys;
    use crate::sav::swsh::{BlockKind, encode_block};

    /// A minimal signed image: the blocks this container reads plus an
    /// unrelated flag block.
    pub(crate) fn build_image(keys: &SwishKeys) -> Vec<u8> {
        let mut status = vec![0u8; 0x110];
        status[TID_AT] = 0x39;
        status[TID_AT + 1] = 0x30;
        status[GAME_AT] = 45;
        status[GENDER_AT] = 1;
        status[LANGUAGE_AT] = 2;
        utf16::encode(&mut status[OT_AT..OT_AT + NAME_LEN], "Gloria", 0);
        let blocks = [
            encode_block(keys::BOX, BlockKind::Object, &vec![0; BOX_COUNT * BOX_SLOTS * SLOT_LEN]),
            encode_block(keys::PARTY, BlockKind::Object, &vec![0; PARTY_COUNT_AT + 8]),
            encode_block(keys::MY_STATUS, BlockKind::Object, &status),
            encode_block(keys::MONEY, BlockKind::Value(10), &1234u32.to_le_bytes()),
            encode_block(keys::PLAY_TIME, BlockKind::Object, &[12, 0, 34, 56, 0, 0, 0, 0]),
            encode_block(keys::ITEMS, BlockKind::Object, &vec![0; 0x1190]),
            encode_block(keys::ZUKAN, BlockKind::Object, &vec![0; 400 * DexEntry8::LEN]),
            encode_block(keys::ZUKAN_ARMOR, BlockKind::Object, &vec![0; 211 * DexEntry8::LEN]),
            encode_block(0x0000_BEEF, BlockKind::Bool2, &[]),
        ];
        swsh::encrypt_image(&blocks.concat(), keys)
    }

    /// Gen 8 personal table where Grookey (810) is Galar #1 and Kubfu (891)
    /// is Isle of Armor #196.
    pub(crate) fn personal8() -> PersonalTable {
        let size = PersonalTable::record_size(Generation::Eight);
        let mut data = vec![0u8; size * 899];
        data[810 * size + 0x5C] = 1;
        data[891 * size + 0xAC] = 196;
        PersonalTable::from_bytes(Generation::Eight, data).unwrap()
    }

    fn open(registry: &TableRegistry) -> Sav8 {
        Sav8::new(build_image(&test_keys()), &test_keys(), registry).unwrap()
    }

    fn grookey() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Eight, false);
        pk.set_species(810);
        pk.set_encryption_constant(0xCAFE_0001);
        pk.set_language(Language::French);
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn trainer_comes_from_my_status() {
        let sav = open(&TableRegistry::new());
        let t = sav.trainer().unwrap();
        assert_eq!(t.ot_name, "Gloria");
        assert_eq!(t.tid, 12345);
        assert_eq!(t.version, GameVersion::Shield);
        assert_eq!(t.gender, 1);
        assert_eq!(t.money, 1234);
        assert_eq!(t.play_time, PlayTime { hours: 12, minutes: 34, seconds: 56 });
        assert_eq!(sav.pouches().len(), 10);
    }

    #[test]
    fn wrong_keys_or_missing_blocks_are_rejected() {
        let keys = test_keys();
        let image = build_image(&keys);
        let mut other = keys.clone();
        other.xorpad[0] ^= 0xFF;
        assert!(Sav8::new(image.clone(), &other, &TableRegistry::new()).is_none());

        let short = encode_block(keys::MONEY, BlockKind::Value(10), &[0; 4]);
        let short = swsh::encrypt_image(&short, &keys);
        assert!(Sav8::new(short, &keys, &TableRegistry::new()).is_none());
    }

    #[test]
    fn edits_survive_resealing() {
        let keys = test_keys();
        let mut sav = open(&TableRegistry::new());
        sav.set_money(20_000_000).unwrap();
        sav.set_ot_name("Hop").unwrap();
        sav.set_pkm(3, 7, grookey().as_ref()).unwrap();
        sav.set_party_pkm(4, grookey().as_ref()).unwrap();
        sav.set_item(4, 0, &ItemStack::new(1, 5)).unwrap();
        assert!(sav.resign().is_err());
        sav.finish_editing().unwrap();
        assert!(sav.set_money(1).is_err());
        assert!(swsh::is_signed(sav.bytes(), &keys));

        let image = Box::new(sav).into_bytes();
        let reopened = Sav8::new(image, &keys, &TableRegistry::new()).unwrap();
        let t = reopened.trainer().unwrap();
        assert_eq!(t.money, MONEY_MAX);
        assert_eq!(t.ot_name, "Hop");
        let pk = reopened.pkm(3, 7).unwrap();
        assert_eq!(pk.species(), 810);
        assert_eq!(pk.encryption_constant(), 0xCAFE_0001);
        assert_eq!(reopened.party_count().unwrap(), 1);
        assert_eq!(reopened.party_pkm(0).unwrap().species(), 810);
        assert_eq!(reopened.item(4, 0).unwrap(), ItemStack::new(1, 5));
        assert!(reopened.raw_block(0x0000_BEEF).is_some());
    }

    #[test]
    fn views_edit_the_box_block() {
        let mut sav = open(&TableRegistry::new());
        sav.set_pkm(0, 0, grookey().as_ref()).unwrap();
        {
            let mut view = sav.pkm_view(0, 0).unwrap();
            view.set_held_item(50);
            view.refresh_checksum();
        }
        assert_eq!(sav.pkm(0, 0).unwrap().held_item(), 50);
        assert!(sav.pkm(BOX_COUNT, 0).is_err());
    }

    #[test]
    fn dex_uses_regional_numbers() {
        let registry = TableRegistry::new().with_personal(personal8());
        let mut sav = open(&registry);
        sav.dex_update(grookey().as_ref(), &registry).unwrap();
        assert!(sav.dex_caught(810).unwrap());
        assert!(sav.dex_seen(810).unwrap());
        let entry = sav.dex_entry(810).unwrap().unwrap();
        assert!(entry.has_language(Language::French));
        assert!(!sav.dex_caught(891).unwrap());
        assert!(!sav.dex_seen(1).unwrap());
        assert!(sav.dex_seen(899).is_err());

        let mut kubfu = grookey();
        kubfu.set_species(891);
        sav.dex_update(kubfu.as_ref(), &registry).unwrap();
        assert!(sav.dex_caught(891).unwrap());
    }

    #[test]
    fn dex_without_personal_table_is_a_resource_error() {
        let sav = open(&TableRegistry::new());
        let err = sav.dex_caught(810).unwrap_err();
        assert_eq!(err.code, CoreErrorCode::Resource);
    }
}
