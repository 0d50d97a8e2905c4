//! Sword/Shield wonder card (0x2D0 bytes). Titles are message-table ids on
//! this format, so no text title is stored.

use crate::endian::{u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::pkm::MOVE_SLOTS;
use crate::sav::ItemStack;
use crate::text::utf16;

use super::{AbilityType, Gift, IvSpec, PidType};

pub const LEN: usize = 0x2D0;

const CARD_ID: usize = 0x08;
const FLAGS: usize = 0x0E;
const CARD_TYPE: usize = 0x0F;
const ITEMS: usize = 0x20;
const MAX_ITEMS: usize = 6;
const NICKNAME: std::ops::Range<usize> = 0x30..0x4A;
const OT_NAME: std::ops::Range<usize> = 0x4A..0x64;

const TYPE_POKEMON: u8 = 1;
const TYPE_ITEM: u8 = 2;
const MULTI_OBTAIN: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wc8 {
    data: Vec<u8>,
}

impl Wc8 {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        (data.len() == LEN).then_some(Self { data })
    }

    pub fn dynamax_level(&self) -> u8 {
        self.data[0x24D]
    }

    pub fn can_gigantamax(&self) -> bool {
        self.data[0x24E] != 0
    }
}

impl Gift for Wc8 {
    fn generation(&self) -> Generation {
        Generation::Eight
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn card_id(&self) -> u16 {
        u16_le(&self.data, CARD_ID)
    }

    fn title(&self) -> String {
        format!("Wonder Card {:04}", self.card_id())
    }

    fn is_pokemon(&self) -> bool {
        self.data[CARD_TYPE] == TYPE_POKEMON
    }

    fn is_item(&self) -> bool {
        self.data[CARD_TYPE] == TYPE_ITEM
    }

    fn items(&self) -> Vec<ItemStack> {
        if !self.is_item() {
            return Vec::new();
        }
        (0..MAX_ITEMS)
            .map(|i| {
                let at = ITEMS + 4 * i;
                ItemStack::new(u16_le(&self.data, at), u16_le(&self.data, at + 2).max(1))
            })
            .take_while(|s| s.item != 0)
            .collect()
    }

    fn once_only(&self) -> bool {
        self.data[FLAGS] & MULTI_OBTAIN == 0
    }

    fn encryption_constant(&self) -> Option<u32> {
        let ec = u32_le(&self.data, 0x28);
        (ec != 0).then_some(ec)
    }

    fn species(&self) -> u16 {
        u16_le(&self.data, 0x234)
    }

    fn form(&self) -> u8 {
        self.data[0x236]
    }

    fn level(&self) -> u8 {
        self.data[0x238]
    }

    fn ball(&self) -> u8 {
        self.data[0x220]
    }

    fn held_item(&self) -> u16 {
        u16_le(&self.data, 0x222)
    }

    fn moves(&self) -> [u16; MOVE_SLOTS] {
        std::array::from_fn(|i| u16_le(&self.data, 0x224 + 2 * i))
    }

    fn relearn_moves(&self) -> [u16; MOVE_SLOTS] {
        std::array::from_fn(|i| u16_le(&self.data, 0x22C + 2 * i))
    }

    fn iv_spec(&self) -> IvSpec {
        IvSpec::from_bytes(&self.data[0x246..0x24C])
    }

    fn pid_type(&self) -> PidType {
        match self.data[0x23C] {
            0 => PidType::Fixed(u32_le(&self.data, 0x2C)),
            2 => PidType::AlwaysShiny,
            3 => PidType::NeverShiny,
            _ => PidType::Random,
        }
    }

    fn ability_type(&self) -> AbilityType {
        AbilityType::from_raw(self.data[0x23B])
    }

    fn nature(&self) -> Option<u8> {
        let nature = self.data[0x23A];
        (nature < 25).then_some(nature)
    }

    fn gender(&self) -> Option<Gender> {
        let raw = self.data[0x237];
        (raw < 3).then(|| Gender::from_raw(raw))
    }

    fn language(&self) -> Option<Language> {
        Language::from_raw(self.data[0x24F])
    }

    fn nickname(&self) -> Option<String> {
        let name = utf16::decode(&self.data[NICKNAME], 0);
        (!name.is_empty()).then_some(name)
    }

    fn ot_name(&self) -> String {
        utf16::decode(&self.data[OT_NAME], 0)
    }

    fn ot_gender(&self) -> u8 {
        self.data[0x24C]
    }

    fn tid(&self) -> u16 {
        u16_le(&self.data, 0x20)
    }

    fn sid(&self) -> u16 {
        u16_le(&self.data, 0x22)
    }

    fn origin_game(&self) -> u8 {
        self.data[0x24]
    }

    fn met_location(&self) -> u16 {
        u16_le(&self.data, 0x240)
    }

    fn egg_location(&self) -> u16 {
        u16_le(&self.data, 0x242)
    }

    fn met_level(&self) -> u8 {
        self.data[0x244]
    }

    fn is_egg(&self) -> bool {
        self.data[0x239] != 0
    }
}
