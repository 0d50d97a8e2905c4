//! 3DS wonder cards. X/Y and Sun/Moon share one 0x108-byte layout; Sun/Moon
//! item cards may list up to six items.

use crate::endian::{u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::pkm::{Date, MOVE_SLOTS};
use crate::sav::ItemStack;
use crate::text::utf16;

use super::{AbilityType, Gift, IvSpec, PidType, date_from_decimal};

pub const LEN: usize = 0x108;

const CARD_ID: usize = 0x00;
const TITLE: std::ops::Range<usize> = 0x02..0x4A;
const DATE: usize = 0x4C;
const CARD_TYPE: usize = 0x51;
const FLAGS: usize = 0x52;
const ITEMS: usize = 0x68;
const NICKNAME: std::ops::Range<usize> = 0x86..0xA0;
const OT_NAME: std::ops::Range<usize> = 0xB6..0xD0;

const TYPE_POKEMON: u8 = 0;
const TYPE_ITEM: u8 = 1;
const MULTI_OBTAIN: u8 = 0b10;
const MAX_ITEMS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card3ds<const GEN: u8> {
    data: Vec<u8>,
}

pub type Wc6 = Card3ds<6>;

impl<const GEN: u8> Card3ds<GEN> {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        (data.len() == LEN).then_some(Self { data })
    }

    fn item_pair(&self, index: usize) -> ItemStack {
        let at = ITEMS + 4 * index;
        ItemStack::new(u16_le(&self.data, at), u16_le(&self.data, at + 2))
    }
}

impl<const GEN: u8> Gift for Card3ds<GEN> {
    fn generation(&self) -> Generation {
        if GEN == 6 {
            Generation::Six
        } else {
            Generation::Seven
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn card_id(&self) -> u16 {
        u16_le(&self.data, CARD_ID)
    }

    fn title(&self) -> String {
        utf16::decode(&self.data[TITLE], 0)
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
        let slots = if GEN == 6 { 1 } else { MAX_ITEMS };
        (0..slots)
            .map(|i| self.item_pair(i))
            .take_while(|s| s.item != 0)
            .map(|s| ItemStack::new(s.item, s.count.max(1)))
            .collect()
    }

    fn once_only(&self) -> bool {
        self.data[FLAGS] & MULTI_OBTAIN == 0
    }

    fn date(&self) -> Option<Date> {
        date_from_decimal(u32_le(&self.data, DATE))
    }

    fn encryption_constant(&self) -> Option<u32> {
        let ec = u32_le(&self.data, 0x70);
        (ec != 0).then_some(ec)
    }

    fn species(&self) -> u16 {
        u16_le(&self.data, 0x82)
    }

    fn form(&self) -> u8 {
        self.data[0x84]
    }

    fn level(&self) -> u8 {
        self.data[0xD0]
    }

    fn ball(&self) -> u8 {
        self.data[0x76]
    }

    fn held_item(&self) -> u16 {
        u16_le(&self.data, 0x78)
    }

    fn moves(&self) -> [u16; MOVE_SLOTS] {
        std::array::from_fn(|i| u16_le(&self.data, 0x7A + 2 * i))
    }

    fn relearn_moves(&self) -> [u16; MOVE_SLOTS] {
        std::array::from_fn(|i| u16_le(&self.data, 0xD8 + 2 * i))
    }

    fn iv_spec(&self) -> IvSpec {
        IvSpec::from_bytes(&self.data[0xAF..0xB5])
    }

    fn pid_type(&self) -> PidType {
        match self.data[0xA3] {
            0 => PidType::Fixed(u32_le(&self.data, 0xD4)),
            2 => PidType::AlwaysShiny,
            3 => PidType::NeverShiny,
            _ => PidType::Random,
        }
    }

    fn ability_type(&self) -> AbilityType {
        AbilityType::from_raw(self.data[0xA2])
    }

    fn nature(&self) -> Option<u8> {
        let nature = self.data[0xA0];
        (nature < 25).then_some(nature)
    }

    fn gender(&self) -> Option<Gender> {
        let raw = self.data[0xA1];
        (raw < 3).then(|| Gender::from_raw(raw))
    }

    fn language(&self) -> Option<Language> {
        Language::from_raw(self.data[0x85])
    }

    fn nickname(&self) -> Option<String> {
        let name = utf16::decode(&self.data[NICKNAME], 0);
        (!name.is_empty()).then_some(name)
    }

    fn ot_name(&self) -> String {
        utf16::decode(&self.data[OT_NAME], 0)
    }

    fn ot_gender(&self) -> u8 {
        self.data[0xB5]
    }

    fn tid(&self) -> u16 {
        u16_le(&self.data, 0x68)
    }

    fn sid(&self) -> u16 {
        u16_le(&self.data, 0x6A)
    }

    fn origin_game(&self) -> u8 {
        self.data[0x6C]
    }

    fn met_location(&self) -> u16 {
        u16_le(&self.data, 0xA6)
    }

    fn egg_location(&self) -> u16 {
        u16_le(&self.data, 0xA4)
    }

    fn met_level(&self) -> u8 {
        self.data[0xA8]
    }

    fn is_egg(&self) -> bool {
        self.data[0xD1] != 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::endian::{set_u16_le, set_u32_le};

    /// A creature card for species `species` at level `level` with three
    /// guaranteed perfect IVs and a receiver-owned OT.
    pub(crate) fn creature_card(card_id: u16, species: u16, level: u8) -> Vec<u8> {
        let mut raw = vec![0u8; LEN];
        set_u16_le(&mut raw, CARD_ID, card_id);
        utf16::encode(&mut raw[TITLE], "Event", 0);
        set_u32_le(&mut raw, DATE, 20140105);
        raw[CARD_TYPE] = TYPE_POKEMON;
        set_u16_le(&mut raw, 0x82, species);
        raw[0x76] = 4;
        set_u16_le(&mut raw, 0x7A, 33);
        raw[0xA0] = 0xFF;
        raw[0xA1] = 3;
        raw[0xA2] = 4;
        raw[0xA3] = 1;
        set_u16_le(&mut raw, 0xA6, 40001);
        raw[0xAF..0xB5].copy_from_slice(&[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        raw[0xD0] = level;
        raw
    }

    #[test]
    fn creature_card_fields() {
        let card = Wc6::new(creature_card(501, 150, 70)).unwrap();
        assert_eq!(card.generation(), Generation::Six);
        assert!(card.is_pokemon());
        assert!(card.once_only());
        assert_eq!(card.title(), "Event");
        assert_eq!(card.date(), Some(Date::new(2014, 1, 5)));
        assert_eq!(card.species(), 150);
        assert_eq!(card.moves(), [33, 0, 0, 0]);
        assert_eq!(card.iv_spec(), IvSpec::Flawless(3));
        assert_eq!(card.ability_type(), AbilityType::RandomAny);
        assert_eq!(card.pid_type(), PidType::Random);
        assert_eq!(card.gender(), None);
        assert!(card.ot_name().is_empty());
    }

    #[test]
    fn item_card_holds_one_stack() {
        let mut raw = vec![0u8; LEN];
        raw[CARD_TYPE] = TYPE_ITEM;
        raw[FLAGS] = MULTI_OBTAIN;
        set_u16_le(&mut raw, ITEMS, 50);
        set_u16_le(&mut raw, ITEMS + 2, 3);
        set_u16_le(&mut raw, ITEMS + 4, 28);
        let card = Wc6::new(raw).unwrap();
        assert!(!card.once_only());
        assert_eq!(card.items(), vec![ItemStack::new(50, 3)]);
    }
}
