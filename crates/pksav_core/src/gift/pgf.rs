//! Generation 5 wonder card.

use crate::endian::{u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::pkm::{Date, MOVE_SLOTS};
use crate::sav::ItemStack;
use crate::text::utf16;

use super::{AbilityType, Gift, IvSpec, PidType};

pub const LEN: usize = 0xCC;

const TERMINATOR: u16 = 0xFFFF;
const CARD_POKEMON: u8 = 1;
const CARD_ITEM: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pgf {
    data: Vec<u8>,
}

impl Pgf {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        (data.len() == LEN).then_some(Self { data })
    }

    fn card_type(&self) -> u8 {
        self.data[0xB3]
    }
}

impl Gift for Pgf {
    fn generation(&self) -> Generation {
        Generation::Five
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn card_id(&self) -> u16 {
        u16_le(&self.data, 0xB0)
    }

    fn title(&self) -> String {
        utf16::decode(&self.data[0x60..0xAA], TERMINATOR)
    }

    fn is_pokemon(&self) -> bool {
        self.card_type() == CARD_POKEMON
    }

    fn is_item(&self) -> bool {
        self.card_type() == CARD_ITEM
    }

    fn items(&self) -> Vec<ItemStack> {
        if self.is_item() {
            vec![ItemStack::new(self.held_item(), 1)]
        } else {
            Vec::new()
        }
    }

    fn once_only(&self) -> bool {
        self.data[0xB4] & 4 == 0
    }

    fn date(&self) -> Option<Date> {
        let year = u16_le(&self.data, 0xAC);
        let (month, day) = (self.data[0xAE], self.data[0xAF]);
        (month != 0).then(|| Date::new(year, month, day))
    }

    fn species(&self) -> u16 {
        u16_le(&self.data, 0x1A)
    }

    fn form(&self) -> u8 {
        self.data[0x1C]
    }

    fn level(&self) -> u8 {
        self.data[0x5B]
    }

    fn ball(&self) -> u8 {
        self.data[0x0E]
    }

    fn held_item(&self) -> u16 {
        u16_le(&self.data, 0x10)
    }

    fn moves(&self) -> [u16; MOVE_SLOTS] {
        std::array::from_fn(|i| u16_le(&self.data, 0x12 + 2 * i))
    }

    fn iv_spec(&self) -> IvSpec {
        IvSpec::from_bytes(&self.data[0x43..0x49])
    }

    /// A non-zero PID is used as is unless the card asks for a shiny.
    fn pid_type(&self) -> PidType {
        let pid = u32_le(&self.data, 0x08);
        match self.data[0x37] {
            2 => PidType::AlwaysShiny,
            0 if pid != 0 => PidType::Fixed(pid),
            0 => PidType::NeverShiny,
            _ => PidType::Random,
        }
    }

    fn ability_type(&self) -> AbilityType {
        AbilityType::from_raw(self.data[0x36])
    }

    fn nature(&self) -> Option<u8> {
        let nature = self.data[0x34];
        (nature < 25).then_some(nature)
    }

    fn gender(&self) -> Option<Gender> {
        match self.data[0x35] {
            2 => None,
            raw => Some(Gender::from_raw(raw)),
        }
    }

    fn language(&self) -> Option<Language> {
        Language::from_raw(self.data[0x1D])
    }

    fn nickname(&self) -> Option<String> {
        let name = utf16::decode(&self.data[0x1E..0x34], TERMINATOR);
        (!name.is_empty()).then_some(name)
    }

    fn ot_name(&self) -> String {
        utf16::decode(&self.data[0x4A..0x5A], TERMINATOR)
    }

    fn ot_gender(&self) -> u8 {
        self.data[0x5A]
    }

    fn tid(&self) -> u16 {
        u16_le(&self.data, 0x00)
    }

    fn sid(&self) -> u16 {
        u16_le(&self.data, 0x02)
    }

    fn origin_game(&self) -> u8 {
        self.data[0x04]
    }

    fn met_location(&self) -> u16 {
        u16_le(&self.data, 0x3A)
    }

    fn egg_location(&self) -> u16 {
        u16_le(&self.data, 0x38)
    }

    fn met_level(&self) -> u8 {
        self.data[0x3C]
    }

    fn is_egg(&self) -> bool {
        self.data[0x5C] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{set_u16_le, set_u32_le};

    #[test]
    fn reads_fixed_template_fields() {
        let mut raw = vec![0u8; LEN];
        set_u16_le(&mut raw, 0xB0, 1234);
        raw[0xB3] = CARD_POKEMON;
        set_u16_le(&mut raw, 0x1A, 494);
        raw[0x5B] = 15;
        set_u32_le(&mut raw, 0x08, 0x1234_5678);
        raw[0x37] = 0;
        raw[0x34] = 0xFF;
        raw[0x35] = 2;
        raw[0x43..0x49].fill(0xFF);
        utf16::encode(&mut raw[0x4A..0x5A], "N", TERMINATOR);

        let card = Pgf::new(raw).unwrap();
        assert_eq!(card.card_id(), 1234);
        assert!(card.is_pokemon());
        assert!(card.once_only());
        assert_eq!(card.species(), 494);
        assert_eq!(card.pid_type(), PidType::Fixed(0x1234_5678));
        assert_eq!(card.nature(), None);
        assert_eq!(card.gender(), None);
        assert_eq!(card.iv_spec(), IvSpec::Random);
        assert_eq!(card.ot_name(), "N");
        assert!(Pgf::new(vec![0; LEN - 1]).is_none());
    }
}
