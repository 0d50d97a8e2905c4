//! Generation 1 record: big-endian data block followed by the OT name and
//! nickname fields (11 bytes each, 6 in the Japanese games).

use crate::core_api::{CoreError, check_index};
use crate::endian::{set_u16_be, set_u24_be, u16_be, u24_be};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::{Stat, calc_stat_gb};
use crate::tables::growth::exp_for_level;
use crate::tables::species;
use crate::text;

use super::{MOVE_SLOTS, Pkm, derived_gender, gb};

pub const DATA_BOX_LEN: usize = 33;
pub const DATA_PARTY_LEN: usize = 44;
pub const NAME_LEN: usize = 11;
pub const JP_NAME_LEN: usize = 6;
pub const BOX_LEN: usize = DATA_BOX_LEN + 2 * NAME_LEN;
pub const PARTY_LEN: usize = DATA_PARTY_LEN + 2 * NAME_LEN;
pub const JP_BOX_LEN: usize = DATA_BOX_LEN + 2 * JP_NAME_LEN;
pub const JP_PARTY_LEN: usize = DATA_PARTY_LEN + 2 * JP_NAME_LEN;

const DVS: usize = 0x1B;
const STAT_EXP: usize = 0x11;

#[derive(Debug, Clone)]
pub struct Pk1<S = Vec<u8>> {
    data: S,
    language: Language,
}

pub type BorrowedPk1<'a> = Pk1<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk1<S> {
    /// The Japanese lengths imply a Japanese record; others default to
    /// English until [`Pk1::with_language`] says otherwise.
    pub fn new(data: S) -> Option<Self> {
        let language = match data.as_ref().len() {
            BOX_LEN | PARTY_LEN => Language::English,
            JP_BOX_LEN | JP_PARTY_LEN => Language::Japanese,
            _ => return None,
        };
        Some(Self { data, language })
    }

    pub fn with_language(mut self, language: Language) -> Self {
        if !self.is_japanese() {
            self.language = language;
        }
        self
    }

    fn d(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn d_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn is_japanese(&self) -> bool {
        matches!(self.d().len(), JP_BOX_LEN | JP_PARTY_LEN)
    }

    fn name_len(&self) -> usize {
        if self.is_japanese() { JP_NAME_LEN } else { NAME_LEN }
    }

    fn data_len(&self) -> usize {
        self.d().len() - 2 * self.name_len()
    }

    fn ot_range(&self) -> std::ops::Range<usize> {
        let start = self.data_len();
        start..start + self.name_len()
    }

    fn nickname_range(&self) -> std::ops::Range<usize> {
        let start = self.data_len() + self.name_len();
        start..start + self.name_len()
    }

    /// Raw data block without the name fields, as stored in box lists.
    pub fn data_block(&self) -> &[u8] {
        &self.d()[..self.data_len()]
    }

    pub fn ot_name_raw(&self) -> &[u8] {
        &self.d()[self.ot_range()]
    }

    pub fn nickname_raw(&self) -> &[u8] {
        &self.d()[self.nickname_range()]
    }

    pub fn type1(&self) -> u8 {
        self.d()[0x05]
    }

    pub fn type2(&self) -> u8 {
        self.d()[0x06]
    }

    pub fn set_types(&mut self, type1: u8, type2: u8) {
        self.d_mut()[0x05] = type1;
        self.d_mut()[0x06] = type2;
    }

    /// Catch rate; read as a held item once the record moves to generation 2.
    pub fn catch_rate(&self) -> u8 {
        self.d()[0x07]
    }

    pub fn set_catch_rate(&mut self, rate: u8) {
        self.d_mut()[0x07] = rate;
    }

    pub fn status(&self) -> u8 {
        self.d()[0x04]
    }

    pub fn box_level(&self) -> u8 {
        self.d()[0x03]
    }

    pub fn set_box_level(&mut self, level: u8) {
        self.d_mut()[0x03] = level;
    }

    fn table_text(&self) -> bool {
        self.language == Language::Japanese
    }

    fn decode_name(&self, registry: &TableRegistry, range: std::ops::Range<usize>) -> String {
        match registry.char_table(Generation::One, Language::Japanese) {
            Some(table) if self.table_text() => text::g12::decode_with(table, &self.d()[range]),
            _ => text::g12::decode(&self.d()[range]),
        }
    }
}

impl Pk1<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        let data_len = if party { DATA_PARTY_LEN } else { DATA_BOX_LEN };
        let mut data = vec![0; data_len + 2 * NAME_LEN];
        data[data_len..].fill(text::g12::TERMINATOR);
        Self {
            data,
            language: Language::English,
        }
    }

    /// Joins a box-list data block with its separately stored names.
    pub fn from_parts(data: &[u8], ot_name: &[u8], nickname: &[u8]) -> Option<Self> {
        let mut bytes = Vec::with_capacity(data.len() + ot_name.len() + nickname.len());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(ot_name);
        bytes.extend_from_slice(nickname);
        Self::new(bytes)
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk1<S> {
    fn generation(&self) -> Generation {
        Generation::One
    }

    fn bytes(&self) -> &[u8] {
        self.d()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.d_mut()
    }

    fn is_party(&self) -> bool {
        self.data_len() == DATA_PARTY_LEN
    }

    fn box_len(&self) -> usize {
        DATA_BOX_LEN + 2 * self.name_len()
    }

    fn to_owned_pkm(&self) -> Box<dyn Pkm> {
        Box::new(Pk1 {
            data: self.d().to_vec(),
            language: self.language,
        })
    }

    fn species(&self) -> u16 {
        species::g1_to_national(self.d()[0x00])
    }

    fn set_species(&mut self, value: u16) {
        self.d_mut()[0x00] = species::national_to_g1(value);
    }

    fn tid(&self) -> u16 {
        u16_be(self.d(), 0x0C)
    }

    fn set_tid(&mut self, tid: u16) {
        set_u16_be(self.d_mut(), 0x0C, tid);
    }

    fn held_item(&self) -> u16 {
        0
    }

    fn set_held_item(&mut self, _item: u16) {}

    fn experience(&self) -> u32 {
        u24_be(self.d(), 0x0E)
    }

    fn set_experience(&mut self, exp: u32) {
        set_u24_be(self.d_mut(), 0x0E, exp);
    }

    /// Virtual Console transfers derive the nature from experience.
    fn nature(&self) -> u8 {
        (self.experience() % 25) as u8
    }

    fn ev(&self, stat: Stat) -> u16 {
        u16_be(self.d(), STAT_EXP + 2 * gb::stat_exp_index(stat))
    }

    fn set_ev(&mut self, stat: Stat, value: u16) {
        set_u16_be(self.d_mut(), STAT_EXP + 2 * gb::stat_exp_index(stat), value);
    }

    fn iv(&self, stat: Stat) -> u8 {
        gb::dv(self.d(), DVS, stat)
    }

    fn set_iv(&mut self, stat: Stat, value: u8) {
        gb::set_dv(self.d_mut(), DVS, stat, value);
    }

    fn move_id(&self, index: usize) -> Result<u16, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(u16::from(self.d()[0x08 + index]))
    }

    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x08 + index] = id.min(255) as u8;
        Ok(())
    }

    fn pp(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x1D + index] & 0x3F)
    }

    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        let byte = self.d()[0x1D + index] & 0xC0 | pp & 0x3F;
        self.d_mut()[0x1D + index] = byte;
        Ok(())
    }

    fn pp_ups(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x1D + index] >> 6)
    }

    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        let byte = self.d()[0x1D + index] & 0x3F | (ups & 3) << 6;
        self.d_mut()[0x1D + index] = byte;
        Ok(())
    }

    fn nickname(&self) -> String {
        text::g12::decode(&self.d()[self.nickname_range()])
    }

    fn set_nickname(&mut self, name: &str) {
        let range = self.nickname_range();
        text::g12::encode(&mut self.d_mut()[range], name);
    }

    fn nickname_with(&self, registry: &TableRegistry) -> String {
        self.decode_name(registry, self.nickname_range())
    }

    fn ot_name(&self) -> String {
        text::g12::decode(&self.d()[self.ot_range()])
    }

    fn set_ot_name(&mut self, name: &str) {
        let range = self.ot_range();
        text::g12::encode(&mut self.d_mut()[range], name);
    }

    fn ot_name_with(&self, registry: &TableRegistry) -> String {
        self.decode_name(registry, self.ot_range())
    }

    fn language(&self) -> Language {
        self.language
    }

    fn set_language(&mut self, language: Language) {
        if !self.is_japanese() && language != Language::Japanese {
            self.language = language;
        }
    }

    /// Generation 1 has no genders; the generation 2 rule applies when that
    /// table is available.
    fn gender(&self, registry: &TableRegistry) -> Result<Gender, CoreError> {
        if !registry.has_personal(Generation::Two) {
            return Ok(Gender::Genderless);
        }
        derived_gender(registry, Generation::Two, self.species(), self.iv(Stat::Atk) << 4)
    }

    fn is_egg(&self) -> bool {
        false
    }

    fn set_egg(&mut self, _egg: bool) {}

    fn is_shiny(&self) -> bool {
        gb::is_shiny(self.d(), DVS)
    }

    fn set_shiny(&mut self, shiny: bool) {
        gb::set_shiny(self.d_mut(), DVS, shiny);
    }

    fn hp_type(&self) -> u8 {
        gb::hp_type(self.d(), DVS)
    }

    fn level(&self, _registry: &TableRegistry) -> Result<u8, CoreError> {
        Ok(self.box_level())
    }

    fn set_level(&mut self, level: u8, registry: &TableRegistry) -> Result<(), CoreError> {
        let rate = registry
            .personal(Generation::One)?
            .info(self.species(), 0)
            .growth_rate();
        self.set_experience(exp_for_level(rate, level));
        self.d_mut()[0x03] = level;
        self.set_party_level(level);
        Ok(())
    }

    fn stat(&self, stat: Stat, registry: &TableRegistry) -> Result<u16, CoreError> {
        let table = registry.personal(Generation::One)?;
        let base = table.info(self.species(), 0).base_stat(stat);
        Ok(calc_stat_gb(stat, base, self.iv(stat), self.ev(stat), self.box_level()))
    }

    fn party_level(&self) -> u8 {
        if self.is_party() { self.d()[0x21] } else { 0 }
    }

    fn set_party_level(&mut self, level: u8) {
        if self.is_party() {
            self.d_mut()[0x21] = level;
        }
    }

    // Current HP is kept in the box block.
    fn party_current_hp(&self) -> u16 {
        u16_be(self.d(), 0x01)
    }

    fn set_party_current_hp(&mut self, hp: u16) {
        set_u16_be(self.d_mut(), 0x01, hp);
    }

    fn party_stat(&self, stat: Stat) -> u16 {
        if self.is_party() {
            u16_be(self.d(), 0x22 + 2 * gb::stat_exp_index(stat))
        } else {
            0
        }
    }

    fn set_party_stat(&mut self, stat: Stat, value: u16) {
        if self.is_party() {
            set_u16_be(self.d_mut(), 0x22 + 2 * gb::stat_exp_index(stat), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_select_language() {
        assert_eq!(Pk1::new(vec![0u8; 55]).unwrap().language(), Language::English);
        assert_eq!(Pk1::new(vec![0u8; 56]).unwrap().language(), Language::Japanese);
        assert!(Pk1::new(vec![0u8; 54]).is_none());
        let pk = Pk1::new(vec![0u8; 66]).unwrap().with_language(Language::French);
        assert_eq!(pk.language(), Language::French);
        assert!(pk.is_party());
    }

    #[test]
    fn species_and_big_endian_fields() {
        let mut pk = Pk1::blank(false);
        pk.set_species(25);
        pk.set_tid(0x1234);
        pk.set_experience(0x0102_03);
        assert_eq!(pk.bytes()[0], 0x54);
        assert_eq!(&pk.bytes()[0x0C..0x11], &[0x12, 0x34, 0x01, 0x02, 0x03]);
        assert_eq!(pk.species(), 25);
    }

    #[test]
    fn names_follow_the_data_block() {
        let mut pk = Pk1::blank(true);
        pk.set_ot_name("RED");
        pk.set_nickname("PIKACHU");
        assert_eq!(&pk.bytes()[44..48], &[0x91, 0x84, 0x83, 0x50]);
        assert_eq!(pk.ot_name(), "RED");
        assert_eq!(pk.nickname(), "PIKACHU");
        assert_eq!(pk.ot_name_raw().len(), NAME_LEN);
    }

    #[test]
    fn pp_and_ups_share_a_byte() {
        let mut pk = Pk1::blank(false);
        pk.set_pp(1, 30).unwrap();
        pk.set_pp_ups(1, 3).unwrap();
        assert_eq!(pk.bytes()[0x1E], 0xC0 | 30);
        assert_eq!(pk.pp(1).unwrap(), 30);
        assert!(pk.set_move(4, 1).is_err());
    }
}
