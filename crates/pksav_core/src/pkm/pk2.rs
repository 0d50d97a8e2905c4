//! Generation 2 record. Same frame as generation 1 with a held item,
//! friendship, Pokérus, caught data and split special stats. Egg status lives
//! in the owning party or box species list, so it travels beside the bytes.

use crate::core_api::{CoreError, check_index};
use crate::endian::{set_u16_be, set_u24_be, u16_be, u24_be};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::{Stat, calc_stat_gb};
use crate::tables::growth::exp_for_level;
use crate::tables::items;
use crate::text;

use super::{MOVE_SLOTS, Pkm, derived_gender, gb};

pub const DATA_BOX_LEN: usize = 32;
pub const DATA_PARTY_LEN: usize = 48;
pub const NAME_LEN: usize = 11;
pub const JP_NAME_LEN: usize = 6;
pub const BOX_LEN: usize = DATA_BOX_LEN + 2 * NAME_LEN;
pub const PARTY_LEN: usize = DATA_PARTY_LEN + 2 * NAME_LEN;
pub const JP_BOX_LEN: usize = DATA_BOX_LEN + 2 * JP_NAME_LEN;
pub const JP_PARTY_LEN: usize = DATA_PARTY_LEN + 2 * JP_NAME_LEN;

/// Species-list marker for an egg.
pub const EGG_MARKER: u8 = 0xFD;

const DVS: usize = 0x15;
const STAT_EXP: usize = 0x0B;
const CAUGHT: usize = 0x1D;
const PARTY_STATS: usize = 0x24;

#[derive(Debug, Clone)]
pub struct Pk2<S = Vec<u8>> {
    data: S,
    language: Language,
    egg: bool,
}

pub type BorrowedPk2<'a> = Pk2<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk2<S> {
    pub fn new(data: S) -> Option<Self> {
        let language = match data.as_ref().len() {
            BOX_LEN | PARTY_LEN => Language::English,
            JP_BOX_LEN | JP_PARTY_LEN => Language::Japanese,
            _ => return None,
        };
        Some(Self {
            data,
            language,
            egg: false,
        })
    }

    /// Korean saves share the international lengths; the container says
    /// which one it is.
    pub fn with_language(mut self, language: Language) -> Self {
        if !self.is_japanese() {
            self.language = language;
        }
        self
    }

    pub fn with_egg(mut self, egg: bool) -> Self {
        self.egg = egg;
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

    pub fn data_block(&self) -> &[u8] {
        &self.d()[..self.data_len()]
    }

    pub fn ot_name_raw(&self) -> &[u8] {
        &self.d()[self.ot_range()]
    }

    pub fn nickname_raw(&self) -> &[u8] {
        &self.d()[self.nickname_range()]
    }

    /// Value written to the owning species list for this record.
    pub fn list_species(&self) -> u8 {
        if self.egg { EGG_MARKER } else { self.d()[0x00] }
    }

    fn caught(&self) -> u16 {
        u16_be(self.d(), CAUGHT)
    }

    fn set_caught(&mut self, value: u16) {
        set_u16_be(self.d_mut(), CAUGHT, value);
    }

    /// 1 morning, 2 day, 3 night; 0 when the game did not record it.
    pub fn met_time_of_day(&self) -> u8 {
        (self.caught() >> 14) as u8
    }

    pub fn set_met_time_of_day(&mut self, time: u8) {
        let v = self.caught() & 0x3FFF | u16::from(time & 3) << 14;
        self.set_caught(v);
    }

    pub fn status(&self) -> u8 {
        if self.is_party() { self.d()[0x20] } else { 0 }
    }

    fn table_text(&self) -> Option<Language> {
        match self.language {
            Language::Japanese | Language::Korean => Some(self.language),
            _ => None,
        }
    }

    fn decode_name(&self, registry: &TableRegistry, range: std::ops::Range<usize>) -> String {
        let table = self
            .table_text()
            .and_then(|lang| registry.char_table(Generation::Two, lang));
        match table {
            Some(table) => text::g12::decode_with(table, &self.d()[range]),
            None => text::g12::decode(&self.d()[range]),
        }
    }
}

impl Pk2<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        let data_len = if party { DATA_PARTY_LEN } else { DATA_BOX_LEN };
        let mut data = vec![0; data_len + 2 * NAME_LEN];
        data[data_len..].fill(text::g12::TERMINATOR);
        Self {
            data,
            language: Language::English,
            egg: false,
        }
    }

    pub fn from_parts(data: &[u8], ot_name: &[u8], nickname: &[u8]) -> Option<Self> {
        let mut bytes = Vec::with_capacity(data.len() + ot_name.len() + nickname.len());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(ot_name);
        bytes.extend_from_slice(nickname);
        Self::new(bytes)
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk2<S> {
    fn generation(&self) -> Generation {
        Generation::Two
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
        Box::new(Pk2 {
            data: self.d().to_vec(),
            language: self.language,
            egg: self.egg,
        })
    }

    fn species(&self) -> u16 {
        u16::from(self.d()[0x00])
    }

    fn set_species(&mut self, species: u16) {
        self.d_mut()[0x00] = if species > 251 { 0 } else { species as u8 };
    }

    fn tid(&self) -> u16 {
        u16_be(self.d(), 0x06)
    }

    fn set_tid(&mut self, tid: u16) {
        set_u16_be(self.d_mut(), 0x06, tid);
    }

    fn held_item(&self) -> u16 {
        items::g2_to_national(self.d()[0x01])
    }

    fn set_held_item(&mut self, item: u16) {
        self.d_mut()[0x01] = items::national_to_g2(item);
    }

    fn experience(&self) -> u32 {
        u24_be(self.d(), 0x08)
    }

    fn set_experience(&mut self, exp: u32) {
        set_u24_be(self.d_mut(), 0x08, exp);
    }

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
        Ok(u16::from(self.d()[0x02 + index]))
    }

    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x02 + index] = id.min(255) as u8;
        Ok(())
    }

    fn pp(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x17 + index] & 0x3F)
    }

    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        let byte = self.d()[0x17 + index] & 0xC0 | pp & 0x3F;
        self.d_mut()[0x17 + index] = byte;
        Ok(())
    }

    fn pp_ups(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x17 + index] >> 6)
    }

    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        let byte = self.d()[0x17 + index] & 0x3F | (ups & 3) << 6;
        self.d_mut()[0x17 + index] = byte;
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

    fn gender(&self, registry: &TableRegistry) -> Result<Gender, CoreError> {
        derived_gender(registry, Generation::Two, self.species(), self.iv(Stat::Atk) << 4)
    }

    fn is_egg(&self) -> bool {
        self.egg
    }

    fn set_egg(&mut self, egg: bool) {
        self.egg = egg;
    }

    fn ot_friendship(&self) -> u8 {
        self.d()[0x1B]
    }

    fn set_ot_friendship(&mut self, friendship: u8) {
        self.d_mut()[0x1B] = friendship;
    }

    fn met_level(&self) -> u8 {
        (self.caught() >> 8 & 0x3F) as u8
    }

    fn set_met_level(&mut self, level: u8) {
        let v = self.caught() & !0x3F00 | u16::from(level & 0x3F) << 8;
        self.set_caught(v);
    }

    fn met_location(&self) -> u16 {
        self.caught() & 0x7F
    }

    fn set_met_location(&mut self, location: u16) {
        let v = self.caught() & !0x7F | location & 0x7F;
        self.set_caught(v);
    }

    fn ot_gender(&self) -> u8 {
        (self.caught() >> 7 & 1) as u8
    }

    fn set_ot_gender(&mut self, gender: u8) {
        let v = self.caught() & !0x80 | u16::from(gender & 1) << 7;
        self.set_caught(v);
    }

    fn pkrs_strain(&self) -> u8 {
        self.d()[0x1C] >> 4
    }

    fn pkrs_days(&self) -> u8 {
        self.d()[0x1C] & 0xF
    }

    fn set_pkrs(&mut self, strain: u8, days: u8) {
        self.d_mut()[0x1C] = (strain & 0xF) << 4 | days & 0xF;
    }

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
        Ok(self.d()[0x1F])
    }

    fn set_level(&mut self, level: u8, registry: &TableRegistry) -> Result<(), CoreError> {
        let rate = registry
            .personal(Generation::Two)?
            .info(self.species(), 0)
            .growth_rate();
        self.set_experience(exp_for_level(rate, level));
        self.d_mut()[0x1F] = level;
        Ok(())
    }

    fn stat(&self, stat: Stat, registry: &TableRegistry) -> Result<u16, CoreError> {
        let base = registry
            .personal(Generation::Two)?
            .info(self.species(), 0)
            .base_stat(stat);
        Ok(calc_stat_gb(stat, base, self.iv(stat), self.ev(stat), self.d()[0x1F]))
    }

    // Generation 2 keeps a single level byte for both forms.
    fn party_level(&self) -> u8 {
        self.d()[0x1F]
    }

    fn set_party_level(&mut self, level: u8) {
        self.d_mut()[0x1F] = level;
    }

    fn party_current_hp(&self) -> u16 {
        if self.is_party() { u16_be(self.d(), 0x22) } else { 0 }
    }

    fn set_party_current_hp(&mut self, hp: u16) {
        if self.is_party() {
            set_u16_be(self.d_mut(), 0x22, hp);
        }
    }

    fn party_stat(&self, stat: Stat) -> u16 {
        if self.is_party() {
            u16_be(self.d(), PARTY_STATS + 2 * stat.index())
        } else {
            0
        }
    }

    fn set_party_stat(&mut self, stat: Stat, value: u16) {
        if self.is_party() {
            set_u16_be(self.d_mut(), PARTY_STATS + 2 * stat.index(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_and_korean_override() {
        assert!(Pk2::new(vec![0u8; 54]).is_some());
        assert!(Pk2::new(vec![0u8; 70]).unwrap().is_party());
        assert_eq!(Pk2::new(vec![0u8; 44]).unwrap().language(), Language::Japanese);
        let pk = Pk2::new(vec![0u8; 54]).unwrap().with_language(Language::Korean);
        assert_eq!(pk.language(), Language::Korean);
        let jp = Pk2::new(vec![0u8; 60]).unwrap().with_language(Language::Korean);
        assert_eq!(jp.language(), Language::Japanese);
    }

    #[test]
    fn caught_data_packs_into_one_word() {
        let mut pk = Pk2::blank(false);
        pk.set_met_time_of_day(2);
        pk.set_met_level(5);
        pk.set_ot_gender(1);
        pk.set_met_location(0x2A);
        assert_eq!(&pk.bytes()[CAUGHT..CAUGHT + 2], &[0x85, 0xAA]);
        assert_eq!(pk.met_time_of_day(), 2);
        assert_eq!(pk.met_level(), 5);
        assert_eq!(pk.ot_gender(), 1);
        assert_eq!(pk.met_location(), 0x2A);
    }

    #[test]
    fn held_item_uses_generation_two_index() {
        let mut pk = Pk2::blank(false);
        pk.set_held_item(213);
        assert_eq!(pk.bytes()[0x01], 3);
        assert_eq!(pk.held_item(), 213);
    }

    #[test]
    fn egg_flag_goes_to_species_list() {
        let mut pk = Pk2::blank(true);
        pk.set_species(152);
        assert_eq!(pk.list_species(), 152);
        pk.set_egg(true);
        assert_eq!(pk.list_species(), EGG_MARKER);
        assert_eq!(pk.species(), 152);
    }

    #[test]
    fn party_stats_split_special() {
        let mut pk = Pk2::blank(true);
        pk.set_party_stat(Stat::SpA, 50);
        pk.set_party_stat(Stat::SpD, 60);
        assert_eq!(pk.party_stat(Stat::SpA), 50);
        assert_eq!(pk.party_stat(Stat::SpD), 60);
        assert_eq!(&pk.bytes()[0x2C..0x30], &[0, 50, 0, 60]);
    }
}
