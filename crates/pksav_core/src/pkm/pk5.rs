//! Generation 5 record (Black, White, Black 2, White 2).

use crate::core_api::{CoreError, check_index};
use crate::endian::{set_bits, set_u16_le, set_u32_le, u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::Stat;
use crate::text;

use super::crypto::{LcgLayout, shuffle_45, sum16};
use super::{Date, MOVE_SLOTS, Pkm, iv_from_word, iv_into_word};

pub const BOX_LEN: usize = 136;
pub const PARTY_LEN: usize = 220;

pub(crate) const LAYOUT: LcgLayout = LcgLayout {
    block_size: 0x20,
    box_len: BOX_LEN,
    party_len: PARTY_LEN,
    shuffle_of: shuffle_45,
    seed_with_checksum: true,
};

const NICKNAME: std::ops::Range<usize> = 0x48..0x5E;
const OT_NAME: std::ops::Range<usize> = 0x68..0x78;
const TERMINATOR: u16 = 0xFFFF;
const IV32: usize = 0x38;
const FORM_BYTE: usize = 0x40;
const CRYPT_MARKER: usize = 0x64;

#[derive(Debug, Clone)]
pub struct Pk5<S = Vec<u8>> {
    data: S,
    encrypted: bool,
}

pub type BorrowedPk5<'a> = Pk5<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk5<S> {
    pub fn new(data: S) -> Option<Self> {
        let len = data.as_ref().len();
        if len != BOX_LEN && len != PARTY_LEN {
            return None;
        }
        let encrypted = u32_le(data.as_ref(), CRYPT_MARKER) != 0;
        let mut pk = Self { data, encrypted };
        pk.decrypt();
        Some(pk)
    }

    fn d(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn d_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn iv32(&self) -> u32 {
        u32_le(self.d(), IV32)
    }

    fn set_iv32(&mut self, value: u32) {
        set_u32_le(self.d_mut(), IV32, value);
    }

    fn set_form_byte(&mut self, shift: u32, width: u32, value: u32) {
        let byte = set_bits(u32::from(self.d()[FORM_BYTE]), shift, width, value) as u8;
        self.d_mut()[FORM_BYTE] = byte;
    }

    pub fn hidden_ability(&self) -> bool {
        self.d()[0x42] & 1 == 1
    }

    pub fn set_hidden_ability(&mut self, hidden: bool) {
        let byte = self.d()[0x42] & !1 | u8::from(hidden);
        self.d_mut()[0x42] = byte;
    }

    /// N's Pokémon sparkle flag.
    pub fn n_sparkle(&self) -> bool {
        self.d()[0x42] & 2 == 2
    }

    pub fn set_n_sparkle(&mut self, sparkle: bool) {
        let byte = self.d()[0x42] & !2 | u8::from(sparkle) << 1;
        self.d_mut()[0x42] = byte;
    }

    fn read_text(&self, range: std::ops::Range<usize>) -> String {
        text::swap45(&text::utf16::decode(&self.d()[range], TERMINATOR))
    }

    fn write_text(&mut self, range: std::ops::Range<usize>, s: &str) {
        text::utf16::encode(&mut self.d_mut()[range], &text::swap45(s), TERMINATOR);
    }
}

impl Pk5<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        Self {
            data: vec![0; if party { PARTY_LEN } else { BOX_LEN }],
            encrypted: false,
        }
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk5<S> {
    fn generation(&self) -> Generation {
        Generation::Five
    }

    fn bytes(&self) -> &[u8] {
        self.d()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.d_mut()
    }

    fn is_party(&self) -> bool {
        self.d().len() == PARTY_LEN
    }

    fn box_len(&self) -> usize {
        BOX_LEN
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn encrypt(&mut self) {
        if !self.encrypted {
            LAYOUT.encrypt(self.d_mut());
            self.encrypted = true;
        }
    }

    fn decrypt(&mut self) {
        if self.encrypted {
            LAYOUT.decrypt(self.d_mut());
            self.encrypted = false;
        }
    }

    fn encrypted_bytes(&self) -> Vec<u8> {
        let mut out = self.d().to_vec();
        if !self.encrypted {
            LAYOUT.encrypt(&mut out);
        }
        out
    }

    fn to_owned_pkm(&self) -> Box<dyn Pkm> {
        let mut pk = Pk5 {
            data: self.d().to_vec(),
            encrypted: self.encrypted,
        };
        pk.decrypt();
        Box::new(pk)
    }

    fn checksum(&self) -> u16 {
        u16_le(self.d(), 0x06)
    }

    fn calc_checksum(&self) -> u16 {
        sum16(self.d(), 0x08, BOX_LEN)
    }

    fn refresh_checksum(&mut self) {
        let sum = self.calc_checksum();
        set_u16_le(self.d_mut(), 0x06, sum);
    }

    fn species(&self) -> u16 {
        u16_le(self.d(), 0x08)
    }

    fn set_species(&mut self, species: u16) {
        set_u16_le(self.d_mut(), 0x08, species);
    }

    fn form(&self) -> u8 {
        self.d()[FORM_BYTE] >> 3
    }

    fn set_form(&mut self, form: u8) {
        self.set_form_byte(3, 5, u32::from(form));
    }

    fn pid(&self) -> u32 {
        u32_le(self.d(), 0)
    }

    fn set_pid(&mut self, pid: u32) {
        set_u32_le(self.d_mut(), 0, pid);
    }

    fn tid(&self) -> u16 {
        u16_le(self.d(), 0x0C)
    }

    fn set_tid(&mut self, tid: u16) {
        set_u16_le(self.d_mut(), 0x0C, tid);
    }

    fn sid(&self) -> u16 {
        u16_le(self.d(), 0x0E)
    }

    fn set_sid(&mut self, sid: u16) {
        set_u16_le(self.d_mut(), 0x0E, sid);
    }

    fn held_item(&self) -> u16 {
        u16_le(self.d(), 0x0A)
    }

    fn set_held_item(&mut self, item: u16) {
        set_u16_le(self.d_mut(), 0x0A, item);
    }

    fn experience(&self) -> u32 {
        u32_le(self.d(), 0x10)
    }

    fn set_experience(&mut self, exp: u32) {
        set_u32_le(self.d_mut(), 0x10, exp);
    }

    fn nature(&self) -> u8 {
        self.d()[0x41]
    }

    fn set_nature(&mut self, nature: u8) {
        self.d_mut()[0x41] = nature;
    }

    fn ability(&self) -> u16 {
        u16::from(self.d()[0x15])
    }

    fn set_ability(&mut self, ability: u16) {
        self.d_mut()[0x15] = ability.min(255) as u8;
    }

    fn ability_number(&self) -> u8 {
        if self.hidden_ability() {
            4
        } else if self.pid() >> 16 & 1 == 1 {
            2
        } else {
            1
        }
    }

    fn set_ability_number(&mut self, number: u8) {
        self.set_hidden_ability(number == 4);
    }

    fn ev(&self, stat: Stat) -> u16 {
        u16::from(self.d()[0x18 + stat.index()])
    }

    fn set_ev(&mut self, stat: Stat, value: u16) {
        self.d_mut()[0x18 + stat.index()] = value.min(255) as u8;
    }

    fn iv(&self, stat: Stat) -> u8 {
        iv_from_word(self.iv32(), stat)
    }

    fn set_iv(&mut self, stat: Stat, value: u8) {
        let word = iv_into_word(self.iv32(), stat, value);
        self.set_iv32(word);
    }

    fn move_id(&self, index: usize) -> Result<u16, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(u16_le(self.d(), 0x28 + 2 * index))
    }

    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        set_u16_le(self.d_mut(), 0x28 + 2 * index, id);
        Ok(())
    }

    fn pp(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x30 + index])
    }

    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x30 + index] = pp;
        Ok(())
    }

    fn pp_ups(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x34 + index])
    }

    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x34 + index] = ups.min(3);
        Ok(())
    }

    fn nickname(&self) -> String {
        self.read_text(NICKNAME)
    }

    fn set_nickname(&mut self, name: &str) {
        self.write_text(NICKNAME, name);
    }

    fn ot_name(&self) -> String {
        self.read_text(OT_NAME)
    }

    fn set_ot_name(&mut self, name: &str) {
        self.write_text(OT_NAME, name);
    }

    fn language(&self) -> Language {
        Language::from_raw(self.d()[0x17]).unwrap_or(Language::English)
    }

    fn set_language(&mut self, language: Language) {
        self.d_mut()[0x17] = language.raw();
    }

    fn gender(&self, _registry: &TableRegistry) -> Result<Gender, CoreError> {
        Ok(Gender::from_raw(self.d()[FORM_BYTE] >> 1 & 3))
    }

    fn set_gender(&mut self, gender: Gender) {
        self.set_form_byte(1, 2, u32::from(gender.raw()));
    }

    fn is_egg(&self) -> bool {
        self.iv32() >> 30 & 1 == 1
    }

    fn set_egg(&mut self, egg: bool) {
        let word = set_bits(self.iv32(), 30, 1, u32::from(egg));
        self.set_iv32(word);
    }

    fn is_nicknamed(&self) -> bool {
        self.iv32() >> 31 == 1
    }

    fn set_nicknamed(&mut self, nicknamed: bool) {
        let word = set_bits(self.iv32(), 31, 1, u32::from(nicknamed));
        self.set_iv32(word);
    }

    fn ot_friendship(&self) -> u8 {
        self.d()[0x14]
    }

    fn set_ot_friendship(&mut self, friendship: u8) {
        self.d_mut()[0x14] = friendship;
    }

    fn ball(&self) -> u8 {
        self.d()[0x83]
    }

    fn set_ball(&mut self, ball: u8) {
        self.d_mut()[0x83] = ball;
    }

    fn met_level(&self) -> u8 {
        self.d()[0x84] & 0x7F
    }

    fn set_met_level(&mut self, level: u8) {
        let byte = self.d()[0x84] & 0x80 | level & 0x7F;
        self.d_mut()[0x84] = byte;
    }

    fn met_location(&self) -> u16 {
        u16_le(self.d(), 0x80)
    }

    fn set_met_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0x80, location);
    }

    fn egg_location(&self) -> u16 {
        u16_le(self.d(), 0x7E)
    }

    fn set_egg_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0x7E, location);
    }

    fn met_date(&self) -> Option<Date> {
        Date::read(&self.d()[0x7B..0x7E])
    }

    fn set_met_date(&mut self, date: Option<Date>) {
        Date::write(date, &mut self.d_mut()[0x7B..0x7E]);
    }

    fn egg_date(&self) -> Option<Date> {
        Date::read(&self.d()[0x78..0x7B])
    }

    fn set_egg_date(&mut self, date: Option<Date>) {
        Date::write(date, &mut self.d_mut()[0x78..0x7B]);
    }

    fn version(&self) -> u8 {
        self.d()[0x5F]
    }

    fn set_version(&mut self, version: u8) {
        self.d_mut()[0x5F] = version;
    }

    fn ot_gender(&self) -> u8 {
        self.d()[0x84] >> 7
    }

    fn set_ot_gender(&mut self, gender: u8) {
        let byte = self.d()[0x84] & 0x7F | (gender & 1) << 7;
        self.d_mut()[0x84] = byte;
    }

    fn pkrs_strain(&self) -> u8 {
        self.d()[0x82] >> 4
    }

    fn pkrs_days(&self) -> u8 {
        self.d()[0x82] & 0xF
    }

    fn set_pkrs(&mut self, strain: u8, days: u8) {
        self.d_mut()[0x82] = (strain & 0xF) << 4 | (days & 0xF);
    }

    fn fateful_encounter(&self) -> bool {
        self.d()[FORM_BYTE] & 1 == 1
    }

    fn set_fateful_encounter(&mut self, fateful: bool) {
        self.set_form_byte(0, 1, u32::from(fateful));
    }

    fn markings(&self) -> u8 {
        self.d()[0x16]
    }

    fn set_markings(&mut self, markings: u8) {
        self.d_mut()[0x16] = markings;
    }

    fn party_level(&self) -> u8 {
        if self.is_party() { self.d()[0x8C] } else { 0 }
    }

    fn set_party_level(&mut self, level: u8) {
        if self.is_party() {
            self.d_mut()[0x8C] = level;
        }
    }

    fn party_current_hp(&self) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0x8E)
        } else {
            0
        }
    }

    fn set_party_current_hp(&mut self, hp: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0x8E, hp);
        }
    }

    fn party_stat(&self, stat: Stat) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0x90 + 2 * stat.index())
        } else {
            0
        }
    }

    fn set_party_stat(&mut self, stat: Stat, value: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0x90 + 2 * stat.index(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_symbols_are_stored_as_private_use_glyphs() {
        let mut pk = Pk5::blank(false);
        pk.set_nickname("Nidoran♀");
        let stored = u16_le(pk.bytes(), 0x48 + 2 * 7);
        assert_eq!(stored, 0x246E);
        assert_eq!(pk.nickname(), "Nidoran♀");
        assert_eq!(u16_le(pk.bytes(), 0x48 + 2 * 8), TERMINATOR);
    }

    #[test]
    fn hidden_ability_overrides_pid_slot() {
        let mut pk = Pk5::blank(false);
        pk.set_pid(0x0001_0000);
        assert_eq!(pk.ability_number(), 2);
        pk.set_ability_number(4);
        assert_eq!(pk.ability_number(), 4);
        pk.set_n_sparkle(true);
        assert!(pk.hidden_ability());
        assert_eq!(pk.bytes()[0x42], 3);
    }

    #[test]
    fn party_tail_survives_encryption() {
        let mut pk = Pk5::blank(true);
        pk.set_pid(0xCAFE_BABE);
        pk.set_species(494);
        pk.set_party_level(15);
        pk.set_party_stat(Stat::Spe, 40);
        pk.refresh_checksum();
        let back = Pk5::new(pk.encrypted_bytes()).unwrap();
        assert_eq!(back.party_level(), 15);
        assert_eq!(back.party_stat(Stat::Spe), 40);
        assert_eq!(back.species(), 494);
    }
}
