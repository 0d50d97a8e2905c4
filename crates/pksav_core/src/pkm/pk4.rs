//! Generation 4 record (Diamond, Pearl, Platinum, HeartGold, SoulSilver).

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
pub const PARTY_LEN: usize = 236;

pub(crate) const LAYOUT: LcgLayout = LcgLayout {
    block_size: 0x20,
    box_len: BOX_LEN,
    party_len: PARTY_LEN,
    shuffle_of: shuffle_45,
    seed_with_checksum: true,
};

const NICKNAME: std::ops::Range<usize> = 0x48..0x5E;
const OT_NAME: std::ops::Range<usize> = 0x68..0x78;
const IV32: usize = 0x38;
const FORM_BYTE: usize = 0x40;
/// Unused word that is zero in a decrypted record.
const CRYPT_MARKER: usize = 0x64;
/// Stand-in met location written to the Diamond/Pearl field when the real
/// location only exists in later games.
const FARAWAY_PLACE: u16 = 3002;

#[derive(Debug, Clone)]
pub struct Pk4<S = Vec<u8>> {
    data: S,
    encrypted: bool,
}

pub type BorrowedPk4<'a> = Pk4<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk4<S> {
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

    /// HeartGold/SoulSilver shiny leaf flags.
    pub fn shiny_leaves(&self) -> u8 {
        self.d()[0x41]
    }

    pub fn set_shiny_leaves(&mut self, leaves: u8) {
        self.d_mut()[0x41] = leaves;
    }

    pub fn encounter_type(&self) -> u8 {
        self.d()[0x85]
    }

    pub fn set_encounter_type(&mut self, kind: u8) {
        self.d_mut()[0x85] = kind;
    }

    fn table_language(&self) -> bool {
        matches!(self.language(), Language::Japanese | Language::Korean)
    }
}

impl Pk4<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        Self {
            data: vec![0; if party { PARTY_LEN } else { BOX_LEN }],
            encrypted: false,
        }
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk4<S> {
    fn generation(&self) -> Generation {
        Generation::Four
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
        let mut pk = Pk4 {
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

    fn ability(&self) -> u16 {
        u16::from(self.d()[0x15])
    }

    fn set_ability(&mut self, ability: u16) {
        self.d_mut()[0x15] = ability.min(255) as u8;
    }

    fn ability_number(&self) -> u8 {
        if self.pid() & 1 == 1 { 2 } else { 1 }
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
        text::g4::decode(&self.d()[NICKNAME])
    }

    fn set_nickname(&mut self, name: &str) {
        text::g4::encode(&mut self.d_mut()[NICKNAME], name);
    }

    fn nickname_with(&self, registry: &TableRegistry) -> String {
        match registry.char_table(Generation::Four, self.language()) {
            Some(table) if self.table_language() => {
                text::g4::decode_with(table, &self.d()[NICKNAME])
            }
            _ => self.nickname(),
        }
    }

    fn ot_name(&self) -> String {
        text::g4::decode(&self.d()[OT_NAME])
    }

    fn set_ot_name(&mut self, name: &str) {
        text::g4::encode(&mut self.d_mut()[OT_NAME], name);
    }

    fn ot_name_with(&self, registry: &TableRegistry) -> String {
        match registry.char_table(Generation::Four, self.language()) {
            Some(table) if self.table_language() => {
                text::g4::decode_with(table, &self.d()[OT_NAME])
            }
            _ => self.ot_name(),
        }
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
        match self.d()[0x86] {
            0 => self.d()[0x83],
            hgss => hgss,
        }
    }

    fn set_ball(&mut self, ball: u8) {
        let (dppt, hgss) = if ball <= 0x10 { (ball, 0) } else { (4, ball) };
        self.d_mut()[0x83] = dppt;
        self.d_mut()[0x86] = hgss;
    }

    fn met_level(&self) -> u8 {
        self.d()[0x84] & 0x7F
    }

    fn set_met_level(&mut self, level: u8) {
        let byte = self.d()[0x84] & 0x80 | level & 0x7F;
        self.d_mut()[0x84] = byte;
    }

    fn met_location(&self) -> u16 {
        match u16_le(self.d(), 0x46) {
            0 => u16_le(self.d(), 0x80),
            pt => pt,
        }
    }

    fn set_met_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0x46, location);
        set_u16_le(self.d_mut(), 0x80, dp_location(location));
    }

    fn egg_location(&self) -> u16 {
        match u16_le(self.d(), 0x44) {
            0 => u16_le(self.d(), 0x7E),
            pt => pt,
        }
    }

    fn set_egg_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0x44, location);
        set_u16_le(self.d_mut(), 0x7E, dp_location(location));
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

fn dp_location(location: u16) -> u16 {
    if location <= 111 || location >= 2000 {
        location
    } else {
        FARAWAY_PLACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(party: bool) -> Pk4 {
        let mut pk = Pk4::blank(party);
        pk.set_pid(0x5A5A_1234);
        pk.set_species(448);
        pk.set_tid(100);
        pk.set_form(0);
        pk.set_gender(Gender::Male);
        pk.set_nickname("Lucario");
        pk.set_ot_name("Dawn");
        pk.set_ball(0x11);
        pk.set_met_location(126);
        pk.set_met_date(Some(Date::new(2009, 3, 14)));
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn stored_bytes_round_trip_through_new() {
        for party in [false, true] {
            let pk = sample(party);
            let stored = pk.encrypted_bytes();
            assert_ne!(u32_le(&stored, CRYPT_MARKER), 0);
            let back = Pk4::new(stored).unwrap();
            assert_eq!(back.bytes(), pk.bytes());
            assert!(back.is_valid_checksum());
        }
    }

    #[test]
    fn apricorn_balls_use_the_heartgold_field() {
        let pk = sample(false);
        assert_eq!(pk.bytes()[0x83], 4);
        assert_eq!(pk.ball(), 0x11);
    }

    #[test]
    fn platinum_locations_fall_back_for_diamond_pearl() {
        let pk = sample(false);
        assert_eq!(pk.met_location(), 126);
        assert_eq!(u16_le(pk.bytes(), 0x80), FARAWAY_PLACE);
    }

    #[test]
    fn gender_and_form_share_a_byte() {
        let mut pk = sample(false);
        pk.set_fateful_encounter(true);
        pk.set_form(5);
        pk.set_gender(Gender::Female);
        assert_eq!(pk.bytes()[FORM_BYTE], 5 << 3 | 1 << 1 | 1);
        assert_eq!(pk.gender(&TableRegistry::default()).unwrap(), Gender::Female);
        assert_eq!(pk.form(), 5);
        assert!(pk.fateful_encounter());
    }

    #[test]
    fn met_date_reads_back() {
        let pk = sample(false);
        assert_eq!(pk.met_date(), Some(Date::new(2009, 3, 14)));
        assert_eq!(pk.egg_date(), None);
    }
}
