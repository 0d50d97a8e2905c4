//! Generation 7 record (Sun, Moon, Ultra Sun, Ultra Moon). Same frame as
//! generation 6; the former encounter-type byte holds hyper training flags.

use crate::core_api::{CoreError, check_index};
use crate::endian::{set_bits, set_u16_le, set_u32_le, u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::Stat;
use crate::text;

use super::crypto::{LcgLayout, shuffle_6plus, sum16};
use super::{Date, MOVE_SLOTS, Pkm, iv_from_word, iv_into_word};

pub const BOX_LEN: usize = 232;
pub const PARTY_LEN: usize = 260;

pub(crate) const LAYOUT: LcgLayout = LcgLayout {
    block_size: 0x38,
    box_len: BOX_LEN,
    party_len: PARTY_LEN,
    shuffle_of: shuffle_6plus,
    seed_with_checksum: false,
};

const NICKNAME: std::ops::Range<usize> = 0x40..0x5A;
const HT_NAME: std::ops::Range<usize> = 0x78..0x92;
const OT_NAME: std::ops::Range<usize> = 0xB0..0xCA;
const IV32: usize = 0x74;
const FORM_BYTE: usize = 0x1D;
const HYPER_TRAINING: usize = 0xDE;
/// Name terminators; both are zero in a decrypted record.
const CRYPT_MARKERS: [usize; 2] = [0x58, 0xC8];

#[derive(Debug, Clone)]
pub struct Pk7<S = Vec<u8>> {
    data: S,
    encrypted: bool,
}

pub type BorrowedPk7<'a> = Pk7<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk7<S> {
    pub fn new(data: S) -> Option<Self> {
        let len = data.as_ref().len();
        if len != BOX_LEN && len != PARTY_LEN {
            return None;
        }
        let encrypted = CRYPT_MARKERS
            .iter()
            .any(|&o| u16_le(data.as_ref(), o) != 0);
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

    fn read_text(&self, range: std::ops::Range<usize>) -> String {
        text::swap67(&text::utf16::decode(&self.d()[range], 0))
    }

    fn write_text(&mut self, range: std::ops::Range<usize>, s: &str) {
        text::utf16::encode(&mut self.d_mut()[range], &text::swap67(s), 0);
    }

    pub fn ht_friendship(&self) -> u8 {
        self.d()[0xA2]
    }

    pub fn set_ht_friendship(&mut self, friendship: u8) {
        self.d_mut()[0xA2] = friendship;
    }

    pub fn ht_gender(&self) -> u8 {
        self.d()[0x92]
    }

    pub fn set_ht_gender(&mut self, gender: u8) {
        self.d_mut()[0x92] = gender;
    }

    /// Country, region and console region of the origin game.
    pub fn geo(&self) -> (u8, u8, u8) {
        (self.d()[0xE0], self.d()[0xE1], self.d()[0xE2])
    }

    pub fn set_geo(&mut self, country: u8, region: u8, console_region: u8) {
        self.d_mut()[0xE0] = country;
        self.d_mut()[0xE1] = region;
        self.d_mut()[0xE2] = console_region;
    }

    /// Whether `stat` was hyper trained (counts as 31 for battle).
    pub fn hyper_trained(&self, stat: Stat) -> bool {
        self.d()[HYPER_TRAINING] >> stat.index() & 1 == 1
    }

    pub fn set_hyper_trained(&mut self, stat: Stat, trained: bool) {
        let bit = 1 << stat.index();
        if trained {
            self.d_mut()[HYPER_TRAINING] |= bit;
        } else {
            self.d_mut()[HYPER_TRAINING] &= !bit;
        }
    }
}

impl Pk7<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        Self {
            data: vec![0; if party { PARTY_LEN } else { BOX_LEN }],
            encrypted: false,
        }
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk7<S> {
    fn generation(&self) -> Generation {
        Generation::Seven
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
        let mut pk = Pk7 {
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
        u32_le(self.d(), 0x18)
    }

    fn set_pid(&mut self, pid: u32) {
        set_u32_le(self.d_mut(), 0x18, pid);
    }

    fn encryption_constant(&self) -> u32 {
        u32_le(self.d(), 0)
    }

    fn set_encryption_constant(&mut self, ec: u32) {
        set_u32_le(self.d_mut(), 0, ec);
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
        self.d()[0x1C]
    }

    fn set_nature(&mut self, nature: u8) {
        self.d_mut()[0x1C] = nature;
    }

    fn ability(&self) -> u16 {
        u16::from(self.d()[0x14])
    }

    fn set_ability(&mut self, ability: u16) {
        self.d_mut()[0x14] = ability.min(255) as u8;
    }

    fn ability_number(&self) -> u8 {
        self.d()[0x15]
    }

    fn set_ability_number(&mut self, number: u8) {
        self.d_mut()[0x15] = number;
    }

    fn ev(&self, stat: Stat) -> u16 {
        u16::from(self.d()[0x1E + stat.index()])
    }

    fn set_ev(&mut self, stat: Stat, value: u16) {
        self.d_mut()[0x1E + stat.index()] = value.min(255) as u8;
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
        Ok(u16_le(self.d(), 0x5A + 2 * index))
    }

    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        set_u16_le(self.d_mut(), 0x5A + 2 * index, id);
        Ok(())
    }

    fn pp(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x62 + index])
    }

    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x62 + index] = pp;
        Ok(())
    }

    fn pp_ups(&self, index: usize) -> Result<u8, CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        Ok(self.d()[0x66 + index])
    }

    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError> {
        check_index("move", index, MOVE_SLOTS)?;
        self.d_mut()[0x66 + index] = ups.min(3);
        Ok(())
    }

    fn relearn_move(&self, index: usize) -> Result<u16, CoreError> {
        check_index("relearn move", index, MOVE_SLOTS)?;
        Ok(u16_le(self.d(), 0x6A + 2 * index))
    }

    fn set_relearn_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        check_index("relearn move", index, MOVE_SLOTS)?;
        set_u16_le(self.d_mut(), 0x6A + 2 * index, id);
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

    fn ht_name(&self) -> String {
        self.read_text(HT_NAME)
    }

    fn set_ht_name(&mut self, name: &str) {
        self.write_text(HT_NAME, name);
    }

    fn current_handler(&self) -> u8 {
        self.d()[0x93]
    }

    fn set_current_handler(&mut self, handler: u8) {
        self.d_mut()[0x93] = handler;
    }

    fn language(&self) -> Language {
        Language::from_raw(self.d()[0xE3]).unwrap_or(Language::English)
    }

    fn set_language(&mut self, language: Language) {
        self.d_mut()[0xE3] = language.raw();
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
        self.d()[0xCA]
    }

    fn set_ot_friendship(&mut self, friendship: u8) {
        self.d_mut()[0xCA] = friendship;
    }

    fn ball(&self) -> u8 {
        self.d()[0xDC]
    }

    fn set_ball(&mut self, ball: u8) {
        self.d_mut()[0xDC] = ball;
    }

    fn met_level(&self) -> u8 {
        self.d()[0xDD] & 0x7F
    }

    fn set_met_level(&mut self, level: u8) {
        let byte = self.d()[0xDD] & 0x80 | level & 0x7F;
        self.d_mut()[0xDD] = byte;
    }

    fn met_location(&self) -> u16 {
        u16_le(self.d(), 0xDA)
    }

    fn set_met_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0xDA, location);
    }

    fn egg_location(&self) -> u16 {
        u16_le(self.d(), 0xD8)
    }

    fn set_egg_location(&mut self, location: u16) {
        set_u16_le(self.d_mut(), 0xD8, location);
    }

    fn met_date(&self) -> Option<Date> {
        Date::read(&self.d()[0xD4..0xD7])
    }

    fn set_met_date(&mut self, date: Option<Date>) {
        Date::write(date, &mut self.d_mut()[0xD4..0xD7]);
    }

    fn egg_date(&self) -> Option<Date> {
        Date::read(&self.d()[0xD1..0xD4])
    }

    fn set_egg_date(&mut self, date: Option<Date>) {
        Date::write(date, &mut self.d_mut()[0xD1..0xD4]);
    }

    fn version(&self) -> u8 {
        self.d()[0xDF]
    }

    fn set_version(&mut self, version: u8) {
        self.d_mut()[0xDF] = version;
    }

    fn ot_gender(&self) -> u8 {
        self.d()[0xDD] >> 7
    }

    fn set_ot_gender(&mut self, gender: u8) {
        let byte = self.d()[0xDD] & 0x7F | (gender & 1) << 7;
        self.d_mut()[0xDD] = byte;
    }

    fn pkrs_strain(&self) -> u8 {
        self.d()[0x2B] >> 4
    }

    fn pkrs_days(&self) -> u8 {
        self.d()[0x2B] & 0xF
    }

    fn set_pkrs(&mut self, strain: u8, days: u8) {
        self.d_mut()[0x2B] = (strain & 0xF) << 4 | (days & 0xF);
    }

    fn fateful_encounter(&self) -> bool {
        self.d()[FORM_BYTE] & 1 == 1
    }

    fn set_fateful_encounter(&mut self, fateful: bool) {
        self.set_form_byte(0, 1, u32::from(fateful));
    }

    fn markings(&self) -> u8 {
        self.d()[0x2A]
    }

    fn set_markings(&mut self, markings: u8) {
        self.d_mut()[0x2A] = markings;
    }

    fn party_level(&self) -> u8 {
        if self.is_party() { self.d()[0xEC] } else { 0 }
    }

    fn set_party_level(&mut self, level: u8) {
        if self.is_party() {
            self.d_mut()[0xEC] = level;
        }
    }

    fn party_current_hp(&self) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0xF0)
        } else {
            0
        }
    }

    fn set_party_current_hp(&mut self, hp: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0xF0, hp);
        }
    }

    fn party_stat(&self, stat: Stat) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0xF2 + 2 * stat.index())
        } else {
            0
        }
    }

    fn set_party_stat(&mut self, stat: Stat, value: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0xF2 + 2 * stat.index(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkm::Ribbon;

    #[test]
    fn alola_ribbons_and_hyper_training_round_trip() {
        let mut pk = Pk7::blank(false);
        pk.set_encryption_constant(0x1357_9BDF);
        pk.set_species(722);
        pk.set_nickname("Rowlet");
        pk.set_ribbon(Ribbon::ChampionAlola, true);
        pk.set_ribbon(Ribbon::BattleTreeMaster, true);
        pk.set_hyper_trained(Stat::SpA, true);
        pk.refresh_checksum();
        let back = Pk7::new(pk.encrypted_bytes()).unwrap();
        assert!(back.ribbon(Ribbon::ChampionAlola));
        assert!(back.ribbon(Ribbon::BattleTreeMaster));
        assert!(back.hyper_trained(Stat::SpA));
        assert!(!back.hyper_trained(Stat::SpD));
        assert_eq!(back.bytes()[0x36], 1);
        assert_eq!(back.nickname(), "Rowlet");
    }

    #[test]
    fn star_glyph_uses_the_private_use_code() {
        let mut pk = Pk7::blank(false);
        pk.set_ot_name("A\u{2605}");
        assert_eq!(u16_le(pk.bytes(), 0xB2), 0xE090);
        assert_eq!(pk.ot_name(), "A\u{2605}");
    }
}
