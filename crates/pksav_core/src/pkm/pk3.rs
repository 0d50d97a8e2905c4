//! Generation 3 record: 32-byte header, four 12-byte substructures XOR'd
//! with `pid ^ otid` and shuffled by `pid % 24`, then the party block.

use crate::core_api::{CoreError, check_index};
use crate::endian::{get_bits, set_bits, set_u16_le, set_u32_le, u16_le, u32_le};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::Stat;
use crate::tables::{items, species};
use crate::text;

use super::crypto::{shuffle, sum16, unshuffle_inverse, xor_words};
use super::{MOVE_SLOTS, Pkm, derived_gender, iv_from_word, iv_into_word};

pub const BOX_LEN: usize = 80;
pub const PARTY_LEN: usize = 100;
const BLOCK_SIZE: usize = 12;
const DATA_START: usize = 0x20;
const DATA_END: usize = 0x50;

const NICKNAME: usize = 0x08;
const NICKNAME_LEN: usize = 10;
const OT_NAME: usize = 0x14;
const OT_NAME_LEN: usize = 7;
const FLAGS: usize = 0x13;
const CHECKSUM: usize = 0x1C;
const ORIGINS: usize = 0x46;
const IV32: usize = 0x48;
const RIBBONS: usize = 0x4C;

#[derive(Debug, Clone)]
pub struct Pk3<S = Vec<u8>> {
    data: S,
    encrypted: bool,
}

pub type BorrowedPk3<'a> = Pk3<&'a mut [u8]>;

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pk3<S> {
    /// Wraps a stored record. A record whose header checksum does not match
    /// its plain data is treated as encrypted and decrypted in place.
    pub fn new(data: S) -> Option<Self> {
        let len = data.as_ref().len();
        if len != BOX_LEN && len != PARTY_LEN {
            return None;
        }
        let mut pk = Self {
            data,
            encrypted: false,
        };
        if pk.checksum() != pk.calc_checksum() {
            pk.encrypted = true;
            pk.decrypt();
        }
        Some(pk)
    }

    fn key(data: &[u8]) -> u32 {
        u32_le(data, 0) ^ u32_le(data, 4)
    }

    fn crypt_in_place(data: &mut [u8], encrypting: bool) {
        let key = Self::key(data);
        let sv = (u32_le(data, 0) % 24) as usize;
        if encrypting {
            unshuffle_inverse(data, DATA_START, sv, BLOCK_SIZE);
            xor_words(data, DATA_START, DATA_END, key);
        } else {
            xor_words(data, DATA_START, DATA_END, key);
            shuffle(data, DATA_START, sv, BLOCK_SIZE);
        }
    }

    fn d(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn d_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    fn origins(&self) -> u32 {
        u32::from(u16_le(self.d(), ORIGINS))
    }

    fn set_origins(&mut self, shift: u32, width: u32, value: u32) {
        let word = set_bits(self.origins(), shift, width, value) as u16;
        set_u16_le(self.d_mut(), ORIGINS, word);
    }

    fn iv32(&self) -> u32 {
        u32_le(self.d(), IV32)
    }

    fn set_iv32(&mut self, value: u32) {
        set_u32_le(self.d_mut(), IV32, value);
    }

    /// Contest condition (cool, beauty, cute, smart, tough, sheen).
    pub fn contest_stat(&self, index: usize) -> Result<u8, CoreError> {
        check_index("contest stat", index, 6)?;
        Ok(self.d()[0x3E + index])
    }

    pub fn set_contest_stat(&mut self, index: usize, value: u8) -> Result<(), CoreError> {
        check_index("contest stat", index, 6)?;
        self.d_mut()[0x3E + index] = value;
        Ok(())
    }

    pub fn is_bad_egg(&self) -> bool {
        self.d()[FLAGS] & 1 != 0
    }

    pub fn status(&self) -> u32 {
        if self.is_party() {
            u32_le(self.d(), 0x50)
        } else {
            0
        }
    }

    fn uses_table(&self) -> bool {
        self.language() == Language::Japanese
    }
}

impl Pk3<Vec<u8>> {
    pub fn blank(party: bool) -> Self {
        Self {
            data: vec![0; if party { PARTY_LEN } else { BOX_LEN }],
            encrypted: false,
        }
    }
}

fn move_offset(index: usize) -> Result<usize, CoreError> {
    check_index("move", index, MOVE_SLOTS)?;
    Ok(index)
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> Pkm for Pk3<S> {
    fn generation(&self) -> Generation {
        Generation::Three
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
            Self::crypt_in_place(self.d_mut(), true);
            self.encrypted = true;
        }
    }

    fn decrypt(&mut self) {
        if self.encrypted {
            Self::crypt_in_place(self.d_mut(), false);
            self.encrypted = false;
        }
    }

    fn encrypted_bytes(&self) -> Vec<u8> {
        let mut out = self.d().to_vec();
        if !self.encrypted {
            Self::crypt_in_place(&mut out, true);
        }
        out
    }

    fn to_owned_pkm(&self) -> Box<dyn Pkm> {
        let mut pk = Pk3 {
            data: self.d().to_vec(),
            encrypted: self.encrypted,
        };
        pk.decrypt();
        Box::new(pk)
    }

    fn checksum(&self) -> u16 {
        u16_le(self.d(), CHECKSUM)
    }

    fn calc_checksum(&self) -> u16 {
        sum16(self.d(), DATA_START, DATA_END)
    }

    fn refresh_checksum(&mut self) {
        let sum = self.calc_checksum();
        set_u16_le(self.d_mut(), CHECKSUM, sum);
    }

    fn species(&self) -> u16 {
        species::g3_to_national(u16_le(self.d(), 0x20))
    }

    fn set_species(&mut self, value: u16) {
        set_u16_le(self.d_mut(), 0x20, species::national_to_g3(value));
        if value == 0 {
            self.d_mut()[FLAGS] &= !2;
        } else {
            self.d_mut()[FLAGS] |= 2;
        }
    }

    fn pid(&self) -> u32 {
        u32_le(self.d(), 0)
    }

    fn set_pid(&mut self, pid: u32) {
        set_u32_le(self.d_mut(), 0, pid);
    }

    fn tid(&self) -> u16 {
        u16_le(self.d(), 0x04)
    }

    fn set_tid(&mut self, tid: u16) {
        set_u16_le(self.d_mut(), 0x04, tid);
    }

    fn sid(&self) -> u16 {
        u16_le(self.d(), 0x06)
    }

    fn set_sid(&mut self, sid: u16) {
        set_u16_le(self.d_mut(), 0x06, sid);
    }

    fn held_item(&self) -> u16 {
        items::g3_to_national(u16_le(self.d(), 0x22))
    }

    fn set_held_item(&mut self, item: u16) {
        set_u16_le(self.d_mut(), 0x22, items::national_to_g3(item));
    }

    fn experience(&self) -> u32 {
        u32_le(self.d(), 0x24)
    }

    fn set_experience(&mut self, exp: u32) {
        set_u32_le(self.d_mut(), 0x24, exp);
    }

    fn ability_number(&self) -> u8 {
        if self.iv32() >> 31 == 1 { 2 } else { 1 }
    }

    fn set_ability_number(&mut self, number: u8) {
        let word = set_bits(self.iv32(), 31, 1, u32::from(number == 2));
        self.set_iv32(word);
    }

    fn ev(&self, stat: Stat) -> u16 {
        u16::from(self.d()[0x38 + stat.index()])
    }

    fn set_ev(&mut self, stat: Stat, value: u16) {
        self.d_mut()[0x38 + stat.index()] = value.min(255) as u8;
    }

    fn iv(&self, stat: Stat) -> u8 {
        iv_from_word(self.iv32(), stat)
    }

    fn set_iv(&mut self, stat: Stat, value: u8) {
        let word = iv_into_word(self.iv32(), stat, value);
        self.set_iv32(word);
    }

    fn move_id(&self, index: usize) -> Result<u16, CoreError> {
        Ok(u16_le(self.d(), 0x2C + 2 * move_offset(index)?))
    }

    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError> {
        let offset = 0x2C + 2 * move_offset(index)?;
        set_u16_le(self.d_mut(), offset, id);
        Ok(())
    }

    fn pp(&self, index: usize) -> Result<u8, CoreError> {
        Ok(self.d()[0x34 + move_offset(index)?])
    }

    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError> {
        let offset = 0x34 + move_offset(index)?;
        self.d_mut()[offset] = pp;
        Ok(())
    }

    fn pp_ups(&self, index: usize) -> Result<u8, CoreError> {
        let shift = 2 * move_offset(index)? as u32;
        Ok(get_bits(u32::from(self.d()[0x28]), shift, 2) as u8)
    }

    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError> {
        let shift = 2 * move_offset(index)? as u32;
        let packed = set_bits(u32::from(self.d()[0x28]), shift, 2, u32::from(ups.min(3)));
        self.d_mut()[0x28] = packed as u8;
        Ok(())
    }

    fn nickname(&self) -> String {
        text::g3::decode(&self.d()[NICKNAME..NICKNAME + NICKNAME_LEN])
    }

    fn set_nickname(&mut self, name: &str) {
        text::g3::encode(&mut self.d_mut()[NICKNAME..NICKNAME + NICKNAME_LEN], name);
    }

    fn nickname_with(&self, registry: &TableRegistry) -> String {
        match registry.char_table(Generation::Three, Language::Japanese) {
            Some(table) if self.uses_table() => {
                let raw = &self.d()[NICKNAME..NICKNAME + NICKNAME_LEN];
                table.decode_bytes(raw, text::g3::TERMINATOR)
            }
            _ => self.nickname(),
        }
    }

    fn ot_name(&self) -> String {
        text::g3::decode(&self.d()[OT_NAME..OT_NAME + OT_NAME_LEN])
    }

    fn set_ot_name(&mut self, name: &str) {
        text::g3::encode(&mut self.d_mut()[OT_NAME..OT_NAME + OT_NAME_LEN], name);
    }

    fn ot_name_with(&self, registry: &TableRegistry) -> String {
        match registry.char_table(Generation::Three, Language::Japanese) {
            Some(table) if self.uses_table() => {
                table.decode_bytes(&self.d()[OT_NAME..OT_NAME + OT_NAME_LEN], text::g3::TERMINATOR)
            }
            _ => self.ot_name(),
        }
    }

    fn language(&self) -> Language {
        Language::from_raw(self.d()[0x12]).unwrap_or(Language::English)
    }

    fn set_language(&mut self, language: Language) {
        self.d_mut()[0x12] = language.raw();
    }

    fn gender(&self, registry: &TableRegistry) -> Result<Gender, CoreError> {
        derived_gender(registry, Generation::Three, self.species(), self.pid() as u8)
    }

    fn is_egg(&self) -> bool {
        self.iv32() >> 30 & 1 == 1
    }

    fn set_egg(&mut self, egg: bool) {
        let word = set_bits(self.iv32(), 30, 1, u32::from(egg));
        self.set_iv32(word);
        if egg {
            self.d_mut()[FLAGS] |= 4;
        } else {
            self.d_mut()[FLAGS] &= !4;
        }
    }

    fn ot_friendship(&self) -> u8 {
        self.d()[0x29]
    }

    fn set_ot_friendship(&mut self, friendship: u8) {
        self.d_mut()[0x29] = friendship;
    }

    fn ball(&self) -> u8 {
        get_bits(self.origins(), 11, 4) as u8
    }

    fn set_ball(&mut self, ball: u8) {
        self.set_origins(11, 4, u32::from(ball));
    }

    fn met_level(&self) -> u8 {
        get_bits(self.origins(), 0, 7) as u8
    }

    fn set_met_level(&mut self, level: u8) {
        self.set_origins(0, 7, u32::from(level));
    }

    fn met_location(&self) -> u16 {
        u16::from(self.d()[0x45])
    }

    fn set_met_location(&mut self, location: u16) {
        self.d_mut()[0x45] = location.min(255) as u8;
    }

    fn version(&self) -> u8 {
        get_bits(self.origins(), 7, 4) as u8
    }

    fn set_version(&mut self, version: u8) {
        self.set_origins(7, 4, u32::from(version));
    }

    fn ot_gender(&self) -> u8 {
        get_bits(self.origins(), 15, 1) as u8
    }

    fn set_ot_gender(&mut self, gender: u8) {
        self.set_origins(15, 1, u32::from(gender & 1));
    }

    fn pkrs_strain(&self) -> u8 {
        self.d()[0x44] >> 4
    }

    fn pkrs_days(&self) -> u8 {
        self.d()[0x44] & 0xF
    }

    fn set_pkrs(&mut self, strain: u8, days: u8) {
        self.d_mut()[0x44] = (strain & 0xF) << 4 | (days & 0xF);
    }

    fn fateful_encounter(&self) -> bool {
        u32_le(self.d(), RIBBONS) >> 31 == 1
    }

    fn set_fateful_encounter(&mut self, fateful: bool) {
        let word = set_bits(u32_le(self.d(), RIBBONS), 31, 1, u32::from(fateful));
        set_u32_le(self.d_mut(), RIBBONS, word);
    }

    fn markings(&self) -> u8 {
        self.d()[0x1B]
    }

    fn set_markings(&mut self, markings: u8) {
        self.d_mut()[0x1B] = markings;
    }

    fn party_level(&self) -> u8 {
        if self.is_party() { self.d()[0x54] } else { 0 }
    }

    fn set_party_level(&mut self, level: u8) {
        if self.is_party() {
            self.d_mut()[0x54] = level;
        }
    }

    fn party_current_hp(&self) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0x56)
        } else {
            0
        }
    }

    fn set_party_current_hp(&mut self, hp: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0x56, hp);
        }
    }

    fn party_stat(&self, stat: Stat) -> u16 {
        if self.is_party() {
            u16_le(self.d(), 0x58 + 2 * stat.index())
        } else {
            0
        }
    }

    fn set_party_stat(&mut self, stat: Stat, value: u16) {
        if self.is_party() {
            set_u16_le(self.d_mut(), 0x58 + 2 * stat.index(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Pk3 {
        let mut pk = Pk3::blank(false);
        pk.set_pid(0x1234_5677);
        pk.set_tid(12345);
        pk.set_sid(54321);
        pk.set_species(252);
        pk.set_experience(1_000);
        pk.set_move(0, 33).unwrap();
        pk.set_pp(0, 35).unwrap();
        pk.set_iv(Stat::Spe, 31);
        pk.set_nickname("TREECKO");
        pk.set_language(Language::English);
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn species_is_stored_in_internal_order() {
        let pk = sample();
        assert_eq!(u16_le(pk.bytes(), 0x20), 277);
        assert_eq!(pk.species(), 252);
    }

    #[test]
    fn stored_form_is_detected_and_decrypted() {
        let pk = sample();
        let stored = pk.encrypted_bytes();
        assert_ne!(stored, pk.bytes());
        let back = Pk3::new(stored).unwrap();
        assert!(!back.is_encrypted());
        assert_eq!(back.bytes(), pk.bytes());
        assert_eq!(back.nickname(), "TREECKO");
        assert_eq!(back.move_id(0).unwrap(), 33);
    }

    #[test]
    fn encrypt_and_decrypt_are_idempotent() {
        let mut pk = sample();
        let plain = pk.bytes().to_vec();
        pk.encrypt();
        let once = pk.bytes().to_vec();
        pk.encrypt();
        assert_eq!(pk.bytes(), once.as_slice());
        pk.decrypt();
        pk.decrypt();
        assert_eq!(pk.bytes(), plain.as_slice());
    }

    #[test]
    fn pp_ups_share_one_byte() {
        let mut pk = sample();
        pk.set_pp_ups(2, 3).unwrap();
        pk.set_pp_ups(1, 1).unwrap();
        assert_eq!(pk.bytes()[0x28], 0b0011_0100);
        assert!(pk.pp_ups(4).is_err());
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(Pk3::new(vec![0u8; 81]).is_none());
        assert!(Pk3::new(vec![0u8; PARTY_LEN]).is_some());
    }
}
