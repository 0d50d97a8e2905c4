//! Creature records. Each generation is one flat codec over a byte buffer,
//! generic over its storage: `Vec<u8>` for an exclusively owned record or
//! `&mut [u8]` for a view into a container's buffer.

pub mod convert;
pub mod crypto;
mod gb;
pub mod pk1;
pub mod pk2;
pub mod pk3;
pub mod pk4;
pub mod pk5;
pub mod pk6;
pub mod pk7;
pub mod pk8;
pub mod ribbon;

pub use convert::convert;
pub use pk1::Pk1;
pub use pk2::Pk2;
pub use pk3::Pk3;
pub use pk4::Pk4;
pub use pk5::Pk5;
pub use pk6::Pk6;
pub use pk7::Pk7;
pub use pk8::Pk8;
pub use ribbon::Ribbon;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, check_index};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::registry::TableRegistry;
use crate::stats::{Stat, calc_stat};
use crate::tables::growth::{exp_for_level, level_for_exp};

pub const MOVE_SLOTS: usize = 4;

/// Calendar date as stored in met/egg fields (year offset from 2000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Reads a `[year - 2000, month, day]` triple; all zero means unset.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        if bytes[1] == 0 && bytes[2] == 0 {
            return None;
        }
        Some(Self::new(2000 + u16::from(bytes[0]), bytes[1], bytes[2]))
    }

    pub fn write(date: Option<Self>, bytes: &mut [u8]) {
        match date {
            Some(d) => {
                bytes[0] = d.year.saturating_sub(2000).min(255) as u8;
                bytes[1] = d.month;
                bytes[2] = d.day;
            }
            None => bytes[..3].fill(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub id: u16,
    pub pp: u8,
    pub pp_ups: u8,
}

/// Serializable view of one record. Fields that need external tables are
/// `None` when the registry lacks them.
#[derive(Debug, Clone, Serialize)]
pub struct PkmSummary {
    pub generation: Generation,
    pub species: u16,
    pub form: u8,
    pub nickname: String,
    pub ot_name: String,
    pub tid: u16,
    pub sid: u16,
    pub pid: u32,
    pub experience: u32,
    pub level: Option<u8>,
    pub gender: Option<Gender>,
    pub nature: u8,
    pub ability: u16,
    pub held_item: u16,
    pub is_egg: bool,
    pub is_shiny: bool,
    pub language: Language,
    pub version: u8,
    pub ball: u8,
    pub met_level: u8,
    pub met_location: u16,
    pub met_date: Option<Date>,
    pub moves: Vec<MoveSlot>,
    pub ivs: [u8; 6],
    pub evs: [u16; 6],
    pub stats: Option<[u16; 6]>,
    pub ribbons: Vec<Ribbon>,
    pub checksum_valid: bool,
}

/// Field access shared by every generation's record. Accessors for fields a
/// format does not store return a neutral value and their setters do
/// nothing.
pub trait Pkm {
    fn generation(&self) -> Generation;
    fn bytes(&self) -> &[u8];
    fn bytes_mut(&mut self) -> &mut [u8];
    fn is_party(&self) -> bool;
    /// Length of the stored (box) form.
    fn box_len(&self) -> usize;
    fn is_encrypted(&self) -> bool {
        false
    }
    fn encrypt(&mut self) {}
    fn decrypt(&mut self) {}
    /// Stored form of the record, leaving `self` untouched.
    fn encrypted_bytes(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }
    /// Decrypted, owned copy.
    fn to_owned_pkm(&self) -> Box<dyn Pkm>;

    fn checksum(&self) -> u16 {
        0
    }
    fn calc_checksum(&self) -> u16 {
        0
    }
    fn refresh_checksum(&mut self) {}
    fn is_valid_checksum(&self) -> bool {
        self.checksum() == self.calc_checksum()
    }

    fn species(&self) -> u16;
    fn set_species(&mut self, species: u16);
    fn is_empty(&self) -> bool {
        self.species() == 0
    }
    fn form(&self) -> u8 {
        0
    }
    fn set_form(&mut self, _form: u8) {}
    fn pid(&self) -> u32 {
        0
    }
    fn set_pid(&mut self, _pid: u32) {}
    fn encryption_constant(&self) -> u32 {
        self.pid()
    }
    fn set_encryption_constant(&mut self, _ec: u32) {}
    fn tid(&self) -> u16;
    fn set_tid(&mut self, tid: u16);
    fn sid(&self) -> u16 {
        0
    }
    fn set_sid(&mut self, _sid: u16) {}
    fn held_item(&self) -> u16;
    fn set_held_item(&mut self, item: u16);
    fn experience(&self) -> u32;
    fn set_experience(&mut self, exp: u32);
    fn nature(&self) -> u8 {
        (self.pid() % 25) as u8
    }
    fn set_nature(&mut self, _nature: u8) {}
    fn ability(&self) -> u16 {
        0
    }
    fn set_ability(&mut self, _ability: u16) {}
    /// 1, 2 or 4 (hidden).
    fn ability_number(&self) -> u8 {
        1
    }
    fn set_ability_number(&mut self, _number: u8) {}

    fn ev(&self, stat: Stat) -> u16;
    fn set_ev(&mut self, stat: Stat, value: u16);
    fn iv(&self, stat: Stat) -> u8;
    fn set_iv(&mut self, stat: Stat, value: u8);

    fn move_id(&self, index: usize) -> Result<u16, CoreError>;
    fn set_move(&mut self, index: usize, id: u16) -> Result<(), CoreError>;
    fn pp(&self, index: usize) -> Result<u8, CoreError>;
    fn set_pp(&mut self, index: usize, pp: u8) -> Result<(), CoreError>;
    fn pp_ups(&self, index: usize) -> Result<u8, CoreError>;
    fn set_pp_ups(&mut self, index: usize, ups: u8) -> Result<(), CoreError>;
    fn relearn_move(&self, index: usize) -> Result<u16, CoreError> {
        check_index("relearn move", index, MOVE_SLOTS)?;
        Ok(0)
    }
    fn set_relearn_move(&mut self, index: usize, _id: u16) -> Result<(), CoreError> {
        check_index("relearn move", index, MOVE_SLOTS)
    }

    fn nickname(&self) -> String;
    fn set_nickname(&mut self, name: &str);
    /// Nickname decoded with registry-supplied tables where the language
    /// needs one (Japanese and Korean in the early generations).
    fn nickname_with(&self, _registry: &TableRegistry) -> String {
        self.nickname()
    }
    fn ot_name(&self) -> String;
    fn set_ot_name(&mut self, name: &str);
    fn ot_name_with(&self, _registry: &TableRegistry) -> String {
        self.ot_name()
    }
    fn ht_name(&self) -> String {
        String::new()
    }
    fn set_ht_name(&mut self, _name: &str) {}
    fn current_handler(&self) -> u8 {
        0
    }
    fn set_current_handler(&mut self, _handler: u8) {}
    fn language(&self) -> Language;
    fn set_language(&mut self, language: Language);

    /// Generations 1 to 3 derive gender from stored values and the species'
    /// gender ratio, so the registry's personal table is consulted there.
    fn gender(&self, registry: &TableRegistry) -> Result<Gender, CoreError>;
    fn set_gender(&mut self, _gender: Gender) {}

    fn is_egg(&self) -> bool;
    fn set_egg(&mut self, egg: bool);
    fn is_nicknamed(&self) -> bool {
        false
    }
    fn set_nicknamed(&mut self, _nicknamed: bool) {}
    fn ot_friendship(&self) -> u8 {
        0
    }
    fn set_ot_friendship(&mut self, _friendship: u8) {}
    fn ball(&self) -> u8 {
        4
    }
    fn set_ball(&mut self, _ball: u8) {}
    fn met_level(&self) -> u8 {
        0
    }
    fn set_met_level(&mut self, _level: u8) {}
    fn met_location(&self) -> u16 {
        0
    }
    fn set_met_location(&mut self, _location: u16) {}
    fn egg_location(&self) -> u16 {
        0
    }
    fn set_egg_location(&mut self, _location: u16) {}
    fn met_date(&self) -> Option<Date> {
        None
    }
    fn set_met_date(&mut self, _date: Option<Date>) {}
    fn egg_date(&self) -> Option<Date> {
        None
    }
    fn set_egg_date(&mut self, _date: Option<Date>) {}
    fn version(&self) -> u8 {
        0
    }
    fn set_version(&mut self, _version: u8) {}
    fn ot_gender(&self) -> u8 {
        0
    }
    fn set_ot_gender(&mut self, _gender: u8) {}
    fn pkrs_strain(&self) -> u8 {
        0
    }
    fn pkrs_days(&self) -> u8 {
        0
    }
    fn set_pkrs(&mut self, _strain: u8, _days: u8) {}
    fn fateful_encounter(&self) -> bool {
        false
    }
    fn set_fateful_encounter(&mut self, _fateful: bool) {}
    fn markings(&self) -> u8 {
        0
    }
    fn set_markings(&mut self, _markings: u8) {}

    fn ribbon(&self, ribbon: Ribbon) -> bool {
        ribbon::slot(self.generation(), ribbon).is_some_and(|s| ribbon::read(self.bytes(), s))
    }
    fn set_ribbon(&mut self, ribbon: Ribbon, value: bool) {
        if let Some(s) = ribbon::slot(self.generation(), ribbon) {
            ribbon::write(self.bytes_mut(), s, value);
        }
    }
    fn has_ribbon_slot(&self, ribbon: Ribbon) -> bool {
        ribbon::slot(self.generation(), ribbon).is_some()
    }

    fn is_shiny(&self) -> bool {
        shiny_xor(self.tid(), self.sid(), self.pid()) < shiny_threshold(self.generation())
    }
    fn set_shiny(&mut self, shiny: bool) {
        if shiny == self.is_shiny() {
            return;
        }
        let pid = self.pid();
        let pid = if shiny {
            let high = self.tid() ^ self.sid() ^ (pid & 0xFFFF) as u16;
            u32::from(high) << 16 | (pid & 0xFFFF)
        } else {
            pid ^ 0x1000_0000
        };
        self.set_pid(pid);
    }
    fn tsv(&self) -> u16 {
        (self.tid() ^ self.sid()) >> 4
    }
    fn psv(&self) -> u16 {
        let pid = self.pid();
        ((pid >> 16) as u16 ^ (pid & 0xFFFF) as u16) >> 4
    }
    fn hp_type(&self) -> u8 {
        let bits = Stat::ALL
            .iter()
            .enumerate()
            .map(|(i, s)| u32::from(self.iv(*s) & 1) << i)
            .sum::<u32>();
        (bits * 15 / 63) as u8
    }

    fn level(&self, registry: &TableRegistry) -> Result<u8, CoreError> {
        let table = registry.personal(self.generation())?;
        let rate = table.info(self.species(), self.form()).growth_rate();
        Ok(level_for_exp(rate, self.experience()))
    }
    fn set_level(&mut self, level: u8, registry: &TableRegistry) -> Result<(), CoreError> {
        let table = registry.personal(self.generation())?;
        let rate = table.info(self.species(), self.form()).growth_rate();
        self.set_experience(exp_for_level(rate, level));
        Ok(())
    }
    fn stat(&self, stat: Stat, registry: &TableRegistry) -> Result<u16, CoreError> {
        let level = self.level(registry)?;
        let table = registry.personal(self.generation())?;
        let base = table.info(self.species(), self.form()).base_stat(stat);
        let ev = self.ev(stat).min(255) as u8;
        Ok(calc_stat(
            stat,
            self.species(),
            base,
            self.iv(stat),
            ev,
            level,
            self.nature(),
        ))
    }

    fn party_level(&self) -> u8 {
        0
    }
    fn set_party_level(&mut self, _level: u8) {}
    fn party_current_hp(&self) -> u16 {
        0
    }
    fn set_party_current_hp(&mut self, _hp: u16) {}
    fn party_stat(&self, _stat: Stat) -> u16 {
        0
    }
    fn set_party_stat(&mut self, _stat: Stat, _value: u16) {}
    /// Recomputes the party-only level and stats and restores full HP.
    /// Box-form records are left untouched.
    fn update_party_data(&mut self, registry: &TableRegistry) -> Result<(), CoreError> {
        if !self.is_party() {
            return Ok(());
        }
        let level = self.level(registry)?;
        self.set_party_level(level);
        for stat in Stat::ALL {
            let value = self.stat(stat, registry)?;
            self.set_party_stat(stat, value);
        }
        let hp = self.party_stat(Stat::Hp);
        self.set_party_current_hp(hp);
        Ok(())
    }

    fn summary(&self, registry: &TableRegistry) -> PkmSummary {
        let moves = (0..MOVE_SLOTS)
            .map(|i| MoveSlot {
                id: self.move_id(i).unwrap_or(0),
                pp: self.pp(i).unwrap_or(0),
                pp_ups: self.pp_ups(i).unwrap_or(0),
            })
            .collect();
        let mut ivs = [0u8; 6];
        let mut evs = [0u16; 6];
        for stat in Stat::ALL {
            ivs[stat.index()] = self.iv(stat);
            evs[stat.index()] = self.ev(stat);
        }
        let stats = Stat::ALL
            .iter()
            .map(|s| self.stat(*s, registry))
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .and_then(|v| <[u16; 6]>::try_from(v).ok());
        PkmSummary {
            generation: self.generation(),
            species: self.species(),
            form: self.form(),
            nickname: self.nickname_with(registry),
            ot_name: self.ot_name_with(registry),
            tid: self.tid(),
            sid: self.sid(),
            pid: self.pid(),
            experience: self.experience(),
            level: self.level(registry).ok(),
            gender: self.gender(registry).ok(),
            nature: self.nature(),
            ability: self.ability(),
            held_item: self.held_item(),
            is_egg: self.is_egg(),
            is_shiny: self.is_shiny(),
            language: self.language(),
            version: self.version(),
            ball: self.ball(),
            met_level: self.met_level(),
            met_location: self.met_location(),
            met_date: self.met_date(),
            moves,
            ivs,
            evs,
            stats,
            ribbons: ribbon::held(self.generation(), self.bytes()),
            checksum_valid: self.is_valid_checksum(),
        }
    }
}

pub fn shiny_xor(tid: u16, sid: u16, pid: u32) -> u16 {
    tid ^ sid ^ (pid >> 16) as u16 ^ (pid & 0xFFFF) as u16
}

pub fn shiny_threshold(generation: Generation) -> u16 {
    if generation >= Generation::Six { 16 } else { 8 }
}

/// IV stored five bits per stat in HP, Atk, Def, Spe, SpA, SpD order.
pub(crate) fn iv_from_word(word: u32, stat: Stat) -> u8 {
    crate::endian::get_bits(word, 5 * stat.index() as u32, 5) as u8
}

pub(crate) fn iv_into_word(word: u32, stat: Stat, value: u8) -> u32 {
    crate::endian::set_bits(word, 5 * stat.index() as u32, 5, u32::from(value.min(31)))
}

/// Random IVs with `flawless` distinct stats forced to 31.
pub(crate) fn random_ivs(rng: &mut dyn RngCore, flawless: usize) -> [u8; 6] {
    let mut ivs = [0u8; 6];
    for iv in &mut ivs {
        *iv = rng.gen_range(0..32);
    }
    let mut order: Vec<usize> = (0..ivs.len()).collect();
    order.shuffle(rng);
    for &i in order.iter().take(flawless) {
        ivs[i] = 31;
    }
    ivs
}

/// Gender from the personal gender ratio, for formats that derive it.
pub(crate) fn derived_gender(
    registry: &TableRegistry,
    generation: Generation,
    species: u16,
    value: u8,
) -> Result<Gender, CoreError> {
    let ratio = registry.personal(generation)?.info(species, 0).gender_ratio();
    Ok(Gender::from_ratio(ratio, value))
}

/// Builds the concrete record for `generation` from stored bytes,
/// decrypting when needed. `None` when the length fits neither form.
pub fn from_bytes(generation: Generation, bytes: Vec<u8>) -> Option<Box<dyn Pkm>> {
    let pkm: Box<dyn Pkm> = match generation {
        Generation::One => Box::new(Pk1::new(bytes)?),
        Generation::Two => Box::new(Pk2::new(bytes)?),
        Generation::Three => Box::new(Pk3::new(bytes)?),
        Generation::Four => Box::new(Pk4::new(bytes)?),
        Generation::Five => Box::new(Pk5::new(bytes)?),
        Generation::Six => Box::new(Pk6::new(bytes)?),
        Generation::Seven => Box::new(Pk7::new(bytes)?),
        Generation::Eight => Box::new(Pk8::new(bytes)?),
    };
    Some(pkm)
}

/// Empty record of `generation`.
pub fn blank(generation: Generation, party: bool) -> Box<dyn Pkm> {
    match generation {
        Generation::One => Box::new(Pk1::blank(party)),
        Generation::Two => Box::new(Pk2::blank(party)),
        Generation::Three => Box::new(Pk3::blank(party)),
        Generation::Four => Box::new(Pk4::blank(party)),
        Generation::Five => Box::new(Pk5::blank(party)),
        Generation::Six => Box::new(Pk6::blank(party)),
        Generation::Seven => Box::new(Pk7::blank(party)),
        Generation::Eight => Box::new(Pk8::blank(party)),
    }
}

/// Copies the common fields of `from` into `to` through the shared
/// accessors. Species, identity, moves, stats and trainer data transfer;
/// generation-specific fields keep `to`'s defaults.
pub(crate) fn copy_common(from: &dyn Pkm, to: &mut dyn Pkm) -> Result<(), CoreError> {
    to.set_species(from.species());
    to.set_pid(from.pid());
    to.set_encryption_constant(from.encryption_constant());
    to.set_tid(from.tid());
    to.set_sid(from.sid());
    to.set_experience(from.experience());
    to.set_ot_friendship(from.ot_friendship());
    to.set_language(from.language());
    to.set_egg(from.is_egg());
    to.set_nicknamed(from.is_nicknamed());
    to.set_ot_gender(from.ot_gender());
    to.set_version(from.version());
    to.set_ball(from.ball());
    to.set_met_level(from.met_level());
    to.set_fateful_encounter(from.fateful_encounter());
    to.set_markings(from.markings());
    to.set_pkrs(from.pkrs_strain(), from.pkrs_days());
    for i in 0..MOVE_SLOTS {
        to.set_move(i, from.move_id(i)?)?;
        to.set_pp(i, from.pp(i)?)?;
        to.set_pp_ups(i, from.pp_ups(i)?)?;
    }
    for stat in Stat::ALL {
        to.set_iv(stat, from.iv(stat));
        to.set_ev(stat, from.ev(stat));
    }
    for r in Ribbon::ALL {
        if from.ribbon(r) {
            to.set_ribbon(r, true);
        }
    }
    Ok(())
}
