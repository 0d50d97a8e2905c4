//! Wonder cards. A card is a template: fixed fields are copied into a new
//! record and the unconstrained ones are rolled from the caller's random
//! source.

pub mod pgf;
pub mod wc6;
pub mod wc7;
pub mod wc8;

pub use pgf::Pgf;
pub use wc6::Wc6;
pub use wc7::Wc7;
pub use wc8::Wc8;

use rand::{Rng, RngCore};

use crate::core_api::{CoreError, TrainerInfo};
use crate::gender::Gender;
use crate::generation::{Generation, Language};
use crate::pkm::{self, Date, MOVE_SLOTS, Pkm, random_ivs};
use crate::registry::TableRegistry;
use crate::sav::ItemStack;
use crate::stats::Stat;

/// How a card constrains individual values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IvSpec {
    Random,
    /// This many distinct stats are forced to 31, the rest are random.
    Flawless(usize),
    /// Per stat, `None` is random.
    Fixed([Option<u8>; 6]),
}

impl IvSpec {
    /// Decodes the six card bytes: 0xFC to 0xFE in the first byte ask for
    /// one to three flawless stats, any byte above 31 is random.
    pub fn from_bytes(raw: &[u8]) -> Self {
        if (0xFC..=0xFE).contains(&raw[0]) {
            return Self::Flawless(usize::from(raw[0] - 0xFB));
        }
        if raw.iter().all(|&v| v > 31) {
            return Self::Random;
        }
        let mut ivs = [None; 6];
        for (iv, &v) in ivs.iter_mut().zip(raw) {
            *iv = (v <= 31).then_some(v);
        }
        Self::Fixed(ivs)
    }

    pub fn roll(&self, rng: &mut dyn RngCore) -> [u8; 6] {
        match *self {
            Self::Random => random_ivs(rng, 0),
            Self::Flawless(n) => random_ivs(rng, n),
            Self::Fixed(fixed) => {
                let mut ivs = random_ivs(rng, 0);
                for (iv, f) in ivs.iter_mut().zip(fixed) {
                    if let Some(v) = f {
                        *iv = v;
                    }
                }
                ivs
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidType {
    Fixed(u32),
    Random,
    AlwaysShiny,
    NeverShiny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityType {
    /// Personal-table slot: 0 first, 1 second, 2 hidden.
    Fixed(u8),
    RandomOneTwo,
    RandomAny,
}

impl AbilityType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0..=2 => Self::Fixed(raw),
            3 => Self::RandomOneTwo,
            _ => Self::RandomAny,
        }
    }

    fn roll(self, rng: &mut dyn RngCore) -> u8 {
        match self {
            Self::Fixed(slot) => slot,
            Self::RandomOneTwo => rng.gen_range(0..2),
            Self::RandomAny => rng.gen_range(0..3),
        }
    }
}

/// Read-only view of a distribution card.
pub trait Gift {
    fn generation(&self) -> Generation;
    fn bytes(&self) -> &[u8];
    fn card_id(&self) -> u16;
    fn title(&self) -> String;
    fn is_pokemon(&self) -> bool;
    fn is_item(&self) -> bool;
    /// Every item the card hands out; empty for creature cards.
    fn items(&self) -> Vec<ItemStack>;
    fn once_only(&self) -> bool;
    fn date(&self) -> Option<Date> {
        None
    }

    /// `None` when rolled.
    fn encryption_constant(&self) -> Option<u32> {
        None
    }
    fn species(&self) -> u16;
    fn form(&self) -> u8;
    fn level(&self) -> u8;
    fn ball(&self) -> u8;
    fn held_item(&self) -> u16;
    fn moves(&self) -> [u16; MOVE_SLOTS];
    fn relearn_moves(&self) -> [u16; MOVE_SLOTS] {
        [0; MOVE_SLOTS]
    }
    fn iv_spec(&self) -> IvSpec;
    fn pid_type(&self) -> PidType;
    fn ability_type(&self) -> AbilityType;
    /// `None` when rolled.
    fn nature(&self) -> Option<u8>;
    /// `None` when derived from the rolled PID.
    fn gender(&self) -> Option<Gender>;
    /// `None` when the receiver's language is used.
    fn language(&self) -> Option<Language>;
    fn nickname(&self) -> Option<String>;
    /// Empty when the receiving trainer becomes the original trainer.
    fn ot_name(&self) -> String;
    fn ot_gender(&self) -> u8;
    fn tid(&self) -> u16;
    fn sid(&self) -> u16;
    /// Origin game, zero for the receiver's.
    fn origin_game(&self) -> u8;
    fn met_location(&self) -> u16;
    fn egg_location(&self) -> u16;
    fn met_level(&self) -> u8;
    fn is_egg(&self) -> bool;

    /// Builds a box-form record of the card's generation.
    fn materialize(
        &self,
        trainer: &TrainerInfo,
        registry: &TableRegistry,
        rng: &mut dyn RngCore,
    ) -> Result<Box<dyn Pkm>, CoreError> {
        materialize(self, trainer, registry, rng)
    }
}

pub fn materialize<G: Gift + ?Sized>(
    gift: &G,
    trainer: &TrainerInfo,
    registry: &TableRegistry,
    rng: &mut dyn RngCore,
) -> Result<Box<dyn Pkm>, CoreError> {
    if !gift.is_pokemon() {
        return Err(CoreError::unsupported(format!(
            "card {} does not hold a creature",
            gift.card_id()
        )));
    }
    let generation = gift.generation();
    let table = registry.personal(generation)?;
    let info = table.info(gift.species(), gift.form());

    let mut pk = pkm::blank(generation, false);
    pk.set_species(gift.species());
    pk.set_form(gift.form());
    pk.set_held_item(gift.held_item());
    pk.set_ball(gift.ball());
    pk.set_egg(gift.is_egg());
    pk.set_fateful_encounter(true);

    let language = gift.language().unwrap_or(trainer.language);
    pk.set_language(language);
    let version = match gift.origin_game() {
        0 => trainer.version.raw(),
        v => v,
    };
    pk.set_version(version);

    let ot = gift.ot_name();
    let card_is_ot = !ot.is_empty();
    if card_is_ot {
        pk.set_ot_name(&ot);
        pk.set_tid(gift.tid());
        pk.set_sid(gift.sid());
        pk.set_ot_gender(gift.ot_gender());
        pk.set_ht_name(&trainer.ot_name);
        pk.set_current_handler(1);
    } else {
        pk.set_ot_name(&trainer.ot_name);
        pk.set_tid(trainer.tid);
        pk.set_sid(trainer.sid);
        pk.set_ot_gender(trainer.gender);
    }

    let level = gift.level().max(1);
    pk.set_level(level, registry)?;
    let met_level = match gift.met_level() {
        0 => level,
        l => l,
    };
    pk.set_met_level(met_level);
    pk.set_met_location(gift.met_location());
    pk.set_egg_location(gift.egg_location());
    pk.set_met_date(gift.date());
    pk.set_ot_friendship(info.base_friendship());

    for (i, (&mv, &relearn)) in gift
        .moves()
        .iter()
        .zip(gift.relearn_moves().iter())
        .enumerate()
    {
        pk.set_move(i, mv)?;
        pk.set_relearn_move(i, relearn)?;
    }

    let ability_slot = gift.ability_type().roll(rng);
    pk.set_ability_number(1 << ability_slot);
    pk.set_ability(info.ability(usize::from(ability_slot)));

    let ec = gift.encryption_constant().unwrap_or_else(|| rng.next_u32());
    pk.set_encryption_constant(ec);
    match gift.pid_type() {
        PidType::Fixed(pid) => pk.set_pid(pid),
        PidType::Random => pk.set_pid(rng.next_u32()),
        PidType::AlwaysShiny => {
            pk.set_pid(rng.next_u32());
            pk.set_shiny(true);
        }
        PidType::NeverShiny => {
            pk.set_pid(rng.next_u32());
            pk.set_shiny(false);
        }
    }

    let nature = gift.nature().unwrap_or_else(|| rng.gen_range(0..25));
    pk.set_nature(nature);
    let gender = gift
        .gender()
        .unwrap_or_else(|| Gender::from_ratio(info.gender_ratio(), pk.pid() as u8));
    pk.set_gender(gender);

    let ivs = gift.iv_spec().roll(rng);
    for stat in Stat::ALL {
        pk.set_iv(stat, ivs[stat.index()]);
    }

    match gift.nickname() {
        Some(name) if !name.is_empty() => {
            pk.set_nickname(&name);
            pk.set_nicknamed(true);
        }
        _ => pk.set_nickname(&registry.species_name(language, gift.species())),
    }

    pk.refresh_checksum();
    log::debug!(
        "materialized card {} as species {} (pid {:08X})",
        gift.card_id(),
        pk.species(),
        pk.pid()
    );
    Ok(pk)
}

/// Calendar date packed as decimal `YYYYMMDD`.
pub(crate) fn date_from_decimal(raw: u32) -> Option<Date> {
    if raw == 0 {
        return None;
    }
    let year = (raw / 10000) as u16;
    let month = (raw / 100 % 100) as u8;
    let day = (raw % 100) as u8;
    Some(Date::new(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iv_bytes_decode() {
        assert_eq!(IvSpec::from_bytes(&[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]), IvSpec::Flawless(3));
        assert_eq!(IvSpec::from_bytes(&[0xFF; 6]), IvSpec::Random);
        assert_eq!(
            IvSpec::from_bytes(&[31, 0xFF, 0, 0xFF, 0xFF, 10]),
            IvSpec::Fixed([Some(31), None, Some(0), None, None, Some(10)])
        );
    }

    #[test]
    fn decimal_dates() {
        assert_eq!(date_from_decimal(20131012), Some(Date::new(2013, 10, 12)));
        assert_eq!(date_from_decimal(0), None);
    }
}
