//! Generation conversion, following the in-game transfer paths: the Time
//! Capsule between generations 1 and 2, the Virtual Console transfer from
//! either into generation 7, and one generation at a time from 3 upward
//! (or back down to 4).

use log::debug;
use rand::{Rng, RngCore};

use crate::core_api::{CoreError, TrainerInfo};
use crate::gender::Gender;
use crate::generation::{GameVersion, Generation};
use crate::registry::TableRegistry;
use crate::stats::Stat;
use crate::tables::growth::exp_for_level;
use crate::tables::items;

use super::pk1::{self, Pk1};
use super::pk2::{self, Pk2};
use super::{MOVE_SLOTS, Pk7, Pk8, Pkm, blank, copy_common, random_ivs};

pub const PAL_PARK: u16 = 55;
/// Poké Transfer Lab in generation 5, Poké Transporter in generation 6.
pub const POKE_TRANSFER: u16 = 30001;
pub const VIRTUAL_CONSOLE: u16 = 30013;
pub const POKE_BALL: u8 = 4;

const MAX_EV_MODERN: u16 = 252;

/// Converts `pkm` into `target`'s record format. `None` when no transfer
/// path exists or the species or form is missing from the target game.
pub fn convert(
    pkm: &dyn Pkm,
    target: Generation,
    trainer: &TrainerInfo,
    registry: &TableRegistry,
    rng: &mut dyn RngCore,
) -> Option<Box<dyn Pkm>> {
    let source = pkm.generation();
    if source == target {
        return Some(pkm.to_owned_pkm());
    }
    match (source, target) {
        (Generation::One, Generation::Two) => time_capsule_up(pkm, registry),
        (Generation::Two, Generation::One) => time_capsule_down(pkm, registry),
        (Generation::One | Generation::Two, Generation::Seven) => {
            virtual_console(pkm, trainer, registry, rng)
        }
        (Generation::One | Generation::Two, Generation::Eight) => {
            let pk7 = virtual_console(pkm, trainer, registry, rng)?;
            step(pk7.as_ref(), Generation::Eight, trainer, registry, rng)
        }
        (Generation::One | Generation::Two, _)
        | (_, Generation::One | Generation::Two | Generation::Three) => {
            debug!("no transfer path from {source} to {target}");
            None
        }
        _ => {
            let mut current = pkm.to_owned_pkm();
            while current.generation() != target {
                let n = current.generation().number();
                let next = if current.generation() < target {
                    Generation::from_number(n + 1)?
                } else {
                    Generation::from_number(n - 1)?
                };
                current = step(current.as_ref(), next, trainer, registry, rng)?;
            }
            Some(current)
        }
    }
}

fn accepts(pkm: &dyn Pkm, target: Generation, registry: &TableRegistry) -> bool {
    let species = pkm.species();
    if species == 0 || species > target.max_species() {
        return false;
    }
    match registry.personal(target) {
        Ok(table) => table.has_form(species, pkm.form()),
        Err(_) => true,
    }
}

fn friendship(registry: &TableRegistry, generation: Generation, species: u16) -> u8 {
    registry
        .personal(generation)
        .map_or(70, |t| t.info(species, 0).base_friendship())
}

/// One adjacent hop between generations 3 and 8.
fn step(
    from: &dyn Pkm,
    next: Generation,
    trainer: &TrainerInfo,
    registry: &TableRegistry,
    rng: &mut dyn RngCore,
) -> Option<Box<dyn Pkm>> {
    if !accepts(from, next, registry) {
        debug!(
            "species {} form {} does not exist in {next}",
            from.species(),
            from.form()
        );
        return None;
    }
    let mut to: Box<dyn Pkm> = match next {
        Generation::Eight => {
            let mut pk8 = Pk8::blank(from.is_party());
            pk8.set_scalars(rng.r#gen(), rng.r#gen());
            Box::new(pk8)
        }
        _ => blank(next, from.is_party()),
    };
    if let Err(e) =
        copy_common(from, to.as_mut()).and_then(|()| carry_fields(from, to.as_mut(), registry))
    {
        debug!("cannot carry species {} into {next}: {e}", from.species());
        return None;
    }

    let level = from.level(registry).unwrap_or_else(|_| from.met_level());
    match (from.generation(), next) {
        (Generation::Three, Generation::Four) => {
            to.set_met_location(PAL_PARK);
            to.set_egg_location(0);
            to.set_met_level(level);
            let default_name = registry
                .species_name(from.language(), from.species())
                .to_uppercase();
            to.set_nicknamed(from.nickname_with(registry) != default_name);
        }
        (Generation::Four, Generation::Five) => {
            to.set_met_location(POKE_TRANSFER);
            to.set_met_level(level);
        }
        (Generation::Five, Generation::Six) => {
            to.set_met_location(POKE_TRANSFER);
            to.set_met_level(level);
            to.set_ht_name(&trainer.ot_name);
            to.set_current_handler(1);
        }
        (Generation::Seven, Generation::Eight) if from.ht_name().is_empty() => {
            to.set_ht_name(&trainer.ot_name);
            to.set_current_handler(1);
        }
        _ => {}
    }

    if let Err(e) = to.update_party_data(registry) {
        debug!("party data left as copied: {e}");
    }
    to.refresh_checksum();
    Some(to)
}

/// Fields that every modern format stores, clamped to what `to` accepts.
fn carry_fields(
    from: &dyn Pkm,
    to: &mut dyn Pkm,
    registry: &TableRegistry,
) -> Result<(), CoreError> {
    let target = to.generation();
    if from.held_item() <= target.max_item() {
        to.set_held_item(from.held_item());
    }
    to.set_form(from.form());
    to.set_nature(from.nature());
    to.set_ability_number(from.ability_number());
    let ability = match registry.personal(target) {
        Ok(table) => {
            let slot = match from.ability_number() {
                4 => 2,
                2 => 1,
                _ => 0,
            };
            table.info(from.species(), from.form()).ability(slot)
        }
        Err(_) if from.ability() <= target.max_ability() => from.ability(),
        Err(_) => 0,
    };
    to.set_ability(ability);
    if let Ok(gender) = from.gender(registry) {
        to.set_gender(gender);
    }
    to.set_nickname(&from.nickname_with(registry));
    to.set_ot_name(&from.ot_name_with(registry));
    to.set_ht_name(&from.ht_name());
    to.set_current_handler(from.current_handler());
    to.set_met_location(from.met_location());
    to.set_egg_location(from.egg_location());
    to.set_met_date(from.met_date());
    to.set_egg_date(from.egg_date());
    if from.ball() > target.max_ball() {
        to.set_ball(POKE_BALL);
    }
    for i in 0..MOVE_SLOTS {
        if from.move_id(i)? > target.max_move() {
            to.set_move(i, 0)?;
            to.set_pp(i, 0)?;
            to.set_pp_ups(i, 0)?;
        }
        to.set_relearn_move(i, from.relearn_move(i)?)?;
    }
    if target >= Generation::Six {
        for stat in Stat::ALL {
            to.set_ev(stat, from.ev(stat).min(MAX_EV_MODERN));
        }
    }
    Ok(())
}

fn time_capsule_up(pkm: &dyn Pkm, registry: &TableRegistry) -> Option<Box<dyn Pkm>> {
    let pk1 = Pk1::new(pkm.bytes().to_vec())?.with_language(pkm.language());
    let data_len = if pk1.is_party() {
        pk2::DATA_PARTY_LEN
    } else {
        pk2::DATA_BOX_LEN
    };
    let mut pk2 = Pk2::from_parts(&vec![0; data_len], pk1.ot_name_raw(), pk1.nickname_raw())?
        .with_language(pk1.language());
    pk2.set_species(pk1.species());
    // Generation 2 reads the catch rate byte as the held item.
    pk2.set_held_item(items::g2_to_national(pk1.catch_rate()));
    pk2.set_tid(pk1.tid());
    pk2.set_experience(pk1.experience());
    for i in 0..MOVE_SLOTS {
        pk2.set_move(i, pk1.move_id(i).ok()?).ok()?;
        pk2.set_pp(i, pk1.pp(i).ok()?).ok()?;
        pk2.set_pp_ups(i, pk1.pp_ups(i).ok()?).ok()?;
    }
    for stat in Stat::ALL {
        pk2.set_ev(stat, pk1.ev(stat));
    }
    for stat in [Stat::Atk, Stat::Def, Stat::Spe, Stat::SpA] {
        pk2.set_iv(stat, pk1.iv(stat));
    }
    pk2.set_ot_friendship(friendship(registry, Generation::Two, pk1.species()));
    pk2.set_party_level(pk1.box_level());
    if pk2.is_party() {
        pk2.set_party_current_hp(pk1.party_current_hp());
        for stat in Stat::ALL {
            pk2.set_party_stat(stat, pk1.party_stat(stat));
        }
        // The single special splits in two; recompute both when possible.
        for stat in [Stat::SpA, Stat::SpD] {
            if let Ok(value) = pk2.stat(stat, registry) {
                pk2.set_party_stat(stat, value);
            }
        }
    }
    Some(Box::new(pk2))
}

fn time_capsule_down(pkm: &dyn Pkm, registry: &TableRegistry) -> Option<Box<dyn Pkm>> {
    let max_move = Generation::One.max_move();
    let moves_fit = (0..MOVE_SLOTS).all(|i| pkm.move_id(i).unwrap_or(0) <= max_move);
    if pkm.is_egg() || !accepts(pkm, Generation::One, registry) || !moves_fit {
        debug!("species {} cannot cross the Time Capsule", pkm.species());
        return None;
    }
    let pk2 = Pk2::new(pkm.bytes().to_vec())?.with_language(pkm.language());
    let data_len = if pk2.is_party() {
        pk1::DATA_PARTY_LEN
    } else {
        pk1::DATA_BOX_LEN
    };
    let mut pk1 = Pk1::from_parts(&vec![0; data_len], pk2.ot_name_raw(), pk2.nickname_raw())?
        .with_language(pk2.language());
    pk1.set_species(pk2.species());
    pk1.set_catch_rate(items::national_to_g2(pk2.held_item()));
    if let Ok(table) = registry.personal(Generation::One) {
        let info = table.info(pk2.species(), 0);
        pk1.set_types(info.type1(), info.type2());
    }
    pk1.set_tid(pk2.tid());
    pk1.set_experience(pk2.experience());
    for i in 0..MOVE_SLOTS {
        pk1.set_move(i, pk2.move_id(i).ok()?).ok()?;
        pk1.set_pp(i, pk2.pp(i).ok()?).ok()?;
        pk1.set_pp_ups(i, pk2.pp_ups(i).ok()?).ok()?;
    }
    for stat in Stat::ALL {
        pk1.set_ev(stat, pk2.ev(stat));
    }
    for stat in [Stat::Atk, Stat::Def, Stat::Spe, Stat::SpA] {
        pk1.set_iv(stat, pk2.iv(stat));
    }
    pk1.set_box_level(pk2.party_level());
    pk1.set_party_level(pk2.party_level());
    pk1.set_party_current_hp(pk2.party_current_hp());
    for stat in [Stat::Hp, Stat::Atk, Stat::Def, Stat::Spe, Stat::SpA] {
        pk1.set_party_stat(stat, pk2.party_stat(stat));
    }
    Some(Box::new(pk1))
}

fn virtual_console_version(pkm: &dyn Pkm) -> GameVersion {
    match pkm.generation() {
        Generation::Two if pkm.met_location() != 0 => GameVersion::Crystal,
        Generation::Two => GameVersion::Gold,
        _ => GameVersion::Red,
    }
}

/// Poké Transporter for the Virtual Console releases: hidden ability, three
/// guaranteed perfect IVs (five for the mythicals) and nature from
/// experience.
fn virtual_console(
    pkm: &dyn Pkm,
    trainer: &TrainerInfo,
    registry: &TableRegistry,
    rng: &mut dyn RngCore,
) -> Option<Box<dyn Pkm>> {
    let species = pkm.species();
    if pkm.is_egg() || !accepts(pkm, Generation::Seven, registry) {
        return None;
    }
    let level = pkm.level(registry).ok()?;
    let mythical = matches!(species, 151 | 251);

    let mut pk7 = Pk7::blank(false);
    pk7.set_species(species);
    pk7.set_encryption_constant(rng.next_u32());
    pk7.set_tid(pkm.tid());
    pk7.set_sid(0);
    let exp = match registry.personal(Generation::Seven) {
        Ok(table) => exp_for_level(table.info(species, 0).growth_rate(), level),
        Err(_) => pkm.experience(),
    };
    pk7.set_experience(exp);
    pk7.set_nature(pkm.nature());
    pk7.set_pid(rng.next_u32());
    pk7.set_shiny(pkm.is_shiny());
    pk7.set_gender(pkm.gender(registry).unwrap_or(Gender::Genderless));
    pk7.set_ability_number(4);
    pk7.set_ability(
        registry
            .personal(Generation::Seven)
            .map_or(0, |t| t.info(species, 0).ability(2)),
    );
    let ivs = random_ivs(rng, if mythical { 5 } else { 3 });
    for stat in Stat::ALL {
        pk7.set_iv(stat, ivs[stat.index()]);
    }
    for i in 0..MOVE_SLOTS {
        pk7.set_move(i, pkm.move_id(i).ok()?).ok()?;
        pk7.set_pp(i, pkm.pp(i).ok()?).ok()?;
        pk7.set_pp_ups(i, pkm.pp_ups(i).ok()?).ok()?;
    }

    let language = pkm.language();
    pk7.set_language(language);
    let nickname = pkm.nickname_with(registry);
    let species_name = registry.species_name(language, species);
    if nickname == species_name.to_uppercase() {
        pk7.set_nickname(&species_name);
        pk7.set_nicknamed(false);
    } else {
        pk7.set_nickname(&nickname);
        pk7.set_nicknamed(true);
    }
    pk7.set_ot_name(&pkm.ot_name_with(registry));
    pk7.set_ot_gender(pkm.ot_gender());
    pk7.set_ot_friendship(friendship(registry, Generation::Seven, species));
    pk7.set_ht_name(&trainer.ot_name);
    pk7.set_current_handler(1);
    pk7.set_met_location(VIRTUAL_CONSOLE);
    pk7.set_met_level(level);
    pk7.set_ball(POKE_BALL);
    pk7.set_version(virtual_console_version(pkm).raw());
    pk7.set_fateful_encounter(mythical);
    pk7.refresh_checksum();
    Some(Box::new(pk7))
}
