mod common;

use pksav_core::core_api::{CoreErrorCode, Engine};
use pksav_core::endian::{set_u16_le, set_u32_le};
use pksav_core::gift::{Gift, Wc8, wc8};
use pksav_core::sav::{GiftPlacement, ItemPlacement};

fn kubfu_card() -> Wc8 {
    let mut raw = vec![0u8; wc8::LEN];
    set_u16_le(&mut raw, 0x08, 1201);
    raw[0x0F] = 1;
    set_u32_le(&mut raw, 0x28, 0x7E57_0891);
    set_u32_le(&mut raw, 0x2C, 0x0BAD_F00D);
    set_u16_le(&mut raw, 0x234, 891);
    raw[0x237] = 0xFF;
    raw[0x238] = 10;
    raw[0x23A] = 3;
    raw[0x246..0x24C].fill(0xFF);
    Wc8::new(raw).unwrap()
}

fn ball_card() -> Wc8 {
    let mut raw = vec![0u8; wc8::LEN];
    set_u16_le(&mut raw, 0x08, 1202);
    raw[0x0E] = 1;
    raw[0x0F] = 2;
    set_u16_le(&mut raw, 0x20, 1);
    set_u16_le(&mut raw, 0x22, 5);
    Wc8::new(raw).unwrap()
}

#[test]
fn creature_card_lands_in_the_first_free_slot() {
    let engine = Engine::new(common::swsh_registry());
    let mut session = engine.open_bytes(common::swsh_image(&common::swsh_keys()), None).unwrap();
    let card = kubfu_card();
    assert!(card.is_pokemon());

    let placement = session.inject_gift(&card, &mut common::rng(7)).unwrap();
    assert_eq!(placement, GiftPlacement::Pokemon { box_index: 0, slot: 0 });
    let again = session.inject_gift(&card, &mut common::rng(7)).unwrap();
    assert_eq!(again, GiftPlacement::Pokemon { box_index: 0, slot: 1 });

    let save = session.container();
    let pk = save.pkm(0, 0).unwrap();
    assert_eq!(pk.species(), 891);
    assert_eq!(pk.pid(), 0x0BAD_F00D);
    assert_eq!(pk.encryption_constant(), 0x7E57_0891);
    assert_eq!(pk.nature(), 3);
    assert_eq!(pk.ot_name(), "Leon");
    assert_eq!(pk.tid(), 777);
    assert_eq!(pk.version(), 44);
    assert!(pk.fateful_encounter());
    assert_eq!(pk.level(session.registry()).unwrap(), 10);
    assert!(save.dex_caught(891).unwrap());
    assert!(save.dex_seen(891).unwrap());
}

#[test]
fn same_seed_gives_the_same_image() {
    let engine = Engine::new(common::swsh_registry());
    let image = common::swsh_image(&common::swsh_keys());
    let run = |seed: u64| {
        let mut session = engine.open_bytes(&image, None).unwrap();
        session.inject_gift(&kubfu_card(), &mut common::rng(seed)).unwrap();
        session.finish().unwrap()
    };
    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn item_card_stacks_in_its_pouch() {
    let engine = Engine::new(common::swsh_registry());
    let mut session = engine.open_bytes(common::swsh_image(&common::swsh_keys()), None).unwrap();
    let card = ball_card();
    assert!(!card.once_only());

    let first = session.inject_gift(&card, &mut common::rng(1)).unwrap();
    let second = session.inject_gift(&card, &mut common::rng(1)).unwrap();
    let placed = |count| {
        GiftPlacement::Items(vec![ItemPlacement {
            pouch: 1,
            slot: 0,
            item: 1,
            count,
        }])
    };
    assert_eq!(first, placed(5));
    assert_eq!(second, placed(10));

    let bytes = session.finish().unwrap();
    let reopened = engine.open_bytes(bytes, None).unwrap();
    assert_eq!(reopened.container().item(1, 0).unwrap().count, 10);
}

#[test]
fn cards_from_another_generation_are_refused() {
    let engine = Engine::default();
    let mut session = engine.open_bytes(common::gen1_image(), None).unwrap();
    let err = session
        .inject_gift(&kubfu_card(), &mut common::rng(0))
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
}

#[test]
fn swsh_needs_its_keys() {
    let image = common::swsh_image(&common::swsh_keys());
    let err = Engine::default().open_bytes(&image, None).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Parse);
}
