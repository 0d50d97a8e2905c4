mod common;

use pksav_core::core_api::{CoreErrorCode, Engine};
use pksav_core::generation::{Game, GameVersion, Generation, Language};
use pksav_core::pkm::{self, Pk1, Pkm};
use pksav_core::registry::TableRegistry;

#[test]
fn blank_game_boy_image_needs_a_hint() {
    // All-zero data sums to zero, which both Game Boy checksums accept
    // once the generation 1 byte holds the complement.
    let mut image = vec![0u8; common::GEN1_SIZE];
    image[0x3523] = 0xFF;
    let engine = Engine::default();

    let err = engine.open_bytes(&image, None).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::GameDetectionAmbiguous);
    assert!(err.message.contains("Red/Blue/Yellow"));
    assert!(err.message.contains("Gold/Silver"));

    let red = engine.open_bytes(&image, Some(GameVersion::Blue)).unwrap();
    assert_eq!(red.game(), Game::RedBlueYellow);
    let gold = engine.open_bytes(&image, Some(GameVersion::Silver)).unwrap();
    assert_eq!(gold.game(), Game::GoldSilver);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Engine::default()
        .open_path("/nonexistent/pksav/save.sav", None)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Io);
}

#[test]
fn gen1_session_round_trip() {
    let engine = Engine::default();
    let mut session = engine.open_bytes(common::gen1_image(), None).unwrap();
    assert_eq!(session.game(), Game::RedBlueYellow);

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.trainer.ot_name, "ASH");
    assert_eq!(snapshot.trainer.tid, 12345);
    assert_eq!(snapshot.trainer.money, 3000);
    assert_eq!(snapshot.boxes.len(), 12);
    assert!(snapshot.boxes.iter().all(|b| b.occupied == 0 && b.capacity == 20));

    let mut pk = Pk1::blank(false);
    pk.set_species(25);
    pk.set_box_level(9);
    pk.set_ot_name("ASH");
    pk.set_nickname("SPARKY");
    let save = session.container_mut();
    save.set_pkm(4, 0, &pk).unwrap();
    save.set_party_pkm(0, &pk).unwrap();
    save.dex_update(&pk, &TableRegistry::new()).unwrap();
    save.set_money(54_321).unwrap();

    let bytes = session.finish().unwrap();
    let reopened = engine.open_bytes(bytes, None).unwrap();
    let snapshot = reopened.snapshot().unwrap();
    assert_eq!(snapshot.trainer.money, 54_321);
    assert_eq!(snapshot.party.len(), 1);
    assert_eq!(snapshot.party[0].nickname, "SPARKY");
    assert_eq!(snapshot.boxes[4].occupied, 1);
    assert_eq!((snapshot.dex_caught, snapshot.dex_seen), (1, 1));
    assert_eq!(reopened.container().pkm(4, 0).unwrap().nickname(), "SPARKY");
}

#[test]
fn gen3_reads_the_newer_copy() {
    let engine = Engine::default();
    let mut image = common::gen3_image([Some(3), None], "OLDER");
    let newer = common::gen3_image([None, Some(4)], "NEWER");
    image[0xE000..].copy_from_slice(&newer[0xE000..]);

    let session = engine.open_bytes(&image, None).unwrap();
    assert_eq!(session.game(), Game::Emerald);
    assert_eq!(session.snapshot().unwrap().trainer.ot_name, "NEWER");

    let session = engine
        .open_bytes(common::gen3_image([Some(8), Some(8)], "TIED"), None)
        .unwrap();
    assert_eq!(session.snapshot().unwrap().trainer.tid, 54321);
}

#[test]
fn gen3_nickname_survives_finish() {
    let engine = Engine::default();
    let mut session = engine
        .open_bytes(common::gen3_image([Some(1), Some(2)], "MAY"), None)
        .unwrap();

    let mut pk = pkm::blank(Generation::Three, false);
    pk.set_species(258);
    pk.set_pid(0x89AB_CDEF);
    pk.set_tid(54321);
    pk.set_language(Language::English);
    pk.set_nickname("Mizu");
    pk.set_ot_name("MAY");
    pk.refresh_checksum();
    let before = session.snapshot().unwrap();
    session.container_mut().set_pkm(13, 29, pk.as_ref()).unwrap();
    session.container_mut().set_ot_name("BRENDAN").unwrap();

    let bytes = session.finish().unwrap();
    let reopened = engine.open_bytes(bytes, None).unwrap();
    assert_eq!(reopened.game(), Game::Emerald);
    let stored = reopened.container().pkm(13, 29).unwrap();
    assert_eq!(stored.species(), 258);
    assert_eq!(stored.nickname(), "Mizu");
    assert_eq!(stored.ot_name(), "MAY");
    assert_eq!(stored.pid(), 0x89AB_CDEF);
    assert!(stored.is_valid_checksum());
    assert_eq!(stored.bytes(), pk.bytes());

    let after = reopened.snapshot().unwrap();
    assert_eq!(after.trainer.ot_name, "BRENDAN");
    assert_eq!(after.trainer.tid, before.trainer.tid);
    assert_eq!(after.trainer.sid, before.trainer.sid);
    assert_eq!(after.trainer.money, before.trainer.money);
    assert_eq!(after.trainer.play_time, before.trainer.play_time);
    assert_eq!(after.party.len(), before.party.len());
    for (i, (a, b)) in after.boxes.iter().zip(&before.boxes).enumerate() {
        let added = usize::from(i == 13);
        assert_eq!(a.occupied, b.occupied + added, "box {i}");
    }
}

#[test]
fn finished_session_rejects_edits_only_after_finish() {
    let engine = Engine::default();
    let mut session = engine.open_bytes(common::gen1_image(), None).unwrap();
    assert!(session.container().is_editing());
    session.container_mut().finish_editing().unwrap();
    let err = session.container_mut().set_money(1).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidState);
    // finish does not need an open session
    assert!(session.finish().is_ok());
}
