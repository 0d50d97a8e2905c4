use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use pksav_core::core_api::Engine;
use pksav_core::pkm::{Pk1, Pkm};
use pksav_core::sav::checksum::gb_sum8;
use pksav_core::sav::{Sav1, SaveFile};
use pksav_core::text::g12;
use serde_json::Value;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pksav"))
        .args(args)
        .output()
        .expect("failed to run pksav CLI")
}

fn temp_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.sav", std::process::id(), nanos))
}

/// Red/Blue save for trainer ASH with a Pikachu in box 4 and in the party.
fn write_gen1_save(prefix: &str) -> PathBuf {
    let mut data = vec![0u8; 0x8000];
    let mut lists = vec![0x2F2C, 0x30C0, 0x25C9, 0x27E6];
    for bank in [0x4000, 0x6000] {
        lists.extend((0..6).map(|i| bank + i * 0x462));
    }
    for at in lists {
        data[at + 1] = 0xFF;
    }
    g12::encode(&mut data[0x2598..0x25A3], "ASH");
    data[0x25F3..0x25F6].copy_from_slice(&[0x00, 0x30, 0x00]);
    data[0x3523] = gb_sum8(&data[0x2598..0x3523]);

    let mut sav = Sav1::new(data).expect("fixture checksum");
    let mut pk = Pk1::blank(false);
    pk.set_species(25);
    pk.set_box_level(9);
    pk.set_ot_name("ASH");
    pk.set_nickname("SPARKY");
    sav.set_pkm(3, 0, &pk).unwrap();
    sav.set_party_pkm(0, &pk).unwrap();
    sav.finish_editing().unwrap();

    let path = temp_path(prefix);
    fs::write(&path, sav.bytes()).unwrap();
    path
}

#[test]
fn summary_lists_trainer_and_party() {
    let path = write_gen1_save("pksav_summary");
    let path_arg = path.to_string_lossy().to_string();
    let output = run_cli(&["summary", &path_arg]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Game:      Red/Blue/Yellow (Red)"));
    assert!(stdout.contains("Trainer:   ASH"));
    assert!(stdout.contains("Money:     3000"));
    assert!(stdout.contains("Party (1):"));
    assert!(stdout.contains("Lv. 9 \"SPARKY\""));
    assert!(stdout.contains("Boxes:     1/240 slots in 12 boxes"));
    let _ = fs::remove_file(path);
}

#[test]
fn summary_json_is_the_snapshot() {
    let path = write_gen1_save("pksav_summary_json");
    let path_arg = path.to_string_lossy().to_string();
    let output = run_cli(&["--json", "summary", &path_arg]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["game"], "RedBlueYellow");
    assert_eq!(value["trainer"]["ot_name"], "ASH");
    assert_eq!(value["party"][0]["species"], 25);
    assert_eq!(value["boxes"][3]["occupied"], 1);
    let _ = fs::remove_file(path);
}

#[test]
fn list_shows_occupied_slots_only() {
    let path = write_gen1_save("pksav_list");
    let path_arg = path.to_string_lossy().to_string();
    let output = run_cli(&["list", &path_arg, "--box", "3", "--json"]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["box"], 3);
    let slots = value["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["slot"], 0);
    assert_eq!(slots[0]["pkm"]["nickname"], "SPARKY");

    let output = run_cli(&["list", &path_arg, "--box", "0"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Box 1 (0 occupied)"));
    let _ = fs::remove_file(path);
}

#[test]
fn export_writes_the_record() {
    let path = write_gen1_save("pksav_export");
    let out = temp_path("pksav_export_out");
    let path_arg = path.to_string_lossy().to_string();
    let out_arg = out.to_string_lossy().to_string();

    let output = run_cli(&["export", &path_arg, "--slot", "0", "--output", &out_arg]);
    assert!(output.status.success());
    let written = fs::read(&out).unwrap();
    assert!(!written.is_empty());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote"));

    let output = run_cli(&[
        "export", &path_arg, "--box", "5", "--slot", "0", "--output", &out_arg,
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Slot 0 is empty"));
    let _ = fs::remove_file(path);
    let _ = fs::remove_file(out);
}

#[test]
fn resign_applies_edits_and_stays_loadable() {
    let path = write_gen1_save("pksav_resign");
    let out = temp_path("pksav_resign_out");
    let path_arg = path.to_string_lossy().to_string();
    let out_arg = out.to_string_lossy().to_string();

    let output = run_cli(&[
        "resign", &path_arg, "--output", &out_arg, "--set-money", "777", "--set-ot", "RED",
    ]);
    assert!(output.status.success());

    let engine = Engine::default();
    let session = engine.open_path(&out, None).unwrap();
    let trainer = session.snapshot().unwrap().trainer;
    assert_eq!(trainer.money, 777);
    assert_eq!(trainer.ot_name, "RED");
    assert_eq!(session.container().pkm(3, 0).unwrap().species(), 25);
    let _ = fs::remove_file(path);
    let _ = fs::remove_file(out);
}

#[test]
fn wrong_game_hint_is_rejected() {
    let path = write_gen1_save("pksav_hint");
    let path_arg = path.to_string_lossy().to_string();
    let output = run_cli(&["summary", &path_arg, "--game", "crystal"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error parsing save file"));
    assert!(stderr.contains("Crystal"));

    let output = run_cli(&["summary", &path_arg, "--game", "yellow"]);
    assert!(output.status.success());

    let output = run_cli(&["summary", &path_arg, "--game", "not-a-game"]);
    assert!(!output.status.success());
    let _ = fs::remove_file(path);
}

#[test]
fn missing_file_fails_cleanly() {
    let output = run_cli(&["summary", "/nonexistent/pksav/missing.sav"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading"));
}
