#![allow(dead_code)]

use pksav_core::endian::{set_u16_le, set_u32_le};
use pksav_core::generation::Generation;
use pksav_core::personal::PersonalTable;
use pksav_core::registry::{SwishKeys, TableRegistry};
use pksav_core::sav::checksum::{gb_sum8, sector_sum};
use pksav_core::sav::dex8::DexEntry8;
use pksav_core::sav::sav8::{self, keys};
use pksav_core::sav::swsh::{self, BlockKind, encode_block};
use pksav_core::text::{g12, g3, utf16};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const GEN1_SIZE: usize = 0x8000;
const GEN1_OT: usize = 0x2598;
const GEN1_MONEY: usize = 0x25F3;
const GEN1_TID: usize = 0x2605;
const GEN1_CHECKSUM: usize = 0x3523;

/// Red/Blue image with empty lists, trainer "ASH" and a valid main checksum.
pub fn gen1_image() -> Vec<u8> {
    let mut data = vec![0u8; GEN1_SIZE];
    // Count byte then the species terminator for each list.
    let mut lists = vec![0x2F2C, 0x30C0, 0x25C9, 0x27E6];
    for bank in [0x4000, 0x6000] {
        lists.extend((0..6).map(|i| bank + i * 0x462));
    }
    for at in lists {
        data[at] = 0;
        data[at + 1] = 0xFF;
    }
    g12::encode(&mut data[GEN1_OT..GEN1_OT + 11], "ASH");
    data[GEN1_MONEY..GEN1_MONEY + 3].copy_from_slice(&[0x00, 0x30, 0x00]);
    data[GEN1_TID..GEN1_TID + 2].copy_from_slice(&[0x30, 0x39]);
    data[GEN1_CHECKSUM] = gb_sum8(&data[GEN1_OT..GEN1_CHECKSUM]);
    data
}

const SECTOR_SIZE: usize = 0x1000;
const SECTOR_COUNT: usize = 14;
const CHECKED_LEN: [usize; SECTOR_COUNT] = [
    0xF2C, 0xF80, 0xF80, 0xF80, 0xF08, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80, 0xF80,
    0x7D0,
];

/// Emerald flash image. Each complete copy gets its own save counter and
/// sector rotation; `None` leaves that copy blank.
pub fn gen3_image(counters: [Option<u32>; 2], ot_name: &str) -> Vec<u8> {
    let mut data = vec![0u8; 0x20000];
    for (half, counter) in counters.into_iter().enumerate() {
        let Some(counter) = counter else { continue };
        let base = half * 0xE000;
        for i in 0..SECTOR_COUNT {
            let id = (i + half * 5) % SECTOR_COUNT;
            let at = base + i * SECTOR_SIZE;
            if id == 0 {
                g3::encode(&mut data[at..at + 7], ot_name);
                set_u16_le(&mut data, at + 0x0A, 54321);
                set_u32_le(&mut data, at + 0xAC, 0x1357_9BDF);
            }
            set_u16_le(&mut data, at + 0xFF4, id as u16);
            set_u32_le(&mut data, at + 0xFF8, 0x0801_2025);
            set_u32_le(&mut data, at + 0xFFC, counter);
            let sum = sector_sum(&data[at..at + CHECKED_LEN[id]]);
            set_u16_le(&mut data, at + 0xFF6, sum);
        }
    }
    data
}

pub fn swsh_keys() -> SwishKeys {
    SwishKeys {
        xorpad: (0..0x100u16).map(|i| (i as u8).wrapping_mul(73) ^ 0xC3).collect(),
        hash_intro: vec![0x5A; 0x40],
        hash_outro: vec![0xA5; 0x40],
    }
}

/// Signed Sword image with trainer "Leon" (TID 777) and empty storage.
pub fn swsh_image(keys: &SwishKeys) -> Vec<u8> {
    let mut status = vec![0u8; 0x110];
    set_u16_le(&mut status, sav8::TID_AT, 777);
    status[sav8::GAME_AT] = 44;
    status[sav8::LANGUAGE_AT] = 2;
    let name = sav8::OT_AT..sav8::OT_AT + sav8::NAME_LEN;
    utf16::encode(&mut status[name], "Leon", 0);
    let storage = sav8::BOX_COUNT * sav8::BOX_SLOTS * sav8::SLOT_LEN;
    let blocks = [
        encode_block(keys::MY_STATUS, BlockKind::Object, &status),
        encode_block(keys::BOX, BlockKind::Object, &vec![0; storage]),
        encode_block(keys::PARTY, BlockKind::Object, &vec![0; sav8::PARTY_COUNT_AT + 8]),
        encode_block(keys::MONEY, BlockKind::Value(10), &500u32.to_le_bytes()),
        encode_block(keys::PLAY_TIME, BlockKind::Object, &[1, 0, 2, 3, 0, 0, 0, 0]),
        encode_block(keys::ITEMS, BlockKind::Object, &vec![0; 0x1190]),
        encode_block(keys::ZUKAN, BlockKind::Object, &vec![0; 400 * DexEntry8::LEN]),
        encode_block(keys::ZUKAN_ARMOR, BlockKind::Object, &vec![0; 211 * DexEntry8::LEN]),
    ];
    swsh::encrypt_image(&blocks.concat(), keys)
}

/// Generation 8 personal table: Kubfu (891) is Isle of Armor #196 and
/// grows on the medium-fast curve like every other entry.
pub fn personal8() -> PersonalTable {
    let size = PersonalTable::record_size(Generation::Eight);
    let mut data = vec![0u8; size * 899];
    data[891 * size + 0xAC] = 196;
    PersonalTable::from_bytes(Generation::Eight, data).unwrap()
}

pub fn swsh_registry() -> TableRegistry {
    TableRegistry::new()
        .with_swsh_keys(swsh_keys())
        .with_personal(personal8())
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
