use serde::{Deserialize, Serialize};

use crate::generation::{Game, GameVersion, Generation, Language};
use crate::pkm::PkmSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayTime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

/// The save's own trainer. Records created or transferred into a save take
/// their original-trainer or handler data from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerInfo {
    pub ot_name: String,
    pub tid: u16,
    pub sid: u16,
    pub gender: u8,
    pub language: Language,
    pub version: GameVersion,
    pub money: u32,
    pub play_time: PlayTime,
}

impl TrainerInfo {
    pub fn new(ot_name: impl Into<String>, tid: u16, sid: u16, version: GameVersion) -> Self {
        Self {
            ot_name: ot_name.into(),
            tid,
            sid,
            gender: 0,
            language: Language::English,
            version,
            money: 0,
            play_time: PlayTime::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxOccupancy {
    pub index: usize,
    pub occupied: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub game: Game,
    pub generation: Generation,
    pub trainer: TrainerInfo,
    pub party: Vec<PkmSummary>,
    pub boxes: Vec<BoxOccupancy>,
    pub dex_caught: usize,
    pub dex_seen: usize,
}
