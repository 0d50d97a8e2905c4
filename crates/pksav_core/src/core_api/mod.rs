mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode, check_index};
pub use types::{BoxOccupancy, PlayTime, Snapshot, TrainerInfo};
