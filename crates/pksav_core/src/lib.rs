pub mod core_api;
pub mod endian;
pub mod gender;
pub mod generation;
pub mod gift;
pub mod layout;
pub mod personal;
pub mod pkm;
pub mod reader;
pub mod registry;
pub mod sav;
pub mod stats;
pub mod tables;
pub mod text;
