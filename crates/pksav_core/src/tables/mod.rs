pub mod growth;
pub mod items;
pub mod species;
