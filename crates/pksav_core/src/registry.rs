//! Externally supplied data: personal tables, string tables, runtime
//! character tables and the Sword/Shield static crypto constants.
//!
//! A registry is built once by the caller and passed by reference to every
//! operation that needs one of these resources.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use log::debug;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::generation::{Generation, Language};
use crate::personal::PersonalTable;
use crate::text::CharTable;

pub trait Localizer {
    fn lookup(&self, language: Language, category: &str, id: u16) -> Option<&str>;
}

/// String tables keyed by language and category, loaded from JSON objects
/// of the form `{"species": ["", "Bulbasaur", ...], "moves": [...]}`.
#[derive(Debug, Clone, Default)]
pub struct StringTables {
    tables: HashMap<Language, HashMap<String, Vec<String>>>,
}

impl StringTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: Language, category: &str, entries: Vec<String>) {
        self.tables
            .entry(language)
            .or_default()
            .insert(category.to_string(), entries);
    }

    pub fn load_json(&mut self, language: Language, bytes: &[u8]) -> Result<(), CoreError> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_slice(bytes).map_err(|e| {
            CoreError::resource(format!("invalid {} string table: {e}", language.code()))
        })?;
        debug!(
            "loaded {} string categories for {}",
            parsed.len(),
            language.code()
        );
        self.tables.entry(language).or_default().extend(parsed);
        Ok(())
    }
}

impl Localizer for StringTables {
    fn lookup(&self, language: Language, category: &str, id: u16) -> Option<&str> {
        self.tables
            .get(&language)?
            .get(category)?
            .get(usize::from(id))
            .map(String::as_str)
    }
}

pub const SWSH_HASH_INTRO_LEN: usize = 0x40;
pub const SWSH_HASH_OUTRO_LEN: usize = 0x40;

/// Static constants for the Sword/Shield outer save layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwishKeys {
    pub xorpad: Vec<u8>,
    pub hash_intro: Vec<u8>,
    pub hash_outro: Vec<u8>,
}

impl SwishKeys {
    /// Blob layout: hash intro (0x40), hash outro (0x40), xorpad (rest).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let split = SWSH_HASH_INTRO_LEN + SWSH_HASH_OUTRO_LEN;
        if bytes.len() <= split {
            return Err(CoreError::resource(format!(
                "crypto constants blob is {} bytes, expected more than {split}",
                bytes.len()
            )));
        }
        Ok(Self {
            hash_intro: bytes[..SWSH_HASH_INTRO_LEN].to_vec(),
            hash_outro: bytes[SWSH_HASH_INTRO_LEN..split].to_vec(),
            xorpad: bytes[split..].to_vec(),
        })
    }
}

#[derive(Default)]
pub struct TableRegistry {
    personal: HashMap<Generation, PersonalTable>,
    localizer: Option<Box<dyn Localizer>>,
    char_tables: HashMap<(Generation, Language), CharTable>,
    swsh_keys: Option<SwishKeys>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_personal(mut self, table: PersonalTable) -> Self {
        self.personal.insert(table.generation(), table);
        self
    }

    pub fn load_personal(&mut self, generation: Generation, path: &Path) -> Result<(), CoreError> {
        let bytes = read_resource(path)?;
        let table = PersonalTable::from_bytes(generation, bytes)?;
        debug!(
            "loaded {generation} personal table with {} records from {}",
            table.len(),
            path.display()
        );
        self.personal.insert(generation, table);
        Ok(())
    }

    /// Fails with `Resource` when no table was registered for `generation`.
    pub fn personal(&self, generation: Generation) -> Result<&PersonalTable, CoreError> {
        self.personal.get(&generation).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::Resource,
                format!("no personal table registered for {generation}"),
            )
        })
    }

    pub fn has_personal(&self, generation: Generation) -> bool {
        self.personal.contains_key(&generation)
    }

    pub fn with_localizer(mut self, localizer: Box<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    /// Looks up a string, falling back to `MISSING: <category>.<id>`.
    pub fn localize(&self, language: Language, category: &str, id: u16) -> String {
        self.localizer
            .as_ref()
            .and_then(|l| l.lookup(language, category, id))
            .map_or_else(|| format!("MISSING: {category}.{id}"), str::to_string)
    }

    /// The default nickname a creature of `species` gets in `language`.
    pub fn species_name(&self, language: Language, species: u16) -> String {
        self.localize(language, "species", species)
    }

    pub fn with_char_table(
        mut self,
        generation: Generation,
        language: Language,
        table: CharTable,
    ) -> Self {
        self.char_tables.insert((generation, language), table);
        self
    }

    pub fn load_char_table(
        &mut self,
        generation: Generation,
        language: Language,
        path: &Path,
    ) -> Result<(), CoreError> {
        let table = CharTable::from_json(&read_resource(path)?)?;
        self.char_tables.insert((generation, language), table);
        Ok(())
    }

    pub fn char_table(&self, generation: Generation, language: Language) -> Option<&CharTable> {
        self.char_tables.get(&(generation, language))
    }

    pub fn with_swsh_keys(mut self, keys: SwishKeys) -> Self {
        self.swsh_keys = Some(keys);
        self
    }

    pub fn load_swsh_keys(&mut self, path: &Path) -> Result<(), CoreError> {
        self.swsh_keys = Some(SwishKeys::from_bytes(&read_resource(path)?)?);
        Ok(())
    }

    pub fn swsh_keys(&self) -> Result<&SwishKeys, CoreError> {
        self.swsh_keys
            .as_ref()
            .ok_or_else(|| CoreError::resource("no Sword/Shield crypto constants registered"))
    }
}

/// Reads a resource file, inflating it when it carries a zlib header.
pub fn read_resource(path: &Path) -> Result<Vec<u8>, CoreError> {
    let raw = fs::read(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Resource,
            format!("failed to read {}: {e}", path.display()),
        )
    })?;
    inflate_if_compressed(raw)
}

pub fn inflate_if_compressed(raw: Vec<u8>) -> Result<Vec<u8>, CoreError> {
    if !is_zlib(&raw) {
        return Ok(raw);
    }
    let mut decoder = ZlibDecoder::new(raw.as_slice());
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CoreError::resource(format!("zlib decode failed: {e}")))?;
    Ok(out)
}

fn is_zlib(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => {
            *cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    #[test]
    fn localize_falls_back_to_missing_key() {
        let mut strings = StringTables::new();
        strings.insert(
            Language::English,
            "species",
            vec![String::new(), "Bulbasaur".to_string()],
        );
        let registry = TableRegistry::new().with_localizer(Box::new(strings));
        assert_eq!(registry.species_name(Language::English, 1), "Bulbasaur");
        assert_eq!(registry.species_name(Language::English, 2), "MISSING: species.2");
        assert_eq!(registry.localize(Language::French, "moves", 7), "MISSING: moves.7");
    }

    #[test]
    fn missing_personal_table_is_a_resource_error() {
        let err = TableRegistry::new()
            .personal(Generation::Four)
            .expect_err("nothing registered");
        assert_eq!(err.code, CoreErrorCode::Resource);
    }

    #[test]
    fn inflates_zlib_resources() {
        let payload = vec![7u8; 0x1C * 3];
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).expect("compress");
        let packed = encoder.finish().expect("finish");
        assert_eq!(inflate_if_compressed(packed).expect("inflate"), payload);
        assert_eq!(inflate_if_compressed(payload.clone()).expect("plain"), payload);
    }
}
