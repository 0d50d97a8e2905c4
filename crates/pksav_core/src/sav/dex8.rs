//! Sword/Shield dex entry, one 48-byte record per regional dex number.

use serde::{Deserialize, Serialize};

use crate::endian::{get_bits, set_bits, set_u16_le, set_u32_le, set_u64_le, u16_le, u32_le, u64_le};
use crate::generation::Language;

const FLAGS_AT: usize = 0x20;
const LANGUAGES_AT: usize = 0x24;
const BATTLED_AT: usize = 0x28;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexEntry8 {
    /// Seen form bits for male, female, shiny male and shiny female.
    pub seen: [u64; 4],
    pub obtained: bool,
    pub caught_gigantamax: bool,
    pub display_gigantamax: bool,
    pub display_gender: u8,
    pub display_shiny: bool,
    pub display_form: u16,
    pub languages: u16,
    pub battled: u32,
}

impl DexEntry8 {
    pub const LEN: usize = 0x30;

    pub fn read(data: &[u8]) -> Self {
        let flags = u32_le(data, FLAGS_AT);
        Self {
            seen: [0, 1, 2, 3].map(|i| u64_le(data, i * 8)),
            obtained: get_bits(flags, 0, 1) != 0,
            caught_gigantamax: get_bits(flags, 1, 1) != 0,
            display_gigantamax: get_bits(flags, 2, 1) != 0,
            display_gender: get_bits(flags, 3, 2) as u8,
            display_shiny: get_bits(flags, 5, 1) != 0,
            display_form: get_bits(flags, 6, 13) as u16,
            languages: u16_le(data, LANGUAGES_AT),
            battled: u32_le(data, BATTLED_AT),
        }
    }

    /// Packs into `dest`, leaving the unused tail bytes as they were.
    pub fn write(&self, dest: &mut [u8]) {
        for (i, word) in self.seen.iter().enumerate() {
            set_u64_le(dest, i * 8, *word);
        }
        let mut flags = u32_le(dest, FLAGS_AT);
        flags = set_bits(flags, 0, 1, u32::from(self.obtained));
        flags = set_bits(flags, 1, 1, u32::from(self.caught_gigantamax));
        flags = set_bits(flags, 2, 1, u32::from(self.display_gigantamax));
        flags = set_bits(flags, 3, 2, u32::from(self.display_gender));
        flags = set_bits(flags, 5, 1, u32::from(self.display_shiny));
        flags = set_bits(flags, 6, 13, u32::from(self.display_form));
        set_u32_le(dest, FLAGS_AT, flags);
        set_u16_le(dest, LANGUAGES_AT, self.languages);
        set_u32_le(dest, BATTLED_AT, self.battled);
    }

    pub fn is_seen(&self) -> bool {
        self.seen.iter().any(|&w| w != 0)
    }

    pub fn seen_form(&self, form: u8, female: bool, shiny: bool) -> bool {
        form < 64 && self.seen[region(female, shiny)] >> form & 1 != 0
    }

    pub fn set_seen_form(&mut self, form: u8, female: bool, shiny: bool) {
        if form < 64 {
            self.seen[region(female, shiny)] |= 1 << form;
        }
    }

    pub fn has_language(&self, language: Language) -> bool {
        language_bit(language).is_some_and(|bit| self.languages >> bit & 1 != 0)
    }

    pub fn set_language(&mut self, language: Language) {
        if let Some(bit) = language_bit(language) {
            self.languages |= 1 << bit;
        }
    }
}

fn region(female: bool, shiny: bool) -> usize {
    usize::from(shiny) * 2 + usize::from(female)
}

/// Language id 6 is unassigned, so later languages shift down a bit.
fn language_bit(language: Language) -> Option<u8> {
    match language.raw() {
        raw @ 1..=5 => Some(raw - 1),
        raw @ 7..=10 => Some(raw - 2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pack_into_their_bit_fields() {
        let entry = DexEntry8 {
            obtained: true,
            display_gender: 2,
            display_shiny: true,
            display_form: 0x1FFF,
            ..DexEntry8::default()
        };
        let mut buf = [0u8; DexEntry8::LEN];
        entry.write(&mut buf);
        assert_eq!(u32_le(&buf, FLAGS_AT), 1 | 2 << 3 | 1 << 5 | 0x1FFF << 6);
        assert_eq!(DexEntry8::read(&buf), entry);
    }

    #[test]
    fn seen_regions_and_languages() {
        let mut entry = DexEntry8::default();
        assert!(!entry.is_seen());
        entry.set_seen_form(3, true, true);
        assert!(entry.is_seen());
        assert_eq!(entry.seen[3], 1 << 3);
        assert!(entry.seen_form(3, true, true));
        assert!(!entry.seen_form(3, false, true));

        entry.set_language(Language::Korean);
        entry.set_language(Language::Japanese);
        assert_eq!(entry.languages, 1 << 6 | 1);
        assert!(entry.has_language(Language::Korean));
        assert!(!entry.has_language(Language::German));
    }
}
