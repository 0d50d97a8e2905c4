use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Generation {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

impl Generation {
    pub const ALL: [Generation; 8] = [
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
    ];

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn max_species(self) -> u16 {
        match self {
            Self::One => 151,
            Self::Two => 251,
            Self::Three => 386,
            Self::Four => 493,
            Self::Five => 649,
            Self::Six => 721,
            Self::Seven => 807,
            Self::Eight => 898,
        }
    }

    pub fn max_move(self) -> u16 {
        match self {
            Self::One => 165,
            Self::Two => 251,
            Self::Three => 354,
            Self::Four => 467,
            Self::Five => 559,
            Self::Six => 621,
            Self::Seven => 728,
            Self::Eight => 826,
        }
    }

    pub fn max_item(self) -> u16 {
        match self {
            Self::One => 255,
            Self::Two => 255,
            Self::Three => 376,
            Self::Four => 536,
            Self::Five => 638,
            Self::Six => 775,
            Self::Seven => 959,
            Self::Eight => 1607,
        }
    }

    pub fn max_ability(self) -> u16 {
        match self {
            Self::One | Self::Two => 0,
            Self::Three => 76,
            Self::Four => 123,
            Self::Five => 164,
            Self::Six => 191,
            Self::Seven => 233,
            Self::Eight => 267,
        }
    }

    pub fn max_ball(self) -> u8 {
        match self {
            Self::One | Self::Two => 0,
            Self::Three => 12,
            Self::Four => 24,
            Self::Five | Self::Six => 25,
            Self::Seven | Self::Eight => 26,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation {}", self.number())
    }
}

/// Origin game identifiers as stored in creature records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameVersion {
    Sapphire = 1,
    Ruby = 2,
    Emerald = 3,
    FireRed = 4,
    LeafGreen = 5,
    HeartGold = 7,
    SoulSilver = 8,
    Diamond = 10,
    Pearl = 11,
    Platinum = 12,
    Colosseum = 15,
    White = 20,
    Black = 21,
    White2 = 22,
    Black2 = 23,
    X = 24,
    Y = 25,
    AlphaSapphire = 26,
    OmegaRuby = 27,
    Sun = 30,
    Moon = 31,
    UltraSun = 32,
    UltraMoon = 33,
    Red = 35,
    Blue = 36,
    Green = 37,
    Yellow = 38,
    Gold = 39,
    Silver = 40,
    Crystal = 41,
    Sword = 44,
    Shield = 45,
}

impl GameVersion {
    const ALL: [GameVersion; 32] = [
        Self::Sapphire,
        Self::Ruby,
        Self::Emerald,
        Self::FireRed,
        Self::LeafGreen,
        Self::HeartGold,
        Self::SoulSilver,
        Self::Diamond,
        Self::Pearl,
        Self::Platinum,
        Self::Colosseum,
        Self::White,
        Self::Black,
        Self::White2,
        Self::Black2,
        Self::X,
        Self::Y,
        Self::AlphaSapphire,
        Self::OmegaRuby,
        Self::Sun,
        Self::Moon,
        Self::UltraSun,
        Self::UltraMoon,
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Gold,
        Self::Silver,
        Self::Crystal,
        Self::Sword,
        Self::Shield,
    ];

    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| *v as u8 == raw)
    }

    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Parses a version name such as `"emerald"` or `"UltraMoon"`, or its
    /// raw id.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Ok(raw) = name.parse::<u8>() {
            return Self::from_raw(raw);
        }
        let wanted: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        Self::ALL
            .iter()
            .copied()
            .find(|v| format!("{v:?}").eq_ignore_ascii_case(&wanted))
    }

    pub fn generation(self) -> Generation {
        match self {
            Self::Red | Self::Blue | Self::Green | Self::Yellow => Generation::One,
            Self::Gold | Self::Silver | Self::Crystal => Generation::Two,
            Self::Sapphire
            | Self::Ruby
            | Self::Emerald
            | Self::FireRed
            | Self::LeafGreen
            | Self::Colosseum => Generation::Three,
            Self::HeartGold | Self::SoulSilver | Self::Diamond | Self::Pearl | Self::Platinum => {
                Generation::Four
            }
            Self::White | Self::Black | Self::White2 | Self::Black2 => Generation::Five,
            Self::X | Self::Y | Self::AlphaSapphire | Self::OmegaRuby => Generation::Six,
            Self::Sun | Self::Moon | Self::UltraSun | Self::UltraMoon => Generation::Seven,
            Self::Sword | Self::Shield => Generation::Eight,
        }
    }

    /// Save family the version writes. Colosseum has no handheld save.
    pub fn game(self) -> Option<Game> {
        let game = match self {
            Self::Red | Self::Blue | Self::Green | Self::Yellow => Game::RedBlueYellow,
            Self::Gold | Self::Silver => Game::GoldSilver,
            Self::Crystal => Game::Crystal,
            Self::Ruby | Self::Sapphire => Game::RubySapphire,
            Self::Emerald => Game::Emerald,
            Self::FireRed | Self::LeafGreen => Game::FireRedLeafGreen,
            Self::Diamond | Self::Pearl => Game::DiamondPearl,
            Self::Platinum => Game::Platinum,
            Self::HeartGold | Self::SoulSilver => Game::HeartGoldSoulSilver,
            Self::Black | Self::White => Game::BlackWhite,
            Self::Black2 | Self::White2 => Game::Black2White2,
            Self::X | Self::Y => Game::XY,
            Self::OmegaRuby | Self::AlphaSapphire => Game::OmegaRubyAlphaSapphire,
            Self::Sun | Self::Moon => Game::SunMoon,
            Self::UltraSun | Self::UltraMoon => Game::UltraSunUltraMoon,
            Self::Sword | Self::Shield => Game::SwordShield,
            Self::Colosseum => return None,
        };
        Some(game)
    }
}

/// Save image families. Games in one family share a container layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    RedBlueYellow,
    GoldSilver,
    Crystal,
    RubySapphire,
    Emerald,
    FireRedLeafGreen,
    DiamondPearl,
    Platinum,
    HeartGoldSoulSilver,
    BlackWhite,
    Black2White2,
    XY,
    OmegaRubyAlphaSapphire,
    SunMoon,
    UltraSunUltraMoon,
    SwordShield,
}

impl Game {
    pub const ALL: [Game; 16] = [
        Self::RedBlueYellow,
        Self::GoldSilver,
        Self::Crystal,
        Self::RubySapphire,
        Self::Emerald,
        Self::FireRedLeafGreen,
        Self::DiamondPearl,
        Self::Platinum,
        Self::HeartGoldSoulSilver,
        Self::BlackWhite,
        Self::Black2White2,
        Self::XY,
        Self::OmegaRubyAlphaSapphire,
        Self::SunMoon,
        Self::UltraSunUltraMoon,
        Self::SwordShield,
    ];

    pub fn generation(self) -> Generation {
        match self {
            Self::RedBlueYellow => Generation::One,
            Self::GoldSilver | Self::Crystal => Generation::Two,
            Self::RubySapphire | Self::Emerald | Self::FireRedLeafGreen => Generation::Three,
            Self::DiamondPearl | Self::Platinum | Self::HeartGoldSoulSilver => Generation::Four,
            Self::BlackWhite | Self::Black2White2 => Generation::Five,
            Self::XY | Self::OmegaRubyAlphaSapphire => Generation::Six,
            Self::SunMoon | Self::UltraSunUltraMoon => Generation::Seven,
            Self::SwordShield => Generation::Eight,
        }
    }

    /// The version written into records created for this family.
    pub fn default_version(self) -> GameVersion {
        match self {
            Self::RedBlueYellow => GameVersion::Red,
            Self::GoldSilver => GameVersion::Gold,
            Self::Crystal => GameVersion::Crystal,
            Self::RubySapphire => GameVersion::Ruby,
            Self::Emerald => GameVersion::Emerald,
            Self::FireRedLeafGreen => GameVersion::FireRed,
            Self::DiamondPearl => GameVersion::Diamond,
            Self::Platinum => GameVersion::Platinum,
            Self::HeartGoldSoulSilver => GameVersion::HeartGold,
            Self::BlackWhite => GameVersion::Black,
            Self::Black2White2 => GameVersion::Black2,
            Self::XY => GameVersion::X,
            Self::OmegaRubyAlphaSapphire => GameVersion::OmegaRuby,
            Self::SunMoon => GameVersion::Sun,
            Self::UltraSunUltraMoon => GameVersion::UltraSun,
            Self::SwordShield => GameVersion::Sword,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RedBlueYellow => "Red/Blue/Yellow",
            Self::GoldSilver => "Gold/Silver",
            Self::Crystal => "Crystal",
            Self::RubySapphire => "Ruby/Sapphire",
            Self::Emerald => "Emerald",
            Self::FireRedLeafGreen => "FireRed/LeafGreen",
            Self::DiamondPearl => "Diamond/Pearl",
            Self::Platinum => "Platinum",
            Self::HeartGoldSoulSilver => "HeartGold/SoulSilver",
            Self::BlackWhite => "Black/White",
            Self::Black2White2 => "Black 2/White 2",
            Self::XY => "X/Y",
            Self::OmegaRubyAlphaSapphire => "Omega Ruby/Alpha Sapphire",
            Self::SunMoon => "Sun/Moon",
            Self::UltraSunUltraMoon => "Ultra Sun/Ultra Moon",
            Self::SwordShield => "Sword/Shield",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Language {
    Japanese = 1,
    English = 2,
    French = 3,
    Italian = 4,
    German = 5,
    Spanish = 7,
    Korean = 8,
    ChineseSimplified = 9,
    ChineseTraditional = 10,
}

impl Language {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Japanese),
            2 => Some(Self::English),
            3 => Some(Self::French),
            4 => Some(Self::Italian),
            5 => Some(Self::German),
            7 => Some(Self::Spanish),
            8 => Some(Self::Korean),
            9 => Some(Self::ChineseSimplified),
            10 => Some(Self::ChineseTraditional),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Japanese => "jpn",
            Self::English => "eng",
            Self::French => "fre",
            Self::Italian => "ita",
            Self::German => "ger",
            Self::Spanish => "spa",
            Self::Korean => "kor",
            Self::ChineseSimplified => "chs",
            Self::ChineseTraditional => "cht",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::Japanese,
            Self::English,
            Self::French,
            Self::Italian,
            Self::German,
            Self::Spanish,
            Self::Korean,
            Self::ChineseSimplified,
            Self::ChineseTraditional,
        ]
        .into_iter()
        .find(|l| l.code().eq_ignore_ascii_case(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_round_trip_through_raw() {
        for v in GameVersion::ALL {
            assert_eq!(GameVersion::from_raw(v.raw()), Some(v));
        }
        assert_eq!(GameVersion::from_raw(0), None);
        assert_eq!(GameVersion::from_raw(6), None);
    }

    #[test]
    fn versions_parse_by_name() {
        assert_eq!(GameVersion::from_name("emerald"), Some(GameVersion::Emerald));
        assert_eq!(GameVersion::from_name("Ultra Moon"), Some(GameVersion::UltraMoon));
        assert_eq!(GameVersion::from_name("41"), Some(GameVersion::Crystal));
        assert_eq!(GameVersion::from_name("stadium"), None);
    }

    #[test]
    fn generation_numbers() {
        assert_eq!(Generation::from_number(3), Some(Generation::Three));
        assert_eq!(Generation::from_number(0), None);
        assert_eq!(Generation::from_number(9), None);
        assert_eq!(Generation::Eight.number(), 8);
    }
}
