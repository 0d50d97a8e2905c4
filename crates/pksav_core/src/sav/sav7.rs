//! Sun/Moon and Ultra Sun/Ultra Moon saves. Same block table as X/Y with
//! the inverted CRC and packed bag entries.

use super::checksum::crc16_invert;
use super::items::{ItemFormat, PouchKind, PouchLayout};
use super::table3ds::{Layout3ds, Sav3ds};
use crate::generation::Game;

pub const SIZE_SM: usize = 0x6BE00;
pub const SIZE_USUM: usize = 0x6CC00;

pub type Sav7 = Sav3ds<7>;

const fn packed(kind: PouchKind, offset: usize, capacity: usize) -> PouchLayout {
    PouchLayout::new(kind, offset, capacity, ItemFormat::Packed7)
}

const POUCHES_SM: [PouchLayout; 6] = [
    packed(PouchKind::Items, 0x000, 430),
    packed(PouchKind::KeyItems, 0x6B8, 184),
    packed(PouchKind::Tms, 0x998, 108),
    packed(PouchKind::Medicine, 0xB48, 64),
    packed(PouchKind::Berries, 0xC48, 72),
    packed(PouchKind::ZCrystals, 0xD68, 30),
];

const POUCHES_USUM: [PouchLayout; 7] = [
    packed(PouchKind::Items, 0x000, 430),
    packed(PouchKind::KeyItems, 0x6B8, 184),
    packed(PouchKind::Tms, 0x998, 108),
    packed(PouchKind::Medicine, 0xB48, 64),
    packed(PouchKind::Berries, 0xC48, 72),
    packed(PouchKind::ZCrystals, 0xD68, 30),
    packed(PouchKind::BattleItems, 0xDE0, 11),
];

const SM: Layout3ds = Layout3ds {
    game: Game::SunMoon,
    size: SIZE_SM,
    box_count: 32,
    checksum: crc16_invert,
    bag: 0,
    pouches: &POUCHES_SM,
    status: 1,
    language_at: 0x35,
    ot_name_at: 0x38,
    play_time: 2,
    misc: 3,
    money_at: 0x04,
    party: 4,
    dex: 5,
    dex_caught_at: 0x08,
    dex_seen_at: 0x70,
    cards: 6,
    card_slots: 48,
    boxes: 7,
};

const USUM: Layout3ds = Layout3ds {
    game: Game::UltraSunUltraMoon,
    size: SIZE_USUM,
    pouches: &POUCHES_USUM,
    ..SM
};

impl Sav3ds<7> {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::open(data, &[&SM, &USUM])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Generation;
    use crate::pkm::{self, Pkm};
    use crate::registry::TableRegistry;
    use crate::sav::table3ds::tests::{block_lens, build_image};
    use crate::sav::{ItemStack, PouchKind, SaveFile};

    fn fresh(layout: &Layout3ds) -> Sav7 {
        Sav7::new(build_image(layout.size, &block_lens(layout))).unwrap()
    }

    fn rowlet() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Seven, false);
        pk.set_species(722);
        pk.set_encryption_constant(0x0102_0304);
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn usum_carries_the_battle_item_pouch() {
        let sm = fresh(&SM);
        let usum = fresh(&USUM);
        assert_eq!(sm.game(), Game::SunMoon);
        assert_eq!(sm.pouches().len(), 6);
        assert_eq!(usum.pouches()[6].kind, PouchKind::BattleItems);
    }

    #[test]
    fn packed_bag_entries_round_trip() {
        let mut sav = fresh(&SM);
        let stack = ItemStack {
            is_new: true,
            ..ItemStack::new(776, 1)
        };
        sav.set_item(5, 2, &stack).unwrap();
        assert_eq!(sav.item(5, 2).unwrap(), stack);
        assert!(sav.item(6, 0).is_err());
    }

    #[test]
    fn party_is_compact_and_sealed() {
        let mut sav = fresh(&USUM);
        sav.set_party_pkm(5, rowlet().as_ref()).unwrap();
        sav.set_party_pkm(5, rowlet().as_ref()).unwrap();
        assert_eq!(sav.party_count().unwrap(), 2);
        sav.dex_update(rowlet().as_ref(), &TableRegistry::new()).unwrap();
        sav.finish_editing().unwrap();
        assert!(sav.set_party_pkm(0, rowlet().as_ref()).is_err());

        let reopened = Sav7::new(Box::new(sav).into_bytes()).unwrap();
        assert_eq!(reopened.party_pkm(1).unwrap().species(), 722);
        assert!(reopened.party_pkm(1).unwrap().is_party());
        assert!(reopened.dex_caught(722).unwrap());
        assert!(reopened.dex_seen(808).is_err());
    }
}
