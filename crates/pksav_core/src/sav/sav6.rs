//! X/Y and Omega Ruby/Alpha Sapphire saves.

use super::checksum::crc16_ccitt;
use super::items::{ItemFormat, PouchKind, PouchLayout};
use super::table3ds::{Layout3ds, Sav3ds};
use crate::generation::Game;

pub const SIZE_XY: usize = 0x65600;
pub const SIZE_ORAS: usize = 0x76000;

pub type Sav6 = Sav3ds<6>;

const POUCHES: [PouchLayout; 5] = [
    PouchLayout::new(PouchKind::Items, 0x000, 400, ItemFormat::Plain),
    PouchLayout::new(PouchKind::KeyItems, 0x640, 96, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Tms, 0x7C0, 106, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Medicine, 0x968, 64, ItemFormat::Plain),
    PouchLayout::new(PouchKind::Berries, 0xA68, 102, ItemFormat::Plain),
];

const XY: Layout3ds = Layout3ds {
    game: Game::XY,
    size: SIZE_XY,
    box_count: 31,
    checksum: crc16_ccitt,
    bag: 1,
    pouches: &POUCHES,
    status: 2,
    language_at: 0x2D,
    ot_name_at: 0x48,
    play_time: 3,
    misc: 4,
    money_at: 0x08,
    party: 5,
    dex: 6,
    dex_caught_at: 0x08,
    dex_seen_at: 0x68,
    cards: 7,
    card_slots: 24,
    boxes: 9,
};

const ORAS: Layout3ds = Layout3ds {
    game: Game::OmegaRubyAlphaSapphire,
    size: SIZE_ORAS,
    ..XY
};

impl Sav3ds<6> {
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::open(data, &[&XY, &ORAS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::set_u16_le;
    use crate::generation::{GameVersion, Generation, Language};
    use crate::gift::Wc6;
    use crate::pkm::{self, Pkm};
    use crate::registry::TableRegistry;
    use crate::sav::table3ds::tests::{block_lens, build_image};
    use crate::sav::{GiftPlacement, ItemStack, SaveFile};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fresh(layout: &Layout3ds) -> Sav6 {
        Sav6::new(build_image(layout.size, &block_lens(layout))).unwrap()
    }

    fn froakie() -> Box<dyn Pkm> {
        let mut pk = pkm::blank(Generation::Six, false);
        pk.set_species(656);
        pk.set_encryption_constant(0xDEAD_BEEF);
        pk.set_nickname("Froakie");
        pk.refresh_checksum();
        pk
    }

    #[test]
    fn size_picks_the_game() {
        assert_eq!(fresh(&XY).game(), Game::XY);
        assert_eq!(fresh(&ORAS).game(), Game::OmegaRubyAlphaSapphire);
        assert!(Sav6::new(vec![0; SIZE_XY]).is_none());
    }

    #[test]
    fn missing_blocks_are_rejected() {
        let mut lens = block_lens(&XY);
        lens[9] = 0x100;
        assert!(Sav6::new(build_image(SIZE_XY, &lens)).is_none());
    }

    #[test]
    fn boxes_round_trip_through_the_sealed_image() {
        let mut sav = fresh(&ORAS);
        sav.set_pkm(30, 29, froakie().as_ref()).unwrap();
        sav.finish_editing().unwrap();
        let bytes = Box::new(sav).into_bytes();
        let reopened = Sav6::new(bytes).unwrap();
        let pk = reopened.pkm(30, 29).unwrap();
        assert_eq!(pk.species(), 656);
        assert_eq!(pk.nickname(), "Froakie");
        assert!(pk.is_valid_checksum());
        assert!(reopened.pkm(31, 0).is_err());
    }

    #[test]
    fn trainer_reads_my_status() {
        let mut data = build_image(SIZE_XY, &block_lens(&XY));
        let status = block_lens(&XY)[..2].iter().map(|l| l.div_ceil(0x200) * 0x200).sum::<usize>();
        set_u16_le(&mut data, status, 54321);
        data[status + 4] = GameVersion::Y.raw();
        data[status + 0x2D] = Language::German.raw();
        let mut sav = Sav6::new(data).unwrap();
        sav.set_ot_name("Serena").unwrap();
        sav.set_money(10_000_000).unwrap();
        let trainer = sav.trainer().unwrap();
        assert_eq!(trainer.tid, 54321);
        assert_eq!(trainer.version, GameVersion::Y);
        assert_eq!(trainer.language, Language::German);
        assert_eq!(trainer.ot_name, "Serena");
        assert_eq!(trainer.money, 9_999_999);
    }

    #[test]
    fn item_cards_fill_the_bag_and_are_recorded() {
        let mut sav = fresh(&XY);
        let mut raw = vec![0u8; crate::gift::wc6::LEN];
        set_u16_le(&mut raw, 0x00, 77);
        raw[0x51] = 1;
        set_u16_le(&mut raw, 0x68, 1);
        set_u16_le(&mut raw, 0x6A, 1);
        let card = Wc6::new(raw).unwrap();
        let mut rng = StdRng::seed_from_u64(6);

        let placed = sav
            .inject_gift(&card, &TableRegistry::new(), &mut rng)
            .unwrap();
        let GiftPlacement::Items(items) = placed else {
            panic!("expected an item placement");
        };
        assert_eq!(items[0].pouch, 0);
        assert_eq!(sav.item(0, 0).unwrap(), ItemStack::new(1, 1));
        assert!(sav.card_received(77));
        assert!(!sav.card_received(78));
        assert_eq!(sav.stored_cards().len(), 1);
    }
}
