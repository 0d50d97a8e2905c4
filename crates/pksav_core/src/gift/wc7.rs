//! Sun/Moon wonder card. Same layout as the X/Y card; item cards may carry
//! up to six stacks.

use super::wc6::Card3ds;

pub type Wc7 = Card3ds<7>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::set_u16_le;
    use crate::generation::Generation;
    use crate::gift::Gift;
    use crate::gift::wc6::tests::creature_card;
    use crate::gift::wc6::LEN;
    use crate::sav::ItemStack;

    #[test]
    fn item_list_stops_at_first_empty_pair() {
        let mut raw = vec![0u8; LEN];
        raw[0x51] = 1;
        for (i, (item, count)) in [(50u16, 2u16), (28, 0), (0, 5), (1, 1)].into_iter().enumerate() {
            set_u16_le(&mut raw, 0x68 + 4 * i, item);
            set_u16_le(&mut raw, 0x6A + 4 * i, count);
        }
        let card = Wc7::new(raw).unwrap();
        assert_eq!(card.generation(), Generation::Seven);
        assert_eq!(
            card.items(),
            vec![ItemStack::new(50, 2), ItemStack::new(28, 1)]
        );
    }

    #[test]
    fn creature_cards_report_generation_seven() {
        let card = Wc7::new(creature_card(2001, 785, 60)).unwrap();
        assert!(card.is_pokemon());
        assert!(card.items().is_empty());
        assert_eq!(card.generation(), Generation::Seven);
    }
}
