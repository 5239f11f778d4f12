//! The card shop: random packages for `buy`.

use rand::Rng;
use serde::Serialize;
use shared::{MAX_STARS, MIN_STARS};

/// One card of each type, as sold by `buy`. Serializes to the star counts
/// keyed by card type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardPackage {
    pub rock: u8,
    pub paper: u8,
    pub scissors: u8,
}

/// Rolls a fresh package with independent star counts.
pub fn open_package<R: Rng + ?Sized>(rng: &mut R) -> CardPackage {
    CardPackage {
        rock: rng.gen_range(MIN_STARS..=MAX_STARS),
        paper: rng.gen_range(MIN_STARS..=MAX_STARS),
        scissors: rng.gen_range(MIN_STARS..=MAX_STARS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use shared::{Card, CardError, CardType};

    fn cards(package: &CardPackage) -> Result<Vec<Card>, CardError> {
        [
            (CardType::Rock, package.rock),
            (CardType::Paper, package.paper),
            (CardType::Scissors, package.scissors),
        ]
        .into_iter()
        .map(|(card_type, stars)| Card::new(card_type, stars as i64))
        .collect()
    }

    #[test]
    fn test_packages_hold_valid_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let package = open_package(&mut rng);
            let cards = cards(&package).unwrap();
            assert_eq!(cards.len(), 3);
            assert_eq!(cards[0].card_type(), CardType::Rock);
            assert_eq!(cards[2].card_type(), CardType::Scissors);
        }
    }

    #[test]
    fn test_package_serialization() {
        let package = CardPackage {
            rock: 1,
            paper: 5,
            scissors: 3,
        };
        assert_eq!(
            serde_json::to_value(package).unwrap(),
            json!({"rock": 1, "paper": 5, "scissors": 3})
        );
    }
}
