//! Cards and the Deck
//!
//! The Colapsi deck is the 24 cards 2..7 in each of the four suits. The
//! rank is the exact number of steps a player must walk when leaving the
//! card; the suit selects the one-turn ability the card grants.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;

/// Lowest rank in the deck.
pub const MIN_RANK: u8 = 2;

/// Highest rank in the deck.
pub const MAX_RANK: u8 = 7;

// =============================================================================
// SUIT
// =============================================================================

/// Card suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Suit {
    Spades = 0,
    Hearts = 1,
    Diamonds = 2,
    Clubs = 3,
}

impl Suit {
    /// Deck order.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    /// Unicode suit symbol.
    pub fn symbol(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }

    /// Parse a suit symbol.
    pub fn from_symbol(c: char) -> Option<Suit> {
        Suit::ALL.into_iter().find(|s| s.symbol() == c)
    }

    /// Hearts and diamonds.
    pub fn is_red(self) -> bool {
        matches!(self, Suit::Hearts | Suit::Diamonds)
    }
}

// =============================================================================
// RANK
// =============================================================================

/// Card rank, always within `MIN_RANK..=MAX_RANK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

impl Rank {
    /// Create a rank, `None` outside 2..=7.
    pub const fn new(value: u8) -> Option<Rank> {
        if value >= MIN_RANK && value <= MAX_RANK {
            Some(Rank(value))
        } else {
            None
        }
    }

    /// Numeric value.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Number of steps a route leaving this card must take.
    #[inline]
    pub fn steps(self) -> usize {
        self.0 as usize
    }

    /// Every rank in the deck, ascending.
    pub fn all() -> impl Iterator<Item = Rank> {
        (MIN_RANK..=MAX_RANK).map(Rank)
    }
}

impl TryFrom<u8> for Rank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value).ok_or_else(|| format!("rank {value} outside {MIN_RANK}..={MAX_RANK}"))
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.0
    }
}

// =============================================================================
// CARD VALUE
// =============================================================================

/// A rank/suit pair, e.g. `7♠`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardValue {
    pub rank: Rank,
    pub suit: Suit,
}

impl CardValue {
    /// Create a card value.
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parse the display form, e.g. `"5♦"`.
    pub fn parse(s: &str) -> Option<CardValue> {
        let mut chars = s.chars();
        let rank = chars.next()?.to_digit(10)?;
        let suit = Suit::from_symbol(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(CardValue::new(Rank::new(rank as u8)?, suit))
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.value(), self.suit.symbol())
    }
}

// =============================================================================
// DECK
// =============================================================================

/// The fixed set of card values dealt onto the grid.
#[derive(Clone, Debug)]
pub struct Deck {
    values: Vec<CardValue>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

impl Deck {
    /// The 24-card deck in suit-major order (2♠..7♠, 2♥..7♥, 2♦..7♦, 2♣..7♣).
    pub fn standard() -> Self {
        let values = Suit::ALL
            .into_iter()
            .flat_map(|suit| Rank::all().map(move |rank| CardValue::new(rank, suit)))
            .collect();
        Self { values }
    }

    /// All values in deck order.
    pub fn values(&self) -> &[CardValue] {
        &self.values
    }

    /// Deck size.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the deck holds no cards.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the deck can fill a `rows` x `cols` grid.
    pub fn has_enough_for(&self, rows: usize, cols: usize) -> bool {
        self.values.len() >= rows * cols
    }

    /// Fisher-Yates shuffled copy of the deck.
    pub fn shuffled(&self, rng: &mut DeterministicRng) -> Vec<CardValue> {
        rng.shuffled(&self.values)
    }

    /// Values of one suit.
    pub fn by_suit(&self, suit: Suit) -> Vec<CardValue> {
        self.values.iter().copied().filter(|v| v.suit == suit).collect()
    }

    /// Values of one rank.
    pub fn by_rank(&self, rank: Rank) -> Vec<CardValue> {
        self.values.iter().copied().filter(|v| v.rank == rank).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_standard_deck_is_unique() {
        let deck = Deck::standard();
        assert_eq!(deck.len(), 24);
        let unique: BTreeSet<_> = deck.values().iter().collect();
        assert_eq!(unique.len(), 24);
        assert!(deck.has_enough_for(4, 6));
        assert!(!deck.has_enough_for(5, 6));
    }

    #[test]
    fn test_deck_order() {
        let deck = Deck::standard();
        assert_eq!(deck.values()[0].to_string(), "2♠");
        assert_eq!(deck.values()[5].to_string(), "7♠");
        assert_eq!(deck.values()[6].to_string(), "2♥");
        assert_eq!(deck.values()[23].to_string(), "7♣");
    }

    #[test]
    fn test_shuffle_is_deterministic_permutation() {
        let deck = Deck::standard();
        let a = deck.shuffled(&mut DeterministicRng::new(9));
        let b = deck.shuffled(&mut DeterministicRng::new(9));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        let mut expected = deck.values().to_vec();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_filters() {
        let deck = Deck::standard();
        assert_eq!(deck.by_suit(Suit::Hearts).len(), 6);
        let sevens = deck.by_rank(Rank::new(7).unwrap());
        assert_eq!(sevens.len(), 4);
        assert!(sevens.iter().all(|v| v.rank.value() == 7));
    }

    #[test]
    fn test_rank_bounds() {
        assert!(Rank::new(1).is_none());
        assert!(Rank::new(8).is_none());
        assert_eq!(Rank::new(3).unwrap().steps(), 3);
        assert_eq!(Rank::all().count(), 6);
    }

    #[test]
    fn test_parse_display_form() {
        let v = CardValue::parse("5♦").unwrap();
        assert_eq!(v.rank.value(), 5);
        assert_eq!(v.suit, Suit::Diamonds);
        assert!(v.suit.is_red());
        assert!(CardValue::parse("9♦").is_none());
        assert!(CardValue::parse("5x").is_none());
        assert!(CardValue::parse("5♦♦").is_none());
    }
}
