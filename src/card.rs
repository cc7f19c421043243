//! Card types and deck utilities.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CardError;

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    /// Clubs.
    Club,
    /// Diamonds.
    Diamond,
    /// Spades.
    Spade,
    /// Hearts.
    Heart,
}

impl Suit {
    /// All suits, in deck generation order.
    pub const ALL: [Self; 4] = [Self::Club, Self::Diamond, Self::Spade, Self::Heart];

    /// Returns the single-letter code used in card text (`C`, `D`, `S`, `H`).
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Club => 'C',
            Self::Diamond => 'D',
            Self::Spade => 'S',
            Self::Heart => 'H',
        }
    }

    const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'C' | 'c' => Some(Self::Club),
            'D' | 'd' => Some(Self::Diamond),
            'S' | 's' => Some(Self::Spade),
            'H' | 'h' => Some(Self::Heart),
            _ => None,
        }
    }
}

/// Lowest card rank (a two).
pub const MIN_RANK: u8 = 2;
/// Highest card rank (an ace).
pub const MAX_RANK: u8 = 14;
/// Rank of the queen.
pub const QUEEN: u8 = 12;

/// A playing card.
///
/// Cards are immutable values. Rank runs from 2 to 14 with the ace high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCard")]
pub struct Card {
    rank: u8,
    suit: Suit,
}

#[derive(Deserialize)]
struct RawCard {
    rank: u8,
    suit: Suit,
}

impl TryFrom<RawCard> for Card {
    type Error = CardError;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        Self::new(raw.rank, raw.suit)
    }
}

impl Card {
    /// Creates a new card.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidValue`] if the rank is outside `2..=14`.
    pub const fn new(rank: u8, suit: Suit) -> Result<Self, CardError> {
        if rank < MIN_RANK || rank > MAX_RANK {
            return Err(CardError::InvalidValue);
        }
        Ok(Self { rank, suit })
    }

    /// Returns the rank (2..=14, 14 = ace).
    #[must_use]
    pub const fn rank(&self) -> u8 {
        self.rank
    }

    /// Returns the suit.
    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.suit
    }

    /// Compares two cards of the same suit by rank.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::SuitMismatch`] if the suits differ; ranks of
    /// different suits have no order in this game.
    pub fn compare(&self, other: &Self) -> Result<Ordering, CardError> {
        if self.suit != other.suit {
            return Err(CardError::SuitMismatch);
        }
        Ok(self.rank.cmp(&other.rank))
    }

    /// Returns the penalty points this card is worth when won in a trick.
    #[must_use]
    pub const fn points(&self) -> u32 {
        match (self.suit, self.rank) {
            (Suit::Heart, _) => 1,
            (Suit::Spade, QUEEN) => 13,
            _ => 0,
        }
    }

    /// Returns whether this card carries any points.
    #[must_use]
    pub const fn is_point_card(&self) -> bool {
        self.points() > 0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            11 => f.write_str("J")?,
            12 => f.write_str("Q")?,
            13 => f.write_str("K")?,
            14 => f.write_str("A")?,
            n => write!(f, "{n}")?,
        }
        write!(f, "{}", self.suit.letter())
    }
}

impl FromStr for Card {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let suit = chars
            .next_back()
            .and_then(Suit::from_letter)
            .ok_or(CardError::InvalidValue)?;
        let rank = match chars.as_str() {
            "J" | "j" => 11,
            "Q" | "q" => 12,
            "K" | "k" => 13,
            "A" | "a" => 14,
            digits => digits.parse().map_err(|_| CardError::InvalidValue)?,
        };
        Self::new(rank, suit)
    }
}

/// Number of cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Total points available in one round.
pub const POINTS_PER_ROUND: u32 = 26;

/// The two of clubs, which leads the first trick of a round.
pub const TWO_OF_CLUBS: Card = Card {
    rank: MIN_RANK,
    suit: Suit::Club,
};

/// The queen of spades.
pub const QUEEN_OF_SPADES: Card = Card {
    rank: QUEEN,
    suit: Suit::Spade,
};

/// Generates the full 52-card deck.
///
/// The order is fixed (rank-major, then club, diamond, spade, heart) so that
/// a seeded shuffle of it is reproducible.
#[must_use]
pub fn generate_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for rank in MIN_RANK..=MAX_RANK {
        for suit in Suit::ALL {
            cards.push(Card { rank, suit });
        }
    }
    cards
}
