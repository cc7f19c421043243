//! Card text helpers.

use hearts_sync::{Card, Suit};

pub fn card(text: &str) -> Card {
    text.parse().expect("valid card text")
}

pub fn cards(text: &str) -> Vec<Card> {
    text.split_whitespace().map(card).collect()
}

/// Every card of a suit, two through ace.
pub fn suit_text(suit: Suit) -> String {
    (2..=14)
        .map(|rank| Card::new(rank, suit).expect("valid rank").to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
