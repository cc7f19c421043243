//! Per-seat player state.

use serde::{Deserialize, Serialize};

use crate::card::{Card, Suit};

/// Number of seats at a Hearts table.
pub const SEATS: usize = 4;

/// A seat index, `0..SEATS`.
pub type Seat = usize;

/// Who sits in a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Seat index.
    pub seat: Seat,
    /// Display name.
    pub name: String,
    /// Avatar image name.
    pub avatar: String,
}

impl PlayerInfo {
    /// Creates player info for a seat with a default name.
    #[must_use]
    pub fn for_seat(seat: Seat) -> Self {
        Self {
            seat,
            name: format!("Player {}", seat + 1),
            avatar: String::new(),
        }
    }
}

/// A player's state for the current game.
///
/// The hand, the pass-out buffer and the pass-in buffer never share a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    info: PlayerInfo,
    hand: Vec<Card>,
    pass_out: Vec<Card>,
    pass_in: Vec<Card>,
    won: Vec<Card>,
    score: u32,
    done_passing: bool,
    done_taking: bool,
}

impl Player {
    /// Creates a player with an empty hand and zero score.
    #[must_use]
    pub const fn new(info: PlayerInfo) -> Self {
        Self {
            info,
            hand: Vec::new(),
            pass_out: Vec::new(),
            pass_in: Vec::new(),
            won: Vec::new(),
            score: 0,
            done_passing: false,
            done_taking: false,
        }
    }

    /// Returns the player's identity.
    #[must_use]
    pub const fn info(&self) -> &PlayerInfo {
        &self.info
    }

    /// Returns the seat index.
    #[must_use]
    pub const fn seat(&self) -> Seat {
        self.info.seat
    }

    /// Replaces the hand.
    pub fn set_hand(&mut self, cards: Vec<Card>) {
        self.hand = cards;
    }

    /// Returns the cards in hand.
    #[must_use]
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    /// Returns whether the card is in hand.
    #[must_use]
    pub fn has_card(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// Returns whether any card of the suit is in hand.
    #[must_use]
    pub fn has_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|c| c.suit() == suit)
    }

    /// Returns the cards of one suit, sorted by rank.
    #[must_use]
    pub fn hand_by_suit(&self, suit: Suit) -> Vec<Card> {
        let mut cards: Vec<Card> = self.hand.iter().copied().filter(|c| c.suit() == suit).collect();
        cards.sort_by_key(Card::rank);
        cards
    }

    /// Returns the hand sorted by suit, then rank.
    #[must_use]
    pub fn sorted_hand(&self) -> Vec<Card> {
        Suit::ALL.into_iter().flat_map(|suit| self.hand_by_suit(suit)).collect()
    }

    /// Removes a card from the hand. Returns whether it was present.
    pub(crate) fn remove_card(&mut self, card: &Card) -> bool {
        if let Some(pos) = self.hand.iter().position(|c| c == card) {
            self.hand.swap_remove(pos);
            true
        } else {
            false
        }
    }

    /// Moves the chosen cards from the hand into the pass-out buffer.
    ///
    /// The caller has already checked that every card is in hand.
    pub(crate) fn stage_pass(&mut self, cards: &[Card]) {
        for card in cards {
            self.remove_card(card);
        }
        self.pass_out = cards.to_vec();
        self.done_passing = true;
    }

    /// Returns the cards chosen to pass this round.
    #[must_use]
    pub fn pass_out(&self) -> &[Card] {
        &self.pass_out
    }

    /// Returns the cards received this round.
    #[must_use]
    pub fn pass_in(&self) -> &[Card] {
        &self.pass_in
    }

    pub(crate) fn take_pass_out(&mut self) -> Vec<Card> {
        core::mem::take(&mut self.pass_out)
    }

    pub(crate) fn receive_pass(&mut self, cards: Vec<Card>) {
        self.pass_in = cards;
    }

    /// Merges the received cards into the hand.
    pub(crate) fn take_passed(&mut self) {
        self.hand.append(&mut self.pass_in);
        self.done_taking = true;
    }

    /// Adds a completed trick to the won pile.
    pub fn take_trick(&mut self, cards: &[Card]) {
        self.won.extend_from_slice(cards);
    }

    /// Returns every card won this round.
    #[must_use]
    pub fn won(&self) -> &[Card] {
        &self.won
    }

    /// Computes the points held in the won pile.
    #[must_use]
    pub fn round_points(&self) -> u32 {
        self.won.iter().map(Card::points).sum()
    }

    /// Returns the cumulative score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Adds a round score to the cumulative score.
    pub const fn add_score(&mut self, points: u32) {
        self.score += points;
    }

    /// Returns whether the player has passed this round.
    #[must_use]
    pub const fn done_passing(&self) -> bool {
        self.done_passing
    }

    /// Returns whether the player has taken passed cards this round.
    #[must_use]
    pub const fn done_taking(&self) -> bool {
        self.done_taking
    }

    /// Marks passing and taking as complete for a round with no exchange.
    pub(crate) const fn skip_exchange(&mut self) {
        self.done_passing = true;
        self.done_taking = true;
    }

    /// Clears all per-round state, keeping the cumulative score.
    pub fn reset_round(&mut self) {
        self.hand.clear();
        self.pass_out.clear();
        self.pass_in.clear();
        self.won.clear();
        self.done_passing = false;
        self.done_taking = false;
    }
}
