//! The four seats, the trick in progress, and the deck.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::card::{Card, DECK_SIZE, POINTS_PER_ROUND, generate_deck};
use crate::error::{DealError, TrickError};
use crate::game::PassDirection;
use crate::player::{Player, PlayerInfo, SEATS, Seat};
use crate::result::RoundScores;

/// Cards dealt to each seat.
pub const HAND_SIZE: usize = DECK_SIZE / SEATS;

/// The shared table: seats, the current trick, and the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    players: [Player; SEATS],
    trick: [Option<Card>; SEATS],
    first_played: Option<Seat>,
    direction: PassDirection,
    all_cards: Option<Vec<Card>>,
    dealt: bool,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(core::array::from_fn(PlayerInfo::for_seat))
    }
}

impl Table {
    /// Creates a table seating the given players in order.
    #[must_use]
    pub fn new(players: [PlayerInfo; SEATS]) -> Self {
        Self {
            players: players.map(Player::new),
            trick: [None; SEATS],
            first_played: None,
            direction: PassDirection::Left,
            all_cards: None,
            dealt: false,
        }
    }

    /// Returns all four players in seat order.
    #[must_use]
    pub const fn players(&self) -> &[Player; SEATS] {
        &self.players
    }

    /// Returns the player in a seat.
    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat)
    }

    /// Returns the player in a seat, mutably.
    pub fn player_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.players.get_mut(seat)
    }

    /// Returns the trick slots, indexed by seat.
    #[must_use]
    pub const fn trick(&self) -> &[Option<Card>; SEATS] {
        &self.trick
    }

    /// Returns the number of cards in the current trick.
    #[must_use]
    pub fn trick_len(&self) -> usize {
        self.trick.iter().flatten().count()
    }

    /// Returns the seat that led (or will lead) the current trick.
    #[must_use]
    pub const fn first_played(&self) -> Option<Seat> {
        self.first_played
    }

    /// Sets the seat that leads the current trick.
    pub const fn set_first(&mut self, seat: Seat) {
        self.first_played = Some(seat);
    }

    /// Returns the suit led to the current trick.
    #[must_use]
    pub fn led_card(&self) -> Option<Card> {
        self.first_played.and_then(|seat| self.trick[seat])
    }

    /// Returns this round's pass direction.
    #[must_use]
    pub const fn direction(&self) -> PassDirection {
        self.direction
    }

    /// Sets this round's pass direction.
    pub const fn set_direction(&mut self, direction: PassDirection) {
        self.direction = direction;
    }

    /// Returns whether cards have been dealt this round.
    #[must_use]
    pub const fn is_dealt(&self) -> bool {
        self.dealt
    }

    /// Returns the full deck, generating it on first use.
    fn all_cards(&mut self) -> &[Card] {
        self.all_cards.get_or_insert_with(generate_deck)
    }

    /// Shuffles the deck with a seeded generator and deals 13 cards per seat.
    ///
    /// Seat `i` receives the `i`-th contiguous block of the permutation.
    ///
    /// # Errors
    ///
    /// Returns [`DealError::AlreadyDealt`] if cards were dealt this round and
    /// [`Table::reset_round`] has not been called since.
    pub fn deal(&mut self, seed: u64) -> Result<(), DealError> {
        if self.dealt {
            return Err(DealError::AlreadyDealt);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..DECK_SIZE).collect();
        order.shuffle(&mut rng);

        let deck = self.all_cards().to_vec();
        for (seat, block) in order.chunks(HAND_SIZE).enumerate() {
            let hand = block.iter().map(|&i| deck[i]).collect();
            self.players[seat].set_hand(hand);
        }
        self.dealt = true;
        debug!(seed, "dealt hands");
        Ok(())
    }

    /// Places a card from a seat's hand into the trick.
    ///
    /// The first card of a trick records its seat as the leader.
    ///
    /// # Errors
    ///
    /// Returns an error if the seat does not exist, already played to this
    /// trick, or does not hold the card.
    pub fn play_card(&mut self, card: Card, seat: Seat) -> Result<(), TrickError> {
        let slot = self.trick.get(seat).ok_or(TrickError::NoSuchSeat)?;
        if slot.is_some() {
            return Err(TrickError::SeatOccupied);
        }
        if !self.players[seat].has_card(&card) {
            return Err(TrickError::NotInHand);
        }

        if self.trick_len() == 0 {
            self.first_played = Some(seat);
        }
        self.players[seat].remove_card(&card);
        self.trick[seat] = Some(card);
        Ok(())
    }

    /// Returns the seat that wins the current trick, if it is complete.
    #[must_use]
    pub fn trick_winner(&self) -> Option<Seat> {
        let led = self.led_card()?.suit();
        let cards: Option<Vec<Card>> = self.trick.iter().copied().collect();
        cards?
            .iter()
            .enumerate()
            .filter(|(_, card)| card.suit() == led)
            .max_by_key(|(_, card)| card.rank())
            .map(|(seat, _)| seat)
    }

    /// Resolves the current trick.
    ///
    /// The highest card of the led suit wins. The winner takes all four
    /// cards and leads the next trick.
    ///
    /// # Errors
    ///
    /// Returns [`TrickError::IncompleteTrick`] unless all four seats have played.
    pub fn send_trick(&mut self) -> Result<Seat, TrickError> {
        let winner = self.trick_winner().ok_or(TrickError::IncompleteTrick)?;
        let cards: Vec<Card> = self.trick.iter_mut().filter_map(Option::take).collect();
        self.players[winner].take_trick(&cards);
        self.first_played = Some(winner);
        debug!(winner, "trick resolved");
        Ok(winner)
    }

    /// Moves every pass-out buffer into the receiving seat's pass-in buffer.
    ///
    /// Does nothing when the direction is [`PassDirection::None`].
    pub fn exchange_passes(&mut self) {
        let outgoing: [Vec<Card>; SEATS] =
            core::array::from_fn(|seat| self.players[seat].take_pass_out());
        for (seat, cards) in outgoing.into_iter().enumerate() {
            if let Some(receiver) = self.direction.receiver(seat) {
                self.players[receiver].receive_pass(cards);
            }
        }
    }

    /// Scores the round from each seat's won cards and adds the result to
    /// the cumulative scores.
    ///
    /// A seat that took every point shoots the moon: it scores zero and every
    /// other seat scores the full pool.
    pub fn score_round(&mut self) -> RoundScores {
        let mut points: [u32; SEATS] = core::array::from_fn(|seat| self.players[seat].round_points());
        let shooter = points.iter().position(|&p| p == POINTS_PER_ROUND);

        if let Some(shooter) = shooter {
            for (seat, score) in points.iter_mut().enumerate() {
                *score = if seat == shooter { 0 } else { POINTS_PER_ROUND };
            }
        }

        for (player, &score) in self.players.iter_mut().zip(points.iter()) {
            player.add_score(score);
        }

        RoundScores { points, shooter }
    }

    /// Clears hands, buffers, the trick and the dealt flag for a new round.
    ///
    /// Cumulative scores and the generated deck are kept.
    pub fn reset_round(&mut self) {
        for player in &mut self.players {
            player.reset_round();
        }
        self.trick = [None; SEATS];
        self.first_played = None;
        self.dealt = false;
    }

    /// Resets the table for a new game, clearing cumulative scores.
    pub fn new_game(&mut self) {
        let infos = self.players.clone().map(|p| p.info().clone());
        self.players = infos.map(Player::new);
        self.reset_round();
        self.direction = PassDirection::Left;
    }
}
