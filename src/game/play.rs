use crate::card::{Card, TWO_OF_CLUBS};
use crate::error::{ActionError, TrickError};
use crate::player::{SEATS, Seat};
use crate::result::Outcome;
use crate::table::HAND_SIZE;

use super::{Game, Phase};

impl Game {
    pub(super) fn check_play(&self, seat: Seat, card: &Card) -> Result<(), ActionError> {
        self.require_phase(Phase::Play)?;

        let player = self.table.player(seat).ok_or(TrickError::NoSuchSeat)?;
        let in_trick = self.table.trick_len();
        if in_trick == SEATS {
            return Err(TrickError::TrickComplete.into());
        }
        if self.table.trick()[seat].is_some() {
            return Err(TrickError::SeatOccupied.into());
        }
        if !player.has_card(card) {
            return Err(TrickError::NotInHand.into());
        }

        let leader = self.table.first_played();
        match self.table.led_card() {
            None => {
                if leader.is_some_and(|leader| leader != seat) {
                    return Err(TrickError::OutOfTurn.into());
                }
                if self.options.two_of_clubs_leads
                    && self.tricks_played == 0
                    && *card != TWO_OF_CLUBS
                    && player.has_card(&TWO_OF_CLUBS)
                {
                    return Err(TrickError::MustLeadTwoOfClubs.into());
                }
            }
            Some(led) => {
                // Play runs clockwise from the leader.
                if leader.is_some_and(|leader| (leader + in_trick) % SEATS != seat) {
                    return Err(TrickError::OutOfTurn.into());
                }
                if self.options.follow_suit
                    && card.suit() != led.suit()
                    && player.has_suit(led.suit())
                {
                    return Err(TrickError::MustFollowSuit.into());
                }
            }
        }
        Ok(())
    }

    /// Returns the cards a seat may legally play right now.
    ///
    /// Empty when the seat cannot play: wrong phase, already played to this
    /// trick, or not next in turn.
    #[must_use]
    pub fn legal_plays(&self, seat: Seat) -> Vec<Card> {
        let Some(player) = self.table.player(seat) else {
            return Vec::new();
        };
        player
            .sorted_hand()
            .into_iter()
            .filter(|card| self.check_play(seat, card).is_ok())
            .collect()
    }

    /// Plays a card from a seat's hand into the current trick.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is not in the play phase, the trick is
    /// already full, the seat has already played to this trick, the card is
    /// not in the seat's hand, it is another seat's turn, the first trick is
    /// not led with the two of clubs, or the seat must follow the led suit.
    pub fn play(&mut self, seat: Seat, card: Card) -> Result<Outcome, ActionError> {
        self.check_play(seat, &card)?;
        self.table.play_card(card, seat)?;
        Ok(Outcome::Played { seat })
    }

    pub(super) fn check_resolve_trick(&self) -> Result<(), ActionError> {
        self.require_phase(Phase::Play)?;
        if self.table.trick_len() < SEATS {
            return Err(TrickError::IncompleteTrick.into());
        }
        Ok(())
    }

    /// Awards the completed trick to its winner, who leads next.
    ///
    /// After the last trick of the round the game moves to scoring.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is not in the play phase or the trick is
    /// incomplete.
    pub fn resolve_trick(&mut self) -> Result<Outcome, ActionError> {
        self.check_resolve_trick()?;

        let winner = self.table.send_trick()?;
        self.tricks_played += 1;
        if self.tricks_played == HAND_SIZE {
            self.phase = Phase::Score;
        }

        Ok(Outcome::TrickWon {
            winner,
            tricks_played: self.tricks_played,
        })
    }
}
