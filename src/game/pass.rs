use tracing::debug;

use crate::card::Card;
use crate::error::{ActionError, PassError, TakeError};
use crate::player::{Player, Seat};
use crate::result::Outcome;

use super::{Game, Phase};

impl Game {
    pub(super) fn check_pass(&self, seat: Seat, cards: &[Card]) -> Result<(), ActionError> {
        self.require_phase(Phase::Pass)?;

        let player = self.table.player(seat).ok_or(PassError::NoSuchSeat)?;
        if player.done_passing() {
            return Err(PassError::AlreadyPassed.into());
        }
        if cards.len() != self.options.pass_count {
            return Err(PassError::WrongCount {
                expected: self.options.pass_count,
            }
            .into());
        }
        for (i, card) in cards.iter().enumerate() {
            if cards[..i].contains(card) {
                return Err(PassError::DuplicateCard.into());
            }
            if !player.has_card(card) {
                return Err(PassError::NotInHand.into());
            }
        }
        Ok(())
    }

    /// Moves a seat's chosen cards into its pass-out buffer.
    ///
    /// Once all four seats have passed, the buffers are exchanged according
    /// to the round's direction and the game moves to the take phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is not in the pass phase, the seat has
    /// already passed, or the selection is not exactly the configured number
    /// of distinct cards from the seat's hand.
    pub fn pass(&mut self, seat: Seat, cards: &[Card]) -> Result<Outcome, ActionError> {
        self.check_pass(seat, cards)?;

        if let Some(player) = self.table.player_mut(seat) {
            player.stage_pass(cards);
        }

        if self.table.players().iter().all(Player::done_passing) {
            self.table.exchange_passes();
            self.phase = Phase::Take;
            debug!(round = self.round, "passes exchanged");
        }

        Ok(Outcome::Passed { seat })
    }

    pub(super) fn check_take(&self, seat: Seat) -> Result<(), ActionError> {
        self.require_phase(Phase::Take)?;

        let player = self.table.player(seat).ok_or(TakeError::NoSuchSeat)?;
        if player.done_taking() {
            return Err(TakeError::AlreadyTaken.into());
        }
        Ok(())
    }

    /// Merges the cards passed to a seat into its hand.
    ///
    /// Once all four seats have taken, play begins.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is not in the take phase or the seat has
    /// already taken its cards.
    pub fn take(&mut self, seat: Seat) -> Result<Outcome, ActionError> {
        self.check_take(seat)?;

        if let Some(player) = self.table.player_mut(seat) {
            player.take_passed();
        }

        if self.table.players().iter().all(Player::done_taking) {
            self.start_play();
        }

        Ok(Outcome::Took { seat })
    }
}
