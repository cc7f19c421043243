use tracing::debug;

use crate::error::{ActionError, DealError};
use crate::player::SEATS;
use crate::result::Outcome;

use super::{Game, PassDirection, Phase};

impl Game {
    pub(super) fn check_deal(&self) -> Result<(), ActionError> {
        if self.phase != Phase::Deal || self.table.is_dealt() {
            return Err(DealError::AlreadyDealt.into());
        }
        Ok(())
    }

    /// Deals the round's hands from a seeded shuffle.
    ///
    /// Sets the pass direction for the round. A round without passing goes
    /// straight to play.
    ///
    /// # Errors
    ///
    /// Returns [`DealError::AlreadyDealt`] if the round has already been dealt.
    pub fn deal(&mut self, seed: u64) -> Result<Outcome, ActionError> {
        self.check_deal()?;

        let direction = PassDirection::for_round(self.round);
        self.table.set_direction(direction);
        self.table.deal(seed)?;

        if direction == PassDirection::None {
            for seat in 0..SEATS {
                if let Some(player) = self.table.player_mut(seat) {
                    player.skip_exchange();
                }
            }
            self.start_play();
        } else {
            self.phase = Phase::Pass;
        }

        debug!(round = self.round, ?direction, "round dealt");
        Ok(Outcome::Dealt)
    }
}
