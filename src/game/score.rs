use tracing::info;

use crate::error::ActionError;
use crate::result::Outcome;

use super::{Game, Phase};

impl Game {
    pub(super) fn check_score_round(&self) -> Result<(), ActionError> {
        self.require_phase(Phase::Score)
    }

    /// Scores the finished round and prepares the next one.
    ///
    /// The game ends once any cumulative score reaches the configured end
    /// score; otherwise the next round waits for its deal.
    ///
    /// # Errors
    ///
    /// Returns an error if the round still has tricks to play.
    pub fn score_round(&mut self) -> Result<Outcome, ActionError> {
        self.check_score_round()?;

        let scores = self.table.score_round();
        if let Some(shooter) = scores.shooter {
            info!(round = self.round, shooter, "moon shot");
        }
        info!(round = self.round, points = ?scores.points, totals = ?self.scores(), "round scored");

        self.table.reset_round();
        self.round += 1;
        self.tricks_played = 0;

        let end_score = self.options.end_score;
        self.phase = if self.scores().iter().any(|&score| score >= end_score) {
            info!(winners = ?self.lowest_scores(), "game over");
            Phase::GameOver
        } else {
            Phase::Deal
        };

        Ok(Outcome::Scored(scores))
    }
}
