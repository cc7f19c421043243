//! Outcome types for applied actions and scored rounds.

use crate::card::POINTS_PER_ROUND;
use crate::game::Phase;
use crate::player::{SEATS, Seat};

/// Scores for a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundScores {
    /// Points each seat scored this round, after any shoot-the-moon override.
    pub points: [u32; SEATS],
    /// The seat that shot the moon, if any.
    pub shooter: Option<Seat>,
}

impl RoundScores {
    /// Returns the sum of the round's scores.
    ///
    /// This is [`POINTS_PER_ROUND`] unless the moon was shot, in which case
    /// three seats score the full pool.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.points.iter().sum()
    }

    /// Returns whether the moon was shot this round.
    #[must_use]
    pub const fn shot_the_moon(&self) -> bool {
        self.shooter.is_some()
    }

    /// Returns the points each seat would score without the override.
    #[must_use]
    pub fn raw_points(&self) -> [u32; SEATS] {
        match self.shooter {
            Some(shooter) => core::array::from_fn(|seat| {
                if seat == shooter { POINTS_PER_ROUND } else { 0 }
            }),
            None => self.points,
        }
    }
}

/// What applying an action changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Hands were dealt.
    Dealt,
    /// A seat chose its cards to pass.
    Passed {
        /// The passing seat.
        seat: Seat,
    },
    /// A seat took the cards passed to it.
    Took {
        /// The taking seat.
        seat: Seat,
    },
    /// A card was placed in the trick.
    Played {
        /// The playing seat.
        seat: Seat,
    },
    /// A trick was resolved.
    TrickWon {
        /// The winning seat.
        winner: Seat,
        /// Number of tricks completed this round.
        tricks_played: usize,
    },
    /// The round was scored.
    Scored(RoundScores),
    /// A seat was claimed. The engine state is unchanged.
    Seated {
        /// The claimed seat.
        seat: Seat,
    },
}

/// Result of applying an action, including any phase change it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// What the action changed.
    pub outcome: Outcome,
    /// The phase after the action.
    pub phase: Phase,
}
