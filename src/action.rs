//! Game actions, the unit of replication.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::player::Seat;

/// One state transition of the game.
///
/// Actions are appended to the shared log and replayed in log order by every
/// device. The deal seed travels inside [`Action::Deal`], so replaying the
/// same actions always produces the same hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Shuffle and deal the round's hands.
    Deal {
        /// Seed for the shuffle.
        seed: u64,
    },
    /// A seat chooses the cards it passes.
    Pass {
        /// The passing seat.
        seat: Seat,
        /// The chosen cards.
        cards: Vec<Card>,
    },
    /// A seat picks up the cards passed to it.
    Take {
        /// The taking seat.
        seat: Seat,
    },
    /// A seat plays a card to the current trick.
    Play {
        /// The playing seat.
        seat: Seat,
        /// The card played.
        card: Card,
    },
    /// Award the completed trick to its winner.
    ResolveTrick,
    /// Score the finished round.
    ScoreRound,
    /// The authoring device claims a seat.
    ///
    /// Replicas bind the seat to the entry's author. Later seat-specific
    /// actions for that seat are only accepted from the same device.
    Sit {
        /// The claimed seat.
        seat: Seat,
    },
}

impl Action {
    /// Returns the seat acting, for seat-specific actions.
    #[must_use]
    pub const fn seat(&self) -> Option<Seat> {
        match self {
            Self::Pass { seat, .. }
            | Self::Take { seat }
            | Self::Play { seat, .. }
            | Self::Sit { seat } => Some(*seat),
            Self::Deal { .. } | Self::ResolveTrick | Self::ScoreRound => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deal { seed } => write!(f, "deal (seed {seed})"),
            Self::Pass { seat, cards } => {
                write!(f, "seat {seat} passes")?;
                for card in cards {
                    write!(f, " {card}")?;
                }
                Ok(())
            }
            Self::Take { seat } => write!(f, "seat {seat} takes"),
            Self::Play { seat, card } => write!(f, "seat {seat} plays {card}"),
            Self::ResolveTrick => f.write_str("resolve trick"),
            Self::ScoreRound => f.write_str("score round"),
            Self::Sit { seat } => write!(f, "seat {seat} claimed"),
        }
    }
}
