//! Game state types.

use serde::{Deserialize, Serialize};

use crate::player::{SEATS, Seat};

/// Round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the round's deal.
    Deal,
    /// Players choose cards to pass.
    Pass,
    /// Players pick up the cards passed to them.
    Take,
    /// Tricks are being played.
    Play,
    /// All tricks are played; the round awaits scoring.
    Score,
    /// A player reached the end score.
    GameOver,
}

/// Direction cards travel during the pass phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassDirection {
    /// To the next seat.
    Left,
    /// To the previous seat.
    Right,
    /// To the opposite seat.
    Across,
    /// No passing this round.
    None,
}

impl PassDirection {
    /// Returns the pass direction for a zero-based round number.
    ///
    /// The cycle is Left, Right, Across, then a round without passing.
    #[must_use]
    pub const fn for_round(round: u32) -> Self {
        match round % 4 {
            0 => Self::Left,
            1 => Self::Right,
            2 => Self::Across,
            _ => Self::None,
        }
    }

    const fn offset(self) -> Option<usize> {
        match self {
            Self::Left => Some(1),
            Self::Right => Some(3),
            Self::Across => Some(2),
            Self::None => None,
        }
    }

    /// Returns the seat that receives cards passed by `seat`.
    #[must_use]
    pub const fn receiver(self, seat: Seat) -> Option<Seat> {
        match self.offset() {
            Some(offset) => Some((seat + offset) % SEATS),
            None => None,
        }
    }

    /// Returns the seat whose cards `seat` receives.
    #[must_use]
    pub const fn sender(self, seat: Seat) -> Option<Seat> {
        match self.offset() {
            Some(offset) => Some((seat + SEATS - offset) % SEATS),
            None => None,
        }
    }
}
