//! Round engine and phase state machine.

use tracing::debug;

use crate::action::Action;
use crate::card::TWO_OF_CLUBS;
use crate::error::{ActionError, SeatError};
use crate::options::GameOptions;
use crate::player::{Player, PlayerInfo, SEATS, Seat};
use crate::result::{Applied, Outcome};
use crate::table::Table;

mod deal;
mod pass;
mod play;
mod score;
pub mod state;

pub use state::{PassDirection, Phase};

/// A Hearts game engine that drives the round phases.
///
/// The engine is purely reactive: it changes only when an [`Action`] is
/// applied, and every action is validated in full before any state changes.
/// Two engines created with the same options and fed the same actions end in
/// identical states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Game options.
    options: GameOptions,
    /// Seats, trick and deck.
    table: Table,
    /// Zero-based round counter.
    round: u32,
    /// Current phase.
    phase: Phase,
    /// Tricks resolved in the current round.
    tricks_played: usize,
}

impl Game {
    /// Creates a new game with default player names.
    ///
    /// # Example
    ///
    /// ```
    /// use hearts_sync::{Game, GameOptions, Phase};
    ///
    /// let game = Game::new(GameOptions::default());
    /// assert_eq!(game.phase(), Phase::Deal);
    /// ```
    #[must_use]
    pub fn new(options: GameOptions) -> Self {
        Self::with_table(options, Table::default())
    }

    /// Creates a new game seating the given players.
    #[must_use]
    pub fn with_players(options: GameOptions, players: [PlayerInfo; SEATS]) -> Self {
        Self::with_table(options, Table::new(players))
    }

    const fn with_table(options: GameOptions, table: Table) -> Self {
        Self {
            options,
            table,
            round: 0,
            phase: Phase::Deal,
            tricks_played: 0,
        }
    }

    /// Returns the game options.
    #[must_use]
    pub const fn options(&self) -> &GameOptions {
        &self.options
    }

    /// Returns the table.
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the table for direct manipulation, bypassing phase checks.
    ///
    /// Intended for setting up positions in tests and tools.
    pub const fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    /// Returns the player in a seat.
    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.table.player(seat)
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the zero-based round number.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Returns the number of tricks resolved this round.
    #[must_use]
    pub const fn tricks_played(&self) -> usize {
        self.tricks_played
    }

    /// Returns the cumulative scores in seat order.
    #[must_use]
    pub fn scores(&self) -> [u32; SEATS] {
        core::array::from_fn(|seat| self.table.players()[seat].score())
    }

    /// Returns whether the game has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Returns the seats with the lowest cumulative score once the game is over.
    ///
    /// Returns an empty list while the game is still running.
    #[must_use]
    pub fn winners(&self) -> Vec<Seat> {
        if !self.is_game_over() {
            return Vec::new();
        }
        self.lowest_scores()
    }

    pub(crate) fn lowest_scores(&self) -> Vec<Seat> {
        let scores = self.scores();
        let best = scores.iter().copied().min().unwrap_or_default();
        (0..SEATS).filter(|&seat| scores[seat] == best).collect()
    }

    /// Checks whether an action is legal in the current state.
    ///
    /// # Errors
    ///
    /// Returns the reason the action would be rejected.
    pub fn validate(&self, action: &Action) -> Result<(), ActionError> {
        if self.is_game_over() {
            return Err(ActionError::GameOver);
        }
        match action {
            Action::Deal { .. } => self.check_deal(),
            Action::Pass { seat, cards } => self.check_pass(*seat, cards),
            Action::Take { seat } => self.check_take(*seat),
            Action::Play { seat, card } => self.check_play(*seat, card),
            Action::ResolveTrick => self.check_resolve_trick(),
            Action::ScoreRound => self.check_score_round(),
            Action::Sit { seat } => Self::check_sit(*seat),
        }
    }

    /// Applies an action.
    ///
    /// Either every effect of the action lands or, on error, none do.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is not legal in the current state.
    pub fn apply(&mut self, action: &Action) -> Result<Applied, ActionError> {
        if self.is_game_over() {
            return Err(ActionError::GameOver);
        }
        let outcome = match action {
            Action::Deal { seed } => self.deal(*seed)?,
            Action::Pass { seat, cards } => self.pass(*seat, cards)?,
            Action::Take { seat } => self.take(*seat)?,
            Action::Play { seat, card } => self.play(*seat, *card)?,
            Action::ResolveTrick => self.resolve_trick()?,
            Action::ScoreRound => self.score_round()?,
            Action::Sit { seat } => {
                Self::check_sit(*seat)?;
                Outcome::Seated { seat: *seat }
            }
        };
        Ok(Applied {
            outcome,
            phase: self.phase,
        })
    }

    /// Starts a new game with the same seating, clearing all scores.
    pub fn reset(&mut self) {
        self.table.new_game();
        self.round = 0;
        self.phase = Phase::Deal;
        self.tricks_played = 0;
    }

    /// Seat claims are legal in every phase and leave the engine unchanged.
    /// Which device holds a seat is tracked by the replica, not the engine.
    const fn check_sit(seat: Seat) -> Result<(), ActionError> {
        if seat < SEATS {
            Ok(())
        } else {
            Err(ActionError::Seat(SeatError::NoSuchSeat))
        }
    }

    pub(crate) fn require_phase(&self, phase: Phase) -> Result<(), ActionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(ActionError::WrongPhase(self.phase))
        }
    }

    /// Enters the play phase and picks the first leader.
    fn start_play(&mut self) {
        self.phase = Phase::Play;
        self.tricks_played = 0;
        if self.options.two_of_clubs_leads {
            let leader = self
                .table
                .players()
                .iter()
                .position(|p| p.has_card(&TWO_OF_CLUBS));
            if let Some(leader) = leader {
                self.table.set_first(leader);
            }
        }
        debug!(round = self.round, leader = ?self.table.first_played(), "play started");
    }
}
