//! A Hearts rules engine replicated between devices over a shared,
//! append-only action log.
//!
//! Every device runs the same deterministic [`Game`]. Devices never exchange
//! state, only [`Action`]s: an action is validated locally, appended to the
//! game's [`ActionLog`], and applied by every [`Replica`] (including the
//! author's) when it comes back through the log's watch stream. Because the
//! engine is deterministic and the log is totally ordered, every replica that
//! has applied the same prefix holds the same game.
//!
//! # Example
//!
//! ```
//! use hearts_sync::{Action, Game, GameOptions, Phase};
//!
//! let mut game = Game::new(GameOptions::default());
//! game.apply(&Action::Deal { seed: 42 }).unwrap();
//! assert_eq!(game.phase(), Phase::Pass);
//! assert!(game.table().players().iter().all(|p| p.hand().len() == 13));
//! ```

pub mod action;
pub mod card;
pub mod config;
pub mod discovery;
pub mod error;
pub mod game;
pub mod group;
pub mod log;
pub mod options;
pub mod player;
pub mod replica;
pub mod result;
pub mod resume;
pub mod seating;
pub mod settings;
pub mod store;
pub mod table;

// Re-export main types
pub use action::Action;
pub use card::{Card, DECK_SIZE, POINTS_PER_ROUND, QUEEN_OF_SPADES, Suit, TWO_OF_CLUBS};
pub use config::SyncConfig;
pub use discovery::{
    Advertisement, DiscoveredGame, DiscoveryPlugin, DiscoveryTracker, DiscoveryUpdate,
};
pub use error::{
    ActionError, AddressError, CardError, DealError, GroupError, LogError, PassError,
    ReplicaError, ResumeFileError, SeatError, SetupError, SyncError, TakeError, TrickError,
};
pub use game::{Game, PassDirection, Phase};
pub use group::{Attached, DeviceId, GroupAddress, GroupKind, GroupSpec, MemberInfo, Permissions};
pub use log::{ActionLog, EntryStream, LogEntry, ResumeMarker, Scan, Watch};
pub use options::GameOptions;
pub use player::{Player, PlayerInfo, SEATS, Seat};
pub use replica::Replica;
pub use result::{Applied, Outcome, RoundScores};
pub use resume::ResumeState;
pub use seating::SeatClaims;
pub use settings::{GameStart, UserSettings};
pub use store::{SyncService, SyncStore};
pub use table::{HAND_SIZE, Table};
