//! Error types for game and synchronization operations.

use thiserror::Error;

use crate::game::Phase;

/// Errors that can occur when building or comparing cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CardError {
    /// Rank outside `2..=14` or unknown suit.
    #[error("invalid card value")]
    InvalidValue,
    /// Cards of different suits cannot be ranked against each other.
    #[error("cards of different suits cannot be compared")]
    SuitMismatch,
}

/// Errors that can occur during dealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DealError {
    /// Cards have already been dealt this round.
    #[error("cards have already been dealt this round")]
    AlreadyDealt,
}

/// Errors that can occur while choosing cards to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassError {
    /// Seat index is not 0..=3.
    #[error("no such seat")]
    NoSuchSeat,
    /// Wrong number of cards selected.
    #[error("exactly {expected} cards must be passed")]
    WrongCount {
        /// Number of cards required.
        expected: usize,
    },
    /// A selected card is not in the player's hand.
    #[error("card is not in hand")]
    NotInHand,
    /// The same card was selected twice.
    #[error("card selected more than once")]
    DuplicateCard,
    /// This seat has already passed this round.
    #[error("seat has already passed")]
    AlreadyPassed,
}

/// Errors that can occur while taking passed cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TakeError {
    /// Seat index is not 0..=3.
    #[error("no such seat")]
    NoSuchSeat,
    /// This seat has already taken its cards.
    #[error("seat has already taken its cards")]
    AlreadyTaken,
}

/// Errors that can occur when playing cards or resolving tricks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrickError {
    /// Seat index is not 0..=3.
    #[error("no such seat")]
    NoSuchSeat,
    /// This seat already has a card in the current trick.
    #[error("seat has already played to this trick")]
    SeatOccupied,
    /// The card is not in the seat's hand.
    #[error("card is not in hand")]
    NotInHand,
    /// The trick does not have four cards yet.
    #[error("trick is incomplete")]
    IncompleteTrick,
    /// The trick is full and must be resolved before more cards are played.
    #[error("trick is complete and must be resolved")]
    TrickComplete,
    /// Another seat must lead this trick.
    #[error("seat is not on lead")]
    OutOfTurn,
    /// The seat holds the led suit and must play it.
    #[error("must follow suit")]
    MustFollowSuit,
    /// The first trick of a round must be led with the two of clubs.
    #[error("first trick must be led with the two of clubs")]
    MustLeadTwoOfClubs,
}

/// Errors that can occur when claiming a seat or acting for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeatError {
    /// Seat index is not 0..=3.
    #[error("no such seat")]
    NoSuchSeat,
    /// Another device holds the seat.
    #[error("seat is held by another device")]
    Taken,
    /// The device already holds a different seat.
    #[error("device already holds another seat")]
    AlreadySeated,
    /// The device acted for a seat it does not hold.
    #[error("device does not hold this seat")]
    NotYourSeat,
}

/// A game action failed validation.
///
/// Validation errors are raised before any state changes, so a rejected
/// action leaves the engine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The action does not belong to the current phase.
    #[error("action not allowed in phase {0:?}")]
    WrongPhase(Phase),
    /// The game has ended.
    #[error("game is over")]
    GameOver,
    /// Dealing failed.
    #[error(transparent)]
    Deal(#[from] DealError),
    /// Passing failed.
    #[error(transparent)]
    Pass(#[from] PassError),
    /// Taking failed.
    #[error(transparent)]
    Take(#[from] TakeError),
    /// Playing or resolving a trick failed.
    #[error(transparent)]
    Trick(#[from] TrickError),
    /// A seat claim was malformed.
    #[error(transparent)]
    Seat(#[from] SeatError),
}

/// Errors raised by group membership operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// A group with this name already exists.
    #[error("group {0} already exists")]
    AlreadyExists(String),
    /// No group with this name exists.
    #[error("group {0} not found")]
    NotFound(String),
    /// The group's permissions exclude the caller.
    #[error("access to group {0} denied")]
    AccessDenied(String),
    /// Only the owner may perform this operation.
    #[error("only the owner may modify group {0}")]
    NotOwner(String),
}

/// Errors raised by action log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// The caller lacks write access under the group's permissions.
    #[error("write to {0} rejected")]
    WriteRejected(String),
    /// The group backing this log no longer exists.
    #[error(transparent)]
    Group(#[from] GroupError),
    /// The stream could not be opened at the requested marker.
    #[error(transparent)]
    Sync(#[from] SyncError),
    /// A row could not be encoded or decoded.
    #[error("failed to encode or decode row")]
    Codec(#[from] serde_json::Error),
}

/// Transient failures of a watch or scan stream.
///
/// These are retried with a fresh subscription from the last applied marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The underlying stream ended unexpectedly.
    #[error("watch stream closed")]
    StreamClosed,
    /// The resume marker could not be resolved.
    #[error("resume marker {0} is beyond the log tail")]
    ResumeMarker(u64),
}

/// A group name did not have the `<base>/%%sync/<kind>-<id>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed group address {0}")]
pub struct AddressError(pub String);

/// The advertisement plugin could not start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discovery setup failed: {0}")]
pub struct SetupError(pub String);

/// Errors reading or writing the local resume file.
#[derive(Debug, Error)]
pub enum ResumeFileError {
    /// File system failure.
    #[error("resume file I/O failed")]
    Io(#[from] std::io::Error),
    /// The file contents could not be parsed.
    #[error("resume file is malformed")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by a [`Replica`](crate::replica::Replica).
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// The action was rejected locally and never appended.
    #[error(transparent)]
    Validation(#[from] ActionError),
    /// Group membership failed.
    #[error(transparent)]
    Group(#[from] GroupError),
    /// Appending to the log failed.
    #[error(transparent)]
    Log(#[from] LogError),
    /// The resume file could not be used.
    #[error(transparent)]
    ResumeFile(#[from] ResumeFileError),
    /// The group address could not be parsed.
    #[error(transparent)]
    Address(#[from] AddressError),
    /// No game log is attached.
    #[error("no game is attached")]
    Detached,
    /// This device has not taken a seat.
    #[error("no seat has been taken")]
    Unseated,
    /// The seat is not this device's to claim or act for.
    #[error(transparent)]
    Seat(#[from] SeatError),
    /// Replicas run their replay task on Tokio; none is running here.
    #[error("no Tokio runtime is running")]
    NoRuntime,
}
