//! The device-local replica: shared game state plus the replay task that
//! keeps it in step with the log.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::card::Card;
use crate::config::SyncConfig;
use crate::error::{ActionError, GroupError, LogError, ReplicaError};
use crate::game::Game;
use crate::group::{Attached, DeviceId, GroupAddress, GroupSpec, MemberInfo};
use crate::log::{ActionLog, EntryStream, LogEntry, ResumeMarker};
use crate::options::GameOptions;
use crate::player::Seat;
use crate::resume::ResumeState;
use crate::seating::SeatClaims;
use crate::settings::GameStart;
use crate::store::SyncService;

/// State shared between the replica's callers and its replay task.
#[derive(Debug)]
struct Session {
    game: Game,
    log: Option<ActionLog>,
    is_owner: bool,
    seats: SeatClaims,
    last_applied: Option<ResumeMarker>,
    /// Bumped on every reset so a superseded replay task stops applying.
    epoch: u64,
    cancel: CancellationToken,
}

impl Session {
    /// Applies one entry unless it was already applied.
    ///
    /// Entries whose author may not act for the seat are rejected like any
    /// other illegal action.
    fn apply_entry(&mut self, entry: &LogEntry) {
        if self.last_applied.is_some_and(|last| entry.marker <= last) {
            debug!(marker = %entry.marker, "already applied");
            return;
        }
        let result = self
            .seats
            .check_author(&entry.action, &entry.author)
            .map_err(ActionError::from)
            .and_then(|()| self.game.apply(&entry.action));
        match result {
            Ok(applied) => {
                if let Action::Sit { seat } = entry.action {
                    self.seats.claim(seat, entry.author.clone());
                }
                debug!(marker = %entry.marker, action = %entry.action, phase = ?applied.phase, "applied");
            }
            Err(err) => {
                warn!(marker = %entry.marker, action = %entry.action, author = %entry.author, %err, "rejected during replay");
            }
        }
        self.last_applied = Some(entry.marker);
    }
}

#[derive(Debug)]
struct Shared {
    session: Mutex<Session>,
    applied: watch::Sender<Option<ResumeMarker>>,
}

/// Where a replay task starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Start {
    /// Only entries appended after attaching.
    Tail,
    /// The whole log, caught up from a scan first.
    Beginning,
}

/// One device's view of a game.
///
/// Local actions are validated, appended, and only then observed through the
/// replay task like everyone else's; nothing is applied optimistically.
#[derive(Debug)]
pub struct Replica {
    service: SyncService,
    config: SyncConfig,
    shared: Arc<Shared>,
}

impl Replica {
    /// Creates a detached replica.
    #[must_use]
    pub fn new(service: SyncService, config: SyncConfig, options: GameOptions) -> Self {
        let (applied, _) = watch::channel(None);
        let session = Session {
            game: Game::new(options),
            log: None,
            is_owner: false,
            seats: SeatClaims::default(),
            last_applied: None,
            epoch: 0,
            cancel: CancellationToken::new(),
        };
        Self {
            service,
            config,
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                applied,
            }),
        }
    }

    /// Returns this device's ID.
    #[must_use]
    pub const fn device(&self) -> &DeviceId {
        self.service.device()
    }

    /// Returns the sync configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Hosts a new game under a random game ID.
    ///
    /// # Errors
    ///
    /// See [`Replica::host_game_with_id`].
    pub fn host_game(&self, owner_id: u32) -> Result<(GroupAddress, GameStart), ReplicaError> {
        let game_id = rand::rng().random_range(0..1_000_000);
        self.host_game_with_id(game_id, owner_id)
    }

    /// Creates the log group for `game_id` and attaches to it.
    ///
    /// If the group already exists it is joined instead.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::NoRuntime`] when called outside a Tokio
    /// runtime, before anything is created. Otherwise returns an error if the
    /// group can neither be created nor joined, or the resume file cannot be
    /// written.
    pub fn host_game_with_id(
        &self,
        game_id: u32,
        owner_id: u32,
    ) -> Result<(GroupAddress, GameStart), ReplicaError> {
        let runtime = runtime()?;
        let address = self.config.game_group(game_id);
        let spec = GroupSpec::open(&address);
        match self.service.create_or_join(&address, spec, MemberInfo::CREATOR)? {
            Attached::Created => {
                if self.log_address().as_ref() != Some(&address) {
                    self.reset(&runtime, &address, true, Start::Tail)?;
                }
            }
            Attached::Joined => {
                warn!(group = %address, "game group already existed; joined instead");
                self.reset(&runtime, &address, false, Start::Tail)?;
            }
        }
        Ok((address, GameStart::hearts(game_id, owner_id)))
    }

    /// Joins another device's game.
    ///
    /// Replay starts at the log's current tail; earlier history is not
    /// replayed.
    ///
    /// # Errors
    ///
    /// Returns an error if no Tokio runtime is running, the group does not
    /// exist or excludes this device, or the resume file cannot be written.
    pub fn join_game(&self, address: &GroupAddress) -> Result<(), ReplicaError> {
        let runtime = runtime()?;
        self.service.join_group(address, MemberInfo::JOINER)?;
        self.reset(&runtime, address, false, Start::Tail)
    }

    /// Reattaches to the game recorded in the resume file without rejoining,
    /// replaying its whole log.
    ///
    /// # Errors
    ///
    /// Returns an error if no Tokio runtime is running, the file is missing
    /// or malformed, or the group is gone.
    pub fn reattach(&self) -> Result<GroupAddress, ReplicaError> {
        let runtime = runtime()?;
        let state = ResumeState::load(&self.config.resume_file)?;
        let address: GroupAddress = state.log_address.parse()?;
        self.reset(&runtime, &address, state.is_owner, Start::Beginning)?;
        Ok(address)
    }

    /// Replaces the local game with a fresh one bound to `address`.
    ///
    /// Holds the session lock for the whole reset and cancels the previous
    /// replay task before starting a new one.
    fn reset(
        &self,
        runtime: &Handle,
        address: &GroupAddress,
        is_owner: bool,
        start: Start,
    ) -> Result<(), ReplicaError> {
        let log = self.service.open_log(address)?;
        let mut session = self.shared.session.lock();

        ResumeState {
            log_address: address.to_string(),
            is_owner,
        }
        .save(&self.config.resume_file)?;

        session.cancel.cancel();
        session.cancel = CancellationToken::new();
        session.epoch += 1;
        session.game.reset();
        session.log = Some(log.clone());
        session.is_owner = is_owner;
        session.seats.clear();
        session.last_applied = None;
        self.shared.applied.send_replace(None);

        let from = match start {
            Start::Tail => log.tail(),
            Start::Beginning => ResumeMarker::START,
        };
        let task = ReplayTask {
            log,
            shared: Arc::clone(&self.shared),
            epoch: session.epoch,
            cancel: session.cancel.clone(),
            retry_delay: self.config.retry_delay,
        };
        drop(session);

        info!(group = %address, is_owner, %from, "game reset");
        runtime.spawn(task.run(from, start == Start::Beginning));
        Ok(())
    }

    /// Stops replaying and forgets the attached log.
    pub fn detach(&self) {
        let mut session = self.shared.session.lock();
        session.cancel.cancel();
        session.epoch += 1;
        session.log = None;
    }

    /// Disbands the attached game's group. Only the owner may do this.
    ///
    /// # Errors
    ///
    /// Returns an error if no game is attached or the group refuses.
    pub fn disband(&self) -> Result<(), ReplicaError> {
        let address = self.log_address().ok_or(ReplicaError::Detached)?;
        if !self.is_owner() {
            return Err(GroupError::NotOwner(address.to_string()).into());
        }
        self.service.disband(&address)?;
        self.detach();
        Ok(())
    }

    /// Returns the members of the attached game's group.
    ///
    /// # Errors
    ///
    /// Returns an error if no game is attached or the group is gone.
    pub fn members(&self) -> Result<Vec<(DeviceId, MemberInfo)>, ReplicaError> {
        let address = self.log_address().ok_or(ReplicaError::Detached)?;
        Ok(self.service.members(&address)?)
    }

    /// Claims a seat for this device by appending [`Action::Sit`].
    ///
    /// The seat is held once the claim is replayed. If two devices claim the
    /// same seat concurrently, the first claim in log order wins.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Seat`] if the seat does not exist, is held by
    /// another device, or this device already holds a different seat; see
    /// also [`Replica::submit`].
    pub fn sit(&self, seat: Seat) -> Result<ResumeMarker, ReplicaError> {
        self.submit(&Action::Sit { seat })
    }

    /// Returns the seat this device holds in the replayed log.
    #[must_use]
    pub fn seat(&self) -> Option<Seat> {
        self.shared.session.lock().seats.seat_of(self.device())
    }

    /// Returns the device holding a seat in the replayed log.
    #[must_use]
    pub fn seat_holder(&self, seat: Seat) -> Option<DeviceId> {
        self.shared.session.lock().seats.holder(seat).cloned()
    }

    /// Returns the attached log's address.
    #[must_use]
    pub fn log_address(&self) -> Option<GroupAddress> {
        self.shared
            .session
            .lock()
            .log
            .as_ref()
            .map(|log| log.address().clone())
    }

    /// Returns whether this device owns the attached game.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.shared.session.lock().is_owner
    }

    /// Returns the marker of the last entry replayed.
    #[must_use]
    pub fn last_applied(&self) -> Option<ResumeMarker> {
        self.shared.session.lock().last_applied
    }

    /// Returns a snapshot of the local game state.
    #[must_use]
    pub fn game(&self) -> Game {
        self.shared.session.lock().game.clone()
    }

    /// Validates an action against local state and appends it to the log.
    ///
    /// The action reaches local state only when the replay task observes it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Seat`] if this device may not act for the
    /// action's seat, or [`ReplicaError::Validation`] if the action is
    /// illegal now. Neither is appended. Otherwise returns an error if the
    /// append is rejected.
    pub fn submit(&self, action: &Action) -> Result<ResumeMarker, ReplicaError> {
        let log = {
            let session = self.shared.session.lock();
            session.seats.check_author(action, self.device())?;
            session.game.validate(action)?;
            session.log.clone().ok_or(ReplicaError::Detached)?
        };
        Ok(log.append(action)?)
    }

    fn local_seat(&self) -> Result<Seat, ReplicaError> {
        self.seat().ok_or(ReplicaError::Unseated)
    }

    /// Submits a deal with an explicit seed.
    ///
    /// # Errors
    ///
    /// See [`Replica::submit`].
    pub fn deal(&self, seed: u64) -> Result<ResumeMarker, ReplicaError> {
        self.submit(&Action::Deal { seed })
    }

    /// Submits a deal with a random seed.
    ///
    /// # Errors
    ///
    /// See [`Replica::submit`].
    pub fn deal_random(&self) -> Result<ResumeMarker, ReplicaError> {
        self.deal(rand::random())
    }

    /// Submits this seat's pass.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Unseated`] if no seat was taken; see also
    /// [`Replica::submit`].
    pub fn pass(&self, cards: Vec<Card>) -> Result<ResumeMarker, ReplicaError> {
        let seat = self.local_seat()?;
        self.submit(&Action::Pass { seat, cards })
    }

    /// Submits this seat's take.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Unseated`] if no seat was taken; see also
    /// [`Replica::submit`].
    pub fn take(&self) -> Result<ResumeMarker, ReplicaError> {
        let seat = self.local_seat()?;
        self.submit(&Action::Take { seat })
    }

    /// Submits a card from this seat.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Unseated`] if no seat was taken; see also
    /// [`Replica::submit`].
    pub fn play(&self, card: Card) -> Result<ResumeMarker, ReplicaError> {
        let seat = self.local_seat()?;
        self.submit(&Action::Play { seat, card })
    }

    /// Submits resolution of the full trick.
    ///
    /// # Errors
    ///
    /// See [`Replica::submit`].
    pub fn resolve_trick(&self) -> Result<ResumeMarker, ReplicaError> {
        self.submit(&Action::ResolveTrick)
    }

    /// Submits scoring of the finished round.
    ///
    /// # Errors
    ///
    /// See [`Replica::submit`].
    pub fn score_round(&self) -> Result<ResumeMarker, ReplicaError> {
        self.submit(&Action::ScoreRound)
    }

    /// Waits until the entry at `marker` has been replayed.
    ///
    /// A replayed entry may still have been rejected by the rules. Returns
    /// `false` if the replica is dropped first.
    pub async fn wait_for(&self, marker: ResumeMarker) -> bool {
        let mut applied = self.shared.applied.subscribe();
        applied
            .wait_for(|last| last.is_some_and(|last| last >= marker))
            .await
            .is_ok()
    }
}

impl Drop for Replica {
    fn drop(&mut self) {
        self.shared.session.lock().cancel.cancel();
    }
}

/// How a stream stopped being drained.
enum Drained {
    Ended,
    Failed,
    Stopped,
}

/// The single consumer that applies log entries to a session, in order.
struct ReplayTask {
    log: ActionLog,
    shared: Arc<Shared>,
    epoch: u64,
    cancel: CancellationToken,
    retry_delay: Duration,
}

impl ReplayTask {
    async fn run(self, mut from: ResumeMarker, catch_up: bool) {
        if catch_up {
            match self.log.scan() {
                Ok(mut scan) => {
                    if matches!(self.drain(&mut scan, &mut from).await, Drained::Stopped) {
                        return;
                    }
                }
                Err(err) => warn!(%err, "catch-up scan failed; watching from the start"),
            }
        }

        loop {
            match self.log.watch(from) {
                Ok(mut watch) => match self.drain(&mut watch, &mut from).await {
                    Drained::Failed => {}
                    Drained::Ended | Drained::Stopped => return,
                },
                Err(LogError::Sync(err)) => warn!(%err, %from, "cannot resume watch"),
                Err(err) => {
                    warn!(%err, "log is no longer readable; replay stopped");
                    return;
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(self.retry_delay) => debug!(%from, "resubscribing"),
            }
        }
    }

    async fn drain<S: EntryStream>(&self, stream: &mut S, from: &mut ResumeMarker) -> Drained {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Drained::Stopped,
                next = stream.next_entry() => match next {
                    Some(Ok(entry)) => {
                        if !self.apply(&entry) {
                            return Drained::Stopped;
                        }
                        *from = entry.marker.next();
                    }
                    Some(Err(err)) => {
                        warn!(%err, %from, "watch failed");
                        return Drained::Failed;
                    }
                    None => return Drained::Ended,
                },
            }
        }
    }

    /// Applies an entry under the session lock. Returns `false` if this task
    /// has been superseded by a reset.
    fn apply(&self, entry: &LogEntry) -> bool {
        let mut session = self.shared.session.lock();
        if session.epoch != self.epoch {
            return false;
        }
        session.apply_entry(entry);
        self.shared.applied.send_replace(session.last_applied);
        true
    }
}

/// Returns the runtime that replay tasks are spawned on.
fn runtime() -> Result<Handle, ReplicaError> {
    Handle::try_current().map_err(|_| ReplicaError::NoRuntime)
}
