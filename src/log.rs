//! The append-only action log and its watch and scan streams.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::action::Action;
use crate::error::{GroupError, LogError, SyncError};
use crate::group::{DeviceId, GroupAddress};
use crate::store::{LogSignal, Row, SyncService, SyncStore, in_scope};

/// An opaque position in the log.
///
/// Markers order entries globally; there is no other clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ResumeMarker(u64);

impl ResumeMarker {
    /// The beginning of the log.
    pub const START: Self = Self(0);

    pub(crate) const fn from_offset(offset: u64) -> Self {
        Self(offset)
    }

    /// Returns the raw offset.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.0
    }

    /// Returns the marker immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ResumeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An appended action together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position in the log.
    pub marker: ResumeMarker,
    /// Unique row key, `games/<gameID>/<position>`.
    pub key: String,
    /// Device that appended the entry.
    pub author: DeviceId,
    /// The action.
    pub action: Action,
}

impl LogEntry {
    fn decode(row: Row) -> Option<Self> {
        match serde_json::from_slice(&row.value) {
            Ok(action) => Some(Self {
                marker: row.marker,
                key: row.key,
                author: row.author,
                action,
            }),
            Err(err) => {
                warn!(key = %row.key, %err, "skipping malformed log row");
                None
            }
        }
    }
}

/// A lazy sequence of log entries.
///
/// [`Watch`] never ends on its own and can be restarted from any marker;
/// [`Scan`] is a finite, one-shot snapshot. Dropping the stream cancels it.
pub trait EntryStream: Send {
    /// Returns the next entry, a transient failure, or `None` once the stream
    /// has ended.
    fn next_entry(&mut self) -> impl Future<Output = Option<Result<LogEntry, SyncError>>> + Send;
}

/// A handle to one game's log, scoped to its group's prefix.
#[derive(Debug, Clone)]
pub struct ActionLog {
    service: SyncService,
    address: GroupAddress,
    prefix: String,
}

impl SyncService {
    /// Opens the log of a group the caller belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if the group does not exist and
    /// [`GroupError::AccessDenied`] if the caller is not a member.
    pub fn open_log(&self, address: &GroupAddress) -> Result<ActionLog, GroupError> {
        let name = address.to_string();
        let groups = self.store().groups.lock();
        let group = groups
            .get(&name)
            .ok_or_else(|| GroupError::NotFound(name.clone()))?;
        if !group.is_member(self.device()) {
            return Err(GroupError::AccessDenied(name));
        }
        let prefix = group.spec.prefix.clone();
        drop(groups);

        Ok(ActionLog {
            service: self.clone(),
            address: address.clone(),
            prefix,
        })
    }
}

impl ActionLog {
    /// Returns the group address backing this log.
    #[must_use]
    pub const fn address(&self) -> &GroupAddress {
        &self.address
    }

    /// Returns the row-key prefix of this log.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn store(&self) -> &SyncStore {
        self.service.sync_store()
    }

    fn check_read(&self) -> Result<(), GroupError> {
        let name = self.address.to_string();
        let groups = self.service.store().groups.lock();
        let group = groups
            .get(&name)
            .ok_or_else(|| GroupError::NotFound(name.clone()))?;
        if group.is_member(self.service.device())
            && group.spec.permissions.read.admits(self.service.device())
        {
            Ok(())
        } else {
            Err(GroupError::AccessDenied(name))
        }
    }

    /// Appends an action at the next position.
    ///
    /// Earlier entries are never changed or reordered.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriteRejected`] if the caller lacks write access,
    /// or a group error if the group no longer exists.
    pub fn append(&self, action: &Action) -> Result<ResumeMarker, LogError> {
        let name = self.address.to_string();
        {
            let groups = self.service.store().groups.lock();
            let group = groups
                .get(&name)
                .ok_or_else(|| GroupError::NotFound(name.clone()))?;
            if !group.is_member(self.service.device())
                || !group.spec.permissions.write.admits(self.service.device())
            {
                return Err(LogError::WriteRejected(name));
            }
        }

        let value = serde_json::to_vec(action)?;
        let marker = self.store().push_row(&self.prefix, self.service.device(), value);
        debug!(group = %name, %marker, %action, "appended");
        Ok(marker)
    }

    /// Returns the marker one past the newest entry in the store.
    #[must_use]
    pub fn tail(&self) -> ResumeMarker {
        self.store().tail()
    }

    /// Watches entries appended at or after `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not read the log, or
    /// [`SyncError::ResumeMarker`] if `from` lies beyond the tail.
    pub fn watch(&self, from: ResumeMarker) -> Result<Watch, LogError> {
        self.check_read()?;
        if from > self.tail() {
            return Err(SyncError::ResumeMarker(from.offset()).into());
        }
        let signal = self.store().subscribe();
        let epoch = signal.borrow().epoch;
        Ok(Watch {
            store: self.store().clone(),
            prefix: self.prefix.clone(),
            next: from,
            epoch,
            signal,
        })
    }

    /// Returns a snapshot of every entry currently in the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not read the log.
    pub fn scan(&self) -> Result<Scan, LogError> {
        let prefix = self.prefix.clone();
        self.scan_prefix(&prefix)
    }

    /// Returns a snapshot of the entries whose keys start with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::AccessDenied`] if `prefix` lies outside the
    /// group's scope or the caller may not read the log.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Scan, LogError> {
        self.check_read()?;
        if !in_scope(prefix, &self.prefix) {
            return Err(GroupError::AccessDenied(self.address.to_string()).into());
        }
        let entries: Vec<LogEntry> = self
            .store()
            .rows(&self.prefix)
            .into_iter()
            .filter(|row| row.key.starts_with(prefix))
            .filter_map(LogEntry::decode)
            .collect();
        Ok(Scan {
            entries: entries.into_iter(),
        })
    }
}

/// An unbounded stream of entries, restartable from any marker.
#[derive(Debug)]
pub struct Watch {
    store: SyncStore,
    prefix: String,
    next: ResumeMarker,
    epoch: u64,
    signal: watch::Receiver<LogSignal>,
}

impl Watch {
    /// Returns the marker of the next entry this watch will look at.
    #[must_use]
    pub const fn marker(&self) -> ResumeMarker {
        self.next
    }

    /// Waits for the next entry.
    ///
    /// Returns `None` once the store is closed, or a [`SyncError`] if the
    /// subscription was interrupted.
    pub async fn next(&mut self) -> Option<Result<LogEntry, SyncError>> {
        loop {
            let signal = *self.signal.borrow_and_update();
            if signal.epoch != self.epoch {
                return Some(Err(SyncError::StreamClosed));
            }

            while let Some(row) = self.store.next_row(&self.prefix, self.next) {
                self.next = row.marker.next();
                if let Some(entry) = LogEntry::decode(row) {
                    return Some(Ok(entry));
                }
            }

            if signal.closed {
                return None;
            }
            if self.signal.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl EntryStream for Watch {
    fn next_entry(&mut self) -> impl Future<Output = Option<Result<LogEntry, SyncError>>> + Send {
        self.next()
    }
}

/// A finite snapshot of log entries.
#[derive(Debug)]
pub struct Scan {
    entries: std::vec::IntoIter<LogEntry>,
}

impl Iterator for Scan {
    type Item = LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl EntryStream for Scan {
    fn next_entry(&mut self) -> impl Future<Output = Option<Result<LogEntry, SyncError>>> + Send {
        let next = self.entries.next().map(Ok);
        async move { next }
    }
}
