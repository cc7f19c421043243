//! The replicated store shared by every device.
//!
//! The store holds two tables: the append-only games log and the keyed
//! settings table. Devices reach it through a [`SyncService`] bound to their
//! [`DeviceId`]; every device sees the same rows in the same order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::group::{DeviceId, Group};
use crate::log::ResumeMarker;

/// A row in the games log.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) marker: ResumeMarker,
    pub(crate) key: String,
    pub(crate) author: DeviceId,
    pub(crate) value: Vec<u8>,
}

/// State broadcast to open watches whenever the log changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct LogSignal {
    pub(crate) len: u64,
    pub(crate) epoch: u64,
    pub(crate) closed: bool,
}

#[derive(Debug)]
pub(crate) struct StoreInner {
    pub(crate) log: RwLock<Vec<Row>>,
    pub(crate) settings: RwLock<BTreeMap<String, Vec<u8>>>,
    pub(crate) groups: Mutex<HashMap<String, Group>>,
    pub(crate) signal: watch::Sender<LogSignal>,
}

/// A handle to the shared store. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct SyncStore {
    inner: Arc<StoreInner>,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (signal, _) = watch::channel(LogSignal::default());
        Self {
            inner: Arc::new(StoreInner {
                log: RwLock::new(Vec::new()),
                settings: RwLock::new(BTreeMap::new()),
                groups: Mutex::new(HashMap::new()),
                signal,
            }),
        }
    }

    /// Returns a service handle acting as `device`.
    #[must_use]
    pub fn connect(&self, device: DeviceId) -> SyncService {
        SyncService {
            store: self.clone(),
            device,
        }
    }

    /// Returns the number of rows in the games log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.log.read().len()
    }

    /// Returns whether the games log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails every open watch with a transient error.
    ///
    /// Watchers are expected to resubscribe from their last marker.
    pub fn interrupt_watches(&self) {
        self.inner.signal.send_modify(|signal| signal.epoch += 1);
    }

    /// Ends every open watch. Rows stay readable.
    pub fn close(&self) {
        self.inner.signal.send_modify(|signal| signal.closed = true);
    }

    pub(crate) fn inner(&self) -> &StoreInner {
        &self.inner
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LogSignal> {
        self.inner.signal.subscribe()
    }

    /// Appends a row and returns its marker.
    pub(crate) fn push_row(&self, prefix: &str, author: &DeviceId, value: Vec<u8>) -> ResumeMarker {
        let mut log = self.inner.log.write();
        let marker = ResumeMarker::from_offset(log.len() as u64);
        log.push(Row {
            marker,
            key: format!("{prefix}/{:010}", marker.offset()),
            author: author.clone(),
            value,
        });
        let len = log.len() as u64;
        drop(log);

        self.inner.signal.send_modify(|signal| signal.len = len);
        marker
    }

    /// Returns the first row at or after `from` within `prefix`.
    pub(crate) fn next_row(&self, prefix: &str, from: ResumeMarker) -> Option<Row> {
        let log = self.inner.log.read();
        let start = usize::try_from(from.offset()).unwrap_or(usize::MAX);
        log.get(start..)?
            .iter()
            .find(|row| in_scope(&row.key, prefix))
            .cloned()
    }

    /// Returns every row within `prefix`.
    pub(crate) fn rows(&self, prefix: &str) -> Vec<Row> {
        self.inner
            .log
            .read()
            .iter()
            .filter(|row| in_scope(&row.key, prefix))
            .cloned()
            .collect()
    }

    /// Returns the marker one past the last row.
    pub(crate) fn tail(&self) -> ResumeMarker {
        ResumeMarker::from_offset(self.len() as u64)
    }
}

/// Returns whether `key` lies under `prefix`, respecting path segments.
pub(crate) fn in_scope(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// A device's connection to the shared store.
#[derive(Debug, Clone)]
pub struct SyncService {
    store: SyncStore,
    device: DeviceId,
}

impl SyncService {
    /// Returns the device this service acts as.
    #[must_use]
    pub const fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub const fn sync_store(&self) -> &SyncStore {
        &self.store
    }

    pub(crate) fn store(&self) -> &StoreInner {
        self.store.inner()
    }
}
