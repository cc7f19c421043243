//! Synchronization configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::group::{GroupAddress, GroupKind};

/// Configuration for a device's connection to the shared log.
///
/// ```
/// use std::time::Duration;
/// use hearts_sync::SyncConfig;
///
/// let config = SyncConfig::default()
///     .with_mount_point("/192.168.86.254:8101")
///     .with_retry_delay(Duration::from_millis(50));
/// assert_eq!(config.game_group(7).to_string(),
///     "/192.168.86.254:8101/croupier/syncbase1/%%sync/gaming-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Mount point that group names are rooted at.
    pub mount_point: String,
    /// Service namespace under the mount point.
    pub namespace: String,
    /// Interface name advertised so only compatible peers respond.
    pub interface_name: String,
    /// Where the local resume file is written.
    pub resume_file: PathBuf,
    /// Delay before resubscribing after a watch stream fails.
    pub retry_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mount_point: "/127.0.0.1:8101".to_owned(),
            namespace: "croupier/syncbase1".to_owned(),
            interface_name: "CroupierSettingsAndGame".to_owned(),
            resume_file: PathBuf::from("hearts_resume.json"),
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl SyncConfig {
    /// Sets the mount point.
    #[must_use]
    pub fn with_mount_point(mut self, mount_point: impl Into<String>) -> Self {
        self.mount_point = mount_point.into();
        self
    }

    /// Sets the service namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the advertised interface name.
    #[must_use]
    pub fn with_interface_name(mut self, interface_name: impl Into<String>) -> Self {
        self.interface_name = interface_name.into();
        self
    }

    /// Sets the resume file path.
    #[must_use]
    pub fn with_resume_file(mut self, resume_file: impl Into<PathBuf>) -> Self {
        self.resume_file = resume_file.into();
        self
    }

    /// Sets the resubscription delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn base(&self) -> String {
        format!("{}/{}", self.mount_point, self.namespace)
    }

    /// Returns the address of a game's log group.
    #[must_use]
    pub fn game_group(&self, game_id: u32) -> GroupAddress {
        GroupAddress::new(self.base(), GroupKind::Gaming(game_id))
    }

    /// Returns the address of a user's settings group.
    #[must_use]
    pub fn settings_group(&self, user_id: u32) -> GroupAddress {
        GroupAddress::new(self.base(), GroupKind::Discovery(user_id))
    }
}
