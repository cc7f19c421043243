//! Advertisement attributes and the filter that picks out compatible games.
//!
//! The transport is supplied by a [`DiscoveryPlugin`]; this module only
//! decides what is advertised and which updates matter.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SetupError;
use crate::settings::GameStart;

/// Attribute holding the settings group address.
pub const SETTINGS_ATTR: &str = "settings_sgname";
/// Attribute holding the serialized [`GameStart`] payload.
pub const GAME_START_ATTR: &str = "game_start_data";

/// A service advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Unique instance ID.
    pub instance_id: String,
    /// Human-readable instance name.
    pub instance_name: String,
    /// Interface name; peers ignore advertisements for other interfaces.
    pub interface_name: String,
    /// Advertised attributes.
    pub attrs: BTreeMap<String, String>,
    /// Reachable addresses; the first is the game's log group.
    pub addrs: Vec<String>,
}

impl Advertisement {
    /// Builds the advertisement for a hosted game.
    ///
    /// # Errors
    ///
    /// Returns an error if the game-start payload cannot be serialized.
    pub fn for_game(
        instance_id: impl Into<String>,
        interface_name: impl Into<String>,
        log_address: impl Into<String>,
        settings_address: impl Into<String>,
        game_start: &GameStart,
    ) -> Result<Self, serde_json::Error> {
        let game_start = serde_json::to_string(game_start)?;
        Ok(Self {
            instance_id: instance_id.into(),
            instance_name: "A sample game service".to_owned(),
            interface_name: interface_name.into(),
            attrs: BTreeMap::from([
                (SETTINGS_ATTR.to_owned(), settings_address.into()),
                (GAME_START_ATTR.to_owned(), game_start),
            ]),
            addrs: vec![log_address.into()],
        })
    }
}

/// A change observed by a scanning device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryUpdate {
    /// A service appeared.
    Found(Advertisement),
    /// A service went away.
    Lost {
        /// Instance ID of the lost service.
        instance_id: String,
    },
}

/// A compatible game found by scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredGame {
    /// Address of the host's settings group.
    pub settings_address: String,
    /// Address of the game's log group.
    pub log_address: String,
    /// The host's game-start payload, if it parsed.
    pub game_start: Option<GameStart>,
}

/// Tracks advertised instances and reports compatible games.
#[derive(Debug, Clone)]
pub struct DiscoveryTracker {
    interface_name: String,
    instances: BTreeMap<String, String>,
}

impl DiscoveryTracker {
    /// Creates a tracker that reports games advertised under `interface_name`.
    #[must_use]
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            instances: BTreeMap::new(),
        }
    }

    /// Returns the number of instances currently known.
    #[must_use]
    pub fn known(&self) -> usize {
        self.instances.len()
    }

    /// Records an update and returns the game it announces, if compatible.
    pub fn observe(&mut self, update: DiscoveryUpdate) -> Option<DiscoveredGame> {
        match update {
            DiscoveryUpdate::Found(ad) => {
                debug!(instance = %ad.instance_id, interface = %ad.interface_name, addrs = ?ad.addrs, "discovered");
                self.instances
                    .insert(ad.instance_id.clone(), ad.instance_name.clone());
                if ad.interface_name != self.interface_name {
                    return None;
                }
                let settings_address = ad.attrs.get(SETTINGS_ATTR)?.clone();
                let log_address = ad.addrs.first()?.clone();
                let game_start = ad
                    .attrs
                    .get(GAME_START_ATTR)
                    .and_then(|raw| serde_json::from_str(raw).ok());
                Some(DiscoveredGame {
                    settings_address,
                    log_address,
                    game_start,
                })
            }
            DiscoveryUpdate::Lost { instance_id } => {
                let name = self
                    .instances
                    .remove(&instance_id)
                    .unwrap_or_else(|| "unknown".to_owned());
                debug!(instance = %instance_id, %name, "lost");
                None
            }
        }
    }
}

/// A discovery transport.
pub trait DiscoveryPlugin: Send {
    /// Starts advertising.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the transport cannot start. Without it no
    /// group can be found, so callers treat this as fatal.
    fn advertise(&mut self, ad: &Advertisement) -> Result<(), SetupError>;

    /// Stops advertising an instance.
    fn withdraw(&mut self, instance_id: &str);
}

/// Advertises until `quit` is cancelled, then withdraws.
///
/// Cancelling never affects groups that were already joined.
///
/// # Errors
///
/// Returns [`SetupError`] if the plugin cannot start.
pub async fn advertise<P: DiscoveryPlugin>(
    plugin: &mut P,
    ad: Advertisement,
    quit: CancellationToken,
) -> Result<(), SetupError> {
    plugin.advertise(&ad)?;
    info!(instance = %ad.instance_id, "advertising");
    quit.cancelled().await;
    plugin.withdraw(&ad.instance_id);
    info!(instance = %ad.instance_id, "advertising stopped");
    Ok(())
}

/// Forwards compatible games from `updates` to `found` until `quit` is
/// cancelled or either channel closes.
pub async fn scan(
    mut tracker: DiscoveryTracker,
    mut updates: mpsc::Receiver<DiscoveryUpdate>,
    found: mpsc::Sender<DiscoveredGame>,
    quit: CancellationToken,
) {
    loop {
        tokio::select! {
            () = quit.cancelled() => break,
            update = updates.recv() => {
                let Some(update) = update else { break };
                if let Some(game) = tracker.observe(update) {
                    if found.send(game).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    debug!("scan stopped");
}
