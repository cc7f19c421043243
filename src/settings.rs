//! Profile rows and the game-start payload.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{GroupError, LogError};
use crate::group::{Attached, GroupAddress, GroupSpec, MemberInfo};
use crate::store::{SyncService, in_scope};

/// A user's profile, stored at `users/<userID>/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// User ID.
    #[serde(rename = "userID")]
    pub user_id: u32,
    /// Avatar image name.
    pub avatar: String,
    /// Display name.
    pub name: String,
    /// Display color as `0xRRGGBB`.
    pub color: u32,
}

impl UserSettings {
    /// Returns the row key for a user's settings.
    #[must_use]
    pub fn key(user_id: u32) -> String {
        format!("users/{user_id}/settings")
    }
}

/// Payload advertised when a game's log group is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStart {
    /// Game type, always `"Hearts"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Seat of the advertising player.
    #[serde(rename = "playerNumber")]
    pub player_number: u8,
    /// Game ID.
    #[serde(rename = "gameID")]
    pub game_id: u32,
    /// User ID of the game's owner.
    #[serde(rename = "ownerID")]
    pub owner_id: u32,
}

impl GameStart {
    /// Creates the payload for a new Hearts game.
    #[must_use]
    pub fn hearts(game_id: u32, owner_id: u32) -> Self {
        Self {
            kind: "Hearts".to_owned(),
            player_number: 0,
            game_id,
            owner_id,
        }
    }
}

impl SyncService {
    /// Writes the caller's settings row, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be encoded.
    pub fn put_settings(&self, settings: &UserSettings) -> Result<(), LogError> {
        let value = serde_json::to_vec(settings)?;
        self.store()
            .settings
            .write()
            .insert(UserSettings::key(settings.user_id), value);
        debug!(user_id = settings.user_id, "settings written");
        Ok(())
    }

    /// Reads a user's settings row.
    ///
    /// The caller must belong to a group whose prefix covers the row.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::AccessDenied`] if no such group admits the caller,
    /// or [`LogError::Codec`] if the stored row does not decode.
    pub fn settings(&self, user_id: u32) -> Result<Option<UserSettings>, LogError> {
        let key = UserSettings::key(user_id);
        let readable = self.store().groups.lock().values().any(|group| {
            in_scope(&key, &group.spec.prefix)
                && group.is_member(self.device())
                && group.spec.permissions.read.admits(self.device())
        });
        if !readable {
            return Err(GroupError::AccessDenied(key).into());
        }

        let settings = self.store().settings.read();
        let Some(value) = settings.get(&key) else {
            return Ok(None);
        };
        serde_json::from_slice(value).map(Some).map_err(|err| {
            warn!(%key, %err, "malformed settings row");
            LogError::Codec(err)
        })
    }

    /// Writes the caller's settings and creates (or joins) the settings group
    /// that shares them.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written or the group cannot
    /// be attached.
    pub fn publish_settings(
        &self,
        config: &SyncConfig,
        settings: &UserSettings,
    ) -> Result<GroupAddress, LogError> {
        self.put_settings(settings)?;
        let address = config.settings_group(settings.user_id);
        let attached =
            self.create_or_join(&address, GroupSpec::open(&address), MemberInfo::CREATOR)?;
        if attached == Attached::Joined {
            debug!(group = %address, "settings group already existed");
        }
        Ok(address)
    }
}
