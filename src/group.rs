//! Group membership: access-controlled bindings of devices to a log prefix.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AddressError, GroupError};
use crate::store::SyncService;

/// Identifies a device taking part in the shared log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Creates a device ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a group is for, and the ID it is named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// A game's action log, named `gaming-<gameID>`.
    Gaming(u32),
    /// A user's settings, named `discovery-<userID>`.
    Discovery(u32),
}

impl GroupKind {
    /// Returns the row-key prefix the group is scoped to.
    #[must_use]
    pub fn prefix(&self) -> String {
        match self {
            Self::Gaming(game_id) => format!("games/{game_id}"),
            Self::Discovery(user_id) => format!("users/{user_id}"),
        }
    }
}

const SYNC_SEGMENT: &str = "/%%sync/";

/// A well-known group name: `<mountpoint>/<namespace>/%%sync/<kind>-<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupAddress {
    base: String,
    kind: GroupKind,
}

impl GroupAddress {
    /// Creates an address under `base` (`<mountpoint>/<namespace>`).
    #[must_use]
    pub fn new(base: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            base: base.into(),
            kind,
        }
    }

    /// Returns the group kind.
    #[must_use]
    pub const fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Returns the game ID for a game log group.
    #[must_use]
    pub const fn game_id(&self) -> Option<u32> {
        match self.kind {
            GroupKind::Gaming(game_id) => Some(game_id),
            GroupKind::Discovery(_) => None,
        }
    }

    /// Returns the row-key prefix the group is scoped to.
    #[must_use]
    pub fn prefix(&self) -> String {
        self.kind.prefix()
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GroupKind::Gaming(id) => write!(f, "{}{SYNC_SEGMENT}gaming-{id}", self.base),
            GroupKind::Discovery(id) => write!(f, "{}{SYNC_SEGMENT}discovery-{id}", self.base),
        }
    }
}

impl FromStr for GroupAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AddressError(s.to_owned());
        let (base, name) = s.rsplit_once(SYNC_SEGMENT).ok_or_else(malformed)?;
        let (kind, id) = name.rsplit_once('-').ok_or_else(malformed)?;
        let id: u32 = id.parse().map_err(|_| malformed())?;
        let kind = match kind {
            "gaming" => GroupKind::Gaming(id),
            "discovery" => GroupKind::Discovery(id),
            _ => return Err(malformed()),
        };
        Ok(Self::new(base, kind))
    }
}

/// The devices an access right applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessList {
    /// Any device.
    Everyone,
    /// Only the listed devices.
    Only(BTreeSet<DeviceId>),
}

impl AccessList {
    /// Returns whether the list admits the device.
    #[must_use]
    pub fn admits(&self, device: &DeviceId) -> bool {
        match self {
            Self::Everyone => true,
            Self::Only(devices) => devices.contains(device),
        }
    }
}

/// Access rights on a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Who may disband the group.
    pub admin: AccessList,
    /// Who may append to the group's log.
    pub write: AccessList,
    /// Who may join and read the group's log.
    pub read: AccessList,
}

impl Permissions {
    /// Grants every right to every device.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            admin: AccessList::Everyone,
            write: AccessList::Everyone,
            read: AccessList::Everyone,
        }
    }
}

/// Parameters a group is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    /// Free-form description.
    pub description: String,
    /// Row-key prefix visible to the group.
    pub prefix: String,
    /// Access rights.
    pub permissions: Permissions,
}

impl GroupSpec {
    /// An open group scoped to the address's prefix.
    #[must_use]
    pub fn open(address: &GroupAddress) -> Self {
        Self {
            description: "croupier syncgroup".to_owned(),
            prefix: address.prefix(),
            permissions: Permissions::open(),
        }
    }
}

/// What a member registers when joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Sync priority.
    pub sync_priority: u8,
    /// Whether the member serves the group's data to others.
    pub is_server: bool,
}

impl MemberInfo {
    /// Info registered by a group's creator.
    pub const CREATOR: Self = Self {
        sync_priority: 8,
        is_server: true,
    };

    /// Info registered by a joining device.
    pub const JOINER: Self = Self {
        sync_priority: 8,
        is_server: false,
    };
}

/// A group's record in the store.
#[derive(Debug, Clone)]
pub(crate) struct Group {
    pub(crate) spec: GroupSpec,
    pub(crate) members: BTreeMap<DeviceId, MemberInfo>,
}

impl Group {
    pub(crate) fn is_member(&self, device: &DeviceId) -> bool {
        self.members.contains_key(device)
    }
}

/// How [`SyncService::create_or_join`] attached to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attached {
    /// The group was created.
    Created,
    /// The group already existed and was joined.
    Joined,
}

impl SyncService {
    /// Creates a group and registers the caller as its first member.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::AlreadyExists`] if the name is taken.
    pub fn create_group(
        &self,
        address: &GroupAddress,
        spec: GroupSpec,
        info: MemberInfo,
    ) -> Result<(), GroupError> {
        let name = address.to_string();
        let mut groups = self.store().groups.lock();
        if groups.contains_key(&name) {
            return Err(GroupError::AlreadyExists(name));
        }
        let members = BTreeMap::from([(self.device().clone(), info)]);
        groups.insert(name.clone(), Group { spec, members });
        drop(groups);

        info!(group = %name, device = %self.device(), "group created");
        Ok(())
    }

    /// Joins an existing group.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no group has this name and
    /// [`GroupError::AccessDenied`] if the group's read permission excludes
    /// the caller.
    pub fn join_group(
        &self,
        address: &GroupAddress,
        info: MemberInfo,
    ) -> Result<GroupSpec, GroupError> {
        let name = address.to_string();
        let mut groups = self.store().groups.lock();
        let group = groups
            .get_mut(&name)
            .ok_or_else(|| GroupError::NotFound(name.clone()))?;
        if !group.spec.permissions.read.admits(self.device()) {
            return Err(GroupError::AccessDenied(name));
        }
        group.members.insert(self.device().clone(), info);
        let spec = group.spec.clone();
        drop(groups);

        info!(group = %name, device = %self.device(), "group joined");
        Ok(spec)
    }

    /// Creates the group, or joins it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the group exists and joining it fails.
    pub fn create_or_join(
        &self,
        address: &GroupAddress,
        spec: GroupSpec,
        info: MemberInfo,
    ) -> Result<Attached, GroupError> {
        match self.create_group(address, spec, info) {
            Ok(()) => Ok(Attached::Created),
            Err(GroupError::AlreadyExists(_)) => {
                self.join_group(address, info)?;
                Ok(Attached::Joined)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the current members of a group.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no group has this name.
    pub fn members(
        &self,
        address: &GroupAddress,
    ) -> Result<Vec<(DeviceId, MemberInfo)>, GroupError> {
        let name = address.to_string();
        let groups = self.store().groups.lock();
        let group = groups.get(&name).ok_or(GroupError::NotFound(name))?;
        Ok(group.members.iter().map(|(d, i)| (d.clone(), *i)).collect())
    }

    /// Removes a group. Its log rows stay in the store.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no group has this name and
    /// [`GroupError::NotOwner`] if the caller lacks admin rights or is not a
    /// member.
    pub fn disband(&self, address: &GroupAddress) -> Result<(), GroupError> {
        let name = address.to_string();
        let mut groups = self.store().groups.lock();
        let group = groups
            .get(&name)
            .ok_or_else(|| GroupError::NotFound(name.clone()))?;
        if !group.is_member(self.device()) || !group.spec.permissions.admin.admits(self.device())
        {
            return Err(GroupError::NotOwner(name));
        }
        groups.remove(&name);
        drop(groups);

        info!(group = %name, device = %self.device(), "group disbanded");
        Ok(())
    }
}
