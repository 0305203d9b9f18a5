use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a locally authored menu definition.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// menu definition IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuDefinitionId(Uuid);

impl MenuDefinitionId {
    /// Creates a new random menu definition ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a menu definition ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MenuDefinitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MenuDefinitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MenuDefinitionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MenuDefinitionId> for Uuid {
    fn from(id: MenuDefinitionId) -> Self {
        id.0
    }
}

/// Resource identifier assigned by the external messaging platform.
///
/// Opaque to this system; it only exists once a menu has been published
/// and changes on every republish.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalMenuId(String);

impl ExternalMenuId {
    /// Creates an external menu ID from the platform's resource id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the resource id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalMenuId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExternalMenuId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExternalMenuId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ExternalMenuId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
