//! Alias identifiers and bindings.

use chrono::{DateTime, Utc};
use common::MenuDefinitionId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum alias id length accepted by the platform.
pub const MAX_ALIAS_ID_LEN: usize = 32;

/// A validated alias identifier.
///
/// Alias ids are operator-chosen tokens: lowercase letters, digits, and
/// hyphens only, 1 to 32 characters. Construction is the only validation
/// point, so holding an `AliasId` means the format is legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasId(String);

impl AliasId {
    /// Parses and validates an alias id.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidAliasId {
                alias_id: id,
                reason: "alias id must not be empty".to_string(),
            });
        }
        if id.len() > MAX_ALIAS_ID_LEN {
            return Err(DomainError::InvalidAliasId {
                alias_id: id,
                reason: format!("alias id exceeds {MAX_ALIAS_ID_LEN} characters"),
            });
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(DomainError::InvalidAliasId {
                alias_id: id,
                reason: "alias id may contain only lowercase letters, digits, and hyphens"
                    .to_string(),
            });
        }
        Ok(Self(id))
    }

    /// Returns the alias id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AliasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AliasId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stable, human-chosen name bound to exactly one menu definition.
///
/// The binding records which local menu the alias conceptually names; the
/// platform-side alias record resolves it to that menu's current external
/// resource id. Keeping those two views in agreement across republishes is
/// the orchestrator's core consistency obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasBinding {
    /// The globally unique alias id.
    pub alias_id: AliasId,
    /// The menu definition the alias currently resolves to.
    pub menu_definition_id: MenuDefinitionId,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

impl AliasBinding {
    /// Creates a new binding.
    pub fn new(alias_id: AliasId, menu_definition_id: MenuDefinitionId) -> Self {
        Self {
            alias_id,
            menu_definition_id,
            created_at: Utc::now(),
        }
    }
}
