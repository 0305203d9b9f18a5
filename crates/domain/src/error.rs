//! Domain error types.

use common::MenuDefinitionId;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An alias id failed format validation.
    #[error("Invalid alias id {alias_id:?}: {reason}")]
    InvalidAliasId { alias_id: String, reason: String },

    /// A state transition was attempted from a state that does not allow it.
    #[error("Invalid menu state transition for {menu_id}: {reason}")]
    InvalidTransition {
        menu_id: MenuDefinitionId,
        reason: String,
    },

    /// The menu is missing a part required for the requested operation.
    #[error("Menu {menu_id} is incomplete: {reason}")]
    IncompleteMenu {
        menu_id: MenuDefinitionId,
        reason: String,
    },
}
