//! Publish error types.

use common::MenuDefinitionId;
use domain::{AliasId, DomainError};
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

use crate::compensation::CompensationFailure;
use crate::phase::PublishPhase;

/// Errors that can occur during publish and alias operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Menu definition not found.
    #[error("Menu not found: {0}")]
    MenuNotFound(MenuDefinitionId),

    /// The menu lacks a layout or image and cannot be published.
    #[error("Menu {menu_id} is not publishable: {reason}")]
    IncompleteMenu {
        menu_id: MenuDefinitionId,
        reason: String,
    },

    /// The platform rejected the layout before anything was created.
    /// Never triggers rollback.
    #[error("Layout validation failed: {0}")]
    LayoutRejected(GatewayError),

    /// A saga step failed against the platform; any compensations recorded
    /// up to that point were applied successfully.
    #[error("Publish step '{step}' failed in phase {phase}: {source}")]
    StepFailed {
        step: String,
        phase: PublishPhase,
        source: GatewayError,
    },

    /// A single-call operation (alias management, default menu, withdraw)
    /// failed against the platform. No side effects to undo.
    #[error("Operation '{op}' failed: {source}")]
    Gateway {
        op: String,
        source: GatewayError,
    },

    /// The alias is already bound locally.
    #[error("Alias '{0}' already exists")]
    AliasConflict(AliasId),

    /// The alias exists on the platform but has no local binding. Refusing
    /// to recreate it keeps this store from silently capturing an alias
    /// some other system owns.
    #[error("Alias '{0}' exists remotely but is not tracked locally; import it instead")]
    AliasExistsRemotely(AliasId),

    /// The target menu is not live on the platform.
    #[error("Menu {0} is not active on the platform")]
    MenuNotActive(MenuDefinitionId),

    /// Aliases still resolve to the menu, blocking withdrawal.
    #[error("Menu {menu_id} still has {count} alias(es) bound; delete or repoint them first")]
    AliasesStillBound {
        menu_id: MenuDefinitionId,
        count: usize,
    },

    /// A step failed and one or more compensating actions also failed.
    /// Carries per-action detail for manual fix-up; the affected resources
    /// are in a safe degraded state, never dangling.
    #[error(
        "Publish step '{step}' failed and {} compensating action(s) also failed; \
         manual intervention required",
        failures.len()
    )]
    Inconsistency {
        step: String,
        failures: Vec<CompensationFailure>,
        source: GatewayError,
    },

    /// Domain error (alias format, invalid state transition).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Repository error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PublishError {
    /// Builds the error for a failed saga step: a plain [`StepFailed`] when
    /// every recorded compensation was applied, an [`Inconsistency`] when
    /// some were not.
    ///
    /// [`StepFailed`]: PublishError::StepFailed
    /// [`Inconsistency`]: PublishError::Inconsistency
    pub(crate) fn step_failed(
        step: impl Into<String>,
        phase: PublishPhase,
        source: GatewayError,
        failures: Vec<CompensationFailure>,
    ) -> Self {
        let step = step.into();
        if failures.is_empty() {
            PublishError::StepFailed {
                step,
                phase,
                source,
            }
        } else {
            PublishError::Inconsistency {
                step,
                failures,
                source,
            }
        }
    }
}

/// Convenience type alias for publish results.
pub type Result<T> = std::result::Result<T, PublishError>;
