//! Compensation log for the publish saga.
//!
//! The platform offers no multi-step transaction, so each step that commits
//! external state records its undo here. On failure the log is walked in
//! reverse, best-effort: a compensating action that itself fails is
//! reported for manual fix-up and the walk continues, so one bad undo
//! cannot strand the rest.

use common::ExternalMenuId;
use domain::AliasId;
use gateway::{ExternalMenuGateway, GatewayError};

/// A recorded undo action for one committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Delete a menu resource created earlier in this attempt.
    DeleteMenu { external_id: ExternalMenuId },

    /// Point an alias back at the resource it resolved to before this
    /// attempt touched it.
    RepointAlias {
        alias_id: AliasId,
        external_id: ExternalMenuId,
    },
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compensation::DeleteMenu { external_id } => {
                write!(f, "delete_menu({external_id})")
            }
            Compensation::RepointAlias {
                alias_id,
                external_id,
            } => write!(f, "repoint_alias({alias_id} -> {external_id})"),
        }
    }
}

/// A compensating action that itself failed.
///
/// The named resource is left in a safe but wrong-looking state (an alias
/// still pointing at the replacement resource, or an orphaned menu) and
/// needs operator attention; nothing dangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
    /// The undo action that failed.
    pub action: Compensation,
    /// Why the platform rejected it.
    pub error: GatewayError,
}

impl std::fmt::Display for CompensationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.action, self.error)
    }
}

/// Ordered undo log for one publish attempt.
///
/// Entries are appended as steps commit and applied in reverse on failure,
/// so later work is always undone before the resources it depended on.
#[derive(Debug, Default)]
pub struct CompensationLog {
    entries: Vec<Compensation>,
}

impl CompensationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the undo for a step that just committed.
    pub fn record(&mut self, compensation: Compensation) {
        self.entries.push(compensation);
    }

    /// Returns the number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies every recorded compensation in reverse order, draining the
    /// log. Failures are collected and returned, never propagated: the
    /// remaining entries still run. A 404 on menu deletion counts as
    /// success (the resource is already gone).
    ///
    /// One exception to "run everything": once an alias repoint has failed,
    /// menu deletions are skipped. The stuck alias still resolves to the
    /// resource that was about to be deleted; removing it would turn a
    /// safe degraded state into a dangling reference.
    pub async fn unwind<G>(&mut self, gateway: &G) -> Vec<CompensationFailure>
    where
        G: ExternalMenuGateway + ?Sized,
    {
        let mut failures = Vec::new();
        let mut repoint_failed = false;

        while let Some(entry) = self.entries.pop() {
            let result = match &entry {
                Compensation::DeleteMenu { external_id } => {
                    if repoint_failed {
                        tracing::warn!(
                            compensation = %entry,
                            "skipping deletion; an alias whose rollback failed still points here"
                        );
                        continue;
                    }
                    match gateway.delete_menu(external_id).await {
                        Err(e) if !e.is_not_found() => Err(e),
                        _ => Ok(()),
                    }
                }
                Compensation::RepointAlias {
                    alias_id,
                    external_id,
                } => gateway.update_alias(alias_id.as_str(), external_id).await,
            };

            match result {
                Ok(()) => tracing::info!(compensation = %entry, "compensation applied"),
                Err(error) => {
                    tracing::error!(
                        compensation = %entry,
                        %error,
                        "compensation failed; manual intervention required"
                    );
                    if matches!(entry, Compensation::RepointAlias { .. }) {
                        repoint_failed = true;
                    }
                    failures.push(CompensationFailure {
                        action: entry,
                        error,
                    });
                }
            }
        }

        failures
    }
}
