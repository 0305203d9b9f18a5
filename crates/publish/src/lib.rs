//! Saga-style publish orchestration for rich menus.
//!
//! This crate coordinates the multi-step publish of a menu definition to
//! the external messaging platform, with compensating actions on failure.
//!
//! A republish follows these steps:
//! 1. Validate the layout
//! 2. Create the replacement menu resource
//! 3. Upload its image
//! 4. Repoint every alias at the replacement
//! 5. Delete the replaced resource (best-effort, strictly last)
//!
//! If any step fails, previously committed steps are compensated in
//! reverse order so no alias ever resolves to a deleted resource.

pub mod compensation;
pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod registry;
pub mod steps;

pub use compensation::{Compensation, CompensationFailure, CompensationLog};
pub use error::{PublishError, Result};
pub use orchestrator::PublishOrchestrator;
pub use phase::PublishPhase;
pub use registry::AliasRegistry;
