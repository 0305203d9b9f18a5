//! Local persistence contracts for menu definitions and alias bindings.
//!
//! The orchestration core only ever talks to the [`MenuRepository`] and
//! [`AliasRepository`] traits; the in-memory implementations here back the
//! test suites. A missing row is `Ok(None)`, not an error — callers that
//! require presence raise their own not-found errors.

pub mod alias;
pub mod error;
pub mod menu;

pub use alias::{AliasRepository, InMemoryAliasRepository};
pub use error::{Result, StoreError};
pub use menu::{InMemoryMenuRepository, MenuRepository};
