//! Contract for the external messaging platform's rich-menu API.
//!
//! The platform offers no cross-resource transaction: every operation here
//! is a single request/response pair, and multi-step changes must be made
//! safe by the caller (see the publish crate). [`InMemoryMenuGateway`]
//! models the platform's state faithfully enough that orchestration tests
//! can assert on remote state and inject failures at any step.

pub mod error;
pub mod gateway;
pub mod memory;

pub use error::{GatewayError, Result};
pub use gateway::{CreateMenuRequest, ExternalMenuGateway, MAX_IMAGE_BYTES};
pub use memory::{GatewayCallCounts, InMemoryMenuGateway};
