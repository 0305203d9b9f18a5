pub mod types;

pub use types::{ExternalMenuId, MenuDefinitionId};
