//! The menu aggregate and its value objects.

pub mod definition;
pub mod layout;
pub mod state;

pub use definition::MenuDefinition;
pub use layout::{Bounds, ImageSize, MenuImage, MenuLayout, TapAction, TapArea};
pub use state::MenuState;
