//! Domain model for the rich-menu system.
//!
//! A [`MenuDefinition`] is a locally authored rich-menu configuration:
//! a tap-area layout plus an image, published to an external messaging
//! platform as an immutable resource. An [`AliasBinding`] is a stable
//! operator-chosen name that resolves to whichever external resource a
//! menu currently owns, so in-menu switch actions survive republishes.

pub mod alias;
pub mod error;
pub mod menu;

pub use alias::{AliasBinding, AliasId};
pub use error::DomainError;
pub use menu::{
    Bounds, ImageSize, MenuDefinition, MenuImage, MenuLayout, MenuState, TapAction, TapArea,
};
