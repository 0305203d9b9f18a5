//! Menu lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The state of a menu definition in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──publish──► Active ──withdraw──► Inactive
///                      │ ▲
///                      └─┘ (republish keeps Active)
/// ```
///
/// A menu holds an external resource id exactly while it is `Active` or
/// `Inactive`; a `Draft` menu has never been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MenuState {
    /// Menu is being authored; layout and image can still change freely.
    #[default]
    Draft,

    /// Menu is live on the platform.
    Active,

    /// Menu was withdrawn from the platform after having been published.
    Inactive,
}

impl MenuState {
    /// Returns true if the menu has been published at some point.
    pub fn is_published(&self) -> bool {
        matches!(self, MenuState::Active | MenuState::Inactive)
    }

    /// Returns true if aliases may target a menu in this state.
    pub fn can_be_aliased(&self) -> bool {
        matches!(self, MenuState::Active)
    }

    /// Returns true if the menu can be withdrawn from the platform.
    pub fn can_withdraw(&self) -> bool {
        matches!(self, MenuState::Active)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuState::Draft => "Draft",
            MenuState::Active => "Active",
            MenuState::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for MenuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
