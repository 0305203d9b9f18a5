//! The menu definition aggregate.

use chrono::{DateTime, Utc};
use common::{ExternalMenuId, MenuDefinitionId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::menu::layout::{MenuImage, MenuLayout, TapAction};
use crate::menu::state::MenuState;

/// One authored rich-menu configuration and its publish state.
///
/// Invariant: `external_id` is `Some` exactly while `state` is `Active` or
/// `Inactive`. A menu is never "published but stateless", and a `Draft`
/// menu never holds a platform resource. The transition methods below are
/// the only way publish state changes, so the invariant holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuDefinition {
    id: MenuDefinitionId,
    name: String,
    /// Platform resource id; set by the first successful publish and
    /// replaced on every republish.
    external_id: Option<ExternalMenuId>,
    /// The external id most recently replaced, kept for diagnostics.
    previous_external_id: Option<ExternalMenuId>,
    layout: MenuLayout,
    image: Option<MenuImage>,
    state: MenuState,
    /// Alias to auto-create after a successful publish, if not yet bound.
    suggested_alias_id: Option<String>,
    /// Label shown on the chat bar while the menu is collapsed.
    chat_bar_text: String,
    /// Whether the menu opens expanded by default.
    selected: bool,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl MenuDefinition {
    /// Creates a new menu definition in `Draft` state.
    pub fn new(name: impl Into<String>, layout: MenuLayout) -> Self {
        Self {
            id: MenuDefinitionId::new(),
            name: name.into(),
            external_id: None,
            previous_external_id: None,
            layout,
            image: None,
            state: MenuState::Draft,
            suggested_alias_id: None,
            chat_bar_text: "Menu".to_string(),
            selected: false,
            created_at: Utc::now(),
            published_at: None,
        }
    }

    /// Returns the local id.
    pub fn id(&self) -> MenuDefinitionId {
        self.id
    }

    /// Returns the menu name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current platform resource id, if published.
    pub fn external_id(&self) -> Option<&ExternalMenuId> {
        self.external_id.as_ref()
    }

    /// Returns the external id replaced by the last republish, if any.
    pub fn previous_external_id(&self) -> Option<&ExternalMenuId> {
        self.previous_external_id.as_ref()
    }

    /// Returns the tap-area layout.
    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    /// Returns the menu image, if one has been attached.
    pub fn image(&self) -> Option<&MenuImage> {
        self.image.as_ref()
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Returns the alias to auto-create on publish, if configured.
    pub fn suggested_alias_id(&self) -> Option<&str> {
        self.suggested_alias_id.as_deref()
    }

    /// Returns the chat bar label.
    pub fn chat_bar_text(&self) -> &str {
        &self.chat_bar_text
    }

    /// Returns whether the menu opens expanded by default.
    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Returns when the menu was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the menu was last successfully published.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    /// Returns true if the menu has both a layout and an image, the
    /// precondition for any publish attempt.
    pub fn is_publishable(&self) -> bool {
        !self.layout.is_empty() && self.image.is_some()
    }

    // Authoring mutators

    /// Attaches or replaces the menu image.
    pub fn set_image(&mut self, image: MenuImage) {
        self.image = Some(image);
    }

    /// Replaces the layout.
    pub fn set_layout(&mut self, layout: MenuLayout) {
        self.layout = layout;
    }

    /// Sets the alias to auto-create on publish.
    pub fn set_suggested_alias_id(&mut self, alias_id: Option<String>) {
        self.suggested_alias_id = alias_id;
    }

    /// Sets the chat bar label.
    pub fn set_chat_bar_text(&mut self, text: impl Into<String>) {
        self.chat_bar_text = text.into();
    }

    /// Sets whether the menu opens expanded by default.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    // Publish state transitions

    /// Records a completed first publish: the menu now owns `external_id`
    /// and becomes `Active`.
    pub fn mark_published(&mut self, external_id: ExternalMenuId) -> Result<(), DomainError> {
        if self.external_id.is_some() {
            return Err(DomainError::InvalidTransition {
                menu_id: self.id,
                reason: "menu is already published; use record_republish".to_string(),
            });
        }
        self.external_id = Some(external_id);
        self.state = MenuState::Active;
        self.published_at = Some(Utc::now());
        Ok(())
    }

    /// Records a completed republish: the old external id moves to
    /// `previous_external_id` and the menu stays `Active`.
    pub fn record_republish(&mut self, new_external_id: ExternalMenuId) -> Result<(), DomainError> {
        let old = self
            .external_id
            .take()
            .ok_or_else(|| DomainError::InvalidTransition {
                menu_id: self.id,
                reason: "menu has never been published".to_string(),
            })?;
        self.previous_external_id = Some(old);
        self.external_id = Some(new_external_id);
        self.state = MenuState::Active;
        self.published_at = Some(Utc::now());
        Ok(())
    }

    /// Records an explicit withdrawal from the platform. The external id is
    /// retained as a record of the (now deleted) resource.
    pub fn mark_withdrawn(&mut self) -> Result<(), DomainError> {
        if !self.state.can_withdraw() {
            return Err(DomainError::InvalidTransition {
                menu_id: self.id,
                reason: format!("cannot withdraw from {} state", self.state),
            });
        }
        self.state = MenuState::Inactive;
        Ok(())
    }

    /// Clears every `SwitchMenu` reference to the given alias in the stored
    /// layout, leaving the tap area in place with an empty reference.
    ///
    /// Returns the number of references cleared.
    pub fn clear_alias_references(&mut self, alias_id: &str) -> usize {
        let mut cleared = 0;
        for area in &mut self.layout.areas {
            if let TapAction::SwitchMenu { alias_id: target, .. } = &mut area.action
                && target == alias_id
            {
                target.clear();
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::layout::{Bounds, ImageSize, TapArea};

    fn sample_layout() -> MenuLayout {
        MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![TapArea::new(
                Bounds::new(0, 0, 2500, 1686),
                TapAction::Message {
                    text: "hi".to_string(),
                },
            )],
        )
    }

    fn sample_image() -> MenuImage {
        MenuImage::new(vec![0u8; 64], 2500, 1686, "image/png")
    }

    #[test]
    fn test_new_menu_is_draft_without_external_id() {
        let menu = MenuDefinition::new("main", sample_layout());
        assert_eq!(menu.state(), MenuState::Draft);
        assert!(menu.external_id().is_none());
        assert!(menu.published_at().is_none());
    }

    #[test]
    fn test_is_publishable_requires_layout_and_image() {
        let mut menu = MenuDefinition::new("main", MenuLayout::default());
        assert!(!menu.is_publishable());

        menu.set_layout(sample_layout());
        assert!(!menu.is_publishable());

        menu.set_image(sample_image());
        assert!(menu.is_publishable());
    }

    #[test]
    fn test_mark_published_sets_external_id_and_state() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        menu.mark_published(ExternalMenuId::new("richmenu-1")).unwrap();

        assert_eq!(menu.state(), MenuState::Active);
        assert_eq!(menu.external_id().unwrap().as_str(), "richmenu-1");
        assert!(menu.published_at().is_some());
    }

    #[test]
    fn test_mark_published_twice_is_rejected() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        menu.mark_published(ExternalMenuId::new("richmenu-1")).unwrap();

        let result = menu.mark_published(ExternalMenuId::new("richmenu-2"));
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_record_republish_rotates_external_ids() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        menu.mark_published(ExternalMenuId::new("richmenu-1")).unwrap();
        menu.record_republish(ExternalMenuId::new("richmenu-2")).unwrap();

        assert_eq!(menu.state(), MenuState::Active);
        assert_eq!(menu.external_id().unwrap().as_str(), "richmenu-2");
        assert_eq!(menu.previous_external_id().unwrap().as_str(), "richmenu-1");
    }

    #[test]
    fn test_record_republish_on_draft_is_rejected() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        let result = menu.record_republish(ExternalMenuId::new("richmenu-2"));
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_withdraw_keeps_external_id() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        menu.mark_published(ExternalMenuId::new("richmenu-1")).unwrap();
        menu.mark_withdrawn().unwrap();

        assert_eq!(menu.state(), MenuState::Inactive);
        assert_eq!(menu.external_id().unwrap().as_str(), "richmenu-1");
    }

    #[test]
    fn test_withdraw_from_draft_is_rejected() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        assert!(matches!(
            menu.mark_withdrawn(),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_clear_alias_references() {
        let layout = MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![
                TapArea::new(
                    Bounds::new(0, 0, 1250, 1686),
                    TapAction::SwitchMenu {
                        alias_id: "promo-a".to_string(),
                        data: "switch".to_string(),
                    },
                ),
                TapArea::new(
                    Bounds::new(1250, 0, 1250, 1686),
                    TapAction::SwitchMenu {
                        alias_id: "promo-b".to_string(),
                        data: "switch".to_string(),
                    },
                ),
            ],
        );
        let mut menu = MenuDefinition::new("main", layout);

        assert_eq!(menu.clear_alias_references("promo-a"), 1);
        assert_eq!(menu.layout().referenced_aliases(), vec!["promo-b"]);
        // Already cleared; nothing left to do.
        assert_eq!(menu.clear_alias_references("promo-a"), 0);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut menu = MenuDefinition::new("main", sample_layout());
        menu.set_image(sample_image());
        menu.mark_published(ExternalMenuId::new("richmenu-1")).unwrap();

        let json = serde_json::to_string(&menu).unwrap();
        let deserialized: MenuDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(menu, deserialized);
    }
}
