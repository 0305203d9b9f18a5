//! In-memory platform double for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ExternalMenuId;
use domain::{MenuImage, MenuLayout};

use crate::error::{GatewayError, Result};
use crate::gateway::{CreateMenuRequest, ExternalMenuGateway, MAX_IMAGE_BYTES};

/// Per-operation call counts, for asserting what a test did (and did not)
/// reach the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCallCounts {
    pub validate_layout: usize,
    pub create_menu: usize,
    pub upload_image: usize,
    pub delete_menu: usize,
    pub set_platform_default: usize,
    pub clear_platform_default: usize,
    pub list_aliases: usize,
    pub create_alias: usize,
    pub update_alias: usize,
    pub delete_alias: usize,
}

impl GatewayCallCounts {
    /// Total calls across every operation.
    pub fn total(&self) -> usize {
        self.validate_layout
            + self.create_menu
            + self.upload_image
            + self.delete_menu
            + self.set_platform_default
            + self.clear_platform_default
            + self.list_aliases
            + self.create_alias
            + self.update_alias
            + self.delete_alias
    }
}

#[derive(Debug)]
struct StoredMenu {
    request: CreateMenuRequest,
    image_uploaded: bool,
}

#[derive(Debug, Default)]
struct PlatformState {
    menus: HashMap<String, StoredMenu>,
    /// alias id -> external menu id. BTreeMap so listings are deterministic.
    aliases: BTreeMap<String, String>,
    default_menu: Option<String>,
    next_id: u32,
    fail_on_create_menu: bool,
    fail_on_upload: bool,
    fail_on_delete_menu: bool,
    fail_on_create_alias: bool,
    fail_on_update_alias: bool,
    /// When set, only updates of this alias fail.
    fail_update_alias_for: Option<String>,
    /// When set, `update_alias` fails once this many calls have been made.
    fail_update_alias_after: Option<usize>,
    calls: GatewayCallCounts,
}

/// In-memory menu gateway for testing.
///
/// Models the platform's retained state (menus, images, aliases, the
/// account default) and enforces its request rules, so orchestration tests
/// can assert on remote state after success and rollback paths alike.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuGateway {
    state: Arc<RwLock<PlatformState>>,
}

impl InMemoryMenuGateway {
    /// Creates a new empty platform double.
    pub fn new() -> Self {
        Self::default()
    }

    // Failure injection

    /// Configures `create_menu` to fail with a 500.
    pub fn set_fail_on_create_menu(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create_menu = fail;
    }

    /// Configures `upload_image` to fail with a 500.
    pub fn set_fail_on_upload(&self, fail: bool) {
        self.state.write().unwrap().fail_on_upload = fail;
    }

    /// Configures `delete_menu` to fail with a 500.
    pub fn set_fail_on_delete_menu(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete_menu = fail;
    }

    /// Configures `create_alias` to fail with a 500.
    pub fn set_fail_on_create_alias(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create_alias = fail;
    }

    /// Configures every `update_alias` call to fail with a 500.
    pub fn set_fail_on_update_alias(&self, fail: bool) {
        self.state.write().unwrap().fail_on_update_alias = fail;
    }

    /// Configures `update_alias` to fail with a 500 for one alias only.
    pub fn set_fail_on_update_alias_for(&self, alias_id: impl Into<String>) {
        self.state.write().unwrap().fail_update_alias_for = Some(alias_id.into());
    }

    /// Configures `update_alias` to fail with a 500 after the first
    /// `calls` invocations have succeeded.
    pub fn set_fail_on_update_alias_after(&self, calls: usize) {
        self.state.write().unwrap().fail_update_alias_after = Some(calls);
    }

    // State queries

    /// Returns per-operation call counts.
    pub fn calls(&self) -> GatewayCallCounts {
        self.state.read().unwrap().calls
    }

    /// Returns the number of menu resources currently held.
    pub fn menu_count(&self) -> usize {
        self.state.read().unwrap().menus.len()
    }

    /// Returns true if a menu resource with the given id exists.
    pub fn has_menu(&self, external_id: &ExternalMenuId) -> bool {
        self.state
            .read()
            .unwrap()
            .menus
            .contains_key(external_id.as_str())
    }

    /// Returns true if the menu exists and its image has been uploaded.
    pub fn image_uploaded(&self, external_id: &ExternalMenuId) -> bool {
        self.state
            .read()
            .unwrap()
            .menus
            .get(external_id.as_str())
            .is_some_and(|m| m.image_uploaded)
    }

    /// Returns the number of aliases currently held.
    pub fn alias_count(&self) -> usize {
        self.state.read().unwrap().aliases.len()
    }

    /// Returns the external id an alias currently resolves to.
    pub fn alias_target(&self, alias_id: &str) -> Option<ExternalMenuId> {
        self.state
            .read()
            .unwrap()
            .aliases
            .get(alias_id)
            .map(|id| ExternalMenuId::new(id.clone()))
    }

    /// Returns the account default menu, if set.
    pub fn platform_default(&self) -> Option<ExternalMenuId> {
        self.state
            .read()
            .unwrap()
            .default_menu
            .clone()
            .map(ExternalMenuId::new)
    }

    /// Returns every alias whose target menu no longer exists. An empty
    /// result is the consistency property the orchestrator maintains.
    pub fn dangling_aliases(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        state
            .aliases
            .iter()
            .filter(|(_, target)| !state.menus.contains_key(*target))
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    /// Pre-seeds an alias on the platform without a local counterpart,
    /// for remote-conflict tests.
    pub fn seed_remote_alias(&self, alias_id: impl Into<String>, external_id: &ExternalMenuId) {
        self.state
            .write()
            .unwrap()
            .aliases
            .insert(alias_id.into(), external_id.as_str().to_string());
    }

    fn check_layout(layout: &MenuLayout) -> Result<()> {
        if layout.is_empty() {
            return Err(GatewayError::bad_request(
                "layout must define at least one tap area",
            ));
        }
        for (i, area) in layout.areas.iter().enumerate() {
            if !area.bounds.fits_within(layout.size) {
                return Err(GatewayError::bad_request(format!(
                    "tap area {i} is out of range for {}",
                    layout.size
                )));
            }
        }
        for (i, a) in layout.areas.iter().enumerate() {
            for (j, b) in layout.areas.iter().enumerate().skip(i + 1) {
                if a.bounds.overlaps(&b.bounds) {
                    return Err(GatewayError::bad_request(format!(
                        "tap areas {i} and {j} overlap"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ExternalMenuGateway for InMemoryMenuGateway {
    async fn validate_layout(&self, layout: &MenuLayout) -> Result<()> {
        self.state.write().unwrap().calls.validate_layout += 1;
        Self::check_layout(layout)
    }

    async fn create_menu(&self, request: CreateMenuRequest) -> Result<ExternalMenuId> {
        let mut state = self.state.write().unwrap();
        state.calls.create_menu += 1;

        if state.fail_on_create_menu {
            return Err(GatewayError::server_error("menu creation unavailable"));
        }
        Self::check_layout(&request.layout)?;

        state.next_id += 1;
        let external_id = format!("richmenu-{:04}", state.next_id);
        state.menus.insert(
            external_id.clone(),
            StoredMenu {
                request,
                image_uploaded: false,
            },
        );

        Ok(ExternalMenuId::new(external_id))
    }

    async fn upload_image(&self, external_id: &ExternalMenuId, image: &MenuImage) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.upload_image += 1;

        if state.fail_on_upload {
            return Err(GatewayError::server_error("image upload unavailable"));
        }

        let menu = state
            .menus
            .get_mut(external_id.as_str())
            .ok_or_else(|| GatewayError::not_found("richmenu not found"))?;

        if image.byte_len() > MAX_IMAGE_BYTES {
            return Err(GatewayError::bad_request(format!(
                "image exceeds {MAX_IMAGE_BYTES} bytes"
            )));
        }
        if image.size() != menu.request.layout.size {
            return Err(GatewayError::bad_request(format!(
                "image size {} does not match declared size {}",
                image.size(),
                menu.request.layout.size
            )));
        }

        menu.image_uploaded = true;
        Ok(())
    }

    async fn delete_menu(&self, external_id: &ExternalMenuId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.delete_menu += 1;

        if state.fail_on_delete_menu {
            return Err(GatewayError::server_error("menu deletion unavailable"));
        }
        if state.menus.remove(external_id.as_str()).is_none() {
            return Err(GatewayError::not_found("richmenu not found"));
        }
        if state.default_menu.as_deref() == Some(external_id.as_str()) {
            state.default_menu = None;
        }
        Ok(())
    }

    async fn clear_platform_default(&self) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.clear_platform_default += 1;
        state.default_menu = None;
        Ok(())
    }

    async fn set_platform_default(&self, external_id: &ExternalMenuId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.set_platform_default += 1;

        if !state.menus.contains_key(external_id.as_str()) {
            return Err(GatewayError::not_found("richmenu not found"));
        }
        state.default_menu = Some(external_id.as_str().to_string());
        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<String>> {
        let mut state = self.state.write().unwrap();
        state.calls.list_aliases += 1;
        Ok(state.aliases.keys().cloned().collect())
    }

    async fn create_alias(&self, alias_id: &str, external_id: &ExternalMenuId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.create_alias += 1;

        if state.fail_on_create_alias {
            return Err(GatewayError::server_error("alias creation unavailable"));
        }
        if state.aliases.contains_key(alias_id) {
            return Err(GatewayError::conflict("alias already exists"));
        }
        if !state.menus.contains_key(external_id.as_str()) {
            return Err(GatewayError::not_found("richmenu not found"));
        }
        state
            .aliases
            .insert(alias_id.to_string(), external_id.as_str().to_string());
        Ok(())
    }

    async fn update_alias(&self, alias_id: &str, external_id: &ExternalMenuId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.update_alias += 1;

        if state.fail_on_update_alias
            || state.fail_update_alias_for.as_deref() == Some(alias_id)
            || state
                .fail_update_alias_after
                .is_some_and(|n| state.calls.update_alias > n)
        {
            return Err(GatewayError::server_error("alias update unavailable"));
        }
        if !state.menus.contains_key(external_id.as_str()) {
            return Err(GatewayError::not_found("richmenu not found"));
        }
        match state.aliases.get_mut(alias_id) {
            Some(target) => {
                *target = external_id.as_str().to_string();
                Ok(())
            }
            None => Err(GatewayError::not_found("alias not found")),
        }
    }

    async fn delete_alias(&self, alias_id: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.delete_alias += 1;

        if state.aliases.remove(alias_id).is_none() {
            return Err(GatewayError::not_found("alias not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Bounds, ImageSize, TapAction, TapArea};

    fn layout() -> MenuLayout {
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

    fn request() -> CreateMenuRequest {
        CreateMenuRequest {
            name: "main".to_string(),
            chat_bar_text: "Menu".to_string(),
            selected: false,
            layout: layout(),
        }
    }

    fn image() -> MenuImage {
        MenuImage::new(vec![0u8; 128], 2500, 1686, "image/png")
    }

    #[tokio::test]
    async fn test_create_upload_delete_menu() {
        let gateway = InMemoryMenuGateway::new();

        let id = gateway.create_menu(request()).await.unwrap();
        assert_eq!(id.as_str(), "richmenu-0001");
        assert!(gateway.has_menu(&id));
        assert!(!gateway.image_uploaded(&id));

        gateway.upload_image(&id, &image()).await.unwrap();
        assert!(gateway.image_uploaded(&id));

        gateway.delete_menu(&id).await.unwrap();
        assert!(!gateway.has_menu(&id));

        let err = gateway.delete_menu(&id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_validate_layout_rejects_empty() {
        let gateway = InMemoryMenuGateway::new();
        let err = gateway
            .validate_layout(&MenuLayout::default())
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_validate_layout_rejects_out_of_range() {
        let gateway = InMemoryMenuGateway::new();
        let bad = MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![TapArea::new(
                Bounds::new(2400, 0, 200, 100),
                TapAction::Postback {
                    data: "x".to_string(),
                },
            )],
        );
        let err = gateway.validate_layout(&bad).await.unwrap_err();
        assert_eq!(err.status, 400);
        assert!(err.body.contains("out of range"));
    }

    #[tokio::test]
    async fn test_validate_layout_rejects_overlap() {
        let gateway = InMemoryMenuGateway::new();
        let bad = MenuLayout::new(
            ImageSize::new(2500, 1686),
            vec![
                TapArea::new(
                    Bounds::new(0, 0, 1300, 1686),
                    TapAction::Postback {
                        data: "a".to_string(),
                    },
                ),
                TapArea::new(
                    Bounds::new(1200, 0, 1300, 1686),
                    TapAction::Postback {
                        data: "b".to_string(),
                    },
                ),
            ],
        );
        let err = gateway.validate_layout(&bad).await.unwrap_err();
        assert!(err.body.contains("overlap"));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_image() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();

        let huge = MenuImage::new(vec![0u8; MAX_IMAGE_BYTES + 1], 2500, 1686, "image/jpeg");
        let err = gateway.upload_image(&id, &huge).await.unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn test_upload_rejects_size_mismatch() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();

        let wrong = MenuImage::new(vec![0u8; 128], 2500, 843, "image/png");
        let err = gateway.upload_image(&id, &wrong).await.unwrap_err();
        assert!(err.body.contains("does not match"));
    }

    #[tokio::test]
    async fn test_alias_lifecycle() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();

        gateway.create_alias("promo-a", &id).await.unwrap();
        assert_eq!(gateway.alias_target("promo-a"), Some(id.clone()));
        assert_eq!(gateway.list_aliases().await.unwrap(), vec!["promo-a"]);

        let err = gateway.create_alias("promo-a", &id).await.unwrap_err();
        assert_eq!(err.status, 409);

        let id2 = gateway.create_menu(request()).await.unwrap();
        gateway.update_alias("promo-a", &id2).await.unwrap();
        assert_eq!(gateway.alias_target("promo-a"), Some(id2));

        gateway.delete_alias("promo-a").await.unwrap();
        assert!(gateway.delete_alias("promo-a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_scoped_update_alias_failure() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();
        gateway.create_alias("promo-a", &id).await.unwrap();
        gateway.create_alias("promo-b", &id).await.unwrap();

        gateway.set_fail_on_update_alias_for("promo-b");

        let id2 = gateway.create_menu(request()).await.unwrap();
        gateway.update_alias("promo-a", &id2).await.unwrap();
        let err = gateway.update_alias("promo-b", &id2).await.unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[tokio::test]
    async fn test_platform_default() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();

        gateway.set_platform_default(&id).await.unwrap();
        assert_eq!(gateway.platform_default(), Some(id.clone()));

        // Deleting the default menu clears the default.
        gateway.delete_menu(&id).await.unwrap();
        assert_eq!(gateway.platform_default(), None);
    }

    #[tokio::test]
    async fn test_dangling_alias_detection() {
        let gateway = InMemoryMenuGateway::new();
        let id = gateway.create_menu(request()).await.unwrap();
        gateway.create_alias("promo-a", &id).await.unwrap();
        assert!(gateway.dangling_aliases().is_empty());

        gateway.delete_menu(&id).await.unwrap();
        assert_eq!(gateway.dangling_aliases(), vec!["promo-a"]);
    }

    #[tokio::test]
    async fn test_call_counts() {
        let gateway = InMemoryMenuGateway::new();
        assert_eq!(gateway.calls().total(), 0);

        let id = gateway.create_menu(request()).await.unwrap();
        gateway.upload_image(&id, &image()).await.unwrap();
        let _ = gateway.list_aliases().await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.create_menu, 1);
        assert_eq!(calls.upload_image, 1);
        assert_eq!(calls.list_aliases, 1);
        assert_eq!(calls.total(), 3);
    }
}
