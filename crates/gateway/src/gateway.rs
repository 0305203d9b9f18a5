//! The platform menu API trait.

use async_trait::async_trait;
use common::ExternalMenuId;
use domain::{MenuImage, MenuLayout};

use crate::error::Result;

/// Byte-size ceiling the platform enforces on menu images.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Everything the platform needs to create a menu resource.
#[derive(Debug, Clone)]
pub struct CreateMenuRequest {
    /// Menu name shown in the platform console.
    pub name: String,
    /// Label shown on the chat bar while the menu is collapsed.
    pub chat_bar_text: String,
    /// Whether the menu opens expanded by default.
    pub selected: bool,
    /// The tap-area layout.
    pub layout: MenuLayout,
}

/// Thin interface to the remote platform's rich-menu API.
///
/// Pure request/response; no retained state. Every call may fail with a
/// [`GatewayError`](crate::GatewayError) carrying the HTTP status and body.
/// Implementations own per-call timeouts; a timeout surfaces as an ordinary
/// call failure.
#[async_trait]
pub trait ExternalMenuGateway: Send + Sync {
    /// Checks a layout against the platform's rules without creating
    /// anything. Rejects malformed, overlapping, or out-of-range tap areas.
    async fn validate_layout(&self, layout: &MenuLayout) -> Result<()>;

    /// Creates a menu resource and returns its platform-assigned id.
    ///
    /// The resource is not servable until an image has been uploaded.
    async fn create_menu(&self, request: CreateMenuRequest) -> Result<ExternalMenuId>;

    /// Uploads the image for a created menu. Fails if the image exceeds
    /// [`MAX_IMAGE_BYTES`] or its pixel size does not exactly match the
    /// menu's declared layout size.
    async fn upload_image(&self, external_id: &ExternalMenuId, image: &MenuImage) -> Result<()>;

    /// Deletes a menu resource. Callers treat a 404 as success.
    async fn delete_menu(&self, external_id: &ExternalMenuId) -> Result<()>;

    /// Clears the account-wide default menu.
    async fn clear_platform_default(&self) -> Result<()>;

    /// Sets the account-wide default menu.
    async fn set_platform_default(&self, external_id: &ExternalMenuId) -> Result<()>;

    /// Lists every alias id known to the platform.
    async fn list_aliases(&self) -> Result<Vec<String>>;

    /// Creates an alias resolving to the given menu resource.
    async fn create_alias(&self, alias_id: &str, external_id: &ExternalMenuId) -> Result<()>;

    /// Repoints an existing alias at a different menu resource.
    async fn update_alias(&self, alias_id: &str, external_id: &ExternalMenuId) -> Result<()>;

    /// Deletes an alias.
    async fn delete_alias(&self, alias_id: &str) -> Result<()>;
}
