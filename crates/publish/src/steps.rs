//! Menu publish saga constants.

/// The saga type identifier for menu publishing.
pub const SAGA_TYPE: &str = "MenuPublish";

/// Step name: Validate the layout against platform rules.
pub const STEP_VALIDATE_LAYOUT: &str = "validate_layout";

/// Step name: Create the menu resource on the platform.
pub const STEP_CREATE_MENU: &str = "create_menu";

/// Step name: Upload the menu image.
pub const STEP_UPLOAD_IMAGE: &str = "upload_image";

/// Step name: Repoint an alias at the replacement resource.
pub const STEP_REPOINT_ALIAS: &str = "repoint_alias";

/// Step name: Delete the replaced menu resource.
pub const STEP_DELETE_OLD_MENU: &str = "delete_old_menu";

/// Step name: Create the menu's suggested alias.
pub const STEP_CREATE_SUGGESTED_ALIAS: &str = "create_suggested_alias";
