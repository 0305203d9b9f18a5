//! Layout and image value objects for the menu domain.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a menu image / layout canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Creates a new image size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rectangle within the layout canvas, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Creates new bounds.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if this rectangle lies entirely within the given canvas.
    pub fn fits_within(&self, size: ImageSize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.saturating_add(self.width) <= size.width
            && self.y.saturating_add(self.height) <= size.height
    }

    /// Returns true if this rectangle overlaps another.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// The action fired when a tap area is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TapAction {
    /// Opens a URI.
    Uri { uri: String },

    /// Sends a text message into the chat.
    Message { text: String },

    /// Sends a postback payload to the bot server.
    Postback { data: String },

    /// Switches the user to the menu the alias currently resolves to.
    ///
    /// An empty `alias_id` is a cleared reference (the alias it pointed at
    /// was deleted) and is skipped at render time.
    SwitchMenu { alias_id: String, data: String },
}

/// One tappable region of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapArea {
    /// The region bounds within the layout canvas.
    pub bounds: Bounds,
    /// The action fired on tap.
    pub action: TapAction,
}

impl TapArea {
    /// Creates a new tap area.
    pub fn new(bounds: Bounds, action: TapAction) -> Self {
        Self { bounds, action }
    }
}

/// The full tap-area layout of a menu.
///
/// The orchestrator treats this as opaque beyond "must validate before
/// publish"; the platform enforces the detailed rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MenuLayout {
    /// Declared canvas size; the uploaded image must match it exactly.
    pub size: ImageSize,
    /// Tap areas, in display order.
    pub areas: Vec<TapArea>,
}

impl MenuLayout {
    /// Creates a new layout.
    pub fn new(size: ImageSize, areas: Vec<TapArea>) -> Self {
        Self { size, areas }
    }

    /// Returns true if the layout has no tap areas.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Returns the alias ids referenced by switch actions, in layout order.
    pub fn referenced_aliases(&self) -> Vec<&str> {
        self.areas
            .iter()
            .filter_map(|area| match &area.action {
                TapAction::SwitchMenu { alias_id, .. } if !alias_id.is_empty() => {
                    Some(alias_id.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        // The platform's full-size rich menu canvas.
        Self::new(2500, 1686)
    }
}

/// A menu image plus its declared pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Declared pixel width.
    pub width: u32,
    /// Declared pixel height.
    pub height: u32,
    /// MIME type, `image/jpeg` or `image/png`.
    pub content_type: String,
}

impl MenuImage {
    /// Creates a new menu image.
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            width,
            height,
            content_type: content_type.into(),
        }
    }

    /// Returns the declared pixel size.
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    /// Returns the image size in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
