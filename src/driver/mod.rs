//! Page driver abstraction
//!
//! Every component talks to the live page through [`PageDriver`]. The
//! production implementation is [`ChromiumPage`]; tests substitute an
//! in-memory page so the automation protocol runs without a browser.

mod chromium;

pub use chromium::ChromiumPage;
pub(crate) use chromium::STEALTH_SCRIPT;

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::utils::BridgeError;

/// A frame in the page's frame tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameRef {
    /// Top-level document
    Main,
    /// Child frame by CDP frame id
    Child(String),
}

impl std::fmt::Display for FrameRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameRef::Main => write!(f, "main"),
            FrameRef::Child(id) => write!(f, "frame:{}", id),
        }
    }
}

/// One frame plus its resolved URL, re-enumerated for every locate attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCandidate {
    pub frame: FrameRef,
    pub url: String,
}

/// Keys the automation presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    /// Platform select-all chord (Meta+A on macOS, Control+A elsewhere)
    SelectAll,
    /// Platform paste chord (Meta+V on macOS, Control+V elsewhere)
    Paste,
}

/// Operations on one live page
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for the load event, bounded by the navigation timeout
    async fn goto(&self, url: &str) -> Result<(), BridgeError>;

    /// Current top-level URL
    async fn current_url(&self) -> Result<String, BridgeError>;

    /// Snapshot of the frame tree, main frame included
    async fn frames(&self) -> Result<Vec<FrameCandidate>, BridgeError>;

    /// Evaluate a JavaScript expression in a frame and return its JSON value
    ///
    /// Scripts are self-invoking expressions; `undefined` maps to `Value::Null`.
    async fn evaluate(&self, frame: &FrameRef, script: &str) -> Result<Value, BridgeError>;

    /// Serialized HTML of the top-level document
    async fn content(&self) -> Result<String, BridgeError>;

    /// Viewport size in CSS pixels
    async fn viewport(&self) -> Result<(f64, f64), BridgeError>;

    /// Left click at viewport coordinates
    async fn click_at(&self, x: f64, y: f64) -> Result<(), BridgeError>;

    async fn press_key(&self, key: Key) -> Result<(), BridgeError>;

    /// Place text on the operating system clipboard
    async fn write_clipboard(&self, text: &str) -> Result<(), BridgeError>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError>;
}
