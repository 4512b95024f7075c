//! chromiumoxide-backed [`PageDriver`]

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::FrameId;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::layout::Point;
use chromiumoxide::page::{Page, ScreenshotParams};
use chromiumoxide_cdp::cdp::browser_protocol::page::CaptureScreenshotFormat;
use serde_json::Value;
use tracing::{debug, warn};

use super::{FrameCandidate, FrameRef, Key, PageDriver};
use crate::utils::BridgeError;

/// Hides the automation flag before any page script runs
pub(crate) const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const FRAME_URL_SCRIPT: &str = "(() => location.href)()";
const VIEWPORT_SCRIPT: &str = "(() => [window.innerWidth, window.innerHeight])()";

fn page_err(e: impl std::fmt::Display) -> BridgeError {
    BridgeError::Page(e.to_string())
}

/// Modifier used for editing chords: (CDP modifier bit, key, code, virtual key code)
fn chord_modifier() -> (i64, &'static str, &'static str, i64) {
    if cfg!(target_os = "macos") {
        (4, "Meta", "MetaLeft", 91)
    } else {
        (2, "Control", "ControlLeft", 17)
    }
}

/// A live chromiumoxide page
pub struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromiumPage {
    pub fn new(page: Page, navigation_timeout: Duration) -> Self {
        Self {
            page,
            navigation_timeout,
        }
    }

    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
        code: &str,
        virtual_key: i64,
        modifiers: i64,
        text: Option<&str>,
    ) -> Result<(), BridgeError> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .code(code)
            .windows_virtual_key_code(virtual_key)
            .modifiers(modifiers);
        if let Some(text) = text {
            builder = builder.text(text).unmodified_text(text);
        }
        let params = builder.build().map_err(BridgeError::Page)?;
        self.page.execute(params).await.map_err(page_err)?;
        Ok(())
    }

    async fn press_chord(&self, letter: &str, code: &str, virtual_key: i64) -> Result<(), BridgeError> {
        let (bit, mod_key, mod_code, mod_vk) = chord_modifier();
        self.dispatch_key(DispatchKeyEventType::RawKeyDown, mod_key, mod_code, mod_vk, bit, None)
            .await?;
        self.dispatch_key(DispatchKeyEventType::RawKeyDown, letter, code, virtual_key, bit, None)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, letter, code, virtual_key, bit, None)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, mod_key, mod_code, mod_vk, 0, None)
            .await
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), BridgeError> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| {
                BridgeError::Navigation(format!(
                    "Navigation timeout after {}ms for URL: {}",
                    self.navigation_timeout.as_millis(),
                    url
                ))
            })?
            .map_err(|e| BridgeError::Navigation(format!("{}: {}", url, e)))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BridgeError::Navigation(format!("Failed to wait for page load: {}", e)))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BridgeError> {
        Ok(self.page.url().await.map_err(page_err)?.unwrap_or_default())
    }

    async fn frames(&self) -> Result<Vec<FrameCandidate>, BridgeError> {
        let main = self.page.mainframe().await.map_err(page_err)?;
        let ids = self.page.frames().await.map_err(page_err)?;

        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            let frame = if main.as_ref() == Some(&id) {
                FrameRef::Main
            } else {
                FrameRef::Child(id.inner().clone())
            };
            // Unresolvable frames still enter the snapshot; probing them fails and skips them
            let url = match self.evaluate(&frame, FRAME_URL_SCRIPT).await {
                Ok(Value::String(url)) => url,
                Ok(_) => String::new(),
                Err(e) => {
                    debug!("Could not resolve URL of {}: {}", frame, e);
                    String::new()
                }
            };
            candidates.push(FrameCandidate { frame, url });
        }
        Ok(candidates)
    }

    async fn evaluate(&self, frame: &FrameRef, script: &str) -> Result<Value, BridgeError> {
        let mut builder = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true);

        if let FrameRef::Child(id) = frame {
            let context = self
                .page
                .frame_execution_context(FrameId::new(id.clone()))
                .await
                .map_err(page_err)?
                .ok_or_else(|| BridgeError::Page(format!("No execution context for {}", frame)))?;
            builder = builder.context_id(context);
        }

        let params = builder.build().map_err(BridgeError::Page)?;
        let result = self.page.evaluate_expression(params).await.map_err(page_err)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn content(&self) -> Result<String, BridgeError> {
        self.page.content().await.map_err(page_err)
    }

    async fn viewport(&self) -> Result<(f64, f64), BridgeError> {
        let value = self.evaluate(&FrameRef::Main, VIEWPORT_SCRIPT).await?;
        let (width, height): (f64, f64) = serde_json::from_value(value)?;
        Ok((width, height))
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), BridgeError> {
        self.page.click(Point { x, y }).await.map_err(page_err)?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), BridgeError> {
        match key {
            Key::Enter => {
                self.dispatch_key(DispatchKeyEventType::KeyDown, "Enter", "Enter", 13, 0, Some("\r"))
                    .await?;
                self.dispatch_key(DispatchKeyEventType::KeyUp, "Enter", "Enter", 13, 0, None)
                    .await
            }
            Key::SelectAll => self.press_chord("a", "KeyA", 65).await,
            Key::Paste => self.press_chord("v", "KeyV", 86).await,
        }
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), BridgeError> {
        // The clipboard handle never leaves the blocking thread
        let owned = text.to_string();
        let native = tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.set_text(owned))
                .map_err(|e| e.to_string())
        })
        .await
        .unwrap_or_else(|e| Err(e.to_string()));

        if let Err(e) = native {
            warn!("System clipboard unavailable ({}), using the page clipboard", e);
            let script = format!(
                "(async () => {{ await navigator.clipboard.writeText({}); return true; }})()",
                serde_json::to_string(text)?
            );
            self.evaluate(&FrameRef::Main, &script).await?;
        }
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        let image = self.page.screenshot(params).await.map_err(page_err)?;
        tokio::fs::write(path, image).await?;
        Ok(())
    }
}
