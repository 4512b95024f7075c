//! Operator control surface injected into the live page
//!
//! The overlay is a fixed-position panel with one button. Clicking it sets
//! `window.__codegenBridgeReady`, which is the only way the readiness signal
//! becomes true. The application re-renders freely, so the panel is
//! re-injected whenever it goes missing.

use serde_json::Value;
use tracing::{debug, warn};

use crate::driver::{FrameRef, PageDriver};
use crate::utils::BridgeResult;

/// Removes any previous panel, resets the signal and appends a fresh panel
pub const INJECT_SCRIPT: &str = r#"(() => {
  const previous = document.getElementById('codegen-bridge-control');
  if (previous) previous.remove();
  window.__codegenBridgeReady = false;

  const panel = document.createElement('div');
  panel.id = 'codegen-bridge-control';
  panel.style.cssText = 'position:fixed;top:16px;right:16px;z-index:2147483647;' +
    'background:#111827;color:#f9fafb;padding:12px 16px;border-radius:8px;' +
    'font:13px system-ui,sans-serif;box-shadow:0 4px 16px rgba(0,0,0,.35);';

  const status = document.createElement('div');
  status.textContent = 'Iterate until the result looks right, then extract.';
  status.style.marginBottom = '8px';

  const button = document.createElement('button');
  button.textContent = 'Extract code';
  button.style.cssText = 'background:#16a34a;color:#fff;border:0;border-radius:6px;' +
    'padding:8px 14px;font-weight:600;cursor:pointer;';
  button.addEventListener('click', () => {
    window.__codegenBridgeReady = true;
    status.textContent = 'Extracting...';
    button.disabled = true;
    button.style.opacity = '0.6';
  });

  panel.appendChild(status);
  panel.appendChild(button);
  (document.body || document.documentElement).appendChild(panel);
  return true;
})()"#;

pub const PRESENT_SCRIPT: &str =
    "(() => !!document.getElementById('codegen-bridge-control'))()";

pub const READY_SCRIPT: &str = "(() => window.__codegenBridgeReady === true)()";

pub struct OverlayController<'a> {
    driver: &'a dyn PageDriver,
}

impl<'a> OverlayController<'a> {
    pub fn new(driver: &'a dyn PageDriver) -> Self {
        Self { driver }
    }

    /// Replace the panel and reset the signal to false
    ///
    /// Failures are logged and swallowed; the page may be mid-navigation.
    pub async fn inject(&self) {
        match self.driver.evaluate(&FrameRef::Main, INJECT_SCRIPT).await {
            Ok(_) => debug!("Control panel injected"),
            Err(e) => warn!("Could not inject control panel: {}", e),
        }
    }

    pub async fn is_present(&self) -> BridgeResult<bool> {
        let value = self.driver.evaluate(&FrameRef::Main, PRESENT_SCRIPT).await?;
        Ok(value == Value::Bool(true))
    }

    pub async fn is_ready(&self) -> BridgeResult<bool> {
        let value = self.driver.evaluate(&FrameRef::Main, READY_SCRIPT).await?;
        Ok(value == Value::Bool(true))
    }

    /// Inject only when the panel has disappeared
    ///
    /// Re-injection resets the signal, so a present panel is left untouched.
    pub async fn ensure_present(&self) -> BridgeResult<()> {
        if !self.is_present().await? {
            debug!("Control panel missing, re-injecting");
            self.inject().await;
        }
        Ok(())
    }
}
