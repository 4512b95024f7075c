//! Finding the application's composer and submitting the prompt into it
//!
//! The composer moves between releases and may live in a nested frame, so a
//! chain of strategies is tried in order until one fills it:
//!
//! 1. [`FrameScan`]: known composer signatures in every frame
//! 2. [`MainDocumentStrategy`]: any sizeable field in the top-level document
//! 3. [`ClickPasteStrategy`]: click where the composer usually sits and paste
//!
//! The whole input phase runs at most once per [`InputLocator`]. After it, the
//! locator is latched and later calls neither fill nor submit again.

mod click_paste;
mod frame_scan;
mod main_document;

pub use click_paste::ClickPasteStrategy;
pub use frame_scan::{FrameProbe, FrameScan, ProbeMatch, default_probes, is_skipped_frame};
pub use main_document::MainDocumentStrategy;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::TimingConfig;
use crate::driver::{FrameRef, Key, PageDriver};
use crate::utils::BridgeResult;
use crate::utils::constants::PROMPT_FILE;

/// Clicks the first close affordance of a modal, if any
const DISMISS_MODAL_SCRIPT: &str = r#"(() => {
  for (const el of document.querySelectorAll('[aria-label="Close"], button')) {
    if (el.getAttribute('aria-label') === 'Close' || (el.innerText || '').trim() === '×') {
      el.click();
      return true;
    }
  }
  return false;
})()"#;

/// Where a fill landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTarget {
    pub strategy: &'static str,
    pub frame: FrameRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillConfidence {
    /// A matched element received the value and its input events
    High,
    /// Text was pasted blind
    Low,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome {
    Filled {
        target: InputTarget,
        confidence: FillConfidence,
    },
    NotFound,
    /// The input phase already ran for this request
    Latched,
}

/// Result of the input phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReport {
    pub succeeded: bool,
    pub strategy: Option<&'static str>,
    pub confidence: FillConfidence,
    pub submitted: bool,
}

impl FillReport {
    fn manual() -> Self {
        Self {
            succeeded: false,
            strategy: None,
            confidence: FillConfidence::None,
            submitted: false,
        }
    }
}

/// One way of getting the prompt into the composer
#[async_trait]
pub trait LocateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fill the composer; `Ok(None)` means this strategy found nothing
    async fn try_fill(
        &self,
        driver: &dyn PageDriver,
        prompt: &str,
    ) -> BridgeResult<Option<(InputTarget, FillConfidence)>>;
}

/// Wrap an element-finding expression into a fill script
///
/// The value goes through the prototype's setter so framework-controlled
/// inputs observe the change, then `input` and `change` bubble.
pub(crate) fn fill_element_script(finder: &str, prompt: &str) -> BridgeResult<String> {
    Ok(format!(
        r#"((value) => {{
  const el = {finder};
  if (!el) return false;
  el.focus();
  const descriptor = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
  if (descriptor && descriptor.set) {{
    descriptor.set.call(el, value);
  }} else {{
    el.value = value;
  }}
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})({value})"#,
        finder = finder,
        value = serde_json::to_string(prompt)?,
    ))
}

pub struct InputLocator<'a> {
    driver: &'a dyn PageDriver,
    strategies: Vec<Box<dyn LocateStrategy>>,
    timing: &'a TimingConfig,
    artifact_dir: PathBuf,
    phase_complete: AtomicBool,
    target: Mutex<Option<InputTarget>>,
    report: Mutex<Option<FillReport>>,
}

impl<'a> InputLocator<'a> {
    /// Locator with the standard strategy chain
    pub fn new(driver: &'a dyn PageDriver, timing: &'a TimingConfig, artifact_dir: PathBuf) -> Self {
        let strategies: Vec<Box<dyn LocateStrategy>> = vec![
            Box::new(FrameScan::default()),
            Box::new(MainDocumentStrategy),
            Box::new(ClickPasteStrategy::new(Duration::from_millis(
                timing.paste_click_settle_ms,
            ))),
        ];
        Self::with_strategies(driver, timing, artifact_dir, strategies)
    }

    pub fn with_strategies(
        driver: &'a dyn PageDriver,
        timing: &'a TimingConfig,
        artifact_dir: PathBuf,
        strategies: Vec<Box<dyn LocateStrategy>>,
    ) -> Self {
        Self {
            driver,
            strategies,
            timing,
            artifact_dir,
            phase_complete: AtomicBool::new(false),
            target: Mutex::new(None),
            report: Mutex::new(None),
        }
    }

    /// The realized target, once a fill succeeded
    pub fn target(&self) -> Option<InputTarget> {
        self.target.lock().clone()
    }

    pub fn is_latched(&self) -> bool {
        self.phase_complete.load(Ordering::SeqCst)
    }

    /// Run the strategy chain once; first success wins
    ///
    /// Strategy errors are logged and count as "not found". The latch is set
    /// after the chain regardless of the outcome.
    pub async fn locate_and_fill(&self, prompt: &str) -> LocateOutcome {
        if self.is_latched() {
            debug!("Input phase already complete, not filling again");
            return LocateOutcome::Latched;
        }

        let mut outcome = LocateOutcome::NotFound;
        for strategy in &self.strategies {
            match strategy.try_fill(self.driver, prompt).await {
                Ok(Some((target, confidence))) => {
                    info!("Prompt filled via {} in {}", target.strategy, target.frame);
                    *self.target.lock() = Some(target.clone());
                    outcome = LocateOutcome::Filled { target, confidence };
                    break;
                }
                Ok(None) => debug!("Strategy {} found nothing", strategy.name()),
                Err(e) => warn!("Strategy {} failed: {}", strategy.name(), e),
            }
        }

        self.phase_complete.store(true, Ordering::SeqCst);
        outcome
    }

    /// Fill, press Enter once, then clear any modal the submission opened
    ///
    /// When nothing could be filled the prompt is saved for manual pasting and
    /// the report says so. A latched locator returns the first report.
    pub async fn fill_and_submit(&self, prompt: &str) -> BridgeResult<FillReport> {
        let report = match self.locate_and_fill(prompt).await {
            LocateOutcome::Latched => {
                return Ok(self.report.lock().clone().unwrap_or_else(FillReport::manual));
            }
            LocateOutcome::Filled { target, confidence } => {
                tokio::time::sleep(Duration::from_millis(self.timing.fill_settle_ms)).await;
                self.driver.press_key(Key::Enter).await?;
                info!("Prompt submitted");
                FillReport {
                    succeeded: true,
                    strategy: Some(target.strategy),
                    confidence,
                    submitted: true,
                }
            }
            LocateOutcome::NotFound => {
                self.request_manual_completion(prompt).await;
                FillReport::manual()
            }
        };
        *self.report.lock() = Some(report.clone());

        tokio::time::sleep(Duration::from_millis(self.timing.post_submit_ms)).await;
        self.dismiss_modal().await;

        Ok(report)
    }

    async fn request_manual_completion(&self, prompt: &str) {
        let path = self.artifact_dir.join(PROMPT_FILE);
        let saved = match tokio::fs::create_dir_all(&self.artifact_dir).await {
            Ok(()) => tokio::fs::write(&path, prompt).await,
            Err(e) => Err(e),
        };

        warn!("COULD NOT AUTO-FILL THE PROMPT");
        warn!("Paste the prompt into the application manually and press Enter");
        match saved {
            Ok(()) => warn!("Prompt saved to {}", path.display()),
            Err(e) => warn!("Could not save prompt to {}: {}", path.display(), e),
        }
    }

    async fn dismiss_modal(&self) {
        match self.driver.evaluate(&FrameRef::Main, DISMISS_MODAL_SCRIPT).await {
            Ok(serde_json::Value::Bool(true)) => debug!("Dismissed a modal"),
            Ok(_) => {}
            Err(e) => debug!("Modal check failed: {}", e),
        }
    }
}
