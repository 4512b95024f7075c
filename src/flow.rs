//! One `generate` call from launch to extraction

use std::time::Duration;

use tracing::{error, info, warn};

use crate::diagnostics::{Checkpoints, log_survey, survey_page};
use crate::driver::PageDriver;
use crate::extractor::{CodeExtractor, ExtractionResult};
use crate::locator::InputLocator;
use crate::navigator::PageNavigator;
use crate::operator::{OperatorConsole, StdinConsole};
use crate::overlay::OverlayController;
use crate::poller::ReadinessPoller;
use crate::session::SessionStore;
use crate::utils::constants::DEBUG_SCREENSHOT;
use crate::utils::{BridgeError, BridgeResult};
use crate::{Config, PollTimeoutPolicy};

const INSPECTION_PROMPT: &str = "Press ENTER to close the browser...";

/// Prompt text to submit; never blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest(String);

impl PromptRequest {
    pub fn new(text: impl Into<String>) -> BridgeResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(BridgeError::InvalidArgument("prompt must not be empty".into()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Drive an already open page through the whole automation
///
/// Browser lifetime is the caller's concern; this only talks to the page and
/// the operator.
pub async fn run_flow(
    driver: &dyn PageDriver,
    console: &dyn OperatorConsole,
    config: &Config,
    request: &PromptRequest,
) -> BridgeResult<ExtractionResult> {
    let timing = &config.timing;
    let checkpoints = Checkpoints::from_config(config);

    let navigator = PageNavigator::new(driver, console, &config.app, timing);
    navigator
        .open(&config.app.url, Duration::from_millis(timing.initial_settle_ms))
        .await?;
    navigator.ensure_authenticated().await?;

    let overlay = OverlayController::new(driver);
    overlay.inject().await;

    match survey_page(driver).await {
        Ok(survey) => log_survey(&survey),
        Err(e) => warn!("Page survey failed: {}", e),
    }
    checkpoints.capture(driver, DEBUG_SCREENSHOT, false).await;

    let locator = InputLocator::new(driver, timing, config.artifact_dir());
    let report = locator.fill_and_submit(request.as_str()).await?;
    info!(
        "Input phase done: succeeded={} strategy={} submitted={}",
        report.succeeded,
        report.strategy.unwrap_or("manual"),
        report.submitted
    );

    // Submission and the modal dismissal both re-render the page
    overlay.inject().await;

    info!("Generation running. Iterate in the browser, then click \"Extract code\".");
    let poller = ReadinessPoller::new(
        &overlay,
        Duration::from_millis(timing.poll_interval_ms),
        timing.progress_every_ticks,
    );
    if !poller.wait_for_ready(timing.poll_max_ticks).await {
        let waited = Duration::from_millis(timing.poll_interval_ms) * timing.poll_max_ticks;
        match config.on_poll_timeout {
            PollTimeoutPolicy::Fail => return Err(BridgeError::ReadinessTimeout(waited.as_secs())),
            PollTimeoutPolicy::Extract => {
                warn!("No readiness signal after {}s, extracting anyway", waited.as_secs())
            }
        }
    }

    info!("Extracting code...");
    CodeExtractor::new(driver, timing, config.extraction.min_file_chars, &checkpoints)
        .extract_all()
        .await
}

/// Keep the browser open for inspection after an unexpected failure
pub(crate) async fn pause_for_inspection<T>(
    console: &dyn OperatorConsole,
    outcome: &BridgeResult<T>,
) {
    let Err(e) = outcome else {
        return;
    };
    error!("Error: {}", e);
    if e.skips_inspection_pause() {
        return;
    }
    if let Err(console_err) = console.confirm(INSPECTION_PROMPT).await {
        warn!("Inspection pause skipped: {}", console_err);
    }
}

/// Library entry point: submit a prompt and return the extracted files
pub struct CodegenBridge<C: OperatorConsole = StdinConsole> {
    config: Config,
    console: C,
}

impl CodegenBridge<StdinConsole> {
    pub fn new(config: Config) -> Self {
        Self::with_console(config, StdinConsole)
    }
}

impl<C: OperatorConsole> CodegenBridge<C> {
    pub fn with_console(config: Config, console: C) -> Self {
        Self { config, console }
    }

    /// Run the full automation for `prompt`
    ///
    /// A blank prompt fails before any browser is launched. The browser is
    /// released on every exit path, including Ctrl-C.
    pub async fn generate(&self, prompt: &str) -> BridgeResult<ExtractionResult> {
        let request = PromptRequest::new(prompt)?;
        let store = SessionStore::from_config(&self.config)?;
        let session = store.acquire(&self.config).await?;
        info!("Using profile {}", session.profile_dir().display());

        let outcome = tokio::select! {
            result = run_flow(session.page(), &self.console, &self.config, &request) => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                warn!("Interrupted, closing the browser");
                Err(BridgeError::Cancelled)
            }
        };

        tokio::select! {
            _ = pause_for_inspection(&self.console, &outcome) => {}
            Ok(()) = tokio::signal::ctrl_c() => {}
        }

        session.release().await;
        outcome
    }
}
