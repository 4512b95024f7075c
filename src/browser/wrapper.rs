//! Browser process ownership
//!
//! Pairs the chromiumoxide [`Browser`] with its CDP handler task so both are
//! torn down together.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{BrowserError, BrowserResult};
use crate::BrowserConfig;
use crate::driver::ChromiumPage;

/// Wrapper for Browser and its event handler task
///
/// Handler MUST be aborted to prevent it running indefinitely after the
/// browser is closed. The profile directory is persistent and is never
/// removed here.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    closed: bool,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, profile_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            profile_dir,
            closed: false,
        }
    }

    /// Get reference to inner browser
    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Close every page, then the browser, then wait for the process to exit
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Ok(pages) = self.browser.pages().await {
            for page in pages {
                // Pages may already be gone with the renderer
                let _ = page.close().await;
            }
        }

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }

        // close() only sends the command; the process still has to be reaped
        reap(&mut self.browser, BROWSER_EXIT_GRACE).await;

        self.handler.abort();
        info!("Browser closed");
    }
}

/// How long a closed browser gets to exit before it is killed
const BROWSER_EXIT_GRACE: Duration = Duration::from_secs(10);

/// The browser's child process, as far as shutdown is concerned
#[async_trait]
pub(crate) trait BrowserProcess: Send {
    async fn wait_exit(&mut self) -> io::Result<()>;
    async fn kill(&mut self) -> io::Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn wait_exit(&mut self) -> io::Result<()> {
        self.wait().await.map(|_| ())
    }

    async fn kill(&mut self) -> io::Result<()> {
        Browser::kill(self).await.unwrap_or(Ok(()))
    }
}

/// Wait up to `grace` for the process to exit, then kill it
///
/// Returns whether it exited on its own.
pub(crate) async fn reap(process: &mut dyn BrowserProcess, grace: Duration) -> bool {
    match tokio::time::timeout(grace, process.wait_exit()).await {
        Ok(Ok(())) => return true,
        Ok(Err(e)) => warn!("Failed to wait for browser exit: {}", e),
        Err(_) => warn!("Browser still running after {:?}", grace),
    }
    warn!("Killing browser process");
    if let Err(e) = process.kill().await {
        warn!("Failed to kill browser: {}", e);
    }
    false
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        if !self.closed {
            warn!("BrowserWrapper dropped without close(); aborting handler task");
        }
        self.handler.abort();
        // Browser::drop() kills the Chrome child process
    }
}

/// Launch the browser against the operator's persistent profile
pub async fn launch_browser(
    config: &BrowserConfig,
    profile_dir: PathBuf,
) -> BrowserResult<BrowserWrapper> {
    info!("Launching browser instance");

    let (browser, handler) = crate::browser_setup::launch_browser(config, &profile_dir)
        .await
        .map_err(|e| BrowserError::LaunchFailed(format!("{:#}", e)))?;

    Ok(BrowserWrapper::new(browser, handler, profile_dir))
}

/// Create a blank page with the stealth script registered
///
/// The page must be blank when the script is registered so it runs before
/// the application's own scripts on the first real navigation.
pub async fn create_blank_page(
    wrapper: &BrowserWrapper,
    navigation_timeout: std::time::Duration,
) -> BrowserResult<ChromiumPage> {
    let page: Page = wrapper
        .browser()
        .new_page("about:blank")
        .await
        .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

    page.evaluate_on_new_document(crate::driver::STEALTH_SCRIPT)
        .await
        .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

    info!("Created blank page with stealth script");
    Ok(ChromiumPage::new(page, navigation_timeout))
}
