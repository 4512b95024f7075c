use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::BrowserConfig;
use crate::utils::constants::CHROME_USER_AGENT;

/// Chrome to drive: `CHROMIUM_PATH`, then branded Chrome, then Chromium
///
/// Branded Chrome goes first because identity providers treat it as a regular
/// browser.
fn find_browser_executable() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from) {
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Some(path);
        }
        warn!("CHROMIUM_PATH points to a missing file: {}", path.display());
    }

    let found = browser_candidates().into_iter().find(|path| path.exists());
    match &found {
        Some(path) => info!("Found browser at: {}", path.display()),
        None => warn!("No Chrome/Chromium executable found, downloading one"),
    }
    found
}

fn browser_candidates() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let mut paths: Vec<PathBuf> = vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe".into(),
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe".into(),
        ];
        if let Some(local) = dirs::data_local_dir() {
            paths.push(local.join(r"Google\Chrome\Application\chrome.exe"));
        }
        paths
    } else if cfg!(target_os = "macos") {
        let mut paths: Vec<PathBuf> =
            vec!["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into()];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("Applications/Google Chrome.app/Contents/MacOS/Google Chrome"));
        }
        paths.push("/Applications/Chromium.app/Contents/MacOS/Chromium".into());
        paths
    } else {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/opt/google/chrome/chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    }
}

/// Download Chromium into the user cache and return its executable
async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("codegen-bridge/chromium");
    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    info!("Downloading Chromium into {}", cache_dir.display());
    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("Failed to fetch browser")?;
    Ok(revision.executable_path)
}

/// Launch Chrome/Chromium against a persistent profile directory.
///
/// The profile is created if missing and is never removed: it carries the
/// operator's login between runs. Chrome's default `--enable-automation`
/// switch is left out so the identity provider sees an ordinary browser.
pub async fn launch_browser(
    config: &BrowserConfig,
    profile_dir: &Path,
) -> Result<(Browser, JoinHandle<()>)> {
    let chrome_path = match find_browser_executable() {
        Some(path) => path,
        None => download_managed_browser().await?,
    };

    std::fs::create_dir_all(profile_dir).with_context(|| {
        format!("Failed to create profile directory {}", profile_dir.display())
    })?;

    let mut config_builder = BrowserConfigBuilder::default()
        .disable_default_args()
        .request_timeout(Duration::from_secs(30))
        .window_size(config.window.width, config.window.height)
        .viewport(None)
        .user_data_dir(profile_dir)
        .chrome_executable(chrome_path);

    if config.headless {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    config_builder = config_builder
        .arg(format!("--user-agent={}", CHROME_USER_AGENT))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-timer-throttling")
        .arg("--disable-backgrounding-occluded-windows")
        .arg("--disable-renderer-backgrounding")
        .arg("--disable-breakpad")
        .arg("--disable-features=TranslateUI")
        .arg("--disable-hang-monitor")
        .arg("--disable-prompt-on-repost")
        .arg("--metrics-recording-only")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain");

    if config.disable_security {
        info!("WARNING: Disabling browser security features (disable_security=true)");
        config_builder = config_builder
            .arg("--disable-web-security")
            .arg("--disable-features=IsolateOrigins,site-per-process");
    }

    if should_disable_sandbox() {
        info!("Detected containerized environment, disabling sandbox");
        config_builder = config_builder
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");
    }

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser with profile {}", profile_dir.display());
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome emits CDP events chromiumoxide cannot deserialize; those are noise
                // https://github.com/mattsse/chromiumoxide/issues/167
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if !is_benign_serialization_error {
                    error!("Browser handler error: {:?}", e);
                } else {
                    trace!("Suppressed benign CDP serialization error: {}", error_msg);
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok((browser, handler_task))
}

/// Detect if running in containerized environment (Docker, etc.)
/// In containers, sandbox must be disabled as setuid doesn't work
fn should_disable_sandbox() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}
