//! Persistent browser session for one `generate` call
//!
//! # Profile reuse
//!
//! The profile directory is fixed per operator (`~/.codegen-bridge/chrome-profile`
//! unless configured), so the login made on the first run is resumed on every
//! later run.
//!
//! # Exclusivity
//!
//! Chrome refuses to start on a profile whose `SingletonLock` is present. A
//! crashed or killed run leaves that lock behind, so it is removed before
//! launch. This is not mutual exclusion: two concurrent calls on one profile
//! are unsupported.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Config;
use crate::browser::{BrowserWrapper, create_blank_page, launch_browser};
use crate::driver::ChromiumPage;
use crate::utils::constants::{PROFILE_DIR_NAME, PROFILE_HOME_DIR, PROFILE_LOCK_FILE};
use crate::utils::{BridgeError, BridgeResult, validate_navigation_timeout};

/// Owner of the operator's persistent profile directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    profile_dir: PathBuf,
}

impl SessionStore {
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile_dir: profile_dir.into(),
        }
    }

    /// Store rooted at the configured profile, or the operator's default one
    pub fn from_config(config: &Config) -> BridgeResult<Self> {
        match &config.browser.profile_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::for_current_operator(),
        }
    }

    /// Default profile under the current user's home directory
    pub fn for_current_operator() -> BridgeResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            BridgeError::EnvironmentUnavailable("Cannot determine home directory".into())
        })?;
        Ok(Self::new(home.join(PROFILE_HOME_DIR).join(PROFILE_DIR_NAME)))
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Remove a stale exclusivity lock left by a previous run
    ///
    /// Returns true if a lock was removed. Removal failure is logged and the
    /// launch is attempted anyway.
    pub fn clear_stale_lock(&self) -> bool {
        let lock = self.profile_dir.join(PROFILE_LOCK_FILE);

        // The lock is usually a dangling symlink, which Path::exists() reports as absent
        if std::fs::symlink_metadata(&lock).is_err() {
            return false;
        }

        match std::fs::remove_file(&lock) {
            Ok(()) => {
                info!("Removed stale lock file {}", lock.display());
                true
            }
            Err(e) => {
                warn!("Could not remove lock file {}: {}", lock.display(), e);
                false
            }
        }
    }

    /// Clear the lock, launch the browser and open a blank working page
    pub async fn acquire(&self, config: &Config) -> BridgeResult<BrowserSession> {
        let navigation_timeout = validate_navigation_timeout(config.timing.navigation_timeout_ms)?;

        self.clear_stale_lock();

        info!("Launching Chrome...");
        let mut wrapper = launch_browser(&config.browser, self.profile_dir.clone()).await?;

        match create_blank_page(&wrapper, navigation_timeout).await {
            Ok(page) => Ok(BrowserSession { wrapper, page }),
            Err(e) => {
                wrapper.close().await;
                Err(e.into())
            }
        }
    }
}

/// A launched browser plus the page the flow drives
pub struct BrowserSession {
    wrapper: BrowserWrapper,
    page: ChromiumPage,
}

impl BrowserSession {
    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    pub fn profile_dir(&self) -> &Path {
        self.wrapper.profile_dir()
    }

    /// Close all pages and the browser; the profile stays on disk
    pub async fn release(mut self) {
        info!("Releasing browser session");
        self.wrapper.close().await;
    }
}
