//! Browser bridge to a hosted generative UI application
//!
//! Opens a persistent Chrome session, submits a prompt into the application's
//! composer, waits for the operator to approve the generated result, then
//! extracts the generated source files via chromiumoxide.

pub mod browser;
pub mod browser_setup;
pub mod diagnostics;
pub mod driver;
pub mod extractor;
mod flow;
pub mod locator;
pub mod navigator;
pub mod operator;
pub mod overlay;
pub mod poller;
pub mod session;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::constants::{DEFAULT_APP_URL, DEFAULT_IDENTITY_HOST};
use crate::utils::{validate_navigation_timeout, validate_poll_budget};

pub use extractor::ExtractionResult;
pub use flow::{CodegenBridge, PromptRequest, run_flow};
pub use utils::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// What to do when the operator never signals readiness
    #[serde(default)]
    pub on_poll_timeout: PollTimeoutPolicy,
}

/// Target application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_url")]
    pub url: String,

    /// A current URL containing this host means the operator must sign in
    #[serde(default = "default_identity_host")]
    pub identity_host: String,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Headless is only useful with an already signed-in profile
    #[serde(default)]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default)]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,

    /// Persistent profile; defaults to `~/.codegen-bridge/chrome-profile`
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// Fixed delays and bounds, all in milliseconds unless named otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_network_idle_timeout_ms")]
    pub network_idle_timeout_ms: u64,

    /// Client-side rendering continues after network idle
    #[serde(default = "default_initial_settle_ms")]
    pub initial_settle_ms: u64,

    #[serde(default = "default_post_login_ms")]
    pub post_login_ms: u64,

    #[serde(default = "default_relogin_settle_ms")]
    pub relogin_settle_ms: u64,

    #[serde(default = "default_fill_settle_ms")]
    pub fill_settle_ms: u64,

    #[serde(default = "default_paste_click_settle_ms")]
    pub paste_click_settle_ms: u64,

    #[serde(default = "default_post_submit_ms")]
    pub post_submit_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_max_ticks")]
    pub poll_max_ticks: u32,

    #[serde(default = "default_progress_every_ticks")]
    pub progress_every_ticks: u32,

    #[serde(default = "default_code_tab_settle_ms")]
    pub code_tab_settle_ms: u64,

    #[serde(default = "default_file_settle_ms")]
    pub file_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Files whose text is not longer than this are dropped from `files`
    #[serde(default = "default_min_file_chars")]
    pub min_file_chars: usize,

    /// Where screenshots and the manual-paste prompt go; system temp dir if unset
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,

    #[serde(default = "default_screenshots")]
    pub screenshots: bool,
}

/// Behavior after the readiness poll exhausts its bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollTimeoutPolicy {
    /// Extract whatever the page shows, without operator confirmation
    #[default]
    Extract,
    /// Fail the call with `BridgeError::ReadinessTimeout`
    Fail,
}

impl std::str::FromStr for PollTimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract" => Ok(Self::Extract),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown poll timeout policy '{}' (expected extract|fail)", other)),
        }
    }
}

fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}
fn default_identity_host() -> String {
    DEFAULT_IDENTITY_HOST.to_string()
}

fn default_window_width() -> u32 {
    1440
}
fn default_window_height() -> u32 {
    900
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}
fn default_network_idle_timeout_ms() -> u64 {
    30_000
}
fn default_initial_settle_ms() -> u64 {
    8_000
}
fn default_post_login_ms() -> u64 {
    3_000
}
fn default_relogin_settle_ms() -> u64 {
    3_000
}
fn default_fill_settle_ms() -> u64 {
    500
}
fn default_paste_click_settle_ms() -> u64 {
    300
}
fn default_post_submit_ms() -> u64 {
    5_000
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_poll_max_ticks() -> u32 {
    600
}
fn default_progress_every_ticks() -> u32 {
    60
}
fn default_code_tab_settle_ms() -> u64 {
    3_000
}
fn default_file_settle_ms() -> u64 {
    1_000
}

fn default_min_file_chars() -> usize {
    50
}
fn default_screenshots() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: default_app_url(),
            identity_host: default_identity_host(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            disable_security: false,
            window: WindowConfig::default(),
            profile_dir: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            network_idle_timeout_ms: default_network_idle_timeout_ms(),
            initial_settle_ms: default_initial_settle_ms(),
            post_login_ms: default_post_login_ms(),
            relogin_settle_ms: default_relogin_settle_ms(),
            fill_settle_ms: default_fill_settle_ms(),
            paste_click_settle_ms: default_paste_click_settle_ms(),
            post_submit_ms: default_post_submit_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_ticks: default_poll_max_ticks(),
            progress_every_ticks: default_progress_every_ticks(),
            code_tab_settle_ms: default_code_tab_settle_ms(),
            file_settle_ms: default_file_settle_ms(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_file_chars: default_min_file_chars(),
            artifact_dir: None,
            screenshots: default_screenshots(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, else the user config dir, else defaults
    ///
    /// An explicit path must exist; the implicit location is optional.
    pub fn load(path: Option<&Path>) -> BridgeResult<Config> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    BridgeError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&contents)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    let contents = fs::read_to_string(&path)?;
                    serde_yaml::from_str(&contents)?
                }
                _ => Config::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the flow cannot honor
    pub fn validate(&self) -> BridgeResult<()> {
        validate_navigation_timeout(self.timing.navigation_timeout_ms)?;
        validate_poll_budget(self.timing.poll_interval_ms, self.timing.poll_max_ticks)?;
        url::Url::parse(&self.app.url)
            .map_err(|e| BridgeError::Config(format!("Invalid app url '{}': {}", self.app.url, e)))?;
        Ok(())
    }

    /// Directory for screenshots and the manual-paste prompt file
    pub fn artifact_dir(&self) -> PathBuf {
        self.extraction
            .artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// `<config_dir>/codegen-bridge/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codegen-bridge").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let config = Config::default();
        assert_eq!(config.timing.poll_interval_ms, 1_000);
        assert_eq!(config.timing.poll_max_ticks, 600);
        assert_eq!(config.timing.initial_settle_ms, 8_000);
        assert_eq!(config.extraction.min_file_chars, 50);
        assert_eq!(config.on_poll_timeout, PollTimeoutPolicy::Extract);
        assert!(!config.browser.headless);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "timing:\n  poll_max_ticks: 30\non_poll_timeout: fail\nbrowser:\n  window:\n    width: 1920\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timing.poll_max_ticks, 30);
        assert_eq!(config.timing.poll_interval_ms, 1_000);
        assert_eq!(config.on_poll_timeout, PollTimeoutPolicy::Fail);
        assert_eq!(config.browser.window.width, 1920);
        assert_eq!(config.browser.window.height, 900);
        assert_eq!(config.app.url, DEFAULT_APP_URL);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/codegen-bridge.yaml"))).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn explicit_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "timing:\n  poll_interval_ms: 0\n").unwrap();
        assert!(matches!(
            Config::load(Some(path.as_path())).unwrap_err(),
            BridgeError::Config(_)
        ));

        fs::write(&path, "app:\n  url: https://example.test/app\n").unwrap();
        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.app.url, "https://example.test/app");
    }

    #[test]
    fn example_config_matches_defaults() {
        let config: Config = serde_yaml::from_str(include_str!("../config.example.yaml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.app.url, defaults.app.url);
        assert_eq!(config.timing.post_submit_ms, defaults.timing.post_submit_ms);
        assert_eq!(config.browser.window.width, defaults.browser.window.width);
        assert_eq!(config.on_poll_timeout, defaults.on_poll_timeout);
    }

    #[test]
    fn policy_parses_from_cli_text() {
        assert_eq!("fail".parse::<PollTimeoutPolicy>().unwrap(), PollTimeoutPolicy::Fail);
        assert!("later".parse::<PollTimeoutPolicy>().is_err());
    }
}
