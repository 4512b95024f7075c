//! Shared configuration constants
//!
//! Default values and fixed markers used throughout the crate to avoid magic
//! strings in the automation scripts.

/// Chrome user agent string sent by the automated browser
///
/// Keep within a few releases of current stable; an outdated major version is
/// itself an automation signal for some identity providers.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Generative UI application opened by default
pub const DEFAULT_APP_URL: &str = "https://aistudio.google.com/apps/bundled/flash_ui";

/// Host of the identity provider the application redirects to when signed out
pub const DEFAULT_IDENTITY_HOST: &str = "accounts.google.com";

/// Chrome's per-profile exclusivity lock (a symlink on Linux/macOS)
pub const PROFILE_LOCK_FILE: &str = "SingletonLock";

/// Directory under the operator's home holding the persistent profile
pub const PROFILE_HOME_DIR: &str = ".codegen-bridge";

/// Profile directory name inside [`PROFILE_HOME_DIR`]
pub const PROFILE_DIR_NAME: &str = "chrome-profile";

/// Frame URLs containing any of these are never probed for the composer
pub const SKIPPED_FRAME_MARKERS: &[&str] = &["about:", "bscframe"];

/// Placeholders of the incremental-edit sidebar field, which is not the composer
pub const SIDEBAR_PLACEHOLDERS: &[&str] = &["Make changes", "add new features"];

/// File names written under the artifact directory
pub const DEBUG_SCREENSHOT: &str = "codegen-bridge-debug.png";
pub const CODE_TAB_SCREENSHOT: &str = "codegen-bridge-code-tab.png";
pub const RESULT_SCREENSHOT: &str = "codegen-bridge-result.png";
pub const PROMPT_FILE: &str = "codegen-bridge-prompt.txt";
