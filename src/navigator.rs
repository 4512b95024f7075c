//! Opening the application and getting past its sign-in wall

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::driver::{FrameRef, PageDriver};
use crate::operator::OperatorConsole;
use crate::utils::{BridgeError, BridgeResult, wait_for_network_idle};
use crate::{AppConfig, TimingConfig};

pub(crate) const BODY_TEXT_SCRIPT: &str =
    "(() => document.body ? document.body.innerText : '')()";

const LOGIN_PROMPT: &str =
    "Sign in to the application in the browser window, then press ENTER to continue...";

/// Whether a page state calls for interactive sign-in
///
/// The identity host in the URL is decisive. Otherwise a sign-in affordance
/// without a sign-out one means the session is anonymous.
pub fn login_required(url: &str, body_text: &str, identity_host: &str) -> bool {
    if url.contains(identity_host) {
        return true;
    }
    body_text.contains("Sign in") && !body_text.contains("Sign out")
}

pub struct PageNavigator<'a> {
    driver: &'a dyn PageDriver,
    console: &'a dyn OperatorConsole,
    app: &'a AppConfig,
    timing: &'a TimingConfig,
}

impl<'a> PageNavigator<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        console: &'a dyn OperatorConsole,
        app: &'a AppConfig,
        timing: &'a TimingConfig,
    ) -> Self {
        Self {
            driver,
            console,
            app,
            timing,
        }
    }

    /// Navigate, wait for the network to quiet down, then let the client render
    pub async fn open(&self, url: &str, settle: Duration) -> BridgeResult<()> {
        info!("Opening {}", url);
        self.driver.goto(url).await?;

        let idle_timeout = Duration::from_millis(self.timing.network_idle_timeout_ms);
        if let Err(e) = wait_for_network_idle(self.driver, idle_timeout).await {
            debug!("Network idle check failed: {}", e);
        }

        tokio::time::sleep(settle).await;
        Ok(())
    }

    pub async fn is_auth_required(&self) -> BridgeResult<bool> {
        let url = self.driver.current_url().await?;
        let body = match self.driver.evaluate(&FrameRef::Main, BODY_TEXT_SCRIPT).await? {
            Value::String(text) => text,
            _ => String::new(),
        };
        Ok(login_required(&url, &body, &self.app.identity_host))
    }

    /// Block until the operator has signed in, then reload the application
    ///
    /// There is no timeout: the operator may need to complete MFA.
    pub async fn await_interactive_login(&self) -> BridgeResult<()> {
        warn!("Sign-in required. Complete it in the browser window.");
        self.console.confirm(LOGIN_PROMPT).await?;

        tokio::time::sleep(Duration::from_millis(self.timing.post_login_ms)).await;
        self.open(
            &self.app.url,
            Duration::from_millis(self.timing.relogin_settle_ms),
        )
        .await
    }

    pub async fn ensure_authenticated(&self) -> BridgeResult<()> {
        if !self.is_auth_required().await? {
            debug!("Already signed in");
            return Ok(());
        }

        self.await_interactive_login().await?;

        if self.is_auth_required().await? {
            let url = self.driver.current_url().await?;
            return Err(BridgeError::LoginRequired(url));
        }
        info!("Signed in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "accounts.google.com";

    #[test]
    fn identity_host_url_requires_login() {
        assert!(login_required(
            "https://accounts.google.com/v3/signin/identifier?continue=x",
            "",
            HOST
        ));
    }

    #[test]
    fn sign_in_without_sign_out_requires_login() {
        assert!(login_required("https://app.example/", "Welcome. Sign in to continue", HOST));
    }

    #[test]
    fn sign_out_present_means_signed_in() {
        assert!(!login_required(
            "https://app.example/",
            "Sign in with another account | Sign out",
            HOST
        ));
    }

    #[test]
    fn plain_page_needs_no_login() {
        assert!(!login_required("https://app.example/", "Build something", HOST));
    }

    #[test]
    fn identity_host_wins_over_body_text() {
        assert!(login_required("https://accounts.google.com/", "Sign out", HOST));
    }
}
