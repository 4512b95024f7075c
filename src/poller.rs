//! Bounded wait for the operator's go-ahead

use std::time::Duration;

use tracing::{debug, info};

use crate::overlay::OverlayController;

pub struct ReadinessPoller<'a> {
    overlay: &'a OverlayController<'a>,
    interval: Duration,
    progress_every: u32,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(overlay: &'a OverlayController<'a>, interval: Duration, progress_every: u32) -> Self {
        Self {
            overlay,
            interval,
            progress_every,
        }
    }

    /// Poll the readiness signal once per interval, at most `max_ticks` times
    ///
    /// Returns true on the first tick the signal is set, false when the bound
    /// is exhausted. Errors inside a tick are ignored; the page may be
    /// re-rendering.
    pub async fn wait_for_ready(&self, max_ticks: u32) -> bool {
        info!("Waiting for the operator to click \"Extract code\"...");

        for tick in 1..=max_ticks {
            tokio::time::sleep(self.interval).await;

            match self.check().await {
                Ok(true) => {
                    info!("Operator signalled ready after {} polls", tick);
                    return true;
                }
                Ok(false) => {}
                Err(e) => debug!("Poll {} failed: {}", tick, e),
            }

            if self.progress_every > 0 && tick % self.progress_every == 0 {
                let waited = self.interval * tick;
                info!("Still waiting ({} min)", waited.as_secs() / 60);
            }
        }
        false
    }

    async fn check(&self) -> crate::BridgeResult<bool> {
        self.overlay.ensure_present().await?;
        self.overlay.is_ready().await
    }
}
