//! Network-idle polling for client-rendered pages
//!
//! chromiumoxide only reports the load event. The generative app keeps
//! fetching after load, so idleness is approximated by the page's resource
//! timing count staying unchanged for a quiet window.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::driver::{FrameRef, PageDriver};
use crate::utils::errors::BridgeError;

/// Number of resource entries the page has fetched so far
const RESOURCE_COUNT_SCRIPT: &str =
    "(() => performance.getEntriesByType('resource').length)()";

/// Quiet window that counts as network idle
pub const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Wait until the page stops issuing requests, bounded by `timeout`
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at the quiet window
/// - Returns Ok on timeout as well; idleness is best-effort
pub async fn wait_for_network_idle<D: PageDriver + ?Sized>(
    driver: &D,
    timeout: Duration,
) -> Result<(), BridgeError> {
    let start = tokio::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let mut last_count: Option<u64> = None;
    let mut quiet_since = tokio::time::Instant::now();

    loop {
        let count = match driver.evaluate(&FrameRef::Main, RESOURCE_COUNT_SCRIPT).await? {
            Value::Number(n) => n.as_u64(),
            _ => None,
        };

        if count != last_count {
            last_count = count;
            quiet_since = tokio::time::Instant::now();
        } else if quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
            debug!("Network idle after {}ms", start.elapsed().as_millis());
            return Ok(());
        }

        if start.elapsed() >= timeout {
            debug!(
                "Network still busy after {}ms, continuing",
                timeout.as_millis()
            );
            return Ok(());
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(NETWORK_QUIET_WINDOW);
    }
}
