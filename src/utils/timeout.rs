//! Timeout validation for configured browser waits

use std::time::Duration;

use crate::utils::errors::BridgeError;

/// Maximum timeout for navigation (5 minutes)
/// Covers slow identity redirects and heavy client-side apps
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000;

/// Maximum readiness poll interval (1 minute)
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Validate the navigation timeout
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(BridgeError::Config)` - If timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
pub fn validate_navigation_timeout(ms: u64) -> Result<Duration, BridgeError> {
    if ms == 0 {
        return Err(BridgeError::Config(
            "Navigation timeout must be greater than zero".to_string(),
        ));
    }

    if ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(BridgeError::Config(format!(
            "Navigation timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            ms,
            ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(ms))
}

/// Validate the readiness poll interval and iteration bound
pub fn validate_poll_budget(interval_ms: u64, max_ticks: u32) -> Result<Duration, BridgeError> {
    if interval_ms == 0 || interval_ms > MAX_POLL_INTERVAL_MS {
        return Err(BridgeError::Config(format!(
            "Poll interval must be between 1ms and {}ms. Received: {}ms",
            MAX_POLL_INTERVAL_MS, interval_ms
        )));
    }

    if max_ticks == 0 {
        return Err(BridgeError::Config(
            "Poll bound must allow at least one tick".to_string(),
        ));
    }

    Ok(Duration::from_millis(interval_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_timeout_bounds() {
        assert_eq!(
            validate_navigation_timeout(45_000).unwrap(),
            Duration::from_secs(45)
        );
        assert!(validate_navigation_timeout(0).is_err());
        assert!(validate_navigation_timeout(MAX_NAVIGATION_TIMEOUT_MS + 1).is_err());
    }

    #[test]
    fn poll_budget_rejects_zero() {
        assert!(validate_poll_budget(0, 600).is_err());
        assert!(validate_poll_budget(1_000, 0).is_err());
        assert_eq!(
            validate_poll_budget(1_000, 600).unwrap(),
            Duration::from_secs(1)
        );
    }
}
