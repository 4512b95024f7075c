pub mod constants;
mod errors;
mod timeout;
mod wait_for_idle;

pub use errors::{BridgeError, BridgeResult};
pub use timeout::{
    MAX_NAVIGATION_TIMEOUT_MS, validate_navigation_timeout, validate_poll_budget,
};
pub use wait_for_idle::{NETWORK_QUIET_WINDOW, wait_for_network_idle};
