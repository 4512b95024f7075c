//! Blocking operator confirmations
//!
//! Interactive login and the post-failure inspection pause both wait for the
//! human at the keyboard. Prompts go to stderr so stdout stays reserved for the
//! JSON result.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::utils::{BridgeError, BridgeResult};

#[async_trait]
pub trait OperatorConsole: Send + Sync {
    /// Show `message` and wait until the operator acknowledges it
    async fn confirm(&self, message: &str) -> BridgeResult<()>;
}

/// Console on the process's stdin/stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConsole;

#[async_trait]
impl OperatorConsole for StdinConsole {
    async fn confirm(&self, message: &str) -> BridgeResult<()> {
        let message = message.to_string();
        let read = read_detached(move || {
            let mut stderr = io::stderr().lock();
            writeln!(stderr, "{}", message)?;
            stderr.flush()?;

            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)
        })?;

        match read.await {
            Ok(Ok(0)) => Err(BridgeError::Console("stdin closed".into())),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(BridgeError::Console("console reader exited".into())),
        }
    }
}

/// Run a blocking read on its own detached thread
///
/// The blocking pool is joined at runtime shutdown, so a read abandoned by
/// Ctrl-C would keep the process alive until the next line. A detached thread
/// dies with the process instead.
pub(crate) fn read_detached<F>(read: F) -> BridgeResult<oneshot::Receiver<io::Result<usize>>>
where
    F: FnOnce() -> io::Result<usize> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("operator-console".into())
        .spawn(move || {
            // Receiver gone means the wait was cancelled
            let _ = tx.send(read());
        })
        .map_err(|e| BridgeError::Console(format!("could not start console reader: {}", e)))?;
    Ok(rx)
}
