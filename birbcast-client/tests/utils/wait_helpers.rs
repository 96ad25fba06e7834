use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;

/// Upper bound for any single wait. Generous so paused-clock tests always
/// reach their reconnect deadlines first.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for real network round trips (ms).
pub const NETWORK_TIMEOUT_MS: u64 = 5000;

/// Waits until the watched value satisfies `pred` and returns it.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    pred: impl FnMut(&T) -> bool,
) -> Result<T> {
    let value = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(pred))
        .await
        .context("Timed out waiting for state")?
        .context("Sender dropped while waiting for state")?;
    Ok(value.clone())
}
