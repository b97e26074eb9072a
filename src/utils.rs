//! Miscellaneous helper utilities.

use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Spawns a task that flips `tx` to `true` on Ctrl-C.
pub fn spawn_ctrl_c_watcher(tx: watch::Sender<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("[SHUTDOWN] ctrl-c received"),
            Err(e) => warn!(error = %e, "[SHUTDOWN] signal handler failed, stopping"),
        }
        let _ = tx.send(true);
    })
}

/// Round to a fixed number of decimals for log output.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
