use std::time::Duration;

use tokio::sync::watch;

use crate::db;
use crate::state::SharedState;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Periodically purge expired credentials until shutdown is signaled.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Maintenance task started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = sweep(&state).await {
                tracing::error!("Maintenance sweep failed: {e}");
            }

            tokio::select! {
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::debug!("Maintenance task stopped");
    })
}

/// One pass over expired tokens and stale limiter windows.
pub async fn sweep(state: &SharedState) -> Result<(), sqlx::Error> {
    let resets = db::password_reset_tokens::delete_expired(&state.pool).await?;
    let refreshes = db::refresh_tokens::delete_expired(&state.pool).await?;
    state.login_limiter.cleanup();
    state.recovery_limiter.cleanup();
    state.reset_mail_limiter.cleanup();

    if resets > 0 || refreshes > 0 {
        tracing::info!(resets, refreshes, "Purged expired tokens");
    }
    Ok(())
}
