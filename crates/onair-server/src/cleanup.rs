use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use onair_api::AppState;

/// Background task that prunes verification codes and tokens nobody used
/// before they expired.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db = state.clone();
        match tokio::task::spawn_blocking(move || db.db.prune_expired_verifications(Utc::now())).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired verification rows", count);
                }
            }
            Ok(Err(e)) => {
                warn!("Cleanup error: {}", e);
            }
            Err(e) => {
                warn!("Cleanup task failed: {}", e);
            }
        }
    }
}
