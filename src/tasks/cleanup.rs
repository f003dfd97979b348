//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{sweep_expired, CacheState};

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task sleeps for `interval` between sweeps and holds only a weak
/// reference to the cache state, so it ends by itself once the owning cache
/// is gone. The owner aborts it through the returned handle on `destroy()`.
///
/// # Arguments
/// * `cache` - Weak reference to the cache state
/// * `interval` - Time between sweeps
pub(crate) fn spawn_cleanup_task<T>(
    cache: Weak<RwLock<CacheState<T>>>,
    interval: Duration,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(state) = cache.upgrade() else {
                debug!("Cache dropped, stopping TTL cleanup task");
                break;
            };

            let removed = sweep_expired(&state).await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
