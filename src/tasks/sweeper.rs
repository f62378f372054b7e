//! Expiration Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::handle::CacheInner;

/// Spawns a background task that purges expired entries from a cache every
/// `interval`.
///
/// The task holds only a weak reference to the cache internals, so it never
/// keeps a dropped cache alive: when the last handle goes away the upgrade
/// fails and the task exits. Dropping the cache also fires `stop_rx`, which
/// ends the task immediately instead of on its next tick.
///
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_sweeper<V>(
    cache: Weak<CacheInner<V>>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("starting expiration sweeper with interval of {:?}", interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let Some(cache) = cache.upgrade() else {
                        debug!("sweeper exiting: cache dropped");
                        break;
                    };
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        info!("sweep removed {} expired entries", removed);
                    } else {
                        debug!("sweep found no expired entries");
                    }
                }
                _ = &mut stop_rx => {
                    debug!("sweeper exiting: stop signal received");
                    break;
                }
            }
        }
    })
}
