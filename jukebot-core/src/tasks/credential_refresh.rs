// jukebot-core/src/tasks/credential_refresh.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::platforms::catalog::CatalogResolver;

const INITIAL_RETRY: Duration = Duration::from_secs(30);
const MAX_RETRY: Duration = Duration::from_secs(30 * 60);

/// Exponential retry delay for failed refreshes: 30 s, doubling, capped at
/// 30 min. Reset after every success.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    next: Duration,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self { next: INITIAL_RETRY }
    }
}

impl RetryBackoff {
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_RETRY);
        delay
    }

    pub fn reset(&mut self) {
        self.next = INITIAL_RETRY;
    }
}

/// Spawns the refresh loop for one provider. The first refresh runs
/// immediately; later ones run `REFRESH_LEAD` before expiry, or on the
/// retry backoff while the provider is unusable.
pub fn spawn_credential_refresh_task(
    resolver: Arc<CatalogResolver>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = RetryBackoff::default();
        loop {
            let delay = match resolver.refresh().await {
                Ok(delay) => {
                    backoff.reset();
                    delay
                }
                Err(_) => {
                    let delay = backoff.next_delay();
                    warn!(
                        "(CredentialRefresh) {} retrying in {:?}",
                        resolver.provider_name(),
                        delay
                    );
                    delay
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }
        info!("(CredentialRefresh) {} refresh task stopped", resolver.provider_name());
    })
}
