//! # Token Refresh Scheduler
//!
//! One interval loop per configured marketplace, independent of request
//! traffic.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  spawn(refresher, every)                                                │
//! │       │                                                                 │
//! │       ├──► task[shopee]: tick ─► refresh_if_expired ─► log outcome      │
//! │       └──► task[lazada]: tick ─► refresh_if_expired ─► log outcome      │
//! │                                                                         │
//! │  handle.shutdown() ──broadcast──► every task breaks out of its loop     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors never stop a loop; the next tick tries again.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use warung_core::MarketplacePlatform;

use crate::marketplace::{RefreshOutcome, TokenRefresher};

/// Running refresh loops.
pub struct RefreshScheduler {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Starts one loop per platform the refresher can handle. The first
    /// check runs immediately.
    pub fn spawn(refresher: TokenRefresher, every: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let tasks = refresher
            .platforms()
            .into_iter()
            .map(|platform| {
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(run_loop(refresher.clone(), platform, every, shutdown_rx))
            })
            .collect::<Vec<_>>();

        info!(loops = tasks.len(), interval_secs = every.as_secs(), "Token refresh scheduler started");

        RefreshScheduler { shutdown_tx, tasks }
    }

    pub fn loop_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stops every loop and waits for them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Token refresh scheduler stopped");
    }
}

async fn run_loop(
    refresher: TokenRefresher,
    platform: MarketplacePlatform,
    every: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match refresher.refresh_if_expired(platform).await {
                    Ok(RefreshOutcome::Refreshed(token)) => {
                        info!(platform = %platform, expires_at = %token.expires_at(), "Marketplace token refreshed");
                    }
                    Ok(RefreshOutcome::Fresh { expires_at }) => {
                        debug!(platform = %platform, %expires_at, "Marketplace token fresh");
                    }
                    Ok(RefreshOutcome::NoToken) => {
                        debug!(platform = %platform, "No marketplace token to refresh");
                    }
                    Err(e) => {
                        error!(platform = %platform, error = %e, "Scheduled token refresh failed");
                    }
                }
            }

            _ = shutdown_rx.recv() => {
                debug!(platform = %platform, "Refresh loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncResult;
    use crate::marketplace::TokenExchanger;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use warung_core::{MarketplaceToken, TokenSeed};
    use warung_db::{Database, DbConfig};

    struct CountingExchanger(AtomicUsize);

    #[async_trait]
    impl TokenExchanger for CountingExchanger {
        fn platform(&self) -> MarketplacePlatform {
            MarketplacePlatform::Lazada
        }

        async fn refresh(&self, current: &MarketplaceToken) -> SyncResult<TokenSeed> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(TokenSeed {
                access_token: "fresh".into(),
                refresh_token: current.refresh_token.clone(),
                ttl_secs: 604_800,
                account_id: None,
            })
        }
    }

    #[tokio::test]
    async fn test_scheduler_refreshes_expired_token_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.marketplace_tokens()
            .upsert_at(
                MarketplacePlatform::Lazada,
                &TokenSeed {
                    access_token: "stale".into(),
                    refresh_token: "rt".into(),
                    ttl_secs: 60,
                    account_id: None,
                },
                Utc::now() - ChronoDuration::hours(1),
            )
            .await
            .unwrap();

        let exchanger = Arc::new(CountingExchanger(AtomicUsize::new(0)));
        let refresher = TokenRefresher::new(db.clone()).with_exchanger(exchanger.clone());

        let scheduler = RefreshScheduler::spawn(refresher, Duration::from_millis(20));
        assert_eq!(scheduler.loop_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown().await;

        // the refreshed token is valid for a week, later ticks leave it alone
        assert_eq!(exchanger.0.load(Ordering::SeqCst), 1);
        let stored = db.marketplace_tokens().get(MarketplacePlatform::Lazada).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "fresh");
    }

    #[tokio::test]
    async fn test_no_platforms_no_loops() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let scheduler = RefreshScheduler::spawn(TokenRefresher::new(db), Duration::from_secs(60));
        assert_eq!(scheduler.loop_count(), 0);
        scheduler.shutdown().await;
    }
}
