//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use warung_core::SalesTransaction;
use warung_db::Database;
use warung_sync::{
    EventPublisher, LazadaExchanger, Notification, RealtimeHub, SalesEvent, ShopeeExchanger,
    SyncResult, TokenRefresher, WebhookNotifier,
};

use crate::auth::JwtManager;
use crate::config::AppConfig;

/// What happened to a sale, for post-commit fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleChange {
    Created,
    Updated,
}

/// Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Serves `/ws/{id_user}`.
    pub hub: RealtimeHub,
    /// Where sales events go. The hub itself unless replaced.
    pub publisher: Arc<dyn EventPublisher>,
    pub notifier: WebhookNotifier,
    pub refresher: TokenRefresher,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> SyncResult<Self> {
        let hub = RealtimeHub::new();

        let notifier = WebhookNotifier::with_timeout(
            config.notification.webhook_url.clone(),
            config.notification.webhook_secret.clone(),
            Duration::from_secs(config.notification.timeout_secs),
        )?;

        let mut refresher = TokenRefresher::new(db.clone());
        if let Some(shopee) = config.marketplace.shopee_config() {
            refresher = refresher.with_exchanger(Arc::new(ShopeeExchanger::new(shopee)?));
        }
        if let Some(lazada) = config.marketplace.lazada_config() {
            refresher = refresher.with_exchanger(Arc::new(LazadaExchanger::new(lazada)?));
        }

        info!(
            webhook = notifier.is_enabled(),
            marketplaces = ?refresher.platforms(),
            auth = config.auth.enabled,
            "Application state ready"
        );

        let jwt = JwtManager::new(config.auth.jwt_secret.clone(), config.auth.token_lifetime_secs);

        Ok(AppState {
            db,
            publisher: Arc::new(hub.clone()),
            hub,
            notifier,
            refresher,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        })
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Post-commit side effects of a sales write. Never blocks, never fails.
    pub fn announce(&self, sale: &SalesTransaction, change: SaleChange) {
        if let Some(seller) = sale.header.seller_user_id.as_deref() {
            let event = match change {
                SaleChange::Created => SalesEvent::created(sale),
                SaleChange::Updated => SalesEvent::updated(sale),
            };
            self.publisher.publish(seller, event);
        }

        let notification = match change {
            SaleChange::Created => Notification::sales_created(sale),
            SaleChange::Updated => Notification::sales_updated(sale),
        };
        // detached; the handle is dropped
        let _ = self.notifier.dispatch(notification);
    }
}
