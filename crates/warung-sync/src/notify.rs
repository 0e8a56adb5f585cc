//! # Webhook Notifier
//!
//! Best-effort notification of sales activity to an external endpoint
//! (push gateway, chat bot, ...).
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  handler (after commit)                                                 │
//! │       │ dispatch(notification)        returns immediately               │
//! │       ▼                                                                 │
//! │  tokio::spawn ──► POST {url}                                            │
//! │                   Content-Type: application/json                        │
//! │                   X-Warung-Timestamp: 1700000000                        │
//! │                   X-Warung-Signature: hex(hmac(secret, "ts.body"))      │
//! │                        │                                                │
//! │                        ├─ 2xx      ──► debug!                           │
//! │                        └─ error    ──► warn!, dropped, never retried    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use warung_core::{Money, SalesTransaction};

use crate::error::{SyncError, SyncResult};
use crate::sign::hmac_sha256_hex;

pub const TIMESTAMP_HEADER: &str = "X-Warung-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Warung-Signature";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload posted to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event: String,
    pub title: String,
    pub body: String,
    /// Seller the notification is about, when known.
    pub recipient: Option<String>,
    pub data: serde_json::Value,
}

impl Notification {
    pub fn sales_created(sale: &SalesTransaction) -> Self {
        Self::for_sale("sales_created", "Transaksi baru", sale)
    }

    pub fn sales_updated(sale: &SalesTransaction) -> Self {
        Self::for_sale("sales_updated", "Transaksi diperbarui", sale)
    }

    fn for_sale(event: &str, title: &str, sale: &SalesTransaction) -> Self {
        let header = &sale.header;
        Notification {
            event: event.to_string(),
            title: title.to_string(),
            body: format!(
                "{} {} ({} item)",
                header.invoice_number,
                Money::from_rupiah(header.total),
                sale.details.len()
            ),
            recipient: header.seller_user_id.clone(),
            data: serde_json::json!({
                "id_htrans_jual": header.id,
                "nomor_invoice": header.invoice_number,
                "total_harga": header.total,
            }),
        }
    }
}

/// Posts notifications on detached tasks.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    secret: Option<String>,
}

impl WebhookNotifier {
    /// A notifier that posts to `url`, signing when `secret` is set.
    /// With no URL every dispatch is a no-op.
    pub fn new(url: Option<String>, secret: Option<String>) -> SyncResult<Self> {
        Self::with_timeout(url, secret, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        url: Option<String>,
        secret: Option<String>,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("http client: {}", e)))?;

        let url = url.filter(|u| !u.trim().is_empty());
        if let Some(u) = &url {
            if !(u.starts_with("http://") || u.starts_with("https://")) {
                return Err(SyncError::InvalidConfig(format!(
                    "webhook url must be http(s): {}",
                    u
                )));
            }
        }

        Ok(WebhookNotifier {
            client,
            url,
            secret: secret.filter(|s| !s.is_empty()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Fires the notification and returns without waiting.
    ///
    /// The handle is only useful to tests; callers drop it.
    pub fn dispatch(&self, notification: Notification) -> Option<JoinHandle<()>> {
        let Some(url) = self.url.clone() else {
            debug!(event = %notification.event, "Webhook not configured, skipping");
            return None;
        };

        let client = self.client.clone();
        let secret = self.secret.clone();

        Some(tokio::spawn(async move {
            if let Err(e) = send(&client, &url, secret.as_deref(), &notification).await {
                warn!(event = %notification.event, error = %e, "Webhook delivery failed");
            }
        }))
    }
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    secret: Option<&str>,
    notification: &Notification,
) -> SyncResult<()> {
    let body = serde_json::to_string(notification)
        .map_err(|e| SyncError::external("webhook", e.to_string()))?;

    let mut request = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json");

    if let Some(secret) = secret {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = hmac_sha256_hex(secret, &format!("{}.{}", timestamp, body))?;
        request = request
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, signature);
    }

    let response = request
        .body(body)
        .send()
        .await
        .map_err(|e| SyncError::external("webhook", e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::external("webhook", format!("status {}", status)));
    }

    debug!(event = %notification.event, %status, "Webhook delivered");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tokio::sync::mpsc;

    fn notification() -> Notification {
        Notification {
            event: "sales_created".to_string(),
            title: "Transaksi baru".to_string(),
            body: "INV/20260131/000001 Rp 30.000 (1 item)".to_string(),
            recipient: Some("USR001".to_string()),
            data: serde_json::json!({ "id_htrans_jual": "HTJ000001" }),
        }
    }

    async fn mock_endpoint(status: StatusCode) -> (String, mpsc::Receiver<(HeaderMap, String)>) {
        let (tx, rx) = mpsc::channel(4);
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, body: String| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((headers, body)).await;
                    status
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/hook", addr), rx)
    }

    #[tokio::test]
    async fn test_dispatch_without_url_is_noop() {
        let notifier = WebhookNotifier::new(None, None).unwrap();
        assert!(!notifier.is_enabled());
        assert!(notifier.dispatch(notification()).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_posts_signed_json() {
        let (url, mut rx) = mock_endpoint(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(Some(url), Some("hook-secret".into())).unwrap();

        notifier.dispatch(notification()).unwrap().await.unwrap();

        let (headers, body) = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["event"], "sales_created");
        assert_eq!(json["recipient"], "USR001");

        let timestamp = headers[TIMESTAMP_HEADER].to_str().unwrap();
        let signature = headers[SIGNATURE_HEADER].to_str().unwrap();
        let expected = hmac_sha256_hex("hook-secret", &format!("{}.{}", timestamp, body)).unwrap();
        assert_eq!(signature, expected);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let (url, mut rx) = mock_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(Some(url), None).unwrap();

        // task completes normally even though the endpoint returned 500
        notifier.dispatch(notification()).unwrap().await.unwrap();
        let (headers, _) = rx.recv().await.unwrap();
        assert!(!headers.contains_key(SIGNATURE_HEADER));

        // nothing is listening on port 1
        let notifier = WebhookNotifier::with_timeout(
            Some("http://127.0.0.1:1/hook".into()),
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        notifier.dispatch(notification()).unwrap().await.unwrap();
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = WebhookNotifier::new(Some("ftp://example.com".into()), None).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
        assert!(!WebhookNotifier::new(Some("  ".into()), None).unwrap().is_enabled());
    }
}
