//! # Realtime Event Hub
//!
//! Pushes sales events to the seller who owns the sale over a WebSocket.
//!
//! ## Fan-out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sales create/update commits                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  publisher.publish("USR001", SalesEvent::SalesCreated(..))              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  broadcast::Sender<Arc<RealtimeMessage>>  (never blocks, never fails)   │
//! │       │                                                                 │
//! │       ├──► /ws/USR001 ── recipient matches ──► sent as JSON text        │
//! │       └──► /ws/USR002 ── recipient differs ──► skipped                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Publishing with nobody connected is fine: the message is dropped.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;
use warung_core::{SalesDetail, SalesTransaction};

/// Buffered messages per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Keep-alive ping interval for idle sockets.
const PING_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// Events
// =============================================================================

/// What changed on a sale.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SalesEvent {
    SalesCreated(SalesEventData),
    SalesUpdated(SalesEventData),
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesEventData {
    pub id_htrans_jual: String,
    pub nomor_invoice: String,
    pub total_harga: i64,
    pub detail: Vec<SalesDetail>,
}

impl SalesEventData {
    fn of(sale: &SalesTransaction) -> Self {
        SalesEventData {
            id_htrans_jual: sale.header.id.clone(),
            nomor_invoice: sale.header.invoice_number.clone(),
            total_harga: sale.header.total,
            detail: sale.details.clone(),
        }
    }
}

impl SalesEvent {
    pub fn created(sale: &SalesTransaction) -> Self {
        SalesEvent::SalesCreated(SalesEventData::of(sale))
    }

    pub fn updated(sale: &SalesTransaction) -> Self {
        SalesEvent::SalesUpdated(SalesEventData::of(sale))
    }
}

/// An event addressed to one user, as sent over the socket.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    pub id: Uuid,
    pub recipient: String,
    #[serde(flatten)]
    pub event: SalesEvent,
    pub sent_at: DateTime<Utc>,
}

// =============================================================================
// Publisher
// =============================================================================

/// Delivers events to connected users.
///
/// Implementations must not block and must not fail the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, recipient_user_id: &str, event: SalesEvent);
}

/// In-process hub backed by a broadcast channel.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<Arc<RealtimeMessage>>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        RealtimeHub { tx }
    }

    /// Number of open subscriptions across all users.
    pub fn connection_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribes to the events addressed to `user_id`.
    pub fn subscribe(&self, user_id: impl Into<String>) -> UserSubscription {
        UserSubscription {
            user_id: user_id.into(),
            rx: self.tx.subscribe(),
        }
    }

    /// Serves one WebSocket until the client goes away.
    pub async fn handle_socket(self, socket: WebSocket, user_id: String) {
        let (mut sender, mut receiver) = socket.split();
        let mut subscription = self.subscribe(user_id.clone());
        let mut ping = interval(PING_INTERVAL);

        info!(user_id = %user_id, "Realtime subscriber connected");

        loop {
            tokio::select! {
                next = subscription.next() => {
                    let Some(message) = next else { break };
                    let json = match serde_json::to_string(&*message) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(user_id = %user_id, ?e, "Failed to serialize realtime message");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(user_id = %user_id, ?e, "WebSocket error");
                        break;
                    }
                },
                _ = ping.tick() => {
                    if sender.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(user_id = %user_id, "Realtime subscriber disconnected");
    }
}

impl EventPublisher for RealtimeHub {
    fn publish(&self, recipient_user_id: &str, event: SalesEvent) {
        let message = Arc::new(RealtimeMessage {
            id: Uuid::new_v4(),
            recipient: recipient_user_id.to_string(),
            event,
            sent_at: Utc::now(),
        });

        // Err only means nobody is connected
        match self.tx.send(message) {
            Ok(receivers) => debug!(recipient = %recipient_user_id, receivers, "Realtime event published"),
            Err(_) => debug!(recipient = %recipient_user_id, "Realtime event dropped, no subscribers"),
        }
    }
}

/// The stream of messages for one user.
pub struct UserSubscription {
    user_id: String,
    rx: broadcast::Receiver<Arc<RealtimeMessage>>,
}

impl UserSubscription {
    /// Next message for this user; `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Arc<RealtimeMessage>> {
        loop {
            match self.rx.recv().await {
                Ok(message) if message.recipient == self.user_id => return Some(message),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id = %self.user_id, skipped, "Realtime subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
