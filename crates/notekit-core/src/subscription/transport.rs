use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use nostr_sdk::prelude::*;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::{StreamItem, SubscriptionError};

/// An open relay subscription: its id and the items relays send for it.
pub struct TransportSubscription {
    pub id: String,
    /// Ends when the transport shuts down. Relay failures never surface as
    /// errors here; the stream just ends.
    pub items: BoxStream<'static, StreamItem>,
}

/// Relay connection layer. Connection handling, reconnects and retries
/// belong to implementations, never to subscription consumers.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Issue `filter` to `relays`, or to every connected relay when empty.
    async fn subscribe(
        &self,
        filter: Filter,
        relays: &[String],
    ) -> Result<TransportSubscription, SubscriptionError>;

    /// Send CLOSE for `id`. Closing an unknown id is a no-op.
    async fn close(&self, id: &str);
}

/// [`RelayTransport`] over a connected `nostr_sdk::Client`.
#[derive(Clone)]
pub struct NostrClientTransport {
    client: Client,
}

impl NostrClientTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl RelayTransport for NostrClientTransport {
    async fn subscribe(
        &self,
        filter: Filter,
        relays: &[String],
    ) -> Result<TransportSubscription, SubscriptionError> {
        // Listen before subscribing so nothing sent in between is missed
        let notifications = self.client.notifications();

        let output = if relays.is_empty() {
            self.client.subscribe(filter, None).await
        } else {
            self.client.subscribe_to(relays.to_vec(), filter, None).await
        }
        .map_err(|e| SubscriptionError::Transport(e.to_string()))?;

        let id = output.val.to_string();
        debug!(sub_id = %id, "Opened relay subscription");

        let sub_id = id.clone();
        let items = stream::unfold(notifications, move |mut notifications| {
            let sub_id = sub_id.clone();
            async move {
                loop {
                    match notifications.recv().await {
                        Ok(RelayPoolNotification::Event {
                            relay_url,
                            subscription_id,
                            event,
                        }) if subscription_id.to_string() == sub_id => {
                            let item = StreamItem::Event {
                                relay_url: relay_url.to_string(),
                                event,
                            };
                            return Some((item, notifications));
                        }
                        Ok(RelayPoolNotification::Message {
                            relay_url,
                            message: RelayMessage::EndOfStoredEvents(id),
                        }) if id.to_string() == sub_id => {
                            let item = StreamItem::EndOfStoredEvents {
                                relay_url: relay_url.to_string(),
                            };
                            return Some((item, notifications));
                        }
                        Ok(RelayPoolNotification::Shutdown) | Err(RecvError::Closed) => {
                            debug!(sub_id = %sub_id, "Relay pool closed, ending stream");
                            return None;
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(sub_id = %sub_id, skipped, "Notification receiver lagged");
                        }
                    }
                }
            }
        })
        .boxed();

        Ok(TransportSubscription { id, items })
    }

    async fn close(&self, id: &str) {
        let sub_id = SubscriptionId::new(id);
        let _ = self.client.unsubscribe(&sub_id).await;
        debug!(sub_id = %id, "Closed relay subscription");
    }
}
