//! Filter-driven event streams from relays.
//!
//! A [`SubscriptionManager`] turns a [`RelayTransport`] subscription into a
//! [`Subscription`] stream. Each subscription owns a producer task that
//! persists events into an [`EventStore`], forwards items through a bounded
//! channel, and closes the relay subscription once cancelled.

pub mod manager;
pub mod stats;
pub mod store;
pub mod transport;

pub use manager::{CancelHandle, Subscription, SubscriptionManager};
pub use stats::{SharedSubscriptionStats, SubscriptionInfo};
pub use store::{EventStore, MemoryEventStore};
pub use transport::{NostrClientTransport, RelayTransport, TransportSubscription};

use nostr_sdk::prelude::Event;

/// One item of a subscription stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Event { relay_url: String, event: Box<Event> },
    /// Historical backfill from `relay_url` is complete. The subscription
    /// stays open for live events.
    EndOfStoredEvents { relay_url: String },
}

impl StreamItem {
    pub fn relay_url(&self) -> &str {
        match self {
            StreamItem::Event { relay_url, .. } | StreamItem::EndOfStoredEvents { relay_url } => {
                relay_url
            }
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            StreamItem::Event { event, .. } => Some(event),
            StreamItem::EndOfStoredEvents { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("relay transport error: {0}")]
    Transport(String),
    #[error("subscription manager is shut down")]
    Shutdown,
}
