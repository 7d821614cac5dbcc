use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use nostr_sdk::prelude::Filter;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::stats::{SharedSubscriptionStats, SubscriptionInfo};
use super::store::EventStore;
use super::transport::RelayTransport;
use super::{StreamItem, SubscriptionError};
use crate::constants::SUBSCRIPTION_BUFFER;

/// Cancellation flag shared by a subscription, its producer task and the
/// manager. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Live stream of one relay subscription.
///
/// Items arrive through a bounded channel, so a slow consumer suspends the
/// producer instead of growing a buffer. Dropping the stream cancels it.
pub struct Subscription {
    key: String,
    sub_id: String,
    rx: mpsc::Receiver<StreamItem>,
    cancel: CancelHandle,
    eose_relays: HashSet<String>,
}

impl Subscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Relay-side subscription id
    pub fn id(&self) -> &str {
        &self.sub_id
    }

    /// Stop delivery. Items still buffered are discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Relays whose end of stored events this consumer has received
    pub fn eose_relays(&self) -> &HashSet<String> {
        &self.eose_relays
    }

    /// Whether every relay in `relays` has finished backfill
    pub fn backfilled<S: AsRef<str>>(&self, relays: &[S]) -> bool {
        relays
            .iter()
            .all(|r| self.eose_relays.contains(r.as_ref()))
    }
}

impl Stream for Subscription {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            this.rx.close();
            return Poll::Ready(None);
        }

        let item = std::task::ready!(this.rx.poll_recv(cx));
        if let Some(StreamItem::EndOfStoredEvents { relay_url }) = &item {
            this.eose_relays.insert(relay_url.clone());
        }
        Poll::Ready(item)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ActiveSubscription {
    cancel: CancelHandle,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    /// Drop entries whose producer already exited
    fn prune(active: &mut HashMap<String, ActiveSubscription>) {
        active.retain(|_, sub| !sub.task.is_finished());
    }

    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    async fn stop(self) {
        self.cancel.cancel();
        // The producer only ends by returning; a join error means it panicked
        let _ = self.task.await;
    }
}

/// Owns every running subscription, keyed by a caller-chosen logical name.
pub struct SubscriptionManager {
    transport: Arc<dyn RelayTransport>,
    store: Arc<dyn EventStore>,
    stats: SharedSubscriptionStats,
    buffer: usize,
    active: Mutex<HashMap<String, ActiveSubscription>>,
    shut_down: AtomicBool,
}

impl SubscriptionManager {
    pub fn new(transport: Arc<dyn RelayTransport>, store: Arc<dyn EventStore>) -> Self {
        Self {
            transport,
            store,
            stats: SharedSubscriptionStats::new(),
            buffer: SUBSCRIPTION_BUFFER,
            active: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Channel capacity per subscription. Values below 1 are raised to 1.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    pub fn stats(&self) -> &SharedSubscriptionStats {
        &self.stats
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Start streaming `filter` from `relays` under `key`.
    ///
    /// A subscription already running under `key` is cancelled and its relay
    /// subscription closed before the new one is issued.
    pub async fn subscribe(
        &self,
        key: impl Into<String>,
        filter: Filter,
        relays: &[String],
    ) -> Result<Subscription, SubscriptionError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(SubscriptionError::Shutdown);
        }
        let key = key.into();

        let previous = {
            let mut active = self.active.lock();
            ActiveSubscription::prune(&mut active);
            active.remove(&key)
        };
        if let Some(previous) = previous {
            debug!(key = %key, "Replacing existing subscription");
            previous.stop().await;
        }

        let kinds = filter
            .kinds
            .as_ref()
            .map(|kinds| kinds.iter().map(|k| k.as_u16()).collect())
            .unwrap_or_default();
        let raw_filter = serde_json::to_string(&filter).unwrap_or_default();

        let opened = self.transport.subscribe(filter, relays).await?;
        let sub_id = opened.id.clone();
        self.stats.register(
            sub_id.clone(),
            SubscriptionInfo::new(key.clone(), kinds).with_raw_filter(raw_filter),
        );

        let (tx, rx) = mpsc::channel(self.buffer);
        let (cancel, cancel_rx) = CancelHandle::new();

        let producer = Producer {
            sub_id: sub_id.clone(),
            items: opened.items,
            tx,
            cancel_rx,
            store: self.store.clone(),
            transport: self.transport.clone(),
            stats: self.stats.clone(),
        };
        let task = tokio::spawn(producer.run());

        info!(key = %key, sub_id = %sub_id, "Subscription started");

        let replaced = self.active.lock().insert(
            key.clone(),
            ActiveSubscription {
                cancel: cancel.clone(),
                task,
            },
        );
        // A concurrent subscribe for the same key raced us; keep the newest
        if let Some(replaced) = replaced {
            replaced.cancel.cancel();
        }

        Ok(Subscription {
            key,
            sub_id,
            rx,
            cancel,
            eose_relays: HashSet::new(),
        })
    }

    /// Cancel the subscription under `key` and wait until its relay
    /// subscription is closed. Returns whether one was running.
    pub async fn unsubscribe(&self, key: &str) -> bool {
        let removed = {
            let mut active = self.active.lock();
            let removed = active.remove(key);
            ActiveSubscription::prune(&mut active);
            removed
        };
        match removed {
            Some(active) => {
                active.stop().await;
                debug!(key, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Keys of subscriptions still delivering
    pub fn active(&self) -> Vec<String> {
        let mut active = self.active.lock();
        ActiveSubscription::prune(&mut active);
        let mut keys: Vec<String> = active
            .iter()
            .filter(|(_, sub)| sub.is_live())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Cancel everything and refuse new subscriptions.
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        let drained: Vec<ActiveSubscription> =
            self.active.lock().drain().map(|(_, sub)| sub).collect();
        let count = drained.len();
        for sub in drained {
            sub.stop().await;
        }
        info!(count, "Subscription manager shut down");
    }
}

struct Producer {
    sub_id: String,
    items: BoxStream<'static, StreamItem>,
    tx: mpsc::Sender<StreamItem>,
    cancel_rx: watch::Receiver<bool>,
    store: Arc<dyn EventStore>,
    transport: Arc<dyn RelayTransport>,
    stats: SharedSubscriptionStats,
}

impl Producer {
    async fn run(mut self) {
        loop {
            if *self.cancel_rx.borrow() {
                break;
            }

            let item = tokio::select! {
                biased;
                changed = self.cancel_rx.changed() => {
                    // Every cancel handle dropped counts as cancelled
                    if changed.is_err() || *self.cancel_rx.borrow() {
                        break;
                    }
                    continue;
                }
                item = self.items.next() => match item {
                    Some(item) => item,
                    None => {
                        debug!(sub_id = %self.sub_id, "Transport stream ended");
                        break;
                    }
                },
            };

            match &item {
                StreamItem::Event { event, .. } => {
                    self.store.insert(event);
                    self.stats.record_event(&self.sub_id);
                }
                StreamItem::EndOfStoredEvents { relay_url } => {
                    debug!(sub_id = %self.sub_id, relay = %relay_url, "End of stored events");
                    self.stats.record_eose(&self.sub_id, relay_url);
                }
            }

            // Suspends while the consumer's buffer is full
            tokio::select! {
                biased;
                _ = self.cancel_rx.changed() => break,
                sent = self.tx.send(item) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        self.transport.close(&self.sub_id).await;
        self.stats.mark_closed(&self.sub_id);
        debug!(sub_id = %self.sub_id, "Producer stopped");
    }
}
