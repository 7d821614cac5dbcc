use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::constants::CLOSED_SUBSCRIPTION_HISTORY;

/// What a relay subscription asked for and what it delivered so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    /// Human-readable label, usually the manager key
    pub description: String,
    pub kinds: Vec<u16>,
    /// Filter as sent to relays (JSON)
    pub raw_filter: Option<String>,
    pub events_received: u64,
    /// Relays that reported end of stored events, in arrival order
    pub eose_relays: Vec<String>,
    pub closed: bool,
}

impl SubscriptionInfo {
    pub fn new(description: impl Into<String>, kinds: Vec<u16>) -> Self {
        Self {
            description: description.into(),
            kinds,
            raw_filter: None,
            events_received: 0,
            eose_relays: Vec::new(),
            closed: false,
        }
    }

    pub fn with_raw_filter(mut self, raw_filter: String) -> Self {
        self.raw_filter = Some(raw_filter);
        self
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    subscriptions: HashMap<String, SubscriptionInfo>,
    /// Closed subscription ids, oldest first
    closed: VecDeque<String>,
}

/// Thread-safe registry of subscription stats, keyed by relay subscription id.
///
/// Closed entries stay readable until [`CLOSED_SUBSCRIPTION_HISTORY`] newer
/// subscriptions have closed, then they are evicted.
#[derive(Debug, Clone)]
pub struct SharedSubscriptionStats {
    inner: Arc<RwLock<StatsInner>>,
    closed_history: usize,
}

impl Default for SharedSubscriptionStats {
    fn default() -> Self {
        Self::with_closed_history(CLOSED_SUBSCRIPTION_HISTORY)
    }
}

impl SharedSubscriptionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closed_history(closed_history: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StatsInner::default())),
            closed_history,
        }
    }

    pub fn register(&self, sub_id: String, info: SubscriptionInfo) {
        if let Ok(mut stats) = self.inner.write() {
            stats.closed.retain(|id| *id != sub_id);
            stats.subscriptions.insert(sub_id, info);
        }
    }

    pub fn record_event(&self, sub_id: &str) {
        if let Ok(mut stats) = self.inner.write() {
            if let Some(info) = stats.subscriptions.get_mut(sub_id) {
                info.events_received += 1;
            }
        }
    }

    pub fn record_eose(&self, sub_id: &str, relay_url: &str) {
        if let Ok(mut stats) = self.inner.write() {
            if let Some(info) = stats.subscriptions.get_mut(sub_id) {
                if !info.eose_relays.iter().any(|r| r == relay_url) {
                    info.eose_relays.push(relay_url.to_string());
                }
            }
        }
    }

    pub fn mark_closed(&self, sub_id: &str) {
        if let Ok(mut stats) = self.inner.write() {
            let newly_closed = match stats.subscriptions.get_mut(sub_id) {
                Some(info) if !info.closed => {
                    info.closed = true;
                    true
                }
                _ => false,
            };
            if !newly_closed {
                return;
            }
            stats.closed.push_back(sub_id.to_string());
            while stats.closed.len() > self.closed_history {
                if let Some(oldest) = stats.closed.pop_front() {
                    stats.subscriptions.remove(&oldest);
                }
            }
        }
    }

    pub fn get(&self, sub_id: &str) -> Option<SubscriptionInfo> {
        self.inner.read().ok()?.subscriptions.get(sub_id).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, SubscriptionInfo> {
        self.inner
            .read()
            .map(|s| s.subscriptions.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.subscriptions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
