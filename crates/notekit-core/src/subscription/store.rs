use std::collections::HashMap;

use nostr_sdk::prelude::{Event, Filter};
use parking_lot::RwLock;

use crate::ids::NoteId;

/// Local event storage consulted and fed by subscriptions.
pub trait EventStore: Send + Sync {
    /// Store `event`. Returns `true` when its id was not stored before;
    /// inserting a known id leaves the store unchanged.
    fn insert(&self, event: &Event) -> bool;

    fn get(&self, id: &NoteId) -> Option<Event>;

    /// Stored events matching `filter`, newest first, capped by its limit.
    fn query(&self, filter: &Filter) -> Vec<Event>;
}

/// Unindexed in-memory store
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<NoteId, Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventStore for MemoryEventStore {
    fn insert(&self, event: &Event) -> bool {
        let mut events = self.events.write();
        let id = NoteId::from(event.id);
        if events.contains_key(&id) {
            return false;
        }
        events.insert(id, event.clone());
        true
    }

    fn get(&self, id: &NoteId) -> Option<Event> {
        self.events.read().get(id).cloned()
    }

    fn query(&self, filter: &Filter) -> Vec<Event> {
        let mut matched: Vec<Event> = self
            .events
            .read()
            .values()
            .filter(|event| matches_filter(filter, event))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        matched
    }
}

fn matches_filter(filter: &Filter, event: &Event) -> bool {
    if let Some(ids) = &filter.ids {
        if !ids.contains(&event.id) {
            return false;
        }
    }
    if let Some(authors) = &filter.authors {
        if !authors.contains(&event.pubkey) {
            return false;
        }
    }
    if let Some(kinds) = &filter.kinds {
        if !kinds.contains(&event.kind) {
            return false;
        }
    }
    if filter.since.is_some_and(|since| event.created_at < since) {
        return false;
    }
    if filter.until.is_some_and(|until| event.created_at > until) {
        return false;
    }

    filter.generic_tags.iter().all(|(letter, values)| {
        let key = letter.as_char().to_string();
        event.tags.iter().any(|tag| {
            let tag = tag.as_slice();
            tag.len() >= 2 && tag[0] == key && values.contains(&tag[1])
        })
    })
}
