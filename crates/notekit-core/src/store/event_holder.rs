use std::collections::HashSet;
use std::fmt;

use nostr_sdk::prelude::Event;

use crate::ids::NoteId;

type QueueCallback = Box<dyn FnMut(&Event) + Send>;

/// Timeline contents: events newest first, unique by id.
///
/// While queueing is enabled, admitted events wait in `incoming` until
/// [`EventHolder::flush`] merges them. Ids are tracked across both the
/// displayed list and the queue, so an event is admitted once.
#[derive(Default)]
pub struct EventHolder {
    seen: HashSet<NoteId>,
    events: Vec<Event>,
    incoming: Vec<Event>,
    should_queue: bool,
    on_queue: Option<QueueCallback>,
}

impl fmt::Debug for EventHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHolder")
            .field("events", &self.events.len())
            .field("incoming", &self.incoming.len())
            .field("should_queue", &self.should_queue)
            .finish()
    }
}

impl EventHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_queue(&mut self, should_queue: bool) {
        self.should_queue = should_queue;
    }

    pub fn should_queue(&self) -> bool {
        self.should_queue
    }

    /// Called once for every event that lands in the queue
    pub fn set_on_queue(&mut self, callback: impl FnMut(&Event) + Send + 'static) {
        self.on_queue = Some(Box::new(callback));
    }

    /// Returns `true` when the event was not seen before. Later inserts of
    /// the same id return `false` even if the payload differs.
    pub fn insert(&mut self, event: Event) -> bool {
        if !self.seen.insert(NoteId::from(event.id)) {
            return false;
        }

        if self.should_queue {
            if let Some(callback) = self.on_queue.as_mut() {
                callback(&event);
            }
            self.incoming.push(event);
        } else {
            insert_sorted(&mut self.events, event);
        }
        true
    }

    /// Merge queued events into the displayed list. Returns whether anything moved.
    pub fn flush(&mut self) -> bool {
        if self.incoming.is_empty() {
            return false;
        }
        for event in std::mem::take(&mut self.incoming) {
            insert_sorted(&mut self.events, event);
        }
        true
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn incoming(&self) -> &[Event] {
        &self.incoming
    }

    pub fn queued(&self) -> usize {
        self.incoming.len()
    }

    /// Displayed events followed by queued ones
    pub fn all_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().chain(self.incoming.iter())
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.seen.contains(id)
    }

    /// Drop every event and forget seen ids.
    pub fn reset(&mut self) {
        self.events.clear();
        self.incoming.clear();
        self.seen.clear();
    }

    /// Displayed events only
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// Newest first; ties keep arrival order.
fn insert_sorted(events: &mut Vec<Event>, event: Event) {
    let pos = events.partition_point(|e| e.created_at >= event.created_at);
    events.insert(pos, event);
}
