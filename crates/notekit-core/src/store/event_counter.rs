use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use nostr_sdk::prelude::Event;
use parking_lot::Mutex;

use crate::ids::{NoteId, Pubkey};
use crate::tags::{references, NoteRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountResult {
    AlreadyCounted,
    /// New count for the target after this event
    Success(i64),
}

/// Counts reactions, reposts or zaps per target, once per author.
#[derive(Debug, Clone)]
pub struct EventCounter {
    our_pubkey: Pubkey,
    counts: HashMap<NoteId, i64>,
    seen: HashMap<Pubkey, HashSet<NoteId>>,
    ours: HashMap<NoteId, Event>,
}

impl EventCounter {
    pub fn new(our_pubkey: Pubkey) -> Self {
        Self {
            our_pubkey,
            counts: HashMap::new(),
            seen: HashMap::new(),
            ours: HashMap::new(),
        }
    }

    /// Count `event` toward `target`. Each `(author, target)` pair counts
    /// at most once; our own event is kept for the target.
    pub fn add_event(&mut self, event: &Event, target: NoteId) -> CountResult {
        let author = Pubkey::from(event.pubkey);

        if !self.seen.entry(author).or_default().insert(target) {
            return CountResult::AlreadyCounted;
        }

        if author == self.our_pubkey {
            self.ours.insert(target, event.clone());
        }

        let count = self.counts.entry(target).or_insert(0);
        *count += 1;
        CountResult::Success(*count)
    }

    /// Count a reaction toward the note named by its last `e` tag.
    /// Returns `None` when the event references no note.
    pub fn add_reaction(&mut self, event: &Event) -> Option<CountResult> {
        let target = references::<NoteRef, _>(event.tags.iter()).last()?.note_id;
        Some(self.add_event(event, target))
    }

    pub fn count(&self, target: &NoteId) -> i64 {
        self.counts.get(target).copied().unwrap_or(0)
    }

    pub fn our_event(&self, target: &NoteId) -> Option<&Event> {
        self.ours.get(target)
    }

    pub fn has_counted(&self, pubkey: &Pubkey, target: &NoteId) -> bool {
        self.seen
            .get(pubkey)
            .is_some_and(|targets| targets.contains(target))
    }
}

/// Mutex-guarded owner of an [`EventCounter`].
#[derive(Debug, Clone)]
pub struct SharedEventCounter {
    inner: Arc<Mutex<EventCounter>>,
}

impl SharedEventCounter {
    pub fn new(our_pubkey: Pubkey) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCounter::new(our_pubkey))),
        }
    }

    pub fn add_event(&self, event: &Event, target: NoteId) -> CountResult {
        self.inner.lock().add_event(event, target)
    }

    pub fn add_reaction(&self, event: &Event) -> Option<CountResult> {
        self.inner.lock().add_reaction(event)
    }

    pub fn count(&self, target: &NoteId) -> i64 {
        self.inner.lock().count(target)
    }

    /// Run `f` with exclusive access to the counter.
    pub fn with<R>(&self, f: impl FnOnce(&mut EventCounter) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_sdk::prelude::*;

    const TARGET: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d52";
    const OTHER: &str = "8b2be0a0ad34805d76679272c28a77dbede9adcbfdca48c681ec8b624a1208a6";

    fn reaction(keys: &Keys, targets: &[&str]) -> Event {
        let tags = targets
            .iter()
            .map(|t| Tag::event(EventId::from_hex(t).unwrap()));
        EventBuilder::new(Kind::Reaction, "+")
            .tags(tags)
            .sign_with_keys(keys)
            .unwrap()
    }

    fn target() -> NoteId {
        NoteId::from_hex(TARGET).unwrap()
    }

    #[test]
    fn test_same_author_counts_once() {
        let me = Keys::generate();
        let alice = Keys::generate();
        let mut counter = EventCounter::new(me.public_key().into());

        let first = reaction(&alice, &[TARGET]);
        let second = reaction(&alice, &[TARGET]);
        assert_eq!(counter.add_event(&first, target()), CountResult::Success(1));
        assert_eq!(counter.add_event(&second, target()), CountResult::AlreadyCounted);
        assert_eq!(counter.count(&target()), 1);
        assert!(counter.has_counted(&alice.public_key().into(), &target()));
    }

    #[test]
    fn test_distinct_authors_accumulate() {
        let me = Keys::generate();
        let mut counter = EventCounter::new(me.public_key().into());

        let a = reaction(&Keys::generate(), &[TARGET]);
        let b = reaction(&Keys::generate(), &[TARGET]);
        assert_eq!(counter.add_event(&a, target()), CountResult::Success(1));
        assert_eq!(counter.add_event(&b, target()), CountResult::Success(2));
        assert!(counter.our_event(&target()).is_none());
    }

    #[test]
    fn test_our_event_is_recorded() {
        let me = Keys::generate();
        let mut counter = EventCounter::new(me.public_key().into());

        let mine = reaction(&me, &[TARGET]);
        counter.add_event(&mine, target());
        assert_eq!(counter.our_event(&target()).map(|e| e.id), Some(mine.id));
    }

    #[test]
    fn test_reaction_targets_last_e_tag() {
        let me = Keys::generate();
        let mut counter = EventCounter::new(me.public_key().into());

        let ev = reaction(&Keys::generate(), &[OTHER, TARGET]);
        assert_eq!(counter.add_reaction(&ev), Some(CountResult::Success(1)));
        assert_eq!(counter.count(&target()), 1);
        assert_eq!(counter.count(&NoteId::from_hex(OTHER).unwrap()), 0);

        let untargeted = reaction(&Keys::generate(), &[]);
        assert_eq!(counter.add_reaction(&untargeted), None);
    }

    #[test]
    fn test_shared_counter_across_threads() {
        let me = Keys::generate();
        let shared = SharedEventCounter::new(me.public_key().into());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                let ev = reaction(&Keys::generate(), &[TARGET]);
                std::thread::spawn(move || {
                    // Each author's duplicate is rejected
                    assert!(matches!(shared.add_reaction(&ev), Some(CountResult::Success(_))));
                    assert_eq!(shared.add_reaction(&ev), Some(CountResult::AlreadyCounted));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(shared.count(&target()), 8);
        assert_eq!(shared.with(|c| c.count(&target())), 8);
    }
}
