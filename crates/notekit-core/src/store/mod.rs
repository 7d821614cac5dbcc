//! Single-owner in-memory aggregates fed by subscriptions.
//!
//! Neither type synchronizes internally. Share them through one owner, such
//! as [`SharedEventCounter`] or a task that holds the value.

pub mod event_counter;
pub mod event_holder;

pub use event_counter::{CountResult, EventCounter, SharedEventCounter};
pub use event_holder::EventHolder;
