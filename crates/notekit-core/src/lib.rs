pub mod auth;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod ids;
pub mod lists;
pub mod store;
pub mod subscription;
pub mod tags;
pub mod thread;
pub mod tracing_setup;

// Re-export the types most callers reach for at crate root
pub use config::{ConfigError, CoreConfig};
pub use crypto::{EncEncoding, DecryptError, EncryptError};
pub use ids::{IdError, NoteId, Privkey, Pubkey, QuoteId};
pub use store::{CountResult, EventCounter, EventHolder};
pub use subscription::{StreamItem, Subscription, SubscriptionManager};
pub use tags::{Marker, NoteRef, TagConvertible};
pub use thread::{EventRef, ThreadError, ThreadReply};
