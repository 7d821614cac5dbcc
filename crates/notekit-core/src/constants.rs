//! Application-wide constants
//!
//! Centralized location for protocol values and defaults that are used
//! across multiple modules.

/// Default Nostr relay URL
pub const RELAY_URL: &str = "wss://relay.damus.io";

/// Default capacity of the bounded channel between a subscription's
/// producer task and its consumer.
pub const SUBSCRIPTION_BUFFER: usize = 256;

/// Closed subscriptions whose stats are kept for inspection
pub const CLOSED_SUBSCRIPTION_HISTORY: usize = 32;

/// Blossom authorization lifetime in seconds
pub const BLOSSOM_AUTH_TTL_SECS: u64 = 300;

/// Separator between ciphertext and IV in the base64 DM encoding
pub const BASE64_IV_MARKER: &str = "?iv=";

/// Separator between ciphertext and IV in the bech32 DM encoding
pub const BECH32_IV_SEPARATOR: char = '_';

// Nostr event kinds used by the core
pub mod kinds {
    /// Text note
    pub const TEXT_NOTE: u16 = 1;
    /// Contact list
    pub const CONTACTS: u16 = 3;
    /// Legacy encrypted direct message (NIP-04)
    pub const DIRECT_MESSAGE: u16 = 4;
    /// Reaction (NIP-25)
    pub const REACTION: u16 = 7;
    /// Interest list (NIP-51)
    pub const INTEREST_LIST: u16 = 10015;
    /// Blossom authorization (BUD-01)
    pub const BLOSSOM_AUTH: u16 = 24242;
    /// HTTP auth (NIP-98)
    pub const HTTP_AUTH: u16 = 27235;
    /// Interest set (NIP-51, addressable)
    pub const INTEREST_SET: u16 = 30015;
    /// Follow pack / curated people list
    pub const FOLLOW_PACK: u16 = 39089;
}

// Bech32 human-readable prefixes
pub mod hrp {
    pub const NOTE: &str = "note";
    pub const NPUB: &str = "npub";
    pub const NSEC: &str = "nsec";
    /// Ciphertext half of a bech32-encoded encrypted message
    pub const CIPHERTEXT: &str = "pzap";
    /// IV half of a bech32-encoded encrypted message
    pub const IV: &str = "iv";
}
