use std::fmt;

use super::TagConvertible;
use crate::ids::{NoteId, Pubkey, QuoteId};

/// Keys of the common reference tags, in the order the parser tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKey {
    E,
    P,
    Q,
    T,
    D,
    A,
    R,
}

impl RefKey {
    pub const ALL: [RefKey; 7] = [
        RefKey::E,
        RefKey::P,
        RefKey::Q,
        RefKey::T,
        RefKey::D,
        RefKey::A,
        RefKey::R,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefKey::E => "e",
            RefKey::P => "p",
            RefKey::Q => "q",
            RefKey::T => "t",
            RefKey::D => "d",
            RefKey::A => "a",
            RefKey::R => "r",
        }
    }

    pub fn from_tag_key(key: &str) -> Option<RefKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// Addressable event coordinate: `kind:pubkey:identifier`.
///
/// Components are kept as text so that coordinates from other clients are
/// preserved even when they are not strictly valid; use [`AddressRef::kind_num`]
/// and [`AddressRef::author`] for typed access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressRef {
    pub kind: String,
    pub pubkey: String,
    /// Everything after the second colon, colons included
    pub identifier: String,
}

impl AddressRef {
    pub fn new(kind: impl Into<String>, pubkey: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            pubkey: pubkey.into(),
            identifier: identifier.into(),
        }
    }

    /// Requires at least three colon-delimited components.
    pub fn parse(coordinate: &str) -> Option<Self> {
        let mut parts = coordinate.splitn(3, ':');
        let kind = parts.next()?;
        let pubkey = parts.next()?;
        let identifier = parts.next()?;
        Some(Self::new(kind, pubkey, identifier))
    }

    pub fn kind_num(&self) -> Option<u16> {
        self.kind.parse().ok()
    }

    pub fn author(&self) -> Option<Pubkey> {
        Pubkey::from_hex(&self.pubkey).ok()
    }
}

impl fmt::Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.pubkey, self.identifier)
    }
}

/// Common tag references and their values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefId {
    Event(NoteId),
    Pubkey(Pubkey),
    Quote(QuoteId),
    Hashtag(String),
    Param(String),
    Naddr(AddressRef),
    Reference(String),
}

impl RefId {
    pub fn key(&self) -> RefKey {
        match self {
            RefId::Event(_) => RefKey::E,
            RefId::Pubkey(_) => RefKey::P,
            RefId::Quote(_) => RefKey::Q,
            RefId::Hashtag(_) => RefKey::T,
            RefId::Param(_) => RefKey::D,
            RefId::Naddr(_) => RefKey::A,
            RefId::Reference(_) => RefKey::R,
        }
    }

    /// The referenced value as it appears at tag index 1
    pub fn value(&self) -> String {
        match self {
            RefId::Event(id) => id.hex(),
            RefId::Pubkey(pk) => pk.hex(),
            RefId::Quote(q) => q.hex(),
            RefId::Hashtag(s) | RefId::Param(s) | RefId::Reference(s) => s.clone(),
            RefId::Naddr(addr) => addr.to_string(),
        }
    }
}

impl TagConvertible for RefId {
    fn tag(&self) -> Vec<String> {
        vec![self.key().as_str().to_string(), self.value()]
    }

    fn from_tag(tag: &[String]) -> Option<Self> {
        if tag.len() < 2 {
            return None;
        }
        let key = RefKey::from_tag_key(&tag[0])?;
        let value = &tag[1];

        match key {
            RefKey::E => NoteId::from_hex(value).ok().map(RefId::Event),
            RefKey::P => Pubkey::from_hex(value).ok().map(RefId::Pubkey),
            RefKey::Q => QuoteId::from_hex(value).ok().map(RefId::Quote),
            RefKey::T => Some(RefId::Hashtag(value.clone())),
            RefKey::D => Some(RefId::Param(value.clone())),
            RefKey::A => AddressRef::parse(value).map(RefId::Naddr),
            RefKey::R => Some(RefId::Reference(value.clone())),
        }
    }
}

/// Entries of a contact list: followed pubkeys and followed hashtags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FollowRef {
    Pubkey(Pubkey),
    Hashtag(String),
}

impl TagConvertible for FollowRef {
    fn tag(&self) -> Vec<String> {
        match self {
            FollowRef::Pubkey(pk) => vec![Pubkey::KEY.to_string(), pk.hex()],
            FollowRef::Hashtag(t) => vec!["t".to_string(), t.clone()],
        }
    }

    fn from_tag(tag: &[String]) -> Option<Self> {
        if tag.len() < 2 {
            return None;
        }
        match tag[0].as_str() {
            "p" => Pubkey::from_hex(&tag[1]).ok().map(FollowRef::Pubkey),
            "t" => Some(FollowRef::Hashtag(tag[1].clone())),
            _ => None,
        }
    }
}

/// A `q` tag with optional relay hints at index 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteRef {
    pub quote_id: QuoteId,
    pub relay_hints: Vec<String>,
}

impl QuoteRef {
    pub fn note_id(&self) -> NoteId {
        self.quote_id.note_id()
    }
}

impl TagConvertible for QuoteRef {
    fn tag(&self) -> Vec<String> {
        let mut tag = vec![QuoteId::KEY.to_string(), self.quote_id.hex()];
        if let Some(relay) = self.relay_hints.first() {
            tag.push(relay.clone());
        }
        tag
    }

    /// Only hex ids are supported; address-style quotes yield no match.
    fn from_tag(tag: &[String]) -> Option<Self> {
        if tag.len() < 2 || tag[0] != QuoteId::KEY {
            return None;
        }
        let quote_id = QuoteId::from_hex(&tag[1]).ok()?;
        let relay_hints = tag
            .get(2)
            .filter(|r| !r.is_empty())
            .cloned()
            .into_iter()
            .collect();
        Some(QuoteRef {
            quote_id,
            relay_hints,
        })
    }
}
