//! Typed references parsed from raw event tags.
//!
//! Parsers here are total: a malformed tag is "not this construct" and is
//! skipped, never an error.

pub mod note_ref;
pub mod ref_id;

pub use note_ref::{Marker, NoteRef};
pub use ref_id::{AddressRef, FollowRef, QuoteRef, RefId, RefKey};

use nostr_sdk::prelude::{Event, Tag};

use crate::ids::{NoteId, Pubkey};

/// Conversion between a typed reference and its raw tag sequence.
pub trait TagConvertible: Sized {
    /// Raw tag sequence for this value
    fn tag(&self) -> Vec<String>;

    /// Parse a raw tag. Returns `None` when the tag is not this construct.
    fn from_tag(tag: &[String]) -> Option<Self>;
}

/// Anything that can be viewed as a raw tag sequence.
pub trait AsTagSlice {
    fn as_tag_slice(&self) -> &[String];
}

impl AsTagSlice for Tag {
    fn as_tag_slice(&self) -> &[String] {
        self.as_slice()
    }
}

impl AsTagSlice for Vec<String> {
    fn as_tag_slice(&self) -> &[String] {
        self.as_slice()
    }
}

impl AsTagSlice for [String] {
    fn as_tag_slice(&self) -> &[String] {
        self
    }
}

impl<T: AsTagSlice + ?Sized> AsTagSlice for &T {
    fn as_tag_slice(&self) -> &[String] {
        (**self).as_tag_slice()
    }
}

/// Every `T` that parses out of `tags`, in tag order. Malformed tags are skipped.
pub fn references<T, I>(tags: I) -> impl Iterator<Item = T>
where
    T: TagConvertible,
    I: IntoIterator,
    I::Item: AsTagSlice,
{
    tags.into_iter()
        .filter_map(|tag| T::from_tag(tag.as_tag_slice()))
}

/// All note references (`e` tags) of an event
pub fn referenced_noterefs(event: &Event) -> Vec<NoteRef> {
    references(event.tags.iter()).collect()
}

/// Ids of every `e` tag that carries a valid id
pub fn referenced_ids(event: &Event) -> Vec<NoteId> {
    references::<RefId, _>(event.tags.iter())
        .filter_map(|r| match r {
            RefId::Event(id) => Some(id),
            _ => None,
        })
        .collect()
}

/// Pubkeys of every `p` tag that carries a valid key
pub fn referenced_pubkeys(event: &Event) -> Vec<Pubkey> {
    references::<RefId, _>(event.tags.iter())
        .filter_map(|r| match r {
            RefId::Pubkey(pk) => Some(pk),
            _ => None,
        })
        .collect()
}

pub fn referenced_hashtags(event: &Event) -> Vec<String> {
    references::<RefId, _>(event.tags.iter())
        .filter_map(|r| match r {
            RefId::Hashtag(t) => Some(t),
            _ => None,
        })
        .collect()
}

/// Convert raw string tags into nostr-sdk tags, skipping any that fail to parse.
pub fn to_sdk_tags<I, T>(raw: I) -> Vec<Tag>
where
    I: IntoIterator<Item = T>,
    T: AsTagSlice,
{
    raw.into_iter()
        .filter_map(|t| Tag::parse(t.as_tag_slice().to_vec()).ok())
        .collect()
}

#[cfg(test)]
pub(crate) fn raw_tags(tags: &[&[&str]]) -> Vec<Vec<String>> {
    tags.iter()
        .map(|t| t.iter().map(|s| s.to_string()).collect())
        .collect()
}
