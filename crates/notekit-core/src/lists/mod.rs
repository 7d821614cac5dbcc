//! List and set events parsed into typed items.
//!
//! Each list kind declares an ordered table of recognized tags. A tag is
//! handled by the first table entry whose key matches; tags with no entry
//! are ignored so newer list formats still parse.

pub mod follow_pack;
pub mod interest;

pub use follow_pack::FollowPack;
pub use interest::InterestList;

use crate::tags::{AddressRef, AsTagSlice, TagConvertible};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListItem {
    Hashtag(String),
    /// Reference to an addressable interest set
    InterestSet(AddressRef),
}

impl ListItem {
    pub fn hashtag(tag: impl Into<String>) -> Self {
        ListItem::Hashtag(tag.into())
    }

    pub fn interest_set(
        kind: impl Into<String>,
        pubkey: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        ListItem::InterestSet(AddressRef::new(kind, pubkey, identifier))
    }
}

/// One recognized tag of a list format.
pub struct ListTag {
    pub key: &'static str,
    pub parse: fn(&[String]) -> Option<ListItem>,
}

fn parse_hashtag(tag: &[String]) -> Option<ListItem> {
    let value = tag.get(1)?;
    if value.is_empty() {
        return None;
    }
    Some(ListItem::Hashtag(value.clone()))
}

fn parse_interest_set(tag: &[String]) -> Option<ListItem> {
    AddressRef::parse(tag.get(1)?).map(ListItem::InterestSet)
}

/// Items carried by interest lists, in precedence order.
pub const LIST_ITEM_TAGS: &[ListTag] = &[
    ListTag {
        key: "t",
        parse: parse_hashtag,
    },
    ListTag {
        key: "a",
        parse: parse_interest_set,
    },
];

/// Parse one tag against `table`, first match wins.
pub fn parse_with(table: &[ListTag], tag: &[String]) -> Option<ListItem> {
    let key = tag.first()?;
    table
        .iter()
        .find(|entry| entry.key == key.as_str())
        .and_then(|entry| (entry.parse)(tag))
}

/// Parse every recognized tag into items, preserving tag order.
pub fn parse_list_items<I>(tags: I) -> Vec<ListItem>
where
    I: IntoIterator,
    I::Item: AsTagSlice,
{
    tags.into_iter()
        .filter_map(|tag| parse_with(LIST_ITEM_TAGS, tag.as_tag_slice()))
        .collect()
}

impl TagConvertible for ListItem {
    fn tag(&self) -> Vec<String> {
        match self {
            ListItem::Hashtag(t) => vec!["t".to_string(), t.clone()],
            ListItem::InterestSet(addr) => vec!["a".to_string(), addr.to_string()],
        }
    }

    fn from_tag(tag: &[String]) -> Option<Self> {
        parse_with(LIST_ITEM_TAGS, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::raw_tags;

    #[test]
    fn test_interest_tags_ignore_d() {
        let tags = raw_tags(&[
            &["d", "abc"],
            &["t", "bitcoin"],
            &["a", "30000:deadbeef:list1"],
        ]);
        assert_eq!(
            parse_list_items(&tags),
            vec![
                ListItem::hashtag("bitcoin"),
                ListItem::interest_set("30000", "deadbeef", "list1"),
            ]
        );
    }

    #[test]
    fn test_unknown_and_malformed_tags_skipped() {
        let tags = raw_tags(&[
            &["zz", "future"],
            &["t"],
            &["t", ""],
            &["a", "30000:deadbeef"],
            &[],
            &["t", "nostr"],
        ]);
        assert_eq!(parse_list_items(&tags), vec![ListItem::hashtag("nostr")]);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        fn never(_: &[String]) -> Option<ListItem> {
            None
        }
        let table = [
            ListTag {
                key: "t",
                parse: never,
            },
            ListTag {
                key: "t",
                parse: parse_hashtag,
            },
        ];
        let tag = vec!["t".to_string(), "x".to_string()];
        assert_eq!(parse_with(&table, &tag), None);
    }

    #[test]
    fn test_items_reserialize_to_equivalent_tags() {
        let tags = raw_tags(&[&["t", "bitcoin"], &["a", "30015:abc:my:set"]]);
        let items = parse_list_items(&tags);
        let again: Vec<Vec<String>> = items.iter().map(|i| i.tag()).collect();
        assert_eq!(again, tags);
        assert_eq!(parse_list_items(&again), items);
    }
}
