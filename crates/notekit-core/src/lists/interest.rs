use nostr_sdk::prelude::{Event, Kind, Tag};

use super::{parse_list_items, ListItem};
use crate::constants::kinds;
use crate::tags::{to_sdk_tags, AsTagSlice, TagConvertible};

/// A user's interest list (kind 10015): followed hashtags and interest sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestList {
    pub items: Vec<ListItem>,
}

impl InterestList {
    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsTagSlice,
    {
        Self {
            items: parse_list_items(tags),
        }
    }

    /// `None` when the event is not an interest list.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind != Kind::from(kinds::INTEREST_LIST) {
            return None;
        }
        Some(Self::from_tags(event.tags.iter()))
    }

    pub fn hashtags(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            ListItem::Hashtag(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn contains_hashtag(&self, hashtag: &str) -> bool {
        self.hashtags().any(|t| t.eq_ignore_ascii_case(hashtag))
    }

    /// Items in order, one tag each.
    pub fn to_tags(&self) -> Vec<Vec<String>> {
        self.items.iter().map(|item| item.tag()).collect()
    }

    pub fn to_sdk_tags(&self) -> Vec<Tag> {
        to_sdk_tags(self.to_tags())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::raw_tags;
    use nostr_sdk::prelude::{EventBuilder, Keys};

    #[test]
    fn test_from_event_checks_kind() {
        let keys = Keys::generate();
        let tags = to_sdk_tags(raw_tags(&[&["t", "Bitcoin"], &["a", "30015:abc:food"]]));

        let list = EventBuilder::new(Kind::from(10015), "")
            .tags(tags.clone())
            .sign_with_keys(&keys)
            .unwrap();
        let parsed = InterestList::from_event(&list).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert!(parsed.contains_hashtag("bitcoin"));
        assert_eq!(parsed.to_tags()[1], vec!["a", "30015:abc:food"]);

        let note = EventBuilder::new(Kind::from(1), "")
            .tags(tags)
            .sign_with_keys(&keys)
            .unwrap();
        assert!(InterestList::from_event(&note).is_none());
    }
}
