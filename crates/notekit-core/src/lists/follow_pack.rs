use nostr_sdk::prelude::{Event, Kind};

use crate::constants::kinds;
use crate::ids::Pubkey;
use crate::tags::{AddressRef, AsTagSlice};

/// A curated list of accounts to follow (kind 39089).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowPack {
    /// `d` tag
    pub identifier: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Topics of the pack (`t` tags)
    pub interests: Vec<String>,
    pub members: Vec<Pubkey>,
}

impl FollowPack {
    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsTagSlice,
    {
        let mut pack = FollowPack::default();

        for tag in tags {
            let tag = tag.as_tag_slice();
            let (Some(key), Some(value)) = (tag.first(), tag.get(1)) else {
                continue;
            };
            match key.as_str() {
                "d" => pack.identifier = value.clone(),
                "title" => pack.title = Some(value.clone()),
                "description" => pack.description = Some(value.clone()),
                "image" => pack.image = Some(value.clone()),
                "t" if !value.is_empty() => pack.interests.push(value.clone()),
                "p" => {
                    if let Ok(pk) = Pubkey::from_hex(value) {
                        if !pack.members.contains(&pk) {
                            pack.members.push(pk);
                        }
                    }
                }
                _ => {}
            }
        }

        pack
    }

    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind != Kind::from(kinds::FOLLOW_PACK) {
            return None;
        }
        Some(Self::from_tags(event.tags.iter()))
    }

    /// Coordinate of this pack when published by `author`
    pub fn address(&self, author: &Pubkey) -> AddressRef {
        AddressRef::new(kinds::FOLLOW_PACK.to_string(), author.hex(), self.identifier.clone())
    }

    pub fn to_tags(&self) -> Vec<Vec<String>> {
        let mut tags = vec![vec!["d".to_string(), self.identifier.clone()]];
        let optional = [
            ("title", &self.title),
            ("description", &self.description),
            ("image", &self.image),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                tags.push(vec![key.to_string(), value.clone()]);
            }
        }
        tags.extend(self.interests.iter().map(|t| vec!["t".to_string(), t.clone()]));
        tags.extend(self.members.iter().map(|pk| vec!["p".to_string(), pk.hex()]));
        tags
    }
}
