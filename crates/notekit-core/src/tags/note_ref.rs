use std::fmt;

use super::TagConvertible;
use crate::ids::NoteId;

/// Structural role of a note reference within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Root,
    Reply,
    Mention,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Root => "root",
            Marker::Reply => "reply",
            Marker::Mention => "mention",
        }
    }

    /// Marker implied by the total length of an `e` tag.
    ///
    /// Existing data relies on this positional rule: the marker is decided
    /// by how many elements the tag has, not by the text at index 3.
    /// 4 → root, 5 → reply, 7 → mention, anything else → none.
    pub fn from_tag_len(len: usize) -> Option<Marker> {
        match len {
            4 => Some(Marker::Root),
            5 => Some(Marker::Reply),
            7 => Some(Marker::Mention),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to another note, parsed from an `e` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteRef {
    pub note_id: NoteId,
    /// Relay hint at index 2. May be an empty string.
    pub relay: Option<String>,
    pub marker: Option<Marker>,
}

impl NoteRef {
    pub fn new(note_id: NoteId) -> Self {
        Self {
            note_id,
            relay: None,
            marker: None,
        }
    }

    pub fn with_relay(mut self, relay: impl Into<String>) -> Self {
        self.relay = Some(relay.into());
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }
}

impl TagConvertible for NoteRef {
    fn tag(&self) -> Vec<String> {
        let mut tag = vec![NoteId::KEY.to_string(), self.note_id.hex()];
        match (&self.relay, self.marker) {
            (relay, Some(marker)) => {
                tag.push(relay.clone().unwrap_or_default());
                tag.push(marker.as_str().to_string());
            }
            (Some(relay), None) => tag.push(relay.clone()),
            (None, None) => {}
        }
        tag
    }

    fn from_tag(tag: &[String]) -> Option<Self> {
        if tag.len() < 2 || tag[0] != NoteId::KEY {
            return None;
        }
        let note_id = NoteId::from_hex(&tag[1]).ok()?;
        let relay = tag.get(2).cloned();
        let marker = if tag.len() >= 4 {
            Marker::from_tag_len(tag.len())
        } else {
            None
        };

        Some(NoteRef {
            note_id,
            relay,
            marker,
        })
    }
}
