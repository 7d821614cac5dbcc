//! Thread reconstruction from note references.
//!
//! An event's `e` tags become [`NoteRef`]s, [`interp_event_refs`] assigns each
//! one a structural role, and [`ThreadReply`] folds the roles into
//! root/reply/mention.

use nostr_sdk::prelude::Event;

use crate::tags::{referenced_noterefs, Marker, NoteRef};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadError {
    #[error("no root reference found")]
    NoRootFound,
}

/// A note reference together with its role in a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    Mention(NoteRef),
    ThreadId(NoteRef),
    Reply(NoteRef),
    ReplyToRoot(NoteRef),
}

impl EventRef {
    pub fn note_ref(&self) -> &NoteRef {
        match self {
            EventRef::Mention(r)
            | EventRef::ThreadId(r)
            | EventRef::Reply(r)
            | EventRef::ReplyToRoot(r) => r,
        }
    }

    pub fn is_mention(&self) -> Option<&NoteRef> {
        match self {
            EventRef::Mention(r) => Some(r),
            _ => None,
        }
    }

    /// The thread root, whether named as such or implied by a reply-to-root
    pub fn is_thread_id(&self) -> Option<&NoteRef> {
        match self {
            EventRef::ThreadId(r) | EventRef::ReplyToRoot(r) => Some(r),
            _ => None,
        }
    }

    /// The note being directly replied to
    pub fn is_direct_reply(&self) -> Option<&NoteRef> {
        match self {
            EventRef::Reply(r) | EventRef::ReplyToRoot(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_reply(&self) -> Option<&NoteRef> {
        self.is_direct_reply()
    }
}

/// Assign a role to each reference.
///
/// If any reference carries a marker the markers decide, and unmarked
/// references are mentions. Otherwise the legacy positional form applies: a
/// single reference is a reply to the root; with several, the first is the
/// root, the last is the reply and the rest are mentions.
pub fn interp_event_refs(refs: &[NoteRef]) -> Vec<EventRef> {
    if refs.iter().any(|r| r.marker.is_some()) {
        interp_marked(refs)
    } else {
        interp_positional(refs)
    }
}

/// Same as [`interp_event_refs`] with mentions removed
pub fn interp_event_refs_without_mentions(refs: &[NoteRef]) -> Vec<EventRef> {
    interp_event_refs(refs)
        .into_iter()
        .filter(|r| r.is_mention().is_none())
        .collect()
}

fn interp_marked(refs: &[NoteRef]) -> Vec<EventRef> {
    let has_root = refs.iter().any(|r| r.marker == Some(Marker::Root));
    let has_reply = refs.iter().any(|r| r.marker == Some(Marker::Reply));

    refs.iter()
        .cloned()
        .map(|r| match r.marker {
            Some(Marker::Root) if !has_reply => EventRef::ReplyToRoot(r),
            Some(Marker::Root) => EventRef::ThreadId(r),
            // seen in the wild: a lone reply marker standing in for the root
            Some(Marker::Reply) if !has_root => EventRef::ReplyToRoot(r),
            Some(Marker::Reply) => EventRef::Reply(r),
            Some(Marker::Mention) | None => EventRef::Mention(r),
        })
        .collect()
}

fn interp_positional(refs: &[NoteRef]) -> Vec<EventRef> {
    match refs {
        [] => Vec::new(),
        [only] => vec![EventRef::ReplyToRoot(only.clone())],
        [first, middle @ .., last] => {
            let mut out = Vec::with_capacity(refs.len());
            out.push(EventRef::ThreadId(first.clone()));
            out.extend(middle.iter().cloned().map(EventRef::Mention));
            out.push(EventRef::Reply(last.clone()));
            out
        }
    }
}

/// Root/reply/mention structure of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadReply {
    pub root: NoteRef,
    pub reply: Option<NoteRef>,
    pub mention: Option<NoteRef>,
}

impl ThreadReply {
    /// Single pass over `event_refs`; later refs of a category overwrite
    /// earlier ones, and a reply-to-root sets root and reply together.
    pub fn new(event_refs: &[EventRef]) -> Result<Self, ThreadError> {
        let mut root: Option<NoteRef> = None;
        let mut reply: Option<NoteRef> = None;
        let mut mention: Option<NoteRef> = None;

        for event_ref in event_refs {
            match event_ref {
                EventRef::ThreadId(r) => root = Some(r.clone()),
                EventRef::Reply(r) => reply = Some(r.clone()),
                EventRef::Mention(r) => mention = Some(r.clone()),
                EventRef::ReplyToRoot(r) => {
                    root = Some(r.clone());
                    reply = Some(r.clone());
                }
            }
        }

        let root = root.ok_or(ThreadError::NoRootFound)?;
        Ok(ThreadReply {
            root,
            reply,
            mention,
        })
    }

    /// Reconstruct from an event's `e` tags
    pub fn from_event(event: &Event) -> Result<Self, ThreadError> {
        let refs = referenced_noterefs(event);
        Self::new(&interp_event_refs(&refs))
    }

    pub fn is_reply_to_root(&self) -> bool {
        match &self.reply {
            None => true,
            Some(reply) => reply.note_id == self.root.note_id,
        }
    }

    /// The note this one answers: the reply target, or the root if none
    pub fn reply_target(&self) -> &NoteRef {
        self.reply.as_ref().unwrap_or(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NoteId;
    use crate::tags::{raw_tags, references, to_sdk_tags};
    use nostr_sdk::prelude::*;

    const ROOT: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d52";
    const DIRECT: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d51";
    const OTHER: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d53";

    fn nref(hex: &str) -> NoteRef {
        NoteRef::new(NoteId::from_hex(hex).unwrap())
    }

    fn refs_from(tags: &[&[&str]]) -> Vec<NoteRef> {
        references(&raw_tags(tags)).collect()
    }

    #[test]
    fn test_mention_only_has_no_root() {
        let refs = vec![EventRef::Mention(nref(ROOT))];
        assert_eq!(ThreadReply::new(&refs), Err(ThreadError::NoRootFound));
        assert_eq!(ThreadReply::new(&[]), Err(ThreadError::NoRootFound));
    }

    #[test]
    fn test_reply_to_root_sets_both_slots() {
        let r = nref(ROOT);
        let thread = ThreadReply::new(&[EventRef::ReplyToRoot(r.clone())]).unwrap();
        assert_eq!(thread.root, r);
        assert_eq!(thread.reply, Some(r));
        assert!(thread.is_reply_to_root());
    }

    #[test]
    fn test_later_refs_win() {
        let refs = vec![
            EventRef::ThreadId(nref(ROOT)),
            EventRef::Reply(nref(DIRECT)),
            EventRef::Reply(nref(OTHER)),
            EventRef::Mention(nref(DIRECT)),
            EventRef::Mention(nref(OTHER)),
        ];
        let thread = ThreadReply::new(&refs).unwrap();
        assert_eq!(thread.root.note_id.hex(), ROOT);
        assert_eq!(thread.reply.unwrap().note_id.hex(), OTHER);
        assert_eq!(thread.mention.unwrap().note_id.hex(), OTHER);
    }

    #[test]
    fn test_reply_to_root_overwrites_atomically() {
        let refs = vec![
            EventRef::ThreadId(nref(ROOT)),
            EventRef::Reply(nref(DIRECT)),
            EventRef::ReplyToRoot(nref(OTHER)),
        ];
        let thread = ThreadReply::new(&refs).unwrap();
        assert_eq!(thread.root.note_id.hex(), OTHER);
        assert_eq!(thread.reply.as_ref().unwrap().note_id.hex(), OTHER);
        assert!(thread.is_reply_to_root());
    }

    #[test]
    fn test_distinct_reply_is_not_reply_to_root() {
        let refs = vec![EventRef::ThreadId(nref(ROOT)), EventRef::Reply(nref(DIRECT))];
        let thread = ThreadReply::new(&refs).unwrap();
        assert!(!thread.is_reply_to_root());
        assert_eq!(thread.reply_target().note_id.hex(), DIRECT);

        let root_only = ThreadReply::new(&[EventRef::ThreadId(nref(ROOT))]).unwrap();
        assert!(root_only.reply.is_none());
        assert!(root_only.is_reply_to_root());
        assert_eq!(root_only.reply_target().note_id.hex(), ROOT);
    }

    #[test]
    fn test_positional_single_ref_is_reply_to_root() {
        let refs = refs_from(&[&["e", ROOT]]);
        let interp = interp_event_refs(&refs);
        assert_eq!(interp, vec![EventRef::ReplyToRoot(nref(ROOT))]);
    }

    #[test]
    fn test_positional_many_refs() {
        let refs = refs_from(&[&["e", ROOT], &["e", OTHER], &["e", DIRECT]]);
        let interp = interp_event_refs(&refs);
        assert_eq!(
            interp,
            vec![
                EventRef::ThreadId(nref(ROOT)),
                EventRef::Mention(nref(OTHER)),
                EventRef::Reply(nref(DIRECT)),
            ]
        );
        let without = interp_event_refs_without_mentions(&refs);
        assert_eq!(without.len(), 2);

        let thread = ThreadReply::new(&interp).unwrap();
        assert_eq!(thread.root.note_id.hex(), ROOT);
        assert_eq!(thread.reply.unwrap().note_id.hex(), DIRECT);
    }

    #[test]
    fn test_marked_refs_use_tag_length_markers() {
        // length 4 → root, length 5 → reply, length 7 → mention
        let refs = refs_from(&[
            &["e", ROOT, "", "root"],
            &["e", DIRECT, "", "reply", ""],
            &["e", OTHER, "", "mention", "", "", ""],
        ]);
        let interp = interp_event_refs(&refs);
        assert_eq!(interp[0].is_thread_id().unwrap().note_id.hex(), ROOT);
        assert_eq!(interp[1].is_direct_reply().unwrap().note_id.hex(), DIRECT);
        assert_eq!(interp[2].is_mention().unwrap().note_id.hex(), OTHER);
    }

    #[test]
    fn test_lone_root_marker_is_reply_to_root() {
        let refs = refs_from(&[&["e", ROOT, "", "root"]]);
        let thread = ThreadReply::new(&interp_event_refs(&refs)).unwrap();
        assert!(thread.is_reply_to_root());
        assert_eq!(thread.root.note_id.hex(), ROOT);
        assert_eq!(thread.reply.unwrap().note_id.hex(), ROOT);
    }

    #[test]
    fn test_lone_reply_marker_is_reply_to_root() {
        let refs = refs_from(&[&["e", ROOT, "", "reply", ""]]);
        let thread = ThreadReply::new(&interp_event_refs(&refs)).unwrap();
        assert_eq!(thread.root.note_id.hex(), ROOT);
        assert!(thread.is_reply_to_root());
    }

    #[test]
    fn test_marked_mention_only_is_unthreadable() {
        let refs = refs_from(&[&["e", ROOT, "", "mention", "", "", ""]]);
        assert_eq!(
            ThreadReply::new(&interp_event_refs(&refs)),
            Err(ThreadError::NoRootFound)
        );
    }

    #[test]
    fn test_from_event() {
        let keys = Keys::generate();
        let event = EventBuilder::new(Kind::TextNote, "reply")
            .tags(to_sdk_tags(raw_tags(&[&["e", ROOT], &["e", DIRECT]])))
            .sign_with_keys(&keys)
            .unwrap();
        let thread = ThreadReply::from_event(&event).unwrap();
        assert_eq!(thread.root.note_id.hex(), ROOT);
        assert_eq!(thread.reply.unwrap().note_id.hex(), DIRECT);

        let plain = EventBuilder::text_note("no refs").sign_with_keys(&keys).unwrap();
        assert_eq!(ThreadReply::from_event(&plain), Err(ThreadError::NoRootFound));
    }
}
