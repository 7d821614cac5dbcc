use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use nostr_sdk::prelude::*;
use notekit_core::auth::authorization_header;
use notekit_core::crypto::{create_encrypted_event, decrypt_content, encrypt_message};
use notekit_core::lists::{InterestList, ListItem};
use notekit_core::subscription::{MemoryEventStore, NostrClientTransport, StreamItem};
use notekit_core::tags::{references, NoteRef};
use notekit_core::thread::{interp_event_refs, ThreadReply};
use notekit_core::{EncEncoding, NoteId, Pubkey, SubscriptionManager};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::config::CliConfig;

/// Bech32 form produced for a hex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IdKind {
    Note,
    Npub,
}

pub fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

/// Convert an identifier between hex and bech32.
pub fn convert_id(input: &str, kind: IdKind) -> Result<Value> {
    let input = input.trim();
    if input.starts_with(Pubkey::HRP) {
        let pk = Pubkey::from_bech32(input)?;
        return Ok(json!({ "kind": "npub", "hex": pk.hex(), "bech32": input }));
    }
    if input.starts_with(NoteId::HRP) {
        let id = NoteId::from_bech32(input)?;
        return Ok(json!({ "kind": "note", "hex": id.hex(), "bech32": input }));
    }

    let (name, bech32) = match kind {
        IdKind::Note => ("note", NoteId::from_hex(input)?.to_bech32()?),
        IdKind::Npub => ("npub", Pubkey::from_hex(input)?.to_bech32()?),
    };
    Ok(json!({ "kind": name, "hex": input.to_lowercase(), "bech32": bech32 }))
}

fn parse_pubkey(input: &str) -> Result<PublicKey> {
    let pk = Pubkey::from_str(input.trim()).context("Invalid public key")?;
    Ok(pk.to_public_key()?)
}

/// Encrypt `message` to `recipient`. With `as_event` the signed direct
/// message event is returned instead of the bare content.
pub fn encrypt(
    keys: &Keys,
    recipient: &str,
    message: &str,
    encoding: EncEncoding,
    as_event: bool,
) -> Result<Value> {
    let recipient = parse_pubkey(recipient)?;
    if as_event {
        let event = create_encrypted_event(message, &recipient, Vec::new(), keys, encoding)
            .context("Message could not be encrypted and signed")?;
        return Ok(serde_json::to_value(&event)?);
    }
    let content = encrypt_message(message, keys.secret_key(), &recipient, encoding)?;
    Ok(json!({ "content": content, "encoding": encoding }))
}

pub fn decrypt(keys: &Keys, sender: &str, content: &str, encoding: EncEncoding) -> Result<Value> {
    let sender = parse_pubkey(sender)?;
    let message = decrypt_content(content, keys.secret_key(), &sender, encoding)?;
    Ok(json!({ "message": message }))
}

pub fn auth_header(keys: &Keys, url: &str, method: &str, body: Option<&[u8]>) -> Result<Value> {
    let header = authorization_header(keys, url, method, body)?;
    Ok(json!({ "authorization": header }))
}

fn parse_tags(tags_json: &str) -> Result<Vec<Vec<String>>> {
    serde_json::from_str(tags_json).context("Tags must be a JSON array of string arrays")
}

fn note_ref_json(r: &NoteRef) -> Value {
    json!({
        "id": r.note_id.hex(),
        "relay": r.relay,
        "marker": r.marker.map(|m| m.as_str()),
    })
}

/// Resolve the thread position described by raw `e` tags.
pub fn parse_thread(tags_json: &str) -> Result<Value> {
    let tags = parse_tags(tags_json)?;
    let refs: Vec<NoteRef> = references(&tags).collect();
    let reply = ThreadReply::new(&interp_event_refs(&refs))?;
    Ok(json!({
        "root": note_ref_json(&reply.root),
        "reply": reply.reply.as_ref().map(note_ref_json),
        "mention": reply.mention.as_ref().map(note_ref_json),
        "isReplyToRoot": reply.is_reply_to_root(),
    }))
}

pub fn parse_list(tags_json: &str) -> Result<Value> {
    let tags = parse_tags(tags_json)?;
    let list = InterestList::from_tags(&tags);
    let items: Vec<Value> = list
        .items
        .iter()
        .map(|item| match item {
            ListItem::Hashtag(t) => json!({ "type": "hashtag", "value": t }),
            ListItem::InterestSet(addr) => json!({
                "type": "interestSet",
                "kind": addr.kind,
                "pubkey": addr.pubkey,
                "identifier": addr.identifier,
            }),
        })
        .collect();
    Ok(Value::Array(items))
}

#[derive(Debug, Clone, Default)]
pub struct StreamArgs {
    pub kinds: Vec<u16>,
    pub authors: Vec<String>,
    pub hashtags: Vec<String>,
    pub limit: Option<usize>,
    /// Keep streaming this long after every relay finished backfill
    pub live_secs: u64,
    /// Give up waiting for backfill after this long
    pub timeout_secs: u64,
}

impl StreamArgs {
    fn filter(&self) -> Result<Filter> {
        let mut filter = Filter::new();
        if !self.kinds.is_empty() {
            filter = filter.kinds(self.kinds.iter().map(|k| Kind::from(*k)));
        }
        if !self.authors.is_empty() {
            let authors = self
                .authors
                .iter()
                .map(|a| parse_pubkey(a))
                .collect::<Result<Vec<_>>>()?;
            filter = filter.authors(authors);
        }
        if !self.hashtags.is_empty() {
            filter = filter.hashtags(self.hashtags.clone());
        }
        if let Some(limit) = self.limit {
            filter = filter.limit(limit);
        }
        Ok(filter)
    }
}

/// Print events matching `args` from the configured relays, one JSON object
/// per line, until backfill completes and the live window closes.
pub async fn stream(config: &CliConfig, args: &StreamArgs) -> Result<()> {
    let filter = args.filter()?;
    let relays = config.core.relay_urls.clone();
    if relays.is_empty() {
        bail!("No relays configured");
    }

    let client = Client::default();
    for relay in &relays {
        client
            .add_relay(relay.as_str())
            .await
            .with_context(|| format!("Failed to add relay {}", relay))?;
    }
    client.connect().await;

    let transport = Arc::new(NostrClientTransport::new(client.clone()));
    let store = Arc::new(MemoryEventStore::new());
    let manager = SubscriptionManager::new(transport, store.clone())
        .with_buffer(config.core.subscription_buffer);

    let mut sub = manager.subscribe("cli-stream", filter, &relays).await?;
    let mut deadline = tokio::time::Instant::now() + Duration::from_secs(args.timeout_secs);
    let mut live = false;

    loop {
        let item = match tokio::time::timeout_at(deadline, sub.next()).await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(_) => {
                if !live {
                    warn!(
                        received = sub.eose_relays().len(),
                        expected = relays.len(),
                        "Timed out waiting for end of stored events"
                    );
                }
                break;
            }
        };

        match item {
            StreamItem::Event { relay_url, event } => {
                println!(
                    "{}",
                    json!({ "relay": relay_url, "event": serde_json::to_value(&*event)? })
                );
            }
            StreamItem::EndOfStoredEvents { relay_url } => {
                info!(relay = %relay_url, "Backfill complete");
                if !live && sub.backfilled(&relays) {
                    if args.live_secs == 0 {
                        break;
                    }
                    live = true;
                    deadline = tokio::time::Instant::now() + Duration::from_secs(args.live_secs);
                }
            }
        }
    }

    drop(sub);
    manager.shutdown().await;
    let _ = client.disconnect().await;
    info!(stored = store.len(), "Stream finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "7c7d37bc8c04d2ec65cbc7d9275253e6b5cc34b5d10439f158194a3feefa8d52";
    const REPLY: &str = "8b2be0a0ad34805d76679272c28a77dbede9adcbfdca48c681ec8b624a1208a6";

    #[test]
    fn test_convert_id_both_directions() {
        let out = convert_id(ROOT, IdKind::Note).unwrap();
        let bech32 = out["bech32"].as_str().unwrap().to_string();
        assert!(bech32.starts_with("note1"));

        let back = convert_id(&bech32, IdKind::Npub).unwrap();
        assert_eq!(back["hex"], ROOT);
        assert_eq!(back["kind"], "note");

        let npub = convert_id(ROOT, IdKind::Npub).unwrap();
        assert!(npub["bech32"].as_str().unwrap().starts_with("npub1"));

        assert!(convert_id("abcd", IdKind::Note).is_err());
    }

    #[test]
    fn test_encrypt_decrypt_commands() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let bob_npub = bob.public_key().to_bech32().unwrap();
        let alice_hex = alice.public_key().to_hex();

        for encoding in [EncEncoding::Base64, EncEncoding::Bech32] {
            let out = encrypt(&alice, &bob_npub, "hi bob", encoding, false).unwrap();
            let content = out["content"].as_str().unwrap();
            let dec = decrypt(&bob, &alice_hex, content, encoding).unwrap();
            assert_eq!(dec["message"], "hi bob");
        }

        let event = encrypt(&alice, &bob_npub, "hi", EncEncoding::Base64, true).unwrap();
        assert_eq!(event["kind"], 4);
    }

    #[test]
    fn test_auth_header_command() {
        let keys = Keys::generate();
        let out = auth_header(&keys, "https://example.com/api", "get", None).unwrap();
        assert!(out["authorization"].as_str().unwrap().starts_with("Nostr "));
        assert!(auth_header(&keys, "example.com", "get", None).is_err());
    }

    #[test]
    fn test_thread_command() {
        let tags = format!(r#"[["e","{ROOT}","","root"],["e","{REPLY}","","r","x"]]"#);
        let out = parse_thread(&tags).unwrap();
        assert_eq!(out["root"]["id"], ROOT);
        assert_eq!(out["reply"]["id"], REPLY);
        assert_eq!(out["isReplyToRoot"], false);

        let mention_only = format!(r#"[["e","{ROOT}","","m","a","b","c"]]"#);
        assert!(parse_thread(&mention_only).is_err());
    }

    #[test]
    fn test_list_command() {
        let out = parse_list(r#"[["d","abc"],["t","bitcoin"],["a","30000:deadbeef:list1"]]"#)
            .unwrap();
        assert_eq!(
            out,
            json!([
                { "type": "hashtag", "value": "bitcoin" },
                { "type": "interestSet", "kind": "30000", "pubkey": "deadbeef", "identifier": "list1" }
            ])
        );
    }

    #[test]
    fn test_stream_filter_from_args() {
        let keys = Keys::generate();
        let args = StreamArgs {
            kinds: vec![1, 7],
            authors: vec![keys.public_key().to_bech32().unwrap()],
            hashtags: vec!["nostr".into()],
            limit: Some(20),
            ..Default::default()
        };
        let filter = args.filter().unwrap();
        assert_eq!(filter.limit, Some(20));
        assert!(filter.kinds.unwrap().contains(&Kind::from(7)));
        assert!(filter.authors.unwrap().contains(&keys.public_key()));

        let bad = StreamArgs {
            authors: vec!["nope".into()],
            ..Default::default()
        };
        assert!(bad.filter().is_err());
    }
}
