use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notekit_cli::cli::{
    auth_header, convert_id, decrypt, encrypt, parse_list, parse_thread, print_json, stream,
    CliConfig, IdKind, StreamArgs,
};
use notekit_core::config::default_config_path;
use notekit_core::tracing_setup::init_tracing;
use notekit_core::EncEncoding;

#[derive(Parser)]
#[command(name = "notekit")]
#[command(about = "Nostr identifiers, encrypted messages, auth headers and relay streams")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (relayUrls, credentials, ...)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Secret key (nsec or hex), overrides credentials in the config
    #[arg(long, global = true)]
    nsec: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an identifier between hex and bech32
    Id {
        /// Hex, note1... or npub1...
        input: String,
        /// Bech32 prefix to use for hex input
        #[arg(long, value_enum, default_value = "note")]
        kind: IdKind,
    },

    /// Encrypt a direct message
    Encrypt {
        /// Recipient public key (hex or npub)
        #[arg(long)]
        to: String,
        message: String,
        /// Defaults to the configured dmEncoding
        #[arg(long)]
        encoding: Option<EncEncoding>,
        /// Output the signed kind 4 event instead of the content
        #[arg(long)]
        event: bool,
    },

    /// Decrypt direct message content
    Decrypt {
        /// Sender public key (hex or npub)
        #[arg(long)]
        from: String,
        content: String,
        #[arg(long)]
        encoding: Option<EncEncoding>,
    },

    /// Build a NIP-98 Authorization header for one request
    AuthHeader {
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// File whose contents are the request body
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// Resolve root/reply/mention from a JSON array of tags
    Thread { tags: String },

    /// Parse interest list items from a JSON array of tags
    List { tags: String },

    /// Stream events from the configured relays
    Stream {
        /// Event kinds (repeatable)
        #[arg(long = "kind", short = 'k')]
        kinds: Vec<u16>,
        /// Author public keys (repeatable)
        #[arg(long = "author", short = 'a')]
        authors: Vec<String>,
        /// Hashtags (repeatable)
        #[arg(long = "hashtag", short = 't')]
        hashtags: Vec<String>,
        #[arg(long, short = 'l')]
        limit: Option<usize>,
        /// Seconds to keep streaming live events after backfill
        #[arg(long, default_value_t = 0)]
        live_secs: u64,
        /// Seconds to wait for every relay to finish backfill
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.core);

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CliConfig) -> Result<()> {
    let pretty = cli.pretty;
    let nsec = cli.nsec.as_deref();
    let default_encoding = config.core.dm_encoding;

    let output = match cli.command {
        Commands::Id { input, kind } => convert_id(&input, kind)?,
        Commands::Encrypt {
            to,
            message,
            encoding,
            event,
        } => {
            let keys = config.keys(nsec)?;
            encrypt(&keys, &to, &message, encoding.unwrap_or(default_encoding), event)?
        }
        Commands::Decrypt {
            from,
            content,
            encoding,
        } => {
            let keys = config.keys(nsec)?;
            decrypt(&keys, &from, &content, encoding.unwrap_or(default_encoding))?
        }
        Commands::AuthHeader {
            url,
            method,
            body_file,
        } => {
            let keys = config.keys(nsec)?;
            let body = body_file
                .map(|path| {
                    std::fs::read(&path)
                        .with_context(|| format!("Failed to read body file: {}", path.display()))
                })
                .transpose()?;
            auth_header(&keys, &url, &method, body.as_deref())?
        }
        Commands::Thread { tags } => parse_thread(&tags)?,
        Commands::List { tags } => parse_list(&tags)?,
        Commands::Stream {
            kinds,
            authors,
            hashtags,
            limit,
            live_secs,
            timeout_secs,
        } => {
            let args = StreamArgs {
                kinds,
                authors,
                hashtags,
                limit,
                live_secs,
                timeout_secs,
            };
            return stream(&config, &args).await;
        }
    };

    print_json(&output, pretty)
}

/// Explicit `--config` must load; the default location is optional
fn load_config(path: Option<&PathBuf>) -> Result<CliConfig> {
    match path {
        Some(path) => CliConfig::load(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                CliConfig::load(&path)
            } else {
                Ok(CliConfig::default())
            }
        }
    }
}
