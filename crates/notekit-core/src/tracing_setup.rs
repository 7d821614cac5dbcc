use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::CoreConfig;

/// Environment variable holding a tracing filter directive (overrides config)
pub const LOG_FILTER_ENV: &str = "NOTEKIT_LOG";
/// Environment variable naming a file to append logs to (overrides config)
pub const LOG_FILE_ENV: &str = "NOTEKIT_LOG_FILE";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &CoreConfig) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let file_path = std::env::var(LOG_FILE_ENV)
        .ok()
        .map(PathBuf::from)
        .or_else(|| config.log_file.clone());

    let file_layer = file_path.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}
