pub mod commands;
pub mod config;

pub use commands::{
    auth_header, convert_id, decrypt, encrypt, parse_list, parse_thread, print_json, stream,
    IdKind, StreamArgs,
};
pub use config::{CliConfig, Credentials};
