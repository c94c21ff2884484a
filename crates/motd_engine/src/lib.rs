pub mod api;
pub mod config;
pub mod messages;
pub mod store;

pub use api::{ApiService, StaticFileService};
pub use config::{ServerConfig, load_config, parse_config};
pub use messages::{SEED_MESSAGE, decode_messages, encode_messages};
pub use store::{
    DEFAULT_STORAGE_FILE, FileMessageStore, InMemoryMessageStore, MessageStore, StoreHandle,
};

#[cfg(test)]
mod scenario_tests;
