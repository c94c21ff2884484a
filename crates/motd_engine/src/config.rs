/* 📖 # Why a TOML config file with serde defaults?

Every setting has a sensible default, so the service starts without any file at all.
A config file only lists what differs; `#[serde(default)]` fills in the rest and
`deny_unknown_fields` turns a misspelled key into an error instead of a silently
ignored setting. Command line flags are applied on top by the binary.
*/

use std::path::PathBuf;

use serde::Deserialize;

use motd_base::pal::http::HttpServerConfig;
use motd_base::{FilePath, MotdResult, PalHandle, ResultExt};

use crate::store::DEFAULT_STORAGE_FILE;

/// Default address the server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration of the message server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host or address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory holding the storage file.
    pub data_dir: PathBuf,
    /// Storage file name, relative to `data_dir`.
    pub storage_file: String,
    /// Directory of static files served outside the message endpoints.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: std::env::temp_dir(),
            storage_file: DEFAULT_STORAGE_FILE.to_string(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Location of the storage file relative to `data_dir`.
    pub fn storage_location(&self) -> FilePath {
        FilePath::from(self.storage_file.as_str())
    }

    /// Settings for the HTTP server.
    pub fn http_server_config(&self) -> HttpServerConfig {
        HttpServerConfig::new(self.host.as_str()).with_port(self.port)
    }
}

/// Parse a configuration from TOML text.
pub fn parse_config(text: &str) -> MotdResult<ServerConfig> {
    toml::from_str(text).map_err(|e| motd_base::err!("Invalid configuration: {}", e))
}

/// Load a configuration file through the PAL.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> MotdResult<ServerConfig> {
    let text = pal
        .read_file_to_string(path)
        .with_context(|| format!("Failed to load configuration {}", path))?;
    parse_config(&text).with_context(|| format!("Failed to load configuration {}", path))
}
