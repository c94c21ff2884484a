/* 📖 # What does the motd binary do?

It wires the crates together and then serves until killed:

1. Build the configuration: defaults, then the TOML file given with `--config`,
   then individual flags
2. Open the storage file below `data_dir` and initialize it (seeding an empty one)
3. Start the HTTP server on `host:port`

Exit codes:
- 0: never reached while serving
- 1: bad configuration, unusable storage, or the server could not bind
*/

use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use clap::Parser;
use tracing::{error, info};

use motd_base::tracing::init_tracing;
use motd_base::{FilePath, MotdResult, PalHandle, RealPal, ResultExt};
use motd_engine::{
    ApiService, FileMessageStore, ServerConfig, StaticFileService, StoreHandle, load_config,
};

/// Serve a message of the day over HTTP.
#[derive(Debug, Parser)]
#[command(name = "motd", version)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host or address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding the storage file.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Storage file name, relative to the data directory.
    #[arg(long)]
    storage_file: Option<String>,

    /// Directory of static files to serve outside /v1/message/.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Args {
    fn apply_to(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(storage_file) = self.storage_file {
            config.storage_file = storage_file;
        }
        if self.static_dir.is_some() {
            config.static_dir = self.static_dir;
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        error!(error = ?e, "motd stopped");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> MotdResult<()> {
    let config = build_config(args)?;
    info!(?config, "configuration loaded");

    let pal = PalHandle::new(RealPal::new(config.data_dir.clone()));
    let store = StoreHandle::new(FileMessageStore::new(pal.clone()));
    store
        .initialize(Some(config.storage_location()))
        .with_context(|| {
            format!(
                "Failed to initialize message storage in {}",
                config.data_dir.display()
            )
        })?;

    let mut service = ApiService::new(store);
    if let Some(static_dir) = &config.static_dir {
        let assets = PalHandle::new(RealPal::new(static_dir.clone()));
        service = service.with_static_files(StaticFileService::new(assets));
    }

    let handle = pal
        .start_http_server(Box::new(service), config.http_server_config())
        .with_context(|| format!("Failed to start server on {}:{}", config.host, config.port))?;
    info!(address = %handle.address(&config.host), "serving messages");

    // The server runs on its own threads until the process is killed.
    loop {
        thread::park();
    }
}

fn build_config(mut args: Args) -> MotdResult<ServerConfig> {
    let mut config = match args.config.take() {
        Some(path) => {
            let (pal, file) = config_file_location(&path)?;
            load_config(&pal, &file)?
        }
        None => ServerConfig::default(),
    };
    args.apply_to(&mut config);
    Ok(config)
}

/// Split a config path into a PAL rooted at its directory and the file name.
fn config_file_location(path: &Path) -> MotdResult<(PalHandle, FilePath)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| motd_base::err!("Invalid configuration path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((PalHandle::new(RealPal::new(dir)), FilePath::from(file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("motd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = build_config(parse(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("motd.toml");
        std::fs::write(&config_path, "port = 9000\nstorage_file = \"from_file.json\"\n").unwrap();

        let config = build_config(parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--port",
            "9100",
            "--static-dir",
            "/srv/motd",
        ]))
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.storage_file, "from_file.json");
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/motd")));
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("missing.toml");

        let err = build_config(parse(&["--config", config_path.to_str().unwrap()])).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_port_flag() {
        let result = Args::try_parse_from(["motd", "--port", "http"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_location_relative() {
        let (_pal, file) = config_file_location(Path::new("motd.toml")).unwrap();
        assert_eq!(file, FilePath::from("motd.toml"));
    }
}
