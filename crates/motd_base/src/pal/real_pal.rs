use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ErrorKind, MotdError, MotdResult};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
};
use super::traits::{Pal, ReadSeek};

/// How long the accept loop waits for a request before rechecking the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/* 📖 # Why std::fs and threads instead of async?

Every store operation is one small file read or one small file write, and requests
are independent. A thread per request plus blocking std::fs keeps the code linear
and lets the store's RwLock do all of the coordination.
*/

/// Concrete PAL implementation using the real filesystem and tiny_http.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to a filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

fn read_error(path: PathBuf, source: io::Error) -> Box<MotdError> {
    if source.kind() == io::ErrorKind::NotFound {
        Box::new(MotdError::not_found(path))
    } else {
        write_error(path, source)
    }
}

fn write_error(path: PathBuf, source: io::Error) -> Box<MotdError> {
    Box::new(MotdError::new(ErrorKind::FileError { path, source }))
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> MotdResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> MotdResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            read_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> MotdResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            write_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    /* 📖 # Why write to a temp file and rename?
    The message file is always rewritten in full. Writing into a sibling temp file and
    renaming it over the target means a crash or a failed write leaves the previous
    list on disk, and a concurrent reader never sees a half-written document.
    */
    #[instrument(skip(self, contents), fields(path = %path, len = contents.len()))]
    fn write_file_atomic(&self, path: &FilePath, contents: &[u8]) -> MotdResult<()> {
        let resolved = self.resolve_path(path);
        let dir = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| write_error(dir.clone(), e))?;
        temp.write_all(contents)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| write_error(temp.path().to_path_buf(), e))?;

        // Keep the permissions of the file being replaced.
        if let Ok(metadata) = fs::metadata(&resolved) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| write_error(resolved.clone(), e))?;
        }

        temp.persist(&resolved).map_err(|e| {
            debug!(error = %e.error, "failed to move temp file into place");
            write_error(resolved.clone(), e.error)
        })?;
        debug!(resolved = %resolved.display(), "file replaced");
        Ok(())
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MotdResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(&address)
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", address, e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server on {} has no IP address", address))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let service: Arc<dyn HttpService> = Arc::from(service);
        let server_name = config.server_name.clone();
        thread::Builder::new()
            .name(format!("http-accept-{}", port))
            .spawn(move || accept_loop(server, service, server_name, flag))
            .map_err(|e| crate::err!("Failed to spawn HTTP accept thread: {}", e))?;

        info!(port, "HTTP server listening");
        Ok(HttpServerHandle::new(port, shutdown))
    }
}

fn accept_loop(
    server: tiny_http::Server,
    service: Arc<dyn HttpService>,
    server_name: String,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = service.clone();
                let server_name = server_name.clone();
                let spawned = thread::Builder::new()
                    .name("http-request".to_string())
                    .spawn(move || respond(request, service.as_ref(), &server_name));
                if let Err(e) = spawned {
                    error!(error = %e, "failed to spawn request thread");
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "HTTP server stopped accepting requests");
                break;
            }
        }
    }
    info!("HTTP server shut down");
}

fn respond(mut request: tiny_http::Request, service: &dyn HttpService, server_name: &str) {
    let response = match to_http_request(&mut request) {
        Ok(http_request) => {
            let method = http_request.method().clone();
            let path = http_request.path().to_string();
            let response = service.handle_request(http_request).unwrap_or_else(|e| {
                warn!(%method, %path, error = %e, "request failed");
                HttpResponse::from_error(&e)
            });
            debug!(%method, %path, status = response.status().as_u16(), "request handled");
            response
        }
        Err(response) => response,
    };
    if let Err(e) = request.respond(to_tiny_response(response, server_name)) {
        warn!(error = %e, "failed to send response");
    }
}

fn to_http_request(request: &mut tiny_http::Request) -> Result<HttpRequest, HttpResponse> {
    let Some(method) = HttpMethod::parse(request.method().as_str()) else {
        return Err(HttpResponse::method_not_allowed());
    };
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        return Err(HttpResponse::bad_request(format!(
            "Failed to read request body: {}",
            e
        )));
    }
    let mut http_request = HttpRequest::new(method, request.url()).with_body(body);
    for header in request.headers() {
        http_request = http_request.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    Ok(http_request)
}

fn to_tiny_response(response: HttpResponse, server_name: &str) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let status = tiny_http::StatusCode(response.status().as_u16());
    let mut headers: Vec<tiny_http::Header> = response
        .headers()
        .iter()
        .filter_map(|(key, value)| tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()).ok())
        .collect();
    headers.extend(tiny_http::Header::from_bytes(&b"Server"[..], server_name.as_bytes()).ok());
    let body = response.into_body().into_bytes();
    let length = body.len();
    tiny_http::Response::new(status, headers, Cursor::new(body), Some(length), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpStream;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, RealPal) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let pal = RealPal::new(temp_dir.path().to_path_buf());
        (temp_dir, pal)
    }

    #[test]
    fn test_file_exists() {
        let (temp_dir, pal) = setup_test_dir();
        fs::write(temp_dir.path().join("motd.json"), "{}").unwrap();

        assert!(pal.file_exists(&FilePath::from("motd.json")).unwrap());
        assert!(!pal.file_exists(&FilePath::from("other.json")).unwrap());
    }

    #[test]
    fn test_read_file_to_bytes() {
        let (temp_dir, pal) = setup_test_dir();
        fs::write(temp_dir.path().join("motd.json"), b"hello").unwrap();

        let content = pal.read_file_to_bytes(&FilePath::from("motd.json")).unwrap();
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let (_temp_dir, pal) = setup_test_dir();

        let err = pal.read_file(&FilePath::from("missing.json")).err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_file_truncates() {
        let (temp_dir, pal) = setup_test_dir();
        fs::write(temp_dir.path().join("motd.json"), b"old content").unwrap();

        drop(pal.create_file(&FilePath::from("motd.json")).unwrap());

        let content = fs::read(temp_dir.path().join("motd.json")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_write_file_atomic_replaces_content() {
        let (temp_dir, pal) = setup_test_dir();
        let path = FilePath::from("motd.json");
        fs::write(temp_dir.path().join("motd.json"), b"old").unwrap();

        pal.write_file_atomic(&path, b"new content").unwrap();

        assert_eq!(pal.read_file_to_string(&path).unwrap(), "new content");
        // Only the target file remains, the temp file was renamed away.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_file_atomic_missing_directory_keeps_nothing() {
        let (temp_dir, pal) = setup_test_dir();

        let result = pal.write_file_atomic(&FilePath::from("no/such/dir/motd.json"), b"x");

        assert!(result.is_err());
        assert!(!temp_dir.path().join("no").exists());
    }

    #[derive(Debug)]
    struct EchoService;

    impl HttpService for EchoService {
        fn handle_request(&self, request: HttpRequest) -> MotdResult<HttpResponse> {
            match request.method() {
                HttpMethod::Post => Ok(HttpResponse::created()),
                HttpMethod::Delete => Err(Box::new(MotdError::method_not_allowed("DELETE"))),
                HttpMethod::Put => Err(crate::err!("storage unavailable")),
                _ => Ok(HttpResponse::json(format!("\"{}\"", request.route()))),
            }
        }
    }

    fn send(port: u16, raw_request: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(raw_request.as_bytes()).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn request(method: &str, path: &str) -> String {
        format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
            method, path
        )
    }

    #[test]
    fn test_http_server_round_trip() {
        let (_temp_dir, pal) = setup_test_dir();
        let handle = pal
            .start_http_server(Box::new(EchoService), HttpServerConfig::new("127.0.0.1"))
            .unwrap();
        let port = handle.port();
        assert_ne!(port, 0);

        let response = send(port, &request("GET", "/v1/message/?x=1"));
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(response.ends_with("\"/v1/message/\""), "{}", response);

        let response = send(port, &request("POST", "/v1/message/"));
        assert!(response.starts_with("HTTP/1.1 201"), "{}", response);
    }

    #[test]
    fn test_http_server_maps_errors() {
        let (_temp_dir, pal) = setup_test_dir();
        let handle = pal
            .start_http_server(Box::new(EchoService), HttpServerConfig::new("127.0.0.1"))
            .unwrap();

        let response = send(handle.port(), &request("DELETE", "/v1/message/"));
        assert!(response.starts_with("HTTP/1.1 405"), "{}", response);

        let response = send(handle.port(), &request("PUT", "/v1/message/"));
        assert!(response.starts_with("HTTP/1.1 500"), "{}", response);
        assert!(response.ends_with("storage unavailable"), "{}", response);

        let response = send(handle.port(), &request("BREW", "/coffee"));
        assert!(response.starts_with("HTTP/1.1 405"), "{}", response);
    }
}
