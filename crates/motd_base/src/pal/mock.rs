use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ErrorKind, MotdError, MotdResult};

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use HashMap for MockPal storage?

MockPal keeps files in memory behind Arc<Mutex<_>>:
1. **Speed**: no filesystem I/O, deterministic tests
2. **Isolation**: no side effects on the real filesystem
3. **Control**: tests can plant corrupt files or make writes fail
4. **Thread-safe**: concurrent store tests can share one MockPal
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use motd_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("motd.json"), b"{\"messages\":[]}".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("motd.json")).unwrap();
/// assert_eq!(content, "{\"messages\":[]}");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
    http_servers: Arc<Mutex<HashMap<u16, Arc<dyn HttpService>>>>,
    next_port: Arc<AtomicU16>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        lock(&self.files).insert(path, content);
    }

    /// Remove a file from the mock storage.
    pub fn remove_file(&self, path: &FilePath) {
        lock(&self.files).remove(path);
    }

    /// Get a copy of a file's content, if present.
    pub fn file_content(&self, path: &FilePath) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    /// Make every subsequent `write_file_atomic` call fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered for `port` and invokes it. An error from the
    /// service is converted the same way RealPal converts it.
    pub fn simulate_request(&self, port: u16, request: HttpRequest) -> MotdResult<HttpResponse> {
        let service = lock(&self.http_servers)
            .get(&port)
            .cloned()
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        Ok(service
            .handle_request(request)
            .unwrap_or_else(|e| HttpResponse::from_error(&e)))
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        lock(&self.http_servers).len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> MotdResult<bool> {
        Ok(lock(&self.files).contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> MotdResult<Box<dyn ReadSeek + 'static>> {
        let content = lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| Box::new(MotdError::not_found(path.as_path())))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> MotdResult<Box<dyn Write>> {
        // The file exists (empty) from this point on, like File::create.
        lock(&self.files).insert(path.clone(), Vec::new());
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn write_file_atomic(&self, path: &FilePath, contents: &[u8]) -> MotdResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Box::new(MotdError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: std::io::Error::other("simulated write failure"),
            })));
        }
        lock(&self.files).insert(path.clone(), contents.to_vec());
        Ok(())
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MotdResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };
        lock(&self.http_servers).insert(port, Arc::from(service));
        Ok(HttpServerHandle::new(port, Arc::new(AtomicBool::new(false))))
    }
}

/// Helper struct for writing files to MockPal.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        lock(&self.files).insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
