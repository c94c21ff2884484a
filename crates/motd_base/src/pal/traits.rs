use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::MotdResult;
use crate::error::{ErrorKind, MotdError};

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

The message store and the API depend on this abstraction rather than on std::fs and
tiny_http directly. MockPal implements it in memory for fast tests without
filesystem or network side effects.
*/

/// Platform Abstraction Layer (PAL) trait providing file and HTTP operations.
///
/// Two implementations are provided:
/// - `RealPal`: real filesystem via `std::fs`, HTTP via `tiny_http`
/// - `MockPal`: in-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> MotdResult<bool>;

    /// Open a file for reading.
    ///
    /// A missing file is reported as [`ErrorKind::NotFound`].
    fn read_file(&self, path: &FilePath) -> MotdResult<Box<dyn ReadSeek + 'static>>;

    /// Read the entire file contents.
    fn read_file_to_bytes(&self, path: &FilePath) -> MotdResult<Vec<u8>> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(MotdError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        Ok(contents)
    }

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> MotdResult<String> {
        let contents = self.read_file_to_bytes(path)?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, truncating it if it exists.
    fn create_file(&self, path: &FilePath) -> MotdResult<Box<dyn Write>>;

    /// Replace the contents of a file in one step.
    ///
    /// Readers observe either the old or the new contents, never a mix. If the call
    /// fails the previous contents stay in place.
    fn write_file_atomic(&self, path: &FilePath, contents: &[u8]) -> MotdResult<()>;

    /// Start an HTTP server with the given service.
    ///
    /// Returns a handle to the running server. The server stops accepting
    /// connections once the last handle clone is dropped or shutdown() is called.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> MotdResult<HttpServerHandle>;
}

/* 📖 # Why use Arc<dyn Pal> with PalHandle?

The store and the static file service each keep a PalHandle and are shared across
request threads. Arc makes that a cheap clone without lifetime parameters.
*/

/// Handle to a PAL implementation, enabling shared ownership.
///
/// # Examples
///
/// ```no_run
/// use motd_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(std::env::temp_dir()));
/// let pal_clone = pal.clone();
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
