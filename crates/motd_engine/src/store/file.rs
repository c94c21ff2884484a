/* 📖 # How does the file-backed store persist messages?

The whole list lives in one JSON file (see `messages.rs` for the format). An add is a
read-modify-write: read the file, append, encode, then replace the file through
`Pal::write_file_atomic`. The replacement goes through a temporary file and a rename,
so a crash or a failed write leaves the previous contents in place and readers never
observe a half-written list.

The store does no locking of its own. Callers share it through a StoreHandle, which
serializes adds against each other and against reads.
*/

use tracing::{debug, info, instrument, warn};

use motd_base::{FilePath, MotdResult, PalHandle};

use crate::messages::{SEED_MESSAGE, decode_messages, encode_messages};
use crate::store::traits::{MessageStore, validate_message};

/// File name used when no location is configured.
pub const DEFAULT_STORAGE_FILE: &str = "motd_storage.json";

/// A message store backed by a single JSON file.
///
/// # Example
///
/// ```
/// use motd_base::{FilePath, MockPal, PalHandle};
/// use motd_engine::{FileMessageStore, MessageStore};
///
/// let mut store = FileMessageStore::new(PalHandle::new(MockPal::new()));
/// store.initialize(Some(FilePath::from("motd.json"))).unwrap();
/// store.add("hello".to_string()).unwrap();
/// assert_eq!(store.read().unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct FileMessageStore {
    pal: PalHandle,
    location: FilePath,
}

impl FileMessageStore {
    /// Create a store at the default location.
    pub fn new(pal: PalHandle) -> Self {
        Self::with_location(pal, FilePath::from(DEFAULT_STORAGE_FILE))
    }

    /// Create a store at the given location.
    pub fn with_location(pal: PalHandle, location: FilePath) -> Self {
        Self { pal, location }
    }

    /// The file currently backing this store.
    pub fn location(&self) -> &FilePath {
        &self.location
    }

    fn read_messages(&self) -> MotdResult<Vec<String>> {
        let bytes = self.pal.read_file_to_bytes(&self.location)?;
        decode_messages(&self.location, &bytes)
    }

    fn seed(&mut self) -> MotdResult<()> {
        // Reset the location to an empty file before the first add.
        drop(self.pal.create_file(&self.location)?);
        self.add(SEED_MESSAGE.to_string())?;
        info!(location = %self.location, "seeded message storage");
        Ok(())
    }
}

impl MessageStore for FileMessageStore {
    #[instrument(skip(self, location))]
    fn initialize(&mut self, location: Option<FilePath>) -> MotdResult<()> {
        if let Some(location) = location.filter(|location| !location.is_empty()) {
            self.location = location;
        }

        match self.read_messages() {
            Ok(messages) if !messages.is_empty() => {
                info!(location = %self.location, count = messages.len(), "using existing message storage");
                Ok(())
            }
            Ok(_) => self.seed(),
            Err(e) if e.is_not_found() => self.seed(),
            Err(e) => {
                warn!(location = %self.location, error = %e, "cannot initialize message storage");
                Err(e)
            }
        }
    }

    fn read(&self) -> MotdResult<Vec<String>> {
        self.read_messages()
    }

    fn add(&mut self, message: String) -> MotdResult<()> {
        validate_message(&message)?;

        let mut messages = self.read_messages()?;
        messages.push(message);
        let encoded = encode_messages(&messages)?;
        self.pal.write_file_atomic(&self.location, &encoded)?;

        debug!(location = %self.location, count = messages.len(), "message added");
        Ok(())
    }
}
