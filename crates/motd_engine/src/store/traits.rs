/* 📖 # Why create a MessageStore trait?

The API layer only needs three things from storage: make sure there is something
to serve, read the whole list, and append to it. Putting these behind a trait lets
the HTTP tests run against counting or failing stores, and lets the same service
run on top of the file-backed store or the in-memory one.
*/

/* 📖 # Why does StoreHandle own the lock?

Every Read and Add against the backing file must happen under one lock:
- reads take the shared side, so any number of them may overlap
- adds and initialization take the exclusive side, so the read-modify-write of the
  file is never interleaved with another writer or with a reader

parking_lot's RwLock is eventually fair, so a steady stream of readers cannot keep a
writer waiting forever. Store implementations themselves are plain `&self`/`&mut self`
code and never lock.
*/

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use motd_base::{FilePath, MotdError, MotdResult};

/// Trait for message storage implementations.
pub trait MessageStore: Send + Sync + 'static {
    /// Prepare the store for use.
    ///
    /// A non-empty `location` replaces the store's current location. If the location
    /// is missing or holds no messages it is reset and seeded with
    /// [`SEED_MESSAGE`](crate::SEED_MESSAGE). Any other read failure is returned
    /// as-is.
    fn initialize(&mut self, location: Option<FilePath>) -> MotdResult<()>;

    /// Return all messages in insertion order.
    fn read(&self) -> MotdResult<Vec<String>>;

    /// Append a message. Empty messages are rejected before touching storage.
    fn add(&mut self, message: String) -> MotdResult<()>;
}

/// Reject messages that may not be stored.
pub fn validate_message(message: &str) -> MotdResult<()> {
    if message.is_empty() {
        return Err(Box::new(MotdError::validation("message must not be empty")));
    }
    Ok(())
}

/// A thread-safe handle to a message store.
///
/// Cloning is cheap; all clones share the same store and the same lock.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn MessageStore>>);

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: MessageStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// See [`MessageStore::initialize`].
    pub fn initialize(&self, location: Option<FilePath>) -> MotdResult<()> {
        self.0.write().initialize(location)
    }

    /// See [`MessageStore::read`].
    pub fn read(&self) -> MotdResult<Vec<String>> {
        self.0.read().read()
    }

    /// See [`MessageStore::add`].
    pub fn add(&self, message: impl Into<String>) -> MotdResult<()> {
        let message = message.into();
        // Rejected without waiting for the lock.
        validate_message(&message)?;
        self.0.write().add(message)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}
