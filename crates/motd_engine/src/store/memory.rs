/* 📖 # Why provide an in-memory store implementation?

InMemoryMessageStore keeps the list in a Vec and never touches the filesystem. It
follows the same initialize/read/add rules as the file store, so the API can be
exercised without any storage setup.
*/

use motd_base::{FilePath, MotdResult};

use crate::messages::SEED_MESSAGE;
use crate::store::traits::{MessageStore, validate_message};

/// A message store that lives only in memory.
///
/// # Example
///
/// ```
/// use motd_engine::{InMemoryMessageStore, MessageStore};
///
/// let mut store = InMemoryMessageStore::new();
/// store.initialize(None).unwrap();
/// store.add("hello".to_string()).unwrap();
/// assert_eq!(store.read().unwrap().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageStore {
    messages: Vec<String>,
}

impl InMemoryMessageStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given messages.
    pub fn with_messages(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

impl MessageStore for InMemoryMessageStore {
    fn initialize(&mut self, _location: Option<FilePath>) -> MotdResult<()> {
        if self.messages.is_empty() {
            self.messages.push(SEED_MESSAGE.to_string());
        }
        Ok(())
    }

    fn read(&self) -> MotdResult<Vec<String>> {
        Ok(self.messages.clone())
    }

    fn add(&mut self, message: String) -> MotdResult<()> {
        validate_message(&message)?;
        self.messages.push(message);
        Ok(())
    }
}
