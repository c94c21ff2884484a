pub mod file;
pub mod memory;
pub mod traits;

pub use file::{DEFAULT_STORAGE_FILE, FileMessageStore};
pub use memory::InMemoryMessageStore;
pub use traits::{MessageStore, StoreHandle, validate_message};
