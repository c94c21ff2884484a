/* 📖 # Why a dedicated codec for the storage file?

The storage file is the only persistent state of the service, and other tools may
read it. Its shape is fixed: a single JSON object with a `messages` array of strings,
in insertion order. Keeping encode and decode in one place means the file store and
the tests agree on that shape, including the two lenient cases:

- a zero-length file decodes to an empty list (a freshly created file)
- an object without a `messages` field decodes to an empty list
*/

use serde::{Deserialize, Serialize};

use motd_base::{ErrorKind, FilePath, MotdError, MotdResult};

/// Message stored into a location that held no messages.
pub const SEED_MESSAGE: &str = "quidquid Latine dictum sit altum videtur";

#[derive(Debug, Deserialize)]
struct StoredMessages {
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StoredMessagesRef<'a> {
    messages: &'a [String],
}

/// Decode the contents of a storage file.
///
/// `location` is only used to report where corrupt data was found.
pub fn decode_messages(location: &FilePath, bytes: &[u8]) -> MotdResult<Vec<String>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice::<StoredMessages>(bytes)
        .map(|stored| stored.messages)
        .map_err(|source| {
            Box::new(MotdError::new(ErrorKind::CorruptData {
                path: location.as_path().to_path_buf(),
                source,
            }))
        })
}

/// Encode messages in storage file format.
pub fn encode_messages(messages: &[String]) -> MotdResult<Vec<u8>> {
    serde_json::to_vec(&StoredMessagesRef { messages })
        .map_err(|e| motd_base::err!("Failed to encode messages: {}", e))
}
