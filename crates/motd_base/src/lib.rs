/* 📖 # Why have motd_base as a core library?
motd_base provides the error type, tracing setup and the platform abstraction layer
used by the engine and the binary. Keeping them apart from the message logic lets the
engine be tested against MockPal without touching the filesystem or the network.
*/

pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, MotdError, MotdResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
