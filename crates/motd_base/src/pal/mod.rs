/* 📖 # What is the Platform Abstraction Layer?

The PAL is a trait-based abstraction over the file operations the message store needs
and over serving HTTP:
- RealPal uses std::fs and tiny_http
- MockPal keeps files in memory and dispatches requests without a socket

The store and the API only see the Pal trait, so both can be tested with MockPal.
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
