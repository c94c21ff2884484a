/* 📖 # Why an API module in motd_engine?

The api module exposes the message store over HTTP. Its services implement the
HttpService trait from motd_base, so they run unchanged on RealPal (tiny_http) and on
MockPal in tests.

Current services:
- ApiService: the `/v1/message/` endpoints, with optional static files for other paths
- StaticFileService: files from a directory, used by ApiService
*/

mod assets;
mod service;

pub use assets::StaticFileService;
pub use service::{ApiService, MESSAGE_PATH, RANDOM_MESSAGE_PATH};
