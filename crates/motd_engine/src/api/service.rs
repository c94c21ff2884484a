/* 📖 # Why a single unified API service?

ApiService is the one HttpService registered with the PAL. It routes internally:
- `/v1/message/random` -> a random message
- `/v1/message/` -> list or append
- `/v1/message/{index}` -> one message by index
- anything else -> static files when configured, otherwise 404

All endpoints share the same store handle and the same error mapping.
*/

/* 📖 # How are failures turned into responses?

Handlers return `MotdResult<HttpResponse>`. Outcomes that are part of the protocol
(bad index, bad body, empty list) are built as responses directly. Everything else
travels as an error and is converted once in `handle_request` through
`HttpResponse::from_error`: a rejected method becomes 405 and any store failure
becomes a 500 carrying the error text.
*/

use percent_encoding::percent_decode_str;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use motd_base::{MotdError, MotdResult};
use motd_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpService};

use crate::api::assets::StaticFileService;
use crate::store::StoreHandle;

/// Path prefix of the message endpoints.
pub const MESSAGE_PATH: &str = "/v1/message/";

/// Path of the random message endpoint.
pub const RANDOM_MESSAGE_PATH: &str = "/v1/message/random";

/// HTTP service for the message endpoints.
///
/// # Example
///
/// ```
/// use motd_base::pal::http::{HttpMethod, HttpRequest, HttpService};
/// use motd_engine::{ApiService, InMemoryMessageStore, StoreHandle};
///
/// let store = StoreHandle::new(InMemoryMessageStore::with_messages(vec!["hi".to_string()]));
/// let service = ApiService::new(store);
/// let response = service
///     .handle_request(HttpRequest::new(HttpMethod::Get, "/v1/message/0"))
///     .unwrap();
/// assert_eq!(response.body().as_string(), Some("\"hi\"".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct ApiService {
    store: StoreHandle,
    static_files: Option<StaticFileService>,
}

impl ApiService {
    /// Create a new ApiService over the given store.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            static_files: None,
        }
    }

    /// Serve static files for paths outside the message endpoints.
    pub fn with_static_files(mut self, static_files: StaticFileService) -> Self {
        self.static_files = Some(static_files);
        self
    }

    fn serialize_json_response<T: Serialize + ?Sized>(data: &T) -> MotdResult<HttpResponse> {
        serde_json::to_string(data)
            .map(HttpResponse::json)
            .map_err(|e| motd_base::err!("JSON serialization error: {}", e))
    }

    fn route(&self, request: &HttpRequest) -> MotdResult<HttpResponse> {
        let Ok(path) = percent_decode_str(request.route()).decode_utf8() else {
            debug!(path = request.path(), "path is not valid UTF-8");
            return Ok(HttpResponse::not_found());
        };
        let path = path.as_ref();
        if path == RANDOM_MESSAGE_PATH {
            self.handle_random(request)
        } else if let Some(id) = path.strip_prefix(MESSAGE_PATH) {
            self.handle_messages(request, id)
        } else if let Some(static_files) = &self.static_files {
            static_files.serve(request)
        } else {
            debug!(path = path, "no route");
            Ok(HttpResponse::not_found())
        }
    }

    fn handle_random(&self, request: &HttpRequest) -> MotdResult<HttpResponse> {
        if request.method() != &HttpMethod::Get {
            return Err(Box::new(MotdError::method_not_allowed(request.method().as_str())));
        }

        let messages = self.store.read()?;
        if messages.is_empty() {
            return Ok(HttpResponse::no_content());
        }
        let index = rand::thread_rng().gen_range(0..messages.len());
        Self::serialize_json_response(&messages[index])
    }

    fn handle_messages(&self, request: &HttpRequest, id: &str) -> MotdResult<HttpResponse> {
        match (request.method(), id.is_empty()) {
            (HttpMethod::Get, true) => Self::serialize_json_response(&self.store.read()?),
            (HttpMethod::Get, false) => self.handle_get_one(id),
            (HttpMethod::Post, true) => self.handle_append(request),
            (method, _) => Err(Box::new(MotdError::method_not_allowed(method.as_str()))),
        }
    }

    fn handle_get_one(&self, id: &str) -> MotdResult<HttpResponse> {
        // Negative and non-numeric indices never reach the store.
        let Ok(index) = id.parse::<usize>() else {
            debug!(id = id, "invalid message index");
            return Ok(HttpResponse::not_found());
        };

        match self.store.read()?.get(index) {
            Some(message) => Self::serialize_json_response(message),
            None => Ok(HttpResponse::not_found()),
        }
    }

    fn handle_append(&self, request: &HttpRequest) -> MotdResult<HttpResponse> {
        let message: String = match serde_json::from_slice(request.body().as_bytes()) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "rejected message body");
                return Ok(HttpResponse::bad_request(format!(
                    "Body must be a JSON string: {}",
                    e
                )));
            }
        };

        self.store.add(message)?;
        Ok(HttpResponse::created())
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> MotdResult<HttpResponse> {
        let response = self.route(&request).unwrap_or_else(|e| {
            warn!(method = %request.method(), path = request.path(), error = %e, "request failed");
            HttpResponse::from_error(&e)
        });
        debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            "handled request"
        );
        Ok(response)
    }
}
