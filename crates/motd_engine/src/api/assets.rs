use percent_encoding::percent_decode_str;
use tracing::debug;

use motd_base::pal::http::{HttpMethod, HttpRequest, HttpResponse};
use motd_base::{FilePath, MotdError, MotdResult, PalHandle};

/* 📖 # Why serve static files through a PAL?

The static directory gets its own PalHandle whose base directory is that directory.
Request paths become FilePaths relative to it, and anything containing `..` is
refused before a file is touched. Tests plant pages in a MockPal instead of on disk.
*/

/// Serves files below a directory for GET requests.
#[derive(Debug, Clone)]
pub struct StaticFileService {
    pal: PalHandle,
}

impl StaticFileService {
    /// Create a service serving files from the PAL's base directory.
    pub fn new(pal: PalHandle) -> Self {
        Self { pal }
    }

    /// Serve the file named by the request path. `/` and other directory paths
    /// resolve to their `index.html`.
    pub fn serve(&self, request: &HttpRequest) -> MotdResult<HttpResponse> {
        if request.method() != &HttpMethod::Get {
            return Err(Box::new(MotdError::method_not_allowed(request.method().as_str())));
        }

        let Some(path) = Self::file_path(request.route()) else {
            debug!(path = request.path(), "rejected static file path");
            return Ok(HttpResponse::not_found());
        };

        if !self.pal.file_exists(&path)? {
            debug!(path = %path, "static file not found");
            return Ok(HttpResponse::not_found());
        }

        let content = self.pal.read_file_to_bytes(&path)?;
        Ok(HttpResponse::ok()
            .with_content_type(Self::guess_content_type(&path))
            .with_body(content))
    }

    fn file_path(route: &str) -> Option<FilePath> {
        let decoded = percent_decode_str(route).decode_utf8().ok()?;
        let relative = decoded.trim_start_matches('/');
        let path = if relative.is_empty() || relative.ends_with('/') {
            FilePath::from(relative).join("index.html")
        } else {
            FilePath::from(relative)
        };
        (!path.escapes_base()).then_some(path)
    }

    fn guess_content_type(path: &FilePath) -> &'static str {
        let extension = path.extension().map(str::to_lowercase);
        match extension.as_deref() {
            Some("html" | "htm") => "text/html; charset=utf-8",
            Some("css") => "text/css",
            Some("js" | "mjs") => "application/javascript",
            Some("json") => "application/json",
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("ico") => "image/x-icon",
            Some("woff") => "font/woff",
            Some("woff2") => "font/woff2",
            Some("txt") => "text/plain; charset=utf-8",
            _ => "application/octet-stream",
        }
    }
}
