use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Callers need to match on a small, closed set of failure kinds (the HTTP layer
  turns a missing backing file into a 500 but a bad method into a 405)
- Context strings and span traces can be attached without losing the kind
- No dependencies beyond the tracing stack we already carry
 */

/// Error variants that can occur in motd operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file that is expected to exist is missing
    NotFound { path: PathBuf },

    /// File content exists but cannot be decoded
    CorruptData {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Input was rejected before any work was done
    Validation { message: String },

    /// The HTTP method is not accepted by the endpoint
    MethodNotAllowed { method: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::NotFound { path } => write!(f, "File not found: {}", path.display()),
            ErrorKind::CorruptData { path, source } => {
                write!(f, "Corrupt data in {}: {}", path.display(), source)
            }
            ErrorKind::Validation { message } => write!(f, "Validation failed: {}", message),
            ErrorKind::MethodNotAllowed { method } => write!(f, "Method not allowed: {}", method),
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and Error?
ErrorKind holds the structural variant callers match on. Error wraps it with the
runtime extras: a stack of context strings, an optional cause, and the span trace
that was active when the error was created.
*/

/// Error type wrapping [`ErrorKind`] with context, an optional cause and a span trace.
pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<Error>>,
    span_trace: SpanTrace,
}

impl Error {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a catch-all error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation {
            message: message.into(),
        })
    }

    /// Creates a not-found error for the given path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(ErrorKind::NotFound { path: path.into() })
    }

    /// Creates an error for a rejected HTTP method.
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed {
            method: method.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: impl Into<Box<Error>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context strings, oldest first.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the error recorded with [`Error::caused_by`], if any.
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// True if this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let children = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == children { "└─" } else { "├─" };
            write!(f, "\n{}{} {}", indent, branch, ctx)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\n{}└─ cause: {}", indent, cause.kind)?;
            cause.fmt_tree(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::CorruptData { source, .. } => Some(source),
            _ => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

/* 📖 # Why a tree-shaped Debug output?
Errors end up in logs and in test failures. Printing the message, each context
entry, each cause and the span trace on its own line reads much better there than
the derived struct dump would.
*/
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        self.fmt_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            write!(f, "\nTrace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

pub type MotdError = Error;

/// Standard result type for motd operations.
///
/// The error is boxed to keep the result small on the success path.
pub type MotdResult<T> = std::result::Result<T, Box<MotdError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> MotdResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> MotdResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for MotdResult<T> {
    fn context(self, context: impl Into<String>) -> MotdResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> MotdResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::MotdError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed message error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let path = PathBuf::from("test.txt");
        let error = Error::new(ErrorKind::FileError {
            path: path.clone(),
            source: io_err,
        });

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => assert_eq!(p, &path),
            _ => panic!("Expected FileError variant"),
        }
        assert!(error.source().is_some());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("motd.json").is_not_found());
        assert!(!Error::message("other").is_not_found());
    }

    #[test]
    fn test_err_macro() {
        let error: Box<MotdError> = crate::err!("bad value {}", 42);
        assert_eq!(error.to_string(), "bad value 42");
    }

    #[test]
    fn test_bail_macro() {
        fn fails() -> MotdResult<()> {
            crate::bail!("gave up after {} tries", 3);
        }
        assert_eq!(fails().unwrap_err().to_string(), "gave up after 3 tries");
    }
}
