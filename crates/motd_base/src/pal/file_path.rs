use relative_path::{Component, RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

Every FilePath is resolved against the base directory of the PAL that uses it: the
data directory for the message store, the static directory for asset serving.
Keeping the type relative makes that resolution explicit and lets request paths be
checked for `..` before they get anywhere near the filesystem.
*/

/// Type-safe wrapper for file paths relative to PAL base directory.
///
/// # Examples
///
/// ```
/// use motd_base::FilePath;
///
/// let path = FilePath::from("motd_storage.json");
/// assert_eq!(path.extension(), Some("json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Converts to a regular Path, still relative to the PAL base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }

    /// True for the empty path, which never names a file.
    pub fn is_empty(&self) -> bool {
        self.0.as_str().is_empty()
    }

    /// The extension of the final component, if any.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension()
    }

    /// True if any component is `..`, i.e. the path could leave the base directory.
    pub fn escapes_base(&self) -> bool {
        self.0
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    }

    /// Appends a component to this path.
    pub fn join(&self, other: impl AsRef<str>) -> FilePath {
        Self(self.0.join(other.as_ref()))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        Self(RelativePathBuf::from(p.to_string_lossy().into_owned()))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("motd_storage.json");
        assert_eq!(path.as_path(), Path::new("motd_storage.json"));
    }

    #[test]
    fn test_file_path_from_pathbuf() {
        let pb = PathBuf::from("data/motd.json");
        let path = FilePath::from(pb.as_path());
        assert_eq!(path.as_path(), Path::new("data/motd.json"));
    }

    #[test]
    fn test_file_path_is_empty() {
        assert!(FilePath::from("").is_empty());
        assert!(!FilePath::from("motd.json").is_empty());
    }

    #[test]
    fn test_file_path_extension() {
        assert_eq!(FilePath::from("css/site.css").extension(), Some("css"));
        assert_eq!(FilePath::from("README").extension(), None);
    }

    #[test]
    fn test_file_path_escapes_base() {
        assert!(FilePath::from("../secret.txt").escapes_base());
        assert!(FilePath::from("css/../../secret.txt").escapes_base());
        assert!(!FilePath::from("css/site.css").escapes_base());
    }

    #[test]
    fn test_file_path_join() {
        let path = FilePath::from("static").join("index.html");
        assert_eq!(path, FilePath::from("static/index.html"));
    }

    #[test]
    fn test_file_path_display() {
        let path = FilePath::from("static/index.html");
        assert_eq!(path.to_string(), "static/index.html");
    }
}
