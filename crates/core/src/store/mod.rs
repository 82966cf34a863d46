//! On-disk response store keyed by URL host and pathname.
//!
//! Captured bodies live in a directory tree mirroring the URL structure:
//! `<files_dir>/<host>/<pathname>`, with `index.html` standing in for
//! directory-shaped pathnames. The mapping is deterministic across processes
//! and runs, so a cache written by one session is replayed by the next.

use crate::Error;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Index document name appended when a URL pathname denotes a directory.
pub const INDEX_FILE: &str = "index.html";

/// Map a URL to its storage path under `root`.
///
/// Only the host and pathname participate. The query string is deliberately
/// discarded, so URLs differing only in query collapse to the same entry.
/// The pathname's leading slash is stripped before joining so the result
/// always stays under `root`.
pub fn storage_path(root: &Path, url: &Url) -> PathBuf {
    let host = url.host_str().unwrap_or_default();
    let pathname = url.path();

    let mut path = root.join(host);
    let relative = pathname.trim_start_matches('/');
    if !relative.is_empty() {
        path.push(relative);
    }
    if relative.is_empty() || pathname.ends_with('/') {
        path.push(INDEX_FILE);
    }
    path
}

/// Filesystem-backed store for captured response bodies.
///
/// Reads and writes are synchronous whole-file operations; cache entries are
/// small local files and the handlers that touch them run briefly between
/// events.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory itself is only created
    /// when the first response is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage path for `url` under this store's root.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        storage_path(&self.root, url)
    }

    /// Whether a stored response exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Read a stored response body in full.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })
    }

    /// Write a captured response body, creating missing parent directories
    /// first.
    pub fn write(&self, path: &Path, body: &[u8]) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
        }
        fs::write(path, body).map_err(|source| Error::Write { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_str(root: &str, url: &str) -> String {
        let url = Url::parse(url).unwrap();
        storage_path(Path::new(root), &url).display().to_string()
    }

    #[test]
    fn test_storage_path_basic() {
        assert_eq!(path_str("files", "https://example.com/a/b.js"), "files/example.com/a/b.js");
    }

    #[test]
    fn test_storage_path_ignores_query() {
        assert_eq!(path_str("files", "https://example.com/a?x=1"), path_str("files", "https://example.com/a?x=2"));
        assert_eq!(path_str("files", "https://example.com/a?x=1"), path_str("files", "https://example.com/a"));
    }

    #[test]
    fn test_storage_path_root_appends_index() {
        assert_eq!(path_str("files", "https://example.com/"), "files/example.com/index.html");
        assert_eq!(path_str("files", "https://example.com"), "files/example.com/index.html");
    }

    #[test]
    fn test_storage_path_trailing_slash_appends_index() {
        assert_eq!(path_str("files", "https://example.com/assets/"), "files/example.com/assets/index.html");
    }

    #[test]
    fn test_storage_path_ignores_fragment_and_port_keeps_host() {
        assert_eq!(path_str("files", "https://example.com/a#frag"), "files/example.com/a");
    }

    #[test]
    fn test_storage_path_deterministic() {
        let url = Url::parse("https://example.com/x/y?v=3").unwrap();
        assert_eq!(storage_path(Path::new("files"), &url), storage_path(Path::new("files"), &url));
    }

    #[test]
    fn test_write_creates_parents_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let url = Url::parse("https://example.com/deep/nested/a.css").unwrap();
        let path = store.path_for(&url);

        assert!(!store.contains(&path));
        store.write(&path, b"body { color: red }").unwrap();
        assert!(store.contains(&path));
        assert_eq!(store.read(&path).unwrap(), b"body { color: red }");
    }

    #[test]
    fn test_write_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let url = Url::parse("https://example.com/ping").unwrap();
        let path = store.path_for(&url);

        store.write(&path, &[]).unwrap();
        assert!(store.contains(&path));
        assert!(store.read(&path).unwrap().is_empty());
    }

    #[test]
    fn test_contains_is_false_for_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(!store.contains(dir.path()));
    }

    #[test]
    fn test_read_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let url = Url::parse("https://example.com/missing").unwrap();
        let result = store.read(&store.path_for(&url));
        assert!(matches!(result, Err(Error::Read { .. })));
    }
}
