//! Publishing destinations: a name plus a URL, passed around as configuration.

use std::path::{Path, PathBuf};

use crate::manifest::RepositoryEntry;

/// A configured artifact repository with optional credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Repository {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    /// Build a `Repository` from a name and a manifest `RepositoryEntry`.
    pub fn from_entry(name: &str, entry: &RepositoryEntry) -> Self {
        match entry {
            RepositoryEntry::Url(url) => Self::new(name, url),
            RepositoryEntry::Detailed {
                url,
                username,
                password,
            } => Self {
                username: username.clone(),
                password: password.clone(),
                ..Self::new(name, url)
            },
        }
    }

    /// Local directory backing this repository, if it is file-based.
    ///
    /// Accepts `file://` URLs and bare paths; relative paths are resolved
    /// against `base`. Returns `None` for network URLs.
    pub fn local_path(&self, base: &Path) -> Option<PathBuf> {
        if let Some(rest) = self.url.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        if self.url.contains("://") {
            return None;
        }
        let path = Path::new(&self.url);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(base.join(path))
        }
    }

    /// Whether this repository has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}
