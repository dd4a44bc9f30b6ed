//! The uploads directory: where attachment files live and how they're served.
//!
//! Every stored file is addressed by its uploads-relative path
//! (`2024/05/dawn.jpg`). [`Uploads`] turns that into the three forms callers
//! need:
//!
//! | Form | Example |
//! |------|---------|
//! | Filesystem path | `/srv/site/uploads/2024/05/dawn.jpg` |
//! | Public URL | `https://example.com/uploads/2024/05/dawn.jpg` |
//! | Site-relative path | `/uploads/2024/05/dawn.jpg` |

use std::borrow::Cow;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploads {
    dir: PathBuf,
    url: String,
}

impl Uploads {
    pub fn new(dir: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            dir: dir.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from `[uploads]` config, resolving `dir` against the library root.
    pub fn from_config(root: &Path, config: &crate::config::UploadsConfig) -> Self {
        Self::new(root.join(&config.dir), config.url.as_str())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Base URL, without a trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Absolute filesystem path of an uploads-relative file.
    pub fn file_path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Public URL of an uploads-relative file.
    pub fn file_url(&self, file: &str) -> String {
        format!("{}/{}", self.url, file.trim_start_matches('/'))
    }

    /// Site-relative path of an uploads-relative file: the URL without scheme
    /// and host.
    pub fn rel_path(&self, file: &str) -> String {
        url_path(&self.file_url(file)).into_owned()
    }

    /// Uploads-relative form of a path inside the uploads directory, with `/`
    /// separators. `None` if the path is outside it.
    pub fn relative_file(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.dir).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

/// Size in bytes of a regular file, `None` (logged at debug level) when it
/// can't be read.
pub fn file_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => {
            tracing::debug!(path = %path.display(), "not a regular file, size unavailable");
            None
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "can't read file size");
            None
        }
    }
}

/// Path component of a URL: `https://example.com/a/b.jpg?x=1` → `/a/b.jpg?x=1`.
///
/// URLs without a scheme are returned unchanged. A bare host gives `/`, with
/// any query or fragment kept after it (`https://example.com?x=1` → `/?x=1`).
pub fn url_path(url: &str) -> Cow<'_, str> {
    let Some((_, rest)) = url.split_once("://") else {
        return Cow::Borrowed(url);
    };
    match rest.find(['/', '?', '#']) {
        Some(idx) if rest[idx..].starts_with('/') => Cow::Borrowed(&rest[idx..]),
        Some(idx) => Cow::Owned(format!("/{}", &rest[idx..])),
        None => Cow::Borrowed("/"),
    }
}
