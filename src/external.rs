//! Images referenced by URL rather than stored in the uploads directory.
//!
//! An [`ExternalImage`] has exactly one rendition, the URL it was built from.
//! No size variants were ever generated for it, so any size other than
//! `full`/`original` resolves to `None` like an ungenerated attachment size.
//!
//! A local copy can be attached with [`ExternalImage::with_local_file`] to make
//! the file size and (if not given explicitly) the dimensions readable.

use crate::contract::{FULL_SIZE, Image, ORIGINAL_SIZE, fmt_src};
use crate::imaging::{Dimensions, ImageBackend, RustBackend};
use crate::metadata::clean_alt;
use crate::uploads::{file_size, url_path};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ExternalImage {
    url: String,
    local_file: Option<PathBuf>,
    alt: String,
    caption: String,
    dimensions: Option<Dimensions>,
    identified: OnceLock<Option<Dimensions>>,
    file_size: OnceLock<Option<u64>>,
}

impl ExternalImage {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local_file: None,
            alt: String::new(),
            caption: String::new(),
            dimensions: None,
            identified: OnceLock::new(),
            file_size: OnceLock::new(),
        }
    }

    /// A local copy of the image, used for file size and dimensions.
    pub fn with_local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Known pixel dimensions; skips reading the local file.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(Dimensions { width, height });
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn local_file(&self) -> Option<&Path> {
        self.local_file.as_deref()
    }

    fn resolved_dimensions(&self) -> Option<Dimensions> {
        if self.dimensions.is_some() {
            return self.dimensions;
        }
        *self.identified.get_or_init(|| {
            let path = self.local_file.as_deref()?;
            match RustBackend::new().identify(path) {
                Ok(dims) => Some(dims),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "can't read dimensions");
                    None
                }
            }
        })
    }

    /// URL path without query string or fragment.
    fn bare_path(&self) -> String {
        let path = url_path(&self.url);
        path.split(['?', '#']).next().unwrap_or_default().to_string()
    }
}

impl Image for ExternalImage {
    fn path(&self) -> String {
        url_path(&self.url).into_owned()
    }

    fn caption(&self) -> String {
        self.caption.clone()
    }

    fn size_raw(&self) -> Option<u64> {
        *self
            .file_size
            .get_or_init(|| self.local_file.as_deref().and_then(file_size))
    }

    fn extension(&self) -> Option<String> {
        let path = self.bare_path();
        let file_name = path.rsplit('/').next()?;
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_uppercase())
    }

    fn src(&self, size: &str) -> Option<String> {
        match size {
            FULL_SIZE | ORIGINAL_SIZE if !self.url.is_empty() => Some(self.url.clone()),
            _ => None,
        }
    }

    fn width(&self) -> u32 {
        self.resolved_dimensions().map(|d| d.width).unwrap_or(0)
    }

    fn height(&self) -> u32 {
        self.resolved_dimensions().map(|d| d.height).unwrap_or(0)
    }

    fn alt(&self) -> String {
        clean_alt(&self.alt)
    }
}

impl fmt::Display for ExternalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_src(self, f)
    }
}
