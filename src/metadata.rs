//! Stored attachment metadata and its filesystem sources.
//!
//! Every attachment in the library carries one [`AttachmentMetadata`] record:
//! where the main file lives, its pixel dimensions, which size variants have
//! been generated, and the human-entered text (title, caption, alt).
//!
//! ## Text sources (read during scan)
//!
//! - **Title**: derived from the filename stem. `golden-hour_02.jpg` becomes
//!   "golden hour 02".
//! - **Caption**: a sidecar text file with the same stem, `dawn.txt` next to
//!   `dawn.jpg`. Plain text, no special format.
//! - **Alt text**: a second sidecar, `dawn.alt.txt`. Kept separate from the
//!   caption because the two serve different readers: the caption is shown
//!   to everyone, the alt text replaces the image for screen readers.
//!
//! Missing or empty sidecars give an empty string, never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata for one attachment, as stored in `library.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// Main file, relative to the uploads directory (`2024/05/dawn.jpg`).
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// Generated variants keyed by size name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sizes: BTreeMap<String, SizeVariant>,
    /// File name of the upload before it was scaled down on import, in the
    /// same directory as `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    /// Pixel dimensions of `original_image`, 0 when unknown.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub original_width: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub original_height: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub alt: String,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl AttachmentMetadata {
    /// Directory part of `file`, without a trailing slash. Empty for files at
    /// the top of the uploads directory.
    pub fn dir(&self) -> &str {
        self.file.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// File name part of `file`.
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.file)
    }

    /// Uploads-relative path of a file stored next to the main file.
    pub fn sibling(&self, file_name: &str) -> String {
        match self.dir() {
            "" => file_name.to_string(),
            dir => format!("{dir}/{file_name}"),
        }
    }
}

/// A generated size variant, stored next to the main file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// File name only (`dawn-300x225.jpg`).
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// Read the caption sidecar (`dawn.txt`) for an image.
pub fn read_caption(image_path: &Path) -> String {
    read_sidecar(image_path, "txt")
}

/// Read the alt text sidecar (`dawn.alt.txt`) for an image.
pub fn read_alt(image_path: &Path) -> String {
    clean_alt(&read_sidecar(image_path, "alt.txt"))
}

fn read_sidecar(image_path: &Path, extension: &str) -> String {
    let sidecar = image_path.with_extension(extension);
    std::fs::read_to_string(sidecar)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Strip HTML tags and surrounding whitespace from alt text.
pub fn clean_alt(alt: &str) -> String {
    let mut result = String::with_capacity(alt.len());
    let mut in_tag = false;
    for c in alt.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result.trim().to_string()
}

/// Display title from a filename stem: dashes and underscores become spaces.
pub fn title_from_stem(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// MIME type for an image file extension (case-insensitive).
pub fn mime_type_for(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
