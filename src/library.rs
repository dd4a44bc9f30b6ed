//! Attachment discovery and the `library.json` manifest.
//!
//! The uploads directory is the source of truth. [`Library::scan`] walks it
//! and works out which files are attachments and which are generated
//! variants of another file, purely from names:
//!
//! ```text
//! uploads/2024/05/
//! ├── dawn.jpg              # Attachment
//! ├── dawn.txt              # Caption sidecar
//! ├── dawn.alt.txt          # Alt text sidecar
//! ├── dawn-150x150.jpg      # Variant of dawn.jpg (matches `thumbnail`)
//! ├── dawn-300x225.jpg      # Variant of dawn.jpg (matches `medium`)
//! ├── pano.jpg              # Kept original of pano-scaled.jpg
//! ├── pano-scaled.jpg       # Attachment, downscaled on import
//! └── pano-300x150.jpg      # Variant of pano-scaled.jpg
//! ```
//!
//! ## Rules
//!
//! - `name-WxH.ext` is a variant only when `name.ext` exists next to it;
//!   otherwise it is an attachment that happens to have that name.
//! - `name-scaled.ext` next to `name.ext` is the attachment, and `name.ext`
//!   is recorded as its `original_image`.
//! - A variant is filed under a size name when its dimensions equal what
//!   [`variant_dimensions`] computes for that size. Variants that match no
//!   registered size are ignored.
//!
//! ## Manifest
//!
//! The scan result is saved as JSON (`{ "version": 1, "attachments": [...] }`)
//! so later commands don't have to re-read image headers.

use crate::attachment::Attachment;
use crate::imaging::{ImageBackend, is_supported_extension};
use crate::metadata::{
    AttachmentMetadata, SizeVariant, mime_type_for, read_alt, read_caption, title_from_stem,
};
use crate::sizes::{SizeRegistry, parse_variant_stem, variant_dimensions};
use crate::uploads::Uploads;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

/// Version of the manifest format. Bump when the layout changes.
const MANIFEST_VERSION: u32 = 1;

const SCALED_SUFFIX: &str = "-scaled";

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Uploads directory not found: {0}")]
    MissingUploads(PathBuf),
    #[error("Library manifest version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryManifest {
    version: u32,
    attachments: Vec<AttachmentMetadata>,
}

/// All attachments in one uploads directory.
#[derive(Debug, Clone)]
pub struct Library {
    uploads: Arc<Uploads>,
    entries: Vec<AttachmentMetadata>,
}

impl Library {
    /// Build from known entries. Entries are kept sorted by file.
    pub fn new(uploads: Uploads, mut entries: Vec<AttachmentMetadata>) -> Self {
        entries.sort_by(|a, b| a.file.cmp(&b.file));
        Self {
            uploads: Arc::new(uploads),
            entries,
        }
    }

    /// Discover attachments and their variants under the uploads directory.
    pub fn scan(
        uploads: Uploads,
        registry: &SizeRegistry,
        backend: &impl ImageBackend,
    ) -> Result<Self, LibraryError> {
        if !uploads.dir().is_dir() {
            return Err(LibraryError::MissingUploads(uploads.dir().to_path_buf()));
        }

        let mut by_dir: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entry in WalkDir::new(uploads.dir()).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let supported = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(is_supported_extension);
            if !supported {
                continue;
            }
            let Some(rel) = uploads.relative_file(entry.path()) else {
                continue;
            };
            let (dir, name) = match rel.rsplit_once('/') {
                Some((dir, name)) => (dir.to_string(), name.to_string()),
                None => (String::new(), rel),
            };
            by_dir.entry(dir).or_default().insert(name);
        }

        let mut entries = Vec::new();
        for (dir, names) in &by_dir {
            for group in group_directory(names) {
                entries.push(build_metadata(&uploads, dir, &group, registry, backend));
            }
        }

        Ok(Self::new(uploads, entries))
    }

    /// Load a saved manifest.
    pub fn load(path: &Path, uploads: Uploads) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path)?;
        let manifest: LibraryManifest = serde_json::from_str(&content)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(LibraryError::Version {
                found: manifest.version,
                expected: MANIFEST_VERSION,
            });
        }
        Ok(Self::new(uploads, manifest.attachments))
    }

    /// Save as a pretty-printed JSON manifest.
    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let manifest = LibraryManifest {
            version: MANIFEST_VERSION,
            attachments: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    pub fn entries(&self) -> &[AttachmentMetadata] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [AttachmentMetadata] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attachment by uploads-relative file (`2024/05/dawn.jpg`)
    /// or site-relative path (`/uploads/2024/05/dawn.jpg`).
    pub fn get(&self, file: &str) -> Option<Attachment> {
        self.entries
            .iter()
            .find(|meta| meta.file == file || self.uploads.rel_path(&meta.file) == file)
            .map(|meta| Attachment::new(meta.clone(), Arc::clone(&self.uploads)))
    }

    pub fn attachments(&self) -> impl Iterator<Item = Attachment> + '_ {
        self.entries
            .iter()
            .map(|meta| Attachment::new(meta.clone(), Arc::clone(&self.uploads)))
    }
}

/// One attachment's files within a directory.
#[derive(Debug, PartialEq, Eq)]
struct FileGroup {
    main: String,
    original: Option<String>,
    /// `(file name, width, height)` parsed from the variant name.
    variants: Vec<(String, u32, u32)>,
}

fn split_name(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, ""))
}

fn join_name(stem: &str, ext: &str) -> String {
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

/// Sort the image files of one directory into attachments and variants.
fn group_directory(names: &BTreeSet<String>) -> Vec<FileGroup> {
    // Unscaled originals that a `-scaled` file stands in for
    let shadowed: BTreeSet<String> = names
        .iter()
        .filter_map(|name| {
            let (stem, ext) = split_name(name);
            let base = stem.strip_suffix(SCALED_SUFFIX)?;
            let original = join_name(base, ext);
            names.contains(&original).then_some(original)
        })
        .collect();

    // The attachment a file belongs to, following the shadowing above
    let owner = |name: &str| -> String {
        if shadowed.contains(name) {
            let (stem, ext) = split_name(name);
            join_name(&format!("{stem}{SCALED_SUFFIX}"), ext)
        } else {
            name.to_string()
        }
    };

    let mut groups: BTreeMap<String, FileGroup> = BTreeMap::new();
    let mut variants: Vec<(String, String, u32, u32)> = Vec::new();

    for name in names {
        let (stem, ext) = split_name(name);
        if let Some((base, w, h)) = parse_variant_stem(stem) {
            let parent = join_name(base, ext);
            if names.contains(&parent) {
                variants.push((owner(&parent), name.clone(), w, h));
                continue;
            }
        }
        if shadowed.contains(name) {
            continue;
        }
        let (stem, ext) = split_name(name);
        let original = stem
            .strip_suffix(SCALED_SUFFIX)
            .map(|base| join_name(base, ext))
            .filter(|original| shadowed.contains(original));
        groups.insert(
            name.clone(),
            FileGroup {
                main: name.clone(),
                original,
                variants: Vec::new(),
            },
        );
    }

    for (owner, name, w, h) in variants {
        if let Some(group) = groups.get_mut(&owner) {
            group.variants.push((name, w, h));
        }
    }

    groups.into_values().collect()
}

fn build_metadata(
    uploads: &Uploads,
    dir: &str,
    group: &FileGroup,
    registry: &SizeRegistry,
    backend: &impl ImageBackend,
) -> AttachmentMetadata {
    let mut meta = AttachmentMetadata {
        file: group.main.clone(),
        original_image: group.original.clone(),
        ..Default::default()
    };
    if !dir.is_empty() {
        meta.file = format!("{dir}/{}", group.main);
    }

    let main_path = uploads.file_path(&meta.file);
    match backend.identify(&main_path) {
        Ok(dims) => {
            meta.width = dims.width;
            meta.height = dims.height;
        }
        Err(e) => {
            tracing::warn!(file = %meta.file, error = %e, "can't read image dimensions");
        }
    }

    if let Some(original) = &group.original {
        let original_path = uploads.file_path(&meta.sibling(original));
        match backend.identify(&original_path) {
            Ok(dims) => {
                meta.original_width = dims.width;
                meta.original_height = dims.height;
            }
            Err(e) => {
                tracing::warn!(file = %original, error = %e, "can't read original image dimensions");
            }
        }
    }

    // Text comes from the upload as the author named it, before any scaling
    let text_source = group.original.as_deref().unwrap_or(&group.main);
    let text_path = uploads.file_path(&meta.sibling(text_source));
    meta.title = title_from_stem(split_name(text_source).0);
    meta.caption = read_caption(&text_path);
    meta.alt = read_alt(&text_path);

    for size in registry.iter() {
        let Some((w, h)) = variant_dimensions((meta.width, meta.height), size) else {
            continue;
        };
        let found = group
            .variants
            .iter()
            .find(|(_, vw, vh)| (*vw, *vh) == (w, h));
        if let Some((file, _, _)) = found {
            let mime_type = mime_type_for(split_name(file).1).unwrap_or("application/octet-stream");
            meta.sizes.insert(
                size.name.clone(),
                SizeVariant {
                    file: file.clone(),
                    width: w,
                    height: h,
                    mime_type: mime_type.to_string(),
                },
            );
        }
    }

    tracing::debug!(file = %meta.file, sizes = meta.sizes.len(), "scanned attachment");
    meta
}
