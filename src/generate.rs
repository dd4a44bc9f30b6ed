//! Producing missing size variants.
//!
//! For every attachment and every registered size that has no recorded
//! variant yet, computes the target box with [`variant_dimensions`] and writes
//! `{stem}-{W}x{H}.{ext}` next to the main file:
//!
//! ```text
//! uploads/2024/05/
//! ├── dawn.jpg               # 2000x1500 source
//! ├── dawn-150x150.jpg       # thumbnail (crop)
//! ├── dawn-300x225.jpg       # medium
//! ├── dawn-768x576.jpg       # medium_large
//! └── dawn-1024x768.jpg      # large
//! ```
//!
//! Sizes whose box doesn't fit strictly inside the original are skipped and
//! stay unavailable. A target file that is already on disk is recorded
//! without re-encoding.
//!
//! Attachments are processed in parallel with [rayon](https://docs.rs/rayon).
//! Progress is reported per attachment through an optional channel so the
//! CLI can print while workers run.

use crate::config::LibraryConfig;
use crate::imaging::{BackendError, CropParams, ImageBackend, Quality, ResizeParams};
use crate::library::Library;
use crate::metadata::{AttachmentMetadata, SizeVariant, mime_type_for};
use crate::sizes::{SizeRegistry, variant_dimensions, variant_filename};
use crate::uploads::Uploads;
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Settings for variant generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateConfig {
    pub quality: Quality,
}

impl GenerateConfig {
    pub fn from_library_config(config: &LibraryConfig) -> Self {
        Self {
            quality: Quality::new(config.images.quality),
        }
    }
}

/// What happened to one size of one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Already recorded, or already on disk.
    Existing,
    /// Encoded in this run.
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub size: String,
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub status: VariantStatus,
}

/// Progress events sent while generating.
#[derive(Debug, Clone)]
pub enum GenerateEvent {
    Started { attachment_count: usize },
    AttachmentProcessed {
        /// 1-based position in the library.
        index: usize,
        file: String,
        variants: Vec<VariantInfo>,
        /// Sizes that don't apply to this image.
        skipped: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub generated: u32,
    pub existing: u32,
    pub skipped: u32,
}

impl std::ops::AddAssign for GenerateStats {
    fn add_assign(&mut self, other: Self) {
        self.generated += other.generated;
        self.existing += other.existing;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generated, {} existing, {} skipped",
            self.generated, self.existing, self.skipped
        )
    }
}

/// Generate every missing variant and record it in the library.
pub fn generate(
    library: &mut Library,
    registry: &SizeRegistry,
    backend: &impl ImageBackend,
    config: &GenerateConfig,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateStats, GenerateError> {
    if let Some(tx) = &events {
        tx.send(GenerateEvent::Started {
            attachment_count: library.len(),
        })
        .ok();
    }

    let uploads = library.uploads().clone();
    let per_attachment: Vec<GenerateStats> = library
        .entries_mut()
        .par_iter_mut()
        .enumerate()
        .map(|(idx, meta)| -> Result<GenerateStats, GenerateError> {
            let (stats, variants, skipped) =
                generate_attachment(meta, &uploads, registry, backend, config)?;
            if let Some(tx) = &events {
                tx.send(GenerateEvent::AttachmentProcessed {
                    index: idx + 1,
                    file: meta.file.clone(),
                    variants,
                    skipped,
                })
                .ok();
            }
            Ok(stats)
        })
        .collect::<Result<_, _>>()?;

    let mut total = GenerateStats::default();
    for stats in per_attachment {
        total += stats;
    }
    Ok(total)
}

fn generate_attachment(
    meta: &mut AttachmentMetadata,
    uploads: &Uploads,
    registry: &SizeRegistry,
    backend: &impl ImageBackend,
    config: &GenerateConfig,
) -> Result<(GenerateStats, Vec<VariantInfo>, Vec<String>), GenerateError> {
    let source = uploads.file_path(&meta.file);
    if !source.is_file() {
        return Err(GenerateError::SourceNotFound(source));
    }

    let mut stats = GenerateStats::default();
    let mut variants = Vec::new();
    let mut skipped = Vec::new();

    for size in registry.iter() {
        if let Some(recorded) = meta.sizes.get(&size.name) {
            stats.existing += 1;
            variants.push(VariantInfo {
                size: size.name.clone(),
                file: recorded.file.clone(),
                width: recorded.width,
                height: recorded.height,
                status: VariantStatus::Existing,
            });
            continue;
        }

        let Some((width, height)) = variant_dimensions((meta.width, meta.height), size) else {
            stats.skipped += 1;
            skipped.push(size.name.clone());
            continue;
        };

        let file = variant_filename(meta.file_name(), width, height);
        let output = uploads.file_path(&meta.sibling(&file));
        let status = if output.is_file() {
            stats.existing += 1;
            VariantStatus::Existing
        } else {
            if size.crop {
                backend.crop(&CropParams {
                    source: source.clone(),
                    output,
                    width,
                    height,
                    quality: config.quality,
                })?;
            } else {
                backend.resize(&ResizeParams {
                    source: source.clone(),
                    output,
                    width,
                    height,
                    quality: config.quality,
                })?;
            }
            tracing::debug!(file = %meta.file, size = %size.name, width, height, "generated variant");
            stats.generated += 1;
            VariantStatus::Generated
        };

        let ext = file.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        meta.sizes.insert(
            size.name.clone(),
            SizeVariant {
                file: file.clone(),
                width,
                height,
                mime_type: mime_type_for(ext)
                    .unwrap_or("application/octet-stream")
                    .to_string(),
            },
        );
        variants.push(VariantInfo {
            size: size.name.clone(),
            file,
            width,
            height,
            status,
        });
    }

    Ok((stats, variants, skipped))
}
