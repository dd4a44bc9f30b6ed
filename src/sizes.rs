//! Named image sizes and variant dimension math.
//!
//! A size is a bounding box with a name: `medium` is "fit inside 300×300",
//! `thumbnail` is "fill 150×150 and crop the overflow". Each attachment can
//! have one generated variant per registered size, stored next to the main
//! file as `{stem}-{W}x{H}.{ext}`.
//!
//! A variant only exists when it would differ from the original. A 200×150
//! upload never gets a `large` (1024×1024) variant, so asking for `large`
//! returns nothing rather than an upscaled copy.
//!
//! ## Defaults
//!
//! | Name | Box | Crop |
//! |------|-----|------|
//! | `thumbnail` | 150×150 | yes |
//! | `medium` | 300×300 | no |
//! | `medium_large` | 768×∞ | no |
//! | `large` | 1024×1024 | no |
//!
//! A zero bound means "unbounded in that dimension".

use crate::contract::{FULL_SIZE, ORIGINAL_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizeError {
    #[error("Size name must not be empty")]
    EmptyName,
    #[error("Size name '{0}' is reserved")]
    Reserved(String),
    #[error("Size '{0}' needs a non-zero width or height")]
    Unbounded(String),
}

/// A registered image size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub name: String,
    /// Maximum width in pixels, 0 for unbounded.
    pub width: u32,
    /// Maximum height in pixels, 0 for unbounded.
    pub height: u32,
    /// Fill the box exactly and center-crop instead of fitting inside it.
    pub crop: bool,
}

impl ImageSize {
    pub fn new(name: impl Into<String>, width: u32, height: u32, crop: bool) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            crop,
        }
    }
}

/// All sizes variants can be generated for, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRegistry {
    sizes: BTreeMap<String, ImageSize>,
}

impl SizeRegistry {
    /// An empty registry: only `full` and `original` resolve.
    pub fn empty() -> Self {
        Self {
            sizes: BTreeMap::new(),
        }
    }

    /// Register a size, replacing any size with the same name.
    pub fn register(&mut self, size: ImageSize) -> Result<(), SizeError> {
        if size.name.is_empty() {
            return Err(SizeError::EmptyName);
        }
        if size.name == FULL_SIZE || size.name == ORIGINAL_SIZE {
            return Err(SizeError::Reserved(size.name));
        }
        if size.width == 0 && size.height == 0 {
            return Err(SizeError::Unbounded(size.name));
        }
        self.sizes.insert(size.name.clone(), size);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ImageSize> {
        self.sizes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sizes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSize> {
        self.sizes.values()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Build a registry from the `[sizes]` config table.
    pub fn from_config(
        sizes: &BTreeMap<String, crate::config::SizeConfig>,
    ) -> Result<Self, SizeError> {
        let mut registry = Self::empty();
        for (name, size) in sizes {
            registry.register(ImageSize::new(name, size.width, size.height, size.crop))?;
        }
        Ok(registry)
    }
}

impl Default for SizeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for size in [
            ImageSize::new("thumbnail", 150, 150, true),
            ImageSize::new("medium", 300, 300, false),
            ImageSize::new("medium_large", 768, 0, false),
            ImageSize::new("large", 1024, 1024, false),
        ] {
            registry.sizes.insert(size.name.clone(), size);
        }
        registry
    }
}

/// Dimensions of the variant `size` would produce from an `original` image.
///
/// Returns `None` when no variant should exist: the original has a zero
/// dimension, or the variant would be the same size as the original.
///
/// ```
/// # use media_library::sizes::{ImageSize, variant_dimensions};
/// let medium = ImageSize::new("medium", 300, 300, false);
/// assert_eq!(variant_dimensions((2000, 1500), &medium), Some((300, 225)));
///
/// let large = ImageSize::new("large", 1024, 1024, false);
/// assert_eq!(variant_dimensions((800, 600), &large), None);
/// ```
pub fn variant_dimensions(original: (u32, u32), size: &ImageSize) -> Option<(u32, u32)> {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 || (size.width == 0 && size.height == 0) {
        return None;
    }

    let (w, h) = if size.crop {
        crop_dimensions(original, (size.width, size.height))
    } else {
        fit_dimensions(original, (size.width, size.height))
    };

    if w == 0 || h == 0 || (w >= orig_w && h >= orig_h) {
        return None;
    }
    Some((w, h))
}

/// Scale down to fit inside the box, keeping the aspect ratio. Never upscales.
fn fit_dimensions(original: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (max_w, max_h) = max;

    let w_ratio = if max_w > 0 && orig_w > max_w {
        max_w as f64 / orig_w as f64
    } else {
        1.0
    };
    let h_ratio = if max_h > 0 && orig_h > max_h {
        max_h as f64 / orig_h as f64
    } else {
        1.0
    };
    let ratio = w_ratio.min(h_ratio);
    if ratio >= 1.0 {
        return original;
    }

    let w = (orig_w as f64 * ratio).round().max(1.0) as u32;
    let h = (orig_h as f64 * ratio).round().max(1.0) as u32;
    (w, h)
}

/// Clamp each crop bound to the original; fill an unbounded side from the
/// original's aspect ratio.
fn crop_dimensions(original: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let aspect = orig_w as f64 / orig_h as f64;

    let mut w = target.0.min(orig_w);
    let mut h = target.1.min(orig_h);
    if w == 0 {
        w = (h as f64 * aspect).round() as u32;
    }
    if h == 0 {
        h = (w as f64 / aspect).round() as u32;
    }
    (w, h)
}

/// File name of a generated variant: `dawn.jpg` at 300×225 → `dawn-300x225.jpg`.
pub fn variant_filename(file_name: &str, width: u32, height: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{width}x{height}.{ext}"),
        _ => format!("{file_name}-{width}x{height}"),
    }
}

/// Split a variant stem like `dawn-300x225` into `("dawn", 300, 225)`.
///
/// Returns `None` for stems without a trailing `-WxH` suffix.
pub fn parse_variant_stem(stem: &str) -> Option<(&str, u32, u32)> {
    let (base, suffix) = stem.rsplit_once('-')?;
    if base.is_empty() {
        return None;
    }
    let (w, h) = suffix.split_once('x')?;
    if w.is_empty() || h.is_empty() || !w.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, w.parse().ok()?, h.parse().ok()?))
}
