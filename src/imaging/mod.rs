//! Image pixel work: pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only) |
//! | **Resize** | Lanczos3 `resize_exact` |
//! | **Crop** | `resize_to_fill` (fill, then center-crop) |
//! | **Encode** | JPEG with quality, PNG / GIF / WebP by extension |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//!
//! Deciding *which* variants to make lives in [`crate::sizes`] and
//! [`crate::generate`]; this module only executes the decision.

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{CropParams, Quality, ResizeParams};
pub use rust_backend::{RustBackend, is_supported_extension};
