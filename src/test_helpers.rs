//! Shared test utilities.
//!
//! Synthetic images are written with the `image` crate so tests never depend
//! on checked-in binary fixtures.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let uploads = write_uploads(tmp.path(), &[("2024/05/dawn.jpg", 2000, 1500)]);
//! let attachment = attachment_for(&uploads, "2024/05/dawn.jpg", 2000, 1500);
//! ```

use crate::attachment::Attachment;
use crate::metadata::AttachmentMetadata;
use crate::uploads::Uploads;
use image::{ImageEncoder, RgbImage};
use std::path::Path;
use std::sync::Arc;

pub use tempfile::TempDir;

/// Base URL used by every test [`Uploads`].
pub const TEST_URL: &str = "https://example.com/uploads";

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write synthetic JPEGs under `<root>/uploads` and return the [`Uploads`].
pub fn write_uploads(root: &Path, files: &[(&str, u32, u32)]) -> Uploads {
    let uploads = Uploads::new(root.join("uploads"), TEST_URL);
    std::fs::create_dir_all(uploads.dir()).unwrap();
    for &(file, width, height) in files {
        create_test_jpeg(&uploads.file_path(file), width, height);
    }
    uploads
}

/// Write a file of exactly `len` bytes (not a valid image; for size tests).
pub fn write_bytes(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, vec![0u8; len]).unwrap();
}

/// An attachment with no variants for `file` in `uploads`.
pub fn attachment_for(uploads: &Uploads, file: &str, width: u32, height: u32) -> Attachment {
    Attachment::new(
        AttachmentMetadata {
            file: file.to_string(),
            width,
            height,
            ..Default::default()
        },
        Arc::new(uploads.clone()),
    )
}
