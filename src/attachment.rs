//! File-backed images from the uploads directory.
//!
//! An [`Attachment`] pairs stored [`AttachmentMetadata`] with the [`Uploads`]
//! location it lives in. Everything the [`Image`] contract asks for is
//! answered from those two, plus one `stat` of the main file for its size.
//!
//! ## Size resolution
//!
//! | Requested | Result |
//! |---|---|
//! | `full` | The main file |
//! | `original` | The pre-scaled upload if one was kept, else the main file |
//! | a registered name | The generated variant, or `None` if it was never generated |
//! | anything else | `None` |

use crate::contract::{FULL_SIZE, Image, ORIGINAL_SIZE, fmt_src};
use crate::metadata::{AttachmentMetadata, clean_alt};
use crate::uploads::{Uploads, file_size};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Widest candidate included in a `srcset` (the requested size is always kept).
const MAX_SRCSET_WIDTH: u32 = 2048;

/// Relative aspect difference below which two renditions count as the same shape.
const ASPECT_TOLERANCE: f64 = 0.01;

#[derive(Debug)]
pub struct Attachment {
    meta: AttachmentMetadata,
    uploads: Arc<Uploads>,
    /// Lazily stat'ed file size; `None` inside means unreadable.
    file_size: OnceLock<Option<u64>>,
}

impl Attachment {
    pub fn new(meta: AttachmentMetadata, uploads: Arc<Uploads>) -> Self {
        Self {
            meta,
            uploads,
            file_size: OnceLock::new(),
        }
    }

    pub fn metadata(&self) -> &AttachmentMetadata {
        &self.meta
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    /// Absolute filesystem path of the main file.
    pub fn file_path(&self) -> PathBuf {
        self.uploads.file_path(&self.meta.file)
    }

    /// Names of the generated variants, in name order.
    pub fn available_sizes(&self) -> impl Iterator<Item = &str> {
        self.meta.sizes.keys().map(String::as_str)
    }

    /// Pixel dimensions of a size, `None` if it isn't available.
    pub fn dimensions(&self, size: &str) -> Option<(u32, u32)> {
        match size {
            FULL_SIZE => Some((self.meta.width, self.meta.height)),
            ORIGINAL_SIZE => Some(self.original_dimensions()),
            name => self.meta.sizes.get(name).map(|v| (v.width, v.height)),
        }
    }

    /// Dimensions of the kept pre-scaled upload, or of the main file when
    /// there is none.
    fn original_dimensions(&self) -> (u32, u32) {
        match self.meta.original_image {
            Some(_) => (self.meta.original_width, self.meta.original_height),
            None => (self.meta.width, self.meta.height),
        }
    }

    /// `srcset` value for the given size: every rendition with the same
    /// shape, narrowest first (`"…-300x225.jpg 300w, …-1024x768.jpg 1024w"`).
    ///
    /// The kept pre-scaled upload is only a candidate when `original` is
    /// requested, and then it is the widest one.
    ///
    /// `None` when the size is unavailable or there is nothing to choose
    /// between.
    pub fn srcset(&self, size: &str) -> Option<String> {
        let (req_w, req_h) = self.dimensions(size)?;
        if req_w == 0 || req_h == 0 {
            return None;
        }
        let requested_aspect = req_w as f64 / req_h as f64;

        let original = match (&self.meta.original_image, size) {
            (Some(file), ORIGINAL_SIZE) => Some((req_w, req_h, self.meta.sibling(file))),
            _ => None,
        };
        let full = (self.meta.width, self.meta.height, self.meta.file.clone());
        let variants = self
            .meta
            .sizes
            .values()
            .map(|v| (v.width, v.height, self.meta.sibling(&v.file)));

        let mut candidates: Vec<(u32, String)> = original
            .into_iter()
            .chain(std::iter::once(full))
            .chain(variants)
            .filter(|&(w, h, _)| w > 0 && h > 0)
            .filter(|&(w, h, _)| {
                let aspect = w as f64 / h as f64;
                (aspect - requested_aspect).abs() / requested_aspect < ASPECT_TOLERANCE
            })
            .filter(|&(w, _, _)| w <= MAX_SRCSET_WIDTH || w == req_w)
            .map(|(w, _, file)| (w, file))
            .collect();

        candidates.sort_by_key(|(w, _)| *w);
        candidates.dedup_by_key(|(w, _)| *w);
        if candidates.len() < 2 {
            return None;
        }

        Some(
            candidates
                .iter()
                .map(|(w, file)| format!("{} {}w", self.uploads.file_url(file), w))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

}

impl Image for Attachment {
    fn path(&self) -> String {
        self.uploads.rel_path(&self.meta.file)
    }

    fn caption(&self) -> String {
        self.meta.caption.clone()
    }

    fn size_raw(&self) -> Option<u64> {
        *self
            .file_size
            .get_or_init(|| file_size(&self.file_path()))
    }

    fn extension(&self) -> Option<String> {
        Path::new(self.meta.file_name())
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_uppercase)
    }

    fn src(&self, size: &str) -> Option<String> {
        let file = match size {
            FULL_SIZE => self.meta.file.clone(),
            ORIGINAL_SIZE => match &self.meta.original_image {
                Some(original) => self.meta.sibling(original),
                None => self.meta.file.clone(),
            },
            name => self.meta.sibling(&self.meta.sizes.get(name)?.file),
        };
        Some(self.uploads.file_url(&file))
    }

    fn width(&self) -> u32 {
        self.meta.width
    }

    fn height(&self) -> u32 {
        self.meta.height
    }

    fn alt(&self) -> String {
        clean_alt(&self.meta.alt)
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_src(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SizeVariant;
    use crate::test_helpers::*;

    fn variant(file: &str, width: u32, height: u32) -> SizeVariant {
        SizeVariant {
            file: file.to_string(),
            width,
            height,
            mime_type: "image/jpeg".to_string(),
        }
    }

    /// 2000×1500 `dawn.jpg` with thumbnail, medium, and large variants recorded.
    fn dawn(uploads: &Uploads) -> Attachment {
        let mut meta = AttachmentMetadata {
            file: "2024/05/dawn.jpg".to_string(),
            width: 2000,
            height: 1500,
            title: "dawn".to_string(),
            caption: "First light".to_string(),
            alt: " Mist over <b>pines</b> ".to_string(),
            ..Default::default()
        };
        meta.sizes
            .insert("thumbnail".into(), variant("dawn-150x150.jpg", 150, 150));
        meta.sizes
            .insert("medium".into(), variant("dawn-300x225.jpg", 300, 225));
        meta.sizes
            .insert("large".into(), variant("dawn-1024x768.jpg", 1024, 768));
        Attachment::new(meta, Arc::new(uploads.clone()))
    }

    #[test]
    fn path_is_site_relative() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        assert_eq!(dawn(&uploads).path(), "/uploads/2024/05/dawn.jpg");
    }

    #[test]
    fn src_full_and_display_agree() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(
            img.src(FULL_SIZE).as_deref(),
            Some("https://example.com/uploads/2024/05/dawn.jpg")
        );
        assert_eq!(img.to_string(), img.src(FULL_SIZE).unwrap());
    }

    #[test]
    fn src_for_generated_variant() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        let medium = img.src("medium").unwrap();
        assert_eq!(
            medium,
            "https://example.com/uploads/2024/05/dawn-300x225.jpg"
        );
        assert_ne!(Some(medium), img.src(FULL_SIZE));
    }

    #[test]
    fn src_for_missing_variant_is_none() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(img.src("medium_large"), None);
        assert_eq!(img.src("no-such-size"), None);
        assert_eq!(img.src(""), None);
    }

    #[test]
    fn src_original_falls_back_to_full() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(img.src(ORIGINAL_SIZE), img.src(FULL_SIZE));
    }

    #[test]
    fn src_original_uses_kept_original() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let meta = AttachmentMetadata {
            file: "2024/05/pano-scaled.jpg".to_string(),
            width: 2560,
            height: 1280,
            original_image: Some("pano.jpg".to_string()),
            ..Default::default()
        };
        let img = Attachment::new(meta, Arc::new(uploads));
        assert_eq!(
            img.src(ORIGINAL_SIZE).as_deref(),
            Some("https://example.com/uploads/2024/05/pano.jpg")
        );
        assert_eq!(
            img.src(FULL_SIZE).as_deref(),
            Some("https://example.com/uploads/2024/05/pano-scaled.jpg")
        );
    }

    fn scaled_pano() -> Attachment {
        let mut meta = AttachmentMetadata {
            file: "2024/05/pano-scaled.jpg".to_string(),
            width: 640,
            height: 320,
            original_image: Some("pano.jpg".to_string()),
            original_width: 800,
            original_height: 400,
            ..Default::default()
        };
        meta.sizes.insert(
            "medium".to_string(),
            SizeVariant {
                file: "pano-scaled-300x150.jpg".to_string(),
                width: 300,
                height: 150,
                mime_type: "image/jpeg".to_string(),
            },
        );
        Attachment::new(meta, Arc::new(Uploads::new("uploads", TEST_URL)))
    }

    #[test]
    fn original_dimensions_are_the_kept_upload() {
        let img = scaled_pano();
        assert_eq!(img.dimensions(ORIGINAL_SIZE), Some((800, 400)));
        assert_eq!(img.dimensions(FULL_SIZE), Some((640, 320)));
        assert_eq!(img.width(), 640);
    }

    #[test]
    fn original_dimensions_without_kept_upload_are_full() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(img.dimensions(ORIGINAL_SIZE), img.dimensions(FULL_SIZE));
    }

    #[test]
    fn srcset_for_original_tops_out_at_kept_upload() {
        let img = scaled_pano();
        assert_eq!(
            img.srcset(ORIGINAL_SIZE).as_deref(),
            Some(
                "https://example.com/uploads/2024/05/pano-scaled-300x150.jpg 300w, \
                 https://example.com/uploads/2024/05/pano-scaled.jpg 640w, \
                 https://example.com/uploads/2024/05/pano.jpg 800w"
            )
        );
        // Other sizes never offer the unscaled upload
        let full = img.srcset(FULL_SIZE).unwrap();
        assert!(!full.contains("/pano.jpg"));
    }

    #[test]
    fn size_of_one_megabyte_file() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        write_bytes(&uploads.file_path("2024/05/dawn.jpg"), 1_048_576);

        let img = dawn(&uploads);
        assert_eq!(img.size_raw(), Some(1_048_576));
        assert_eq!(img.size().as_deref(), Some("1 MB"));
    }

    #[test]
    fn size_of_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(img.size_raw(), None);
        assert_eq!(img.size(), None);
    }

    #[test]
    fn size_of_directory_is_none() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        std::fs::create_dir_all(uploads.file_path("2024/05/dawn.jpg")).unwrap();
        assert_eq!(dawn(&uploads).size_raw(), None);
    }

    #[test]
    fn size_is_read_once() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        write_bytes(&uploads.file_path("2024/05/dawn.jpg"), 16_555);

        let img = dawn(&uploads);
        assert_eq!(img.size().as_deref(), Some("16 KB"));
        std::fs::remove_file(uploads.file_path("2024/05/dawn.jpg")).unwrap();
        assert_eq!(img.size_raw(), Some(16_555));
    }

    #[test]
    fn extension_is_uppercase() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        assert_eq!(dawn(&uploads).extension().as_deref(), Some("JPG"));

        let no_ext = attachment_for(&uploads, "2024/05/README", 0, 0);
        assert_eq!(no_ext.extension(), None);
    }

    #[test]
    fn text_accessors() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!(img.caption(), "First light");
        assert_eq!(img.alt(), "Mist over pines");
        assert_eq!(img.title(), "dawn");
    }

    #[test]
    fn dimensions_and_aspect() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        assert_eq!((img.width(), img.height()), (2000, 1500));
        assert!((img.aspect() - 4.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(img.dimensions("medium"), Some((300, 225)));
        assert_eq!(img.dimensions("medium_large"), None);
    }

    #[test]
    fn unknown_dimensions_give_zero_aspect() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = attachment_for(&uploads, "broken.jpg", 0, 0);
        assert_eq!(img.aspect(), 0.0);
    }

    #[test]
    fn srcset_lists_same_shape_renditions() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        let srcset = img.srcset("large").unwrap();
        assert_eq!(
            srcset,
            "https://example.com/uploads/2024/05/dawn-300x225.jpg 300w, \
             https://example.com/uploads/2024/05/dawn-1024x768.jpg 1024w, \
             https://example.com/uploads/2024/05/dawn.jpg 2000w"
        );
        // The square thumbnail has a different shape
        assert!(!srcset.contains("150x150"));
    }

    #[test]
    fn srcset_caps_width_but_keeps_requested() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let mut meta = dawn(&uploads).metadata().clone();
        meta.width = 4000;
        meta.height = 3000;
        let img = Attachment::new(meta, Arc::new(uploads));

        let large = img.srcset("large").unwrap();
        assert!(!large.contains("4000w"));
        let full = img.srcset(FULL_SIZE).unwrap();
        assert!(full.ends_with("dawn.jpg 4000w"));
    }

    #[test]
    fn srcset_unavailable_or_single_is_none() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        assert_eq!(dawn(&uploads).srcset("medium_large"), None);

        let lonely = attachment_for(&uploads, "lonely.jpg", 800, 600);
        assert_eq!(lonely.srcset(FULL_SIZE), None);
    }

    #[test]
    fn available_sizes_in_name_order() {
        let tmp = TempDir::new().unwrap();
        let uploads = write_uploads(tmp.path(), &[]);
        let img = dawn(&uploads);
        let sizes: Vec<&str> = img.available_sizes().collect();
        assert_eq!(sizes, vec!["large", "medium", "thumbnail"]);
    }
}
