//! The image accessor contract.
//!
//! Templates and markup helpers never care whether a picture is a file in the
//! uploads directory, a URL on somebody else's server, or something else
//! entirely. They talk to the [`Image`] trait, and every concrete type
//! ([`Attachment`](crate::attachment::Attachment),
//! [`ExternalImage`](crate::external::ExternalImage)) implements it.
//!
//! ## Soft failure
//!
//! "Not available" is never an error here. An unreadable file gives `None`
//! from [`Image::size_raw`], a size that was never generated gives `None` from
//! [`Image::src`], and rendering code is expected to fall back to a
//! placeholder instead of aborting the page.
//!
//! ## String conversion
//!
//! Every implementer's `Display` is the full-size source URL. Use [`fmt_src`]
//! to write it so the two paths cannot drift apart:
//!
//! ```
//! # use media_library::contract::{Image, fmt_src};
//! # use std::fmt;
//! struct Pixel;
//! impl Image for Pixel {
//!     fn path(&self) -> String { "/pixel.png".into() }
//!     fn caption(&self) -> String { String::new() }
//!     fn size_raw(&self) -> Option<u64> { None }
//!     fn extension(&self) -> Option<String> { Some("PNG".into()) }
//!     fn src(&self, size: &str) -> Option<String> {
//!         (size == "full").then(|| "https://example.com/pixel.png".into())
//!     }
//!     fn width(&self) -> u32 { 1 }
//!     fn height(&self) -> u32 { 1 }
//!     fn alt(&self) -> String { String::new() }
//! }
//! impl fmt::Display for Pixel {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt_src(self, f) }
//! }
//!
//! assert_eq!(Pixel.to_string(), "https://example.com/pixel.png");
//! assert_eq!(Pixel.src("large"), None);
//! ```

use crate::filesize::format_size;
use std::fmt;

/// The size identifier used when none is given.
pub const FULL_SIZE: &str = "full";

/// The upload as it arrived, before any downscaling on import.
///
/// Falls back to [`FULL_SIZE`] when no separate original was kept.
pub const ORIGINAL_SIZE: &str = "original";

/// Accessors every image-like value exposes to templates.
pub trait Image: fmt::Display {
    /// Site-relative path of the underlying file, e.g. `/uploads/2024/05/dawn.jpg`.
    fn path(&self) -> String;

    /// Caption text. May be empty.
    fn caption(&self) -> String;

    /// File size in a human-readable format (`"16 KB"`, `"1 MB"`).
    ///
    /// `None` exactly when [`size_raw`](Image::size_raw) is `None`.
    fn size(&self) -> Option<String> {
        self.size_raw().map(format_size)
    }

    /// File size in bytes, or `None` if it can't be read.
    fn size_raw(&self) -> Option<u64>;

    /// Uppercase file extension (`"JPG"`), or `None` if there isn't one.
    fn extension(&self) -> Option<String>;

    /// Source URL for a named size (`"medium"`, `"large"`, [`FULL_SIZE`]).
    ///
    /// Returns `None` if that size was never generated for this image.
    fn src(&self, size: &str) -> Option<String>;

    /// Source URL of the full size.
    fn src_full(&self) -> Option<String> {
        self.src(FULL_SIZE)
    }

    /// Width in pixels, 0 when unknown.
    fn width(&self) -> u32;

    /// Height in pixels, 0 when unknown.
    fn height(&self) -> u32;

    /// Width divided by height. See [`aspect_ratio`] for the zero-height case.
    fn aspect(&self) -> f64 {
        aspect_ratio(self.width(), self.height())
    }

    /// Alt text. May be empty, but should always be rendered.
    fn alt(&self) -> String;
}

/// `width / height`, or `0.0` when the height is zero.
///
/// A zero height means the dimensions are unknown; returning `0.0` keeps the
/// result finite so it can go straight into CSS or arithmetic.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    width as f64 / height as f64
}

/// Write the full-size source URL, or nothing when it isn't available.
///
/// Shared `Display` body for every [`Image`] implementer.
pub fn fmt_src<I: Image + ?Sized>(image: &I, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(image.src(FULL_SIZE).as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        width: u32,
        height: u32,
        bytes: Option<u64>,
    }

    impl Image for Fixed {
        fn path(&self) -> String {
            "/fixed.jpg".to_string()
        }
        fn caption(&self) -> String {
            String::new()
        }
        fn size_raw(&self) -> Option<u64> {
            self.bytes
        }
        fn extension(&self) -> Option<String> {
            Some("JPG".to_string())
        }
        fn src(&self, size: &str) -> Option<String> {
            (size == FULL_SIZE).then(|| "https://example.com/fixed.jpg".to_string())
        }
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn alt(&self) -> String {
            String::new()
        }
    }

    impl fmt::Display for Fixed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt_src(self, f)
        }
    }

    fn fixed(width: u32, height: u32) -> Fixed {
        Fixed {
            width,
            height,
            bytes: Some(1_048_576),
        }
    }

    #[test]
    fn aspect_is_width_over_height() {
        assert_eq!(fixed(1600, 900).aspect(), 1600.0 / 900.0);
        assert_eq!(fixed(400, 500).aspect(), 0.8);
    }

    #[test]
    fn aspect_with_zero_height_is_zero() {
        assert_eq!(aspect_ratio(800, 0), 0.0);
        assert_eq!(fixed(800, 0).aspect(), 0.0);
        assert!(fixed(0, 0).aspect().is_finite());
    }

    #[test]
    fn aspect_with_zero_width_is_zero() {
        assert_eq!(aspect_ratio(0, 600), 0.0);
    }

    #[test]
    fn size_follows_size_raw() {
        assert_eq!(fixed(1, 1).size().as_deref(), Some("1 MB"));

        let unreadable = Fixed {
            width: 1,
            height: 1,
            bytes: None,
        };
        assert_eq!(unreadable.size(), None);
    }

    #[test]
    fn display_is_full_src() {
        let img = fixed(1, 1);
        assert_eq!(img.to_string(), img.src(FULL_SIZE).unwrap());
        assert_eq!(img.src_full(), img.src(FULL_SIZE));
    }

    #[test]
    fn works_as_trait_object() {
        let img = fixed(300, 200);
        let dynamic: &dyn Image = &img;
        assert_eq!(dynamic.to_string(), "https://example.com/fixed.jpg");
        assert_eq!(dynamic.src("medium"), None);
        assert_eq!(dynamic.aspect(), 1.5);
    }
}
