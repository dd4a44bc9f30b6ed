//! # Media Library
//!
//! A WordPress-style media library over a plain uploads directory. Every
//! image file is an attachment; generated size variants live next to it and
//! are recognised by name (`dawn-300x225.jpg` beside `dawn.jpg`).
//!
//! # The Image Contract
//!
//! Templates and tools work against the [`contract::Image`] trait rather
//! than a concrete type. It answers the questions a page needs about an
//! image: where it is (`path`, `src`), what it is (`extension`, `size`,
//! `width`, `height`, `aspect`) and how to describe it (`alt`, `caption`).
//! Two implementations ship:
//!
//! - [`attachment::Attachment`]: a file in the uploads directory, with size
//!   variants, caption and alt sidecars.
//! - [`external::ExternalImage`]: an image referenced by URL.
//!
//! Accessors never fail. Missing files, unreadable headers and ungenerated
//! sizes come back as `None`, `0` or an empty string so one bad image can't
//! break a page.
//!
//! # Workflow
//!
//! ```text
//! 1. Scan       uploads/  →  library.json   (files → attachments + variants)
//! 2. Generate   library   →  uploads/       (missing size variants)
//! 3. Render     Image     →  <img>          (src, alt, width/height, srcset)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`contract`] | The `Image` trait every implementer satisfies |
//! | [`attachment`] | File-backed `Image` with size variants |
//! | [`external`] | URL-backed `Image` |
//! | [`library`] | Discovers attachments under the uploads directory; JSON manifest |
//! | [`generate`] | Writes missing size variants in parallel |
//! | [`render`] | `<img>` markup with Maud |
//! | [`sizes`] | Registered image sizes and variant dimension math |
//! | [`filesize`] | Human-readable byte counts |
//! | [`metadata`] | Stored attachment metadata and sidecar text files |
//! | [`uploads`] | Uploads directory location and public URL |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`imaging`] | Pure-Rust identify, resize and crop |
//! | [`output`] | CLI output formatting |

pub mod attachment;
pub mod config;
pub mod contract;
pub mod external;
pub mod filesize;
pub mod generate;
pub mod imaging;
pub mod library;
pub mod metadata;
pub mod output;
pub mod render;
pub mod sizes;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_helpers;
