//! CLI output formatting.
//!
//! Every attachment is shown with a header line (positional index + title)
//! followed by indented context lines. Titles come first because they are
//! what a reader recognises; file paths are secondary.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! 001 dawn
//!     Source: 2024/05/dawn.jpg
//!     2000x1500, 1.2 MB
//!     Sizes: large, medium, thumbnail
//! 002 (poster-24x36.jpg)
//!     Source: 2024/06/poster-24x36.jpg
//!     0x0
//!     Sizes: none
//!
//! Found 2 attachments
//! ```
//!
//! ## Generate
//!
//! ```text
//! Generating sizes for 2 attachments
//! 001 2024/05/dawn.jpg
//!     thumbnail: dawn-150x150.jpg (existing)
//!     medium: dawn-300x225.jpg (generated)
//!     large: skipped
//! ```
//!
//! ## Show
//!
//! ```text
//! path:      /uploads/2024/05/dawn.jpg
//! src:       https://example.com/uploads/2024/05/dawn.jpg
//! ...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::contract::Image;
use crate::generate::{GenerateEvent, GenerateStats, VariantStatus};
use crate::library::Library;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Titled attachments show the title, untitled ones the file name in parens.
///
/// ```text
/// 001 golden hour
/// 002 (IMG_0042.jpg)
/// ```
fn attachment_line(index: usize, title: &str, file_name: &str) -> String {
    if title.is_empty() {
        format!("{} ({})", format_index(index), file_name)
    } else {
        format!("{} {}", format_index(index), title)
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Format the scan result as an inventory of attachments.
///
/// File sizes are read from disk, so the lines reflect the current uploads
/// directory rather than the manifest alone.
pub fn format_scan_output(library: &Library) -> Vec<String> {
    let mut lines = Vec::new();

    for (idx, attachment) in library.attachments().enumerate() {
        let meta = attachment.metadata();
        lines.push(attachment_line(idx + 1, &meta.title, meta.file_name()));
        lines.push(format!("    Source: {}", meta.file));
        if let Some(original) = &meta.original_image {
            lines.push(format!("    Original: {}", original));
        }
        match attachment.size() {
            Some(size) => lines.push(format!("    {}x{}, {}", meta.width, meta.height, size)),
            None => lines.push(format!("    {}x{}", meta.width, meta.height)),
        }
        let sizes: Vec<&str> = attachment.available_sizes().collect();
        if sizes.is_empty() {
            lines.push("    Sizes: none".to_string());
        } else {
            lines.push(format!("    Sizes: {}", sizes.join(", ")));
        }
        if !meta.caption.is_empty() {
            lines.push(format!("    Caption: {}", meta.caption));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Found {}",
        plural(library.len(), "attachment", "attachments")
    ));
    lines
}

pub fn print_scan_output(library: &Library) {
    for line in format_scan_output(library) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Format a single generate progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::Started { attachment_count } => vec![format!(
            "Generating sizes for {}",
            plural(*attachment_count, "attachment", "attachments")
        )],
        GenerateEvent::AttachmentProcessed {
            index,
            file,
            variants,
            skipped,
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), file)];
            for variant in variants {
                let status = match variant.status {
                    VariantStatus::Existing => "existing",
                    VariantStatus::Generated => "generated",
                };
                lines.push(format!("    {}: {} ({})", variant.size, variant.file, status));
            }
            for size in skipped {
                lines.push(format!("    {}: skipped", size));
            }
            lines
        }
    }
}

pub fn format_generate_summary(stats: &GenerateStats) -> String {
    format!("Sizes: {}", stats)
}

// ============================================================================
// Show
// ============================================================================

/// Every accessor of an image, one per line.
///
/// Unavailable values print as `-` so the layout is stable. Values share one
/// column, widened when the `src(size)` label needs it.
pub fn format_image_details(image: &dyn Image, size: &str) -> Vec<String> {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    let or_dash_str = |value: String| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value
        }
    };

    let rows = [
        ("path:".to_string(), or_dash_str(image.path())),
        ("src:".to_string(), or_dash(image.src_full())),
        (format!("src({}):", size), or_dash(image.src(size))),
        ("extension:".to_string(), or_dash(image.extension())),
        ("size:".to_string(), or_dash(image.size())),
        (
            "size_raw:".to_string(),
            or_dash(image.size_raw().map(|b| b.to_string())),
        ),
        ("width:".to_string(), image.width().to_string()),
        ("height:".to_string(), image.height().to_string()),
        ("aspect:".to_string(), format!("{:.4}", image.aspect())),
        ("alt:".to_string(), or_dash_str(image.alt())),
        ("caption:".to_string(), or_dash_str(image.caption())),
    ];
    let column = rows.iter().map(|(label, _)| label.len() + 1).max().unwrap_or(0);
    rows.into_iter()
        .map(|(label, value)| format!("{:<column$}{}", label, value))
        .collect()
}

pub fn print_image_details(image: &dyn Image, size: &str) {
    for line in format_image_details(image, size) {
        println!("{}", line);
    }
}
