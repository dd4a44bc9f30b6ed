//! `<img>` markup for any [`Image`].
//!
//! Rendering never fails: when the requested size is unavailable the result
//! is empty markup, so one missing variant doesn't break a page.
//!
//! ```text
//! <img src="https://example.com/uploads/2024/05/dawn-300x225.jpg"
//!      alt="Field of wheat" width="300" height="225" loading="lazy"
//!      srcset="…-300x225.jpg 300w, …-768x576.jpg 768w, …"
//!      sizes="(max-width: 300px) 100vw, 300px">
//! ```

use crate::attachment::Attachment;
use crate::contract::{FULL_SIZE, Image};
use maud::{Markup, html};

/// `<img>` for a size of any image.
///
/// `width`/`height` are only emitted for `full`, the one rendition whose
/// dimensions every [`Image`] knows. A kept `original` can be larger.
pub fn img_tag(image: &dyn Image, size: &str) -> Markup {
    let Some(src) = image.src(size) else {
        return html! {};
    };
    let dimensions = match size {
        FULL_SIZE => known(image.width(), image.height()),
        _ => None,
    };
    img(&src, &image.alt(), dimensions, None)
}

/// `<img>` for an attachment size, with `srcset`/`sizes` when there are
/// other renditions of the same shape to choose from.
pub fn attachment_img_tag(attachment: &Attachment, size: &str) -> Markup {
    let Some(src) = attachment.src(size) else {
        return html! {};
    };
    let dimensions = attachment
        .dimensions(size)
        .and_then(|(w, h)| known(w, h));
    let responsive = attachment.srcset(size).map(|srcset| {
        let width = dimensions.map(|(w, _)| w).unwrap_or(attachment.width());
        (srcset, format!("(max-width: {width}px) 100vw, {width}px"))
    });
    img(&src, &attachment.alt(), dimensions, responsive)
}

fn known(width: u32, height: u32) -> Option<(u32, u32)> {
    (width > 0 && height > 0).then_some((width, height))
}

fn img(
    src: &str,
    alt: &str,
    dimensions: Option<(u32, u32)>,
    responsive: Option<(String, String)>,
) -> Markup {
    let (srcset, sizes) = match responsive {
        Some((srcset, sizes)) => (Some(srcset), Some(sizes)),
        None => (None, None),
    };
    html! {
        img src=(src)
            alt=(alt)
            width=[dimensions.map(|(w, _)| w)]
            height=[dimensions.map(|(_, h)| h)]
            loading="lazy"
            srcset=[srcset]
            sizes=[sizes];
    }
}
