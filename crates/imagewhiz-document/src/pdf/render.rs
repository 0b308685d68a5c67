// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rendering capability. Rasterising PDF pages is supplied by the host
// (a viewer widget, pdfium, etc.); this crate only consumes it to build page
// thumbnails.

use image::DynamicImage;
use imagewhiz_core::error::Result;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Render page `index` (zero-based) of an opened document to a bitmap.
pub trait PageRenderer<H>: Send + Sync {
    fn render_page(&self, handle: &H, index: usize) -> Result<DynamicImage>;
}

/// Render `page_count` pages and shrink each to fit within `max_edge`.
///
/// The first page that fails to render aborts the batch.
#[instrument(skip(renderer, handle))]
pub fn render_thumbnails<H>(
    renderer: &dyn PageRenderer<H>,
    handle: &H,
    page_count: usize,
    max_edge: u32,
) -> Result<Vec<DynamicImage>> {
    (0..page_count)
        .map(|index| {
            let page = renderer.render_page(handle, index)?;
            let thumbnail = ImageProcessor::from_dynamic(page).fit_within(max_edge);
            debug!(index, width = thumbnail.width(), height = thumbnail.height(), "Page thumbnail");
            Ok(thumbnail.into_dynamic())
        })
        .collect()
}
