// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imagewhiz-document: Image and document processing for ImageWhiz.
//
// Provides the bitmap codec adapter and raster operators (recompress,
// reformat, rotate/flip, crop, enhance), and the PDF document adapter with its
// operators (merge, split, strip metadata, remove pages) and image assembly.

pub mod image;
pub mod pdf;

// Re-export the primary types so callers can use `imagewhiz_document::ImageCodec` etc.
pub use image::codec::{BitmapCodec, ImageCodec};
pub use image::operators::{OperatorOutcome, RasterOperator};
pub use image::processor::ImageProcessor;
pub use pdf::adapter::{DocumentAdapter, LopdfAdapter, MetadataField, PdfHandle};
pub use pdf::render::PageRenderer;
pub use pdf::writer::PdfWriter;
