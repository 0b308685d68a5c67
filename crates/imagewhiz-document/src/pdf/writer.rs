// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble raster images into a new document using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use imagewhiz_core::PaperSize;
use imagewhiz_core::error::{Result, WhizError};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// At 72 DPI one image pixel is one PDF point.
const PLACEMENT_DPI: f32 = 72.0;

/// Where an image lands on a page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
}

/// Uniform aspect-preserving scale that fits `image` inside `page`, centred.
pub fn fit_to_page(page_w: f32, page_h: f32, image_w: f32, image_h: f32) -> Placement {
    let scale = (page_w / image_w).min(page_h / image_h);
    Placement {
        scale,
        x: (page_w - image_w * scale) / 2.0,
        y: (page_h - image_h * scale) / 2.0,
    }
}

/// Creates new PDF documents from raster images, one page per image.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Assemble `images` into one document, in order. Each image is scaled to
    /// fit its page and centred.
    #[instrument(skip(self, images), fields(images = images.len(), paper = ?self.paper_size))]
    pub fn assemble(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(WhizError::InputRejected(
                "no images to assemble into a document".into(),
            ));
        }

        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        if w_mm == 0 || h_mm == 0 {
            return Err(WhizError::InputRejected(format!(
                "paper size {w_mm}x{h_mm} mm has no area"
            )));
        }

        let (page_w, page_h) = self.page_dimensions();
        let (page_w_pt, page_h_pt) = (page_w.into_pt().0, page_h.into_pt().0);
        let title = self.title.as_deref().unwrap_or("ImageWhiz Images");
        info!(title, "Assembling image PDF");

        let mut doc = PdfDocument::new(title);
        let mut pages = Vec::with_capacity(images.len());

        for image in images {
            let (img_width, img_height) = (image.width() as usize, image.height() as usize);
            if img_width == 0 || img_height == 0 {
                return Err(WhizError::Encode("cannot place an empty image".into()));
            }

            // Convert to RGB8 for printpdf.
            let raw = RawImage {
                pixels: RawImageData::U8(image.to_rgb8().into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let placement = fit_to_page(page_w_pt, page_h_pt, img_width as f32, img_height as f32);
            debug!(scale = placement.scale, x = placement.x, y = placement.y, "Image placed on page");

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(placement.x)),
                    translate_y: Some(Pt(placement.y)),
                    scale_x: Some(placement.scale),
                    scale_y: Some(placement.scale),
                    dpi: Some(PLACEMENT_DPI),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(warnings = warnings.len(), output_bytes = output.len(), "Image PDF serialised");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn wide_image_is_limited_by_page_width() {
        let placement = fit_to_page(600.0, 800.0, 1200.0, 400.0);
        assert!((placement.scale - 0.5).abs() < f32::EPSILON);
        assert!((placement.x - 0.0).abs() < f32::EPSILON);
        assert!((placement.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn small_image_is_scaled_up_and_centred() {
        let placement = fit_to_page(600.0, 800.0, 100.0, 100.0);
        assert!((placement.scale - 6.0).abs() < 1e-5);
        assert!((placement.x - 0.0).abs() < 1e-3);
        assert!((placement.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn assembles_one_page_per_image() {
        let images: Vec<DynamicImage> = [(40, 20), (10, 30), (16, 16)]
            .into_iter()
            .map(|(w, h)| DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 30, 30]))))
            .collect();
        let bytes = PdfWriter::new(PaperSize::A4).assemble(&images).expect("assemble");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn zero_area_paper_is_rejected() {
        let paper = PaperSize::Custom {
            width_mm: 0,
            height_mm: 297,
        };
        let err = PdfWriter::new(paper)
            .assemble(&[DynamicImage::new_rgb8(4, 4)])
            .expect_err("zero width");
        assert!(matches!(err, WhizError::InputRejected(_)));
    }

    #[test]
    fn nothing_to_assemble_is_rejected() {
        let err = PdfWriter::new(PaperSize::Letter).assemble(&[]).expect_err("empty");
        assert!(matches!(err, WhizError::InputRejected(_)));
    }
}
