// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: rotate/flip, crop, histogram equalisation, thumbnails and
// palette sampling. Operates on in-memory bitmaps using the `image` and
// `imageproc` crates.

use std::collections::HashMap;

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::contrast::equalize_histogram;
use imagewhiz_core::{ClampedCrop, RotateOption};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Only every Nth pixel is counted when sampling a palette.
const PALETTE_SAMPLE_STRIDE: usize = 4;

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `#rrggbb` form.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Bitmap transform chain operating on a single decoded image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let bitmap = ImageProcessor::from_dynamic(codec.decode(&bytes)?)
///     .rotate_flip(RotateOption::Rotate90)
///     .equalize()
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Apply one of the lossless quarter-turn rotations or mirrors.
    #[instrument(skip(self), fields(option = option.key()))]
    pub fn rotate_flip(self, option: RotateOption) -> Self {
        let image = match option {
            RotateOption::Rotate90 => self.image.rotate90(),
            RotateOption::Rotate180 => self.image.rotate180(),
            RotateOption::Rotate270 => self.image.rotate270(),
            RotateOption::FlipHorizontal => self.image.fliph(),
            RotateOption::FlipVertical => self.image.flipv(),
        };
        debug!(new_w = image.width(), new_h = image.height(), "Rotate/flip complete");
        Self { image }
    }

    /// Crop to a rectangle already clamped to this image's bounds.
    #[instrument(skip(self), fields(x = rect.x, y = rect.y, width = rect.width, height = rect.height))]
    pub fn crop(self, rect: ClampedCrop) -> Self {
        info!("Cropping image");
        let cropped = self.image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Self { image: cropped }
    }

    /// Equalise the histogram of each colour channel independently,
    /// stretching it across the full tonal range. Alpha is preserved.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn equalize(self) -> Self {
        let rgba = self.image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let channel = |index: usize| -> GrayImage {
            let plane = GrayImage::from_fn(width, height, |x, y| {
                image::Luma([rgba.get_pixel(x, y).0[index]])
            });
            equalize_histogram(&plane)
        };
        let (red, green, blue) = (channel(0), channel(1), channel(2));

        let equalized = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                red.get_pixel(x, y).0[0],
                green.get_pixel(x, y).0[0],
                blue.get_pixel(x, y).0[0],
                rgba.get_pixel(x, y).0[3],
            ])
        });
        debug!("Histogram equalisation applied");
        Self {
            image: DynamicImage::ImageRgba8(equalized),
        }
    }

    /// Shrink so the longest edge is at most `max_edge`, preserving aspect
    /// ratio. Images already within bounds are returned unchanged.
    pub fn fit_within(self, max_edge: u32) -> Self {
        if self.width() <= max_edge && self.height() <= max_edge {
            return self;
        }
        Self {
            image: self.image.thumbnail(max_edge, max_edge),
        }
    }

    // -- Analysis ---------------------------------------------------------------

    /// The `count` most frequent colours, sampling every fourth pixel.
    ///
    /// Colours that occur equally often keep the order in which they were
    /// first sampled.
    pub fn dominant_colors(&self, count: usize) -> Vec<Rgb> {
        let rgb = self.image.to_rgb8();
        let mut tally: HashMap<Rgb, (usize, usize)> = HashMap::new();

        for (order, pixel) in rgb.pixels().step_by(PALETTE_SAMPLE_STRIDE).enumerate() {
            let [r, g, b] = pixel.0;
            tally.entry(Rgb { r, g, b }).or_insert((0, order)).0 += 1;
        }

        let mut ranked: Vec<(Rgb, (usize, usize))> = tally.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });
        ranked.into_iter().take(count).map(|(colour, _)| colour).collect()
    }
}
