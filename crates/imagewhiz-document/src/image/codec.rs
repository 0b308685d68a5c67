// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bitmap codec adapter: decode encoded bytes to a bitmap and encode a bitmap
// to a target format/quality. The default implementation uses the `image`
// crate's built-in codecs.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};
use imagewhiz_core::MediaFormat;
use imagewhiz_core::error::{Result, WhizError};
use tracing::{debug, instrument};

/// Decode/encode capability consumed by the raster operators.
///
/// Implementations must be shareable across the blocking worker threads a
/// pipeline stage fans out to.
pub trait BitmapCodec: Send + Sync {
    /// Decode encoded image bytes. Fails with [`WhizError::Decode`].
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    /// Encode `image` as `format`. `quality` (1-100) applies to lossy formats
    /// only. Fails with [`WhizError::Encode`].
    fn encode(&self, image: &DynamicImage, format: MediaFormat, quality: u8) -> Result<Vec<u8>>;
}

/// Codec backed by the `image` crate.
///
/// WebP output is lossless: the pure-Rust encoder has no lossy mode, so
/// `quality` only affects JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl BitmapCodec for ImageCodec {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        let img = image::load_from_memory(bytes)
            .map_err(|err| WhizError::Decode(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded");
        Ok(img)
    }

    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn encode(&self, image: &DynamicImage, format: MediaFormat, quality: u8) -> Result<Vec<u8>> {
        let quality = quality.clamp(1, 100);
        let mut buffer = Vec::new();

        match format {
            MediaFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = image.to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|err| WhizError::Encode(format!("JPEG encoding failed: {}", err)))?;
            }
            MediaFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                image
                    .write_with_encoder(encoder)
                    .map_err(|err| WhizError::Encode(format!("PNG encoding failed: {}", err)))?;
            }
            MediaFormat::WebP => {
                let rgba = image.to_rgba8();
                let encoder = WebPEncoder::new_lossless(&mut buffer);
                rgba.write_with_encoder(encoder)
                    .map_err(|err| WhizError::Encode(format!("WebP encoding failed: {}", err)))?;
            }
            MediaFormat::Gif | MediaFormat::Bmp | MediaFormat::Tiff => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                buffer = encode_to_format(&rgba, image_format(format))?;
            }
            MediaFormat::Pdf => {
                return Err(WhizError::Encode(
                    "application/pdf is not a raster format".into(),
                ));
            }
        }

        debug!(?format, quality, output_bytes = buffer.len(), "Image encoded");
        Ok(buffer)
    }
}

/// Map a raster media format to the `image` crate's format enum.
fn image_format(format: MediaFormat) -> ImageFormat {
    match format {
        MediaFormat::Jpeg => ImageFormat::Jpeg,
        MediaFormat::Png => ImageFormat::Png,
        MediaFormat::WebP => ImageFormat::WebP,
        MediaFormat::Gif => ImageFormat::Gif,
        MediaFormat::Bmp => ImageFormat::Bmp,
        MediaFormat::Tiff | MediaFormat::Pdf => ImageFormat::Tiff,
    }
}

/// Sniff the format of encoded bytes from their magic number.
pub fn sniff_format(bytes: &[u8]) -> Option<MediaFormat> {
    if bytes.starts_with(b"%PDF-") {
        return Some(MediaFormat::Pdf);
    }
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some(MediaFormat::Jpeg),
        ImageFormat::Png => Some(MediaFormat::Png),
        ImageFormat::WebP => Some(MediaFormat::WebP),
        ImageFormat::Gif => Some(MediaFormat::Gif),
        ImageFormat::Bmp => Some(MediaFormat::Bmp),
        ImageFormat::Tiff => Some(MediaFormat::Tiff),
        _ => None,
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| WhizError::Encode(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
