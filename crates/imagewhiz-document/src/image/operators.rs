// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster transform operators: recompress, reformat, rotate/flip, crop and
// enhance. Each operator maps (item, settings) to a new item and falls back to
// the unchanged item when the codec cannot handle it.

use imagewhiz_core::error::{Result, WhizError};
use imagewhiz_core::{CropRectangle, MediaFormat, MediaItem, RotateOption, TargetFormat, ToolId, ToolSettings};
use imagewhiz_core::types::rewrite_extension;
use tracing::{debug, instrument, warn};

use super::codec::BitmapCodec;
use super::processor::ImageProcessor;

/// Suffix inserted before the new extension by the reformat tool.
pub const CONVERTED_SUFFIX: &str = "_converted";

/// One raster stage, closed over the settings it runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOperator {
    Recompress { quality: u8 },
    Reformat { target: TargetFormat, quality: u8 },
    RotateFlip { option: RotateOption, quality: u8 },
    Crop { rect: Option<CropRectangle>, quality: u8 },
    Enhance { quality: u8 },
}

/// Result of applying an operator to one item.
#[derive(Debug)]
pub struct OperatorOutcome {
    pub item: MediaItem,
    /// Set when the operator fell back to returning the item unchanged.
    pub fallback: Option<WhizError>,
}

/// What a successful transform changes on the item.
struct Rewrite {
    content: Option<Vec<u8>>,
    format: MediaFormat,
    name: String,
}

impl RasterOperator {
    /// Build the operator for a raster tool's settings. Document tools have no
    /// raster operator. `encode_quality` is used by stages that re-encode
    /// without a quality setting of their own.
    pub fn from_settings(settings: &ToolSettings, encode_quality: u8) -> Option<Self> {
        let quality = encode_quality;
        match settings {
            ToolSettings::Recompress { quality } => Some(Self::Recompress { quality: *quality }),
            ToolSettings::Reformat { target } => Some(Self::Reformat {
                target: *target,
                quality,
            }),
            ToolSettings::RotateFlip { option } => Some(Self::RotateFlip {
                option: *option,
                quality,
            }),
            ToolSettings::Crop { rect } => Some(Self::Crop { rect: *rect, quality }),
            ToolSettings::Enhance => Some(Self::Enhance { quality }),
            ToolSettings::Merge
            | ToolSettings::Split { .. }
            | ToolSettings::StripMetadata
            | ToolSettings::RemovePages { .. } => None,
        }
    }

    pub fn tool_id(&self) -> ToolId {
        match self {
            Self::Recompress { .. } => ToolId::Recompress,
            Self::Reformat { .. } => ToolId::Reformat,
            Self::RotateFlip { .. } => ToolId::RotateFlip,
            Self::Crop { .. } => ToolId::Crop,
            Self::Enhance { .. } => ToolId::Enhance,
        }
    }

    /// True when the stage cannot change any item: a crop with no usable
    /// rectangle, or a reformat to PDF (assembly happens at packaging time).
    pub fn is_noop_stage(&self) -> bool {
        match self {
            Self::Crop { rect, .. } => rect.is_none_or(|r| r.is_degenerate()),
            Self::Reformat {
                target: TargetFormat::Pdf,
                ..
            } => true,
            _ => false,
        }
    }

    /// Apply the operator to one item.
    ///
    /// Decode and encode failures return the original item with the error in
    /// [`OperatorOutcome::fallback`]. Any other error is returned as `Err`.
    #[instrument(skip(self, item, codec), fields(tool = %self.tool_id(), item = %item.id, name = %item.name))]
    pub fn apply(&self, mut item: MediaItem, codec: &dyn BitmapCodec) -> Result<OperatorOutcome> {
        match self.transform(&item, codec) {
            Ok(Some(rewrite)) => {
                if let Some(content) = rewrite.content {
                    debug!(from = item.content.len(), to = content.len(), "Item re-encoded");
                    item.content = content;
                }
                item.format = rewrite.format;
                item.name = rewrite.name;
                Ok(OperatorOutcome {
                    item,
                    fallback: None,
                })
            }
            Ok(None) => Ok(OperatorOutcome {
                item,
                fallback: None,
            }),
            Err(err) if err.is_recoverable_per_item() => {
                warn!(error = %err, "Operator failed; item passed through unchanged");
                Ok(OperatorOutcome {
                    item,
                    fallback: Some(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Compute the change for `item`, or `None` when it is left as is.
    fn transform(&self, item: &MediaItem, codec: &dyn BitmapCodec) -> Result<Option<Rewrite>> {
        match *self {
            Self::Recompress { quality } => {
                let bitmap = codec.decode(&item.content)?;
                let content = codec.encode(&bitmap, item.format, quality)?;
                Ok(Some(Rewrite {
                    content: Some(content),
                    format: item.format,
                    name: item.name.clone(),
                }))
            }

            Self::Reformat { target, quality } => match target {
                TargetFormat::Pdf => Ok(None),
                TargetFormat::Original => Ok(Some(Rewrite {
                    content: None,
                    format: item.format,
                    name: rewrite_extension(&item.name, CONVERTED_SUFFIX, item.format.extension()),
                })),
                TargetFormat::Jpeg | TargetFormat::Png | TargetFormat::WebP => {
                    let format = target.raster_format().ok_or_else(|| {
                        WhizError::Unexpected(format!("{} has no raster format", target.key()))
                    })?;
                    let bitmap = codec.decode(&item.content)?;
                    let content = codec.encode(&bitmap, format, quality)?;
                    Ok(Some(Rewrite {
                        content: Some(content),
                        format,
                        name: rewrite_extension(&item.name, CONVERTED_SUFFIX, format.extension()),
                    }))
                }
            },

            Self::RotateFlip { option, quality } => {
                let bitmap = codec.decode(&item.content)?;
                let rotated = ImageProcessor::from_dynamic(bitmap).rotate_flip(option);
                let content = codec.encode(rotated.as_dynamic(), item.format, quality)?;
                Ok(Some(Rewrite {
                    content: Some(content),
                    format: item.format,
                    name: item.name.clone(),
                }))
            }

            Self::Crop { rect, quality } => {
                let Some(rect) = rect.filter(|r| !r.is_degenerate()) else {
                    return Ok(None);
                };
                let bitmap = codec.decode(&item.content)?;
                let Some(clamped) = rect.clamp_to(bitmap.width(), bitmap.height()) else {
                    debug!(width = bitmap.width(), height = bitmap.height(), "Crop outside bounds; unchanged");
                    return Ok(None);
                };
                let cropped = ImageProcessor::from_dynamic(bitmap).crop(clamped);
                let content = codec.encode(cropped.as_dynamic(), item.format, quality)?;
                Ok(Some(Rewrite {
                    content: Some(content),
                    format: item.format,
                    name: item.name.clone(),
                }))
            }

            Self::Enhance { quality } => {
                let bitmap = codec.decode(&item.content)?;
                let enhanced = ImageProcessor::from_dynamic(bitmap).equalize();
                let content = codec.encode(enhanced.as_dynamic(), item.format, quality)?;
                Ok(Some(Rewrite {
                    content: Some(content),
                    format: item.format,
                    name: item.name.clone(),
                }))
            }
        }
    }
}
