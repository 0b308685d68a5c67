// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ImageWhiz toolkit.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for an uploaded media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content types the toolkit understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Pdf,
}

impl MediaFormat {
    /// MIME type string for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
        }
    }

    /// Preferred file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Pdf => "pdf",
        }
    }

    /// Parse a MIME type. Parameters such as `; charset=` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            "image/tiff" => Some(Self::Tiff),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Infer the format from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = split_extension(name);
        ext.and_then(Self::from_extension)
    }

    /// Whether this is a raster bitmap format (everything except PDF).
    pub fn is_raster(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Standard paper sizes used when assembling images into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// One uploaded raster asset as it flows through the pipeline.
///
/// `width`/`height` are captured at upload time and are advisory only: stages
/// that change geometry (rotate, crop) do not refresh them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: ItemId,
    /// Display and output file name; rewritten by format-changing stages.
    pub name: String,
    /// Current content type, authoritative for encode/decode decisions.
    pub format: MediaFormat,
    /// Encoded payload, owned by this item.
    pub content: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl MediaItem {
    pub fn new(
        name: impl Into<String>,
        format: MediaFormat,
        content: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            format,
            content,
            width,
            height,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// SHA-256 of the current payload as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }
}

/// Rotation or mirror applied by the rotate/flip tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotateOption {
    #[serde(rename = "rotate90")]
    Rotate90,
    #[serde(rename = "rotate180")]
    Rotate180,
    #[serde(rename = "rotate270")]
    Rotate270,
    #[serde(rename = "flipH")]
    FlipHorizontal,
    #[serde(rename = "flipV")]
    FlipVertical,
}

impl RotateOption {
    pub const ALL: [RotateOption; 5] = [
        Self::Rotate90,
        Self::Rotate180,
        Self::Rotate270,
        Self::FlipHorizontal,
        Self::FlipVertical,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Rotate90 => "rotate90",
            Self::Rotate180 => "rotate180",
            Self::Rotate270 => "rotate270",
            Self::FlipHorizontal => "flipH",
            Self::FlipVertical => "flipV",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.key() == key)
    }

    /// Whether the output swaps width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// Target of the reformat tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "jpg")]
    Jpeg,
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "webp")]
    WebP,
    /// Assemble every processed item into one paginated document.
    #[serde(rename = "pdf")]
    Pdf,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 5] = [
        Self::Original,
        Self::Jpeg,
        Self::Png,
        Self::WebP,
        Self::Pdf,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Pdf => "pdf",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let lower = key.to_ascii_lowercase();
        match lower.as_str() {
            "jpeg" => Some(Self::Jpeg),
            other => Self::ALL.into_iter().find(|target| target.key() == other),
        }
    }

    /// Raster format produced per item, if the target re-encodes.
    pub fn raster_format(&self) -> Option<MediaFormat> {
        match self {
            Self::Jpeg => Some(MediaFormat::Jpeg),
            Self::Png => Some(MediaFormat::Png),
            Self::WebP => Some(MediaFormat::WebP),
            Self::Original | Self::Pdf => None,
        }
    }
}

/// Rectangle shared by every item in a crop stage, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// A crop rectangle after clamping to a concrete image's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedCrop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRectangle {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// A rectangle with no area never crops anything.
    pub fn is_degenerate(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Intersect with `[0, width] x [0, height]`.
    ///
    /// Returns `None` when the clamped width or height is `<= 0`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<ClampedCrop> {
        if self.is_degenerate() {
            return None;
        }
        let x0 = self.x.clamp(0, i64::from(width));
        let y0 = self.y.clamp(0, i64::from(height));
        let x1 = self.x.saturating_add(self.w).clamp(0, i64::from(width));
        let y1 = self.y.saturating_add(self.h).clamp(0, i64::from(height));

        let clamped_w = x1 - x0;
        let clamped_h = y1 - y0;
        if clamped_w <= 0 || clamped_h <= 0 {
            return None;
        }

        // All four values are within [0, u32::MAX] after clamping.
        Some(ClampedCrop {
            x: x0 as u32,
            y: y0 as u32,
            width: clamped_w as u32,
            height: clamped_h as u32,
        })
    }
}

/// Ids the next pipeline run applies to. An empty selection means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSelection {
    ids: HashSet<ItemId>,
}

impl ItemSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of(ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// True when nothing is explicitly selected, i.e. every item applies.
    pub fn is_all(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn includes(&self, id: &ItemId) -> bool {
        self.is_all() || self.ids.contains(id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Add the id if absent, remove it if present.
    pub fn toggle(&mut self, id: ItemId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn remove(&mut self, id: &ItemId) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Split a file name into stem and extension.
///
/// A trailing dot or a name with no dot yields no extension. Directory
/// separators are never treated as part of an extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let base_start = name.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match name[base_start..].rfind('.') {
        Some(rel) => {
            let dot = base_start + rel;
            let ext = &name[dot + 1..];
            if ext.is_empty() {
                (name, None)
            } else {
                (&name[..dot], Some(ext))
            }
        }
        None => (name, None),
    }
}

/// Replace the extension of `name`, inserting `suffix` before the new one:
/// `photo.png` + (`_converted`, `webp`) becomes `photo_converted.webp`.
pub fn rewrite_extension(name: &str, suffix: &str, extension: &str) -> String {
    let (stem, _) = split_extension(name);
    format!("{stem}{suffix}.{extension}")
}
