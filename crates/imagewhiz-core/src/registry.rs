// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static tool catalog: ids, keys, labels, and default settings.

use std::collections::BTreeSet;

use crate::tools::{ToolId, ToolSettings, ToolTarget};
use crate::types::{RotateOption, TargetFormat};

/// Default quality for the recompress tool.
pub const DEFAULT_RECOMPRESS_QUALITY: u8 = 80;

/// One entry in the tool catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: ToolId,
    /// Stable string key used by front-ends and saved selections.
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub applies_to: ToolTarget,
}

impl ToolDescriptor {
    pub fn default_settings(&self) -> ToolSettings {
        match self.id {
            ToolId::Recompress => ToolSettings::Recompress {
                quality: DEFAULT_RECOMPRESS_QUALITY,
            },
            ToolId::Reformat => ToolSettings::Reformat {
                target: TargetFormat::Original,
            },
            ToolId::RotateFlip => ToolSettings::RotateFlip {
                option: RotateOption::Rotate90,
            },
            ToolId::Crop => ToolSettings::Crop { rect: None },
            ToolId::Enhance => ToolSettings::Enhance,
            ToolId::Merge => ToolSettings::Merge,
            ToolId::Split => ToolSettings::Split {
                pages: BTreeSet::new(),
            },
            ToolId::StripMetadata => ToolSettings::StripMetadata,
            ToolId::RemovePages => ToolSettings::RemovePages {
                pages: BTreeSet::new(),
            },
        }
    }
}

static CATALOG: [ToolDescriptor; 9] = [
    ToolDescriptor {
        id: ToolId::Recompress,
        key: "compress",
        label: "Compress",
        description: "Reduce file size of images.",
        applies_to: ToolTarget::Raster,
    },
    ToolDescriptor {
        id: ToolId::Crop,
        key: "crop",
        label: "Crop",
        description: "Cut out a part of an image.",
        applies_to: ToolTarget::Raster,
    },
    ToolDescriptor {
        id: ToolId::RotateFlip,
        key: "rotate",
        label: "Rotate & Flip",
        description: "Rotate images by 90/180/270 degrees or flip them.",
        applies_to: ToolTarget::Raster,
    },
    ToolDescriptor {
        id: ToolId::Reformat,
        key: "convert",
        label: "Convert",
        description: "Change image format (JPG, PNG, WebP) or assemble a PDF.",
        applies_to: ToolTarget::Raster,
    },
    ToolDescriptor {
        id: ToolId::Enhance,
        key: "enhance",
        label: "Auto Enhance",
        description: "Stretch each colour channel across the full tonal range.",
        applies_to: ToolTarget::Raster,
    },
    ToolDescriptor {
        id: ToolId::Merge,
        key: "merge-pdf",
        label: "Merge PDFs",
        description: "Combine multiple PDF files into one.",
        applies_to: ToolTarget::Document,
    },
    ToolDescriptor {
        id: ToolId::Split,
        key: "split-pdf",
        label: "Split PDF",
        description: "Extract pages from a PDF into a new document.",
        applies_to: ToolTarget::Document,
    },
    ToolDescriptor {
        id: ToolId::StripMetadata,
        key: "compress-pdf",
        label: "Compress PDF",
        description: "Reduce the file size of your PDF document.",
        applies_to: ToolTarget::Document,
    },
    ToolDescriptor {
        id: ToolId::RemovePages,
        key: "remove-pages",
        label: "Remove Pages",
        description: "Delete specific pages from your PDF.",
        applies_to: ToolTarget::Document,
    },
];

/// The full catalog in display order.
pub fn catalog() -> &'static [ToolDescriptor] {
    &CATALOG
}

/// Catalog entries for one kind of input.
pub fn tools_for(target: ToolTarget) -> impl Iterator<Item = &'static ToolDescriptor> {
    CATALOG.iter().filter(move |d| d.applies_to == target)
}

/// Find an entry by key.
pub fn lookup(key: &str) -> Option<&'static ToolDescriptor> {
    CATALOG.iter().find(|d| d.key == key)
}

/// Entry for a known tool id. Every `ToolId` has exactly one entry.
pub fn descriptor(id: ToolId) -> &'static ToolDescriptor {
    match CATALOG.iter().find(|d| d.id == id) {
        Some(descriptor) => descriptor,
        None => unreachable!("tool {id:?} missing from catalog"),
    }
}
