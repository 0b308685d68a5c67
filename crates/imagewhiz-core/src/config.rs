// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolkit configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, WhizError};

/// Persistent toolkit settings. Missing JSON fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Page size used when images are assembled into a PDF.
    pub paper_size: crate::PaperSize,
    /// Quality (1-100) for stages that re-encode without a quality setting of
    /// their own (rotate, crop, reformat, enhance).
    pub encode_quality: u8,
    /// Longest edge, in pixels, of upload preview thumbnails.
    pub preview_max_edge: u32,
    /// File name of the archive deliverable.
    pub archive_name: String,
    /// File name of a document assembled from images.
    pub assembled_document_name: String,
    /// File name of a merged document.
    pub merged_document_name: String,
    /// File name of a metadata-stripped document.
    pub compressed_document_name: String,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            encode_quality: 92,
            preview_max_edge: 256,
            archive_name: "processed_images.zip".into(),
            assembled_document_name: "converted_images.pdf".into(),
            merged_document_name: "merged.pdf".into(),
            compressed_document_name: "compressed.pdf".into(),
        }
    }
}

impl ToolkitConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        debug!(?config, "configuration parsed");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.encode_quality) {
            return Err(WhizError::InputRejected(format!(
                "encode_quality must be between 1 and 100, got {}",
                self.encode_quality
            )));
        }
        let (width_mm, height_mm) = self.paper_size.dimensions_mm();
        if width_mm == 0 || height_mm == 0 {
            return Err(WhizError::InputRejected(format!(
                "paper size must have a positive width and height, got {width_mm}x{height_mm} mm"
            )));
        }
        if self.preview_max_edge == 0 {
            return Err(WhizError::InputRejected(
                "preview_max_edge must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ToolkitConfig::from_json(r#"{ "encode_quality": 75 }"#).expect("parse");
        assert_eq!(config.encode_quality, 75);
        assert_eq!(config.archive_name, "processed_images.zip");
        assert_eq!(config.paper_size, crate::PaperSize::A4);
    }

    #[test]
    fn invalid_quality_is_rejected() {
        assert!(ToolkitConfig::from_json(r#"{ "encode_quality": 0 }"#).is_err());
    }

    #[test]
    fn zero_sized_custom_paper_is_rejected() {
        for raw in [
            r#"{ "paper_size": { "Custom": { "width_mm": 0, "height_mm": 150 } } }"#,
            r#"{ "paper_size": { "Custom": { "width_mm": 100, "height_mm": 0 } } }"#,
        ] {
            let err = ToolkitConfig::from_json(raw).expect_err("zero paper");
            assert!(matches!(err, WhizError::InputRejected(_)));
        }
    }

    #[test]
    fn negative_paper_size_does_not_parse() {
        let raw = r#"{ "paper_size": { "Custom": { "width_mm": -10, "height_mm": 150 } } }"#;
        assert!(matches!(
            ToolkitConfig::from_json(raw),
            Err(WhizError::Serialization(_))
        ));
    }

    #[test]
    fn custom_paper_size_parses() {
        let config = ToolkitConfig::from_json(
            r#"{ "paper_size": { "Custom": { "width_mm": 100, "height_mm": 150 } } }"#,
        )
        .expect("parse");
        assert_eq!(config.paper_size.dimensions_mm(), (100, 150));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = ToolkitConfig::from_json("{ not json").expect_err("malformed");
        assert!(matches!(err, WhizError::Serialization(_)));
    }
}
