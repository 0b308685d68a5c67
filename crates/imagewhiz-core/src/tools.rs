// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool identifiers, per-tool settings, ordered tool selection, and the
// settings-editing session.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WhizError};
use crate::registry;
use crate::types::{CropRectangle, RotateOption, TargetFormat};

/// Every tool the toolkit knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    // Raster tools
    Recompress,
    Reformat,
    RotateFlip,
    Crop,
    Enhance,
    // Document tools
    Merge,
    Split,
    StripMetadata,
    RemovePages,
}

/// What kind of input a tool operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolTarget {
    Raster,
    Document,
}

impl ToolId {
    pub fn target(&self) -> ToolTarget {
        match self {
            Self::Recompress | Self::Reformat | Self::RotateFlip | Self::Crop | Self::Enhance => {
                ToolTarget::Raster
            }
            Self::Merge | Self::Split | Self::StripMetadata | Self::RemovePages => {
                ToolTarget::Document
            }
        }
    }

    /// Catalog key (`compress`, `convert`, `rotate`, ...).
    pub fn key(&self) -> &'static str {
        registry::descriptor(*self).key
    }

    /// Look a tool up by catalog key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        registry::lookup(key).map(|descriptor| descriptor.id)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A tool together with its settings payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolSettings {
    Recompress { quality: u8 },
    Reformat { target: TargetFormat },
    RotateFlip { option: RotateOption },
    Crop { rect: Option<CropRectangle> },
    Enhance,
    Merge,
    Split { pages: BTreeSet<usize> },
    StripMetadata,
    RemovePages { pages: BTreeSet<usize> },
}

impl ToolSettings {
    pub fn tool_id(&self) -> ToolId {
        match self {
            Self::Recompress { .. } => ToolId::Recompress,
            Self::Reformat { .. } => ToolId::Reformat,
            Self::RotateFlip { .. } => ToolId::RotateFlip,
            Self::Crop { .. } => ToolId::Crop,
            Self::Enhance => ToolId::Enhance,
            Self::Merge => ToolId::Merge,
            Self::Split { .. } => ToolId::Split,
            Self::StripMetadata => ToolId::StripMetadata,
            Self::RemovePages { .. } => ToolId::RemovePages,
        }
    }

    /// Check the payload is usable before it is stored.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Recompress { quality } if !(1..=100).contains(quality) => {
                Err(WhizError::InputRejected(format!(
                    "quality must be between 1 and 100, got {quality}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Ordered, duplicate-free set of tools. Insertion order is application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSelection {
    order: Vec<ToolId>,
}

impl ToolSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from tool ids; later duplicates are dropped.
    pub fn of(tools: impl IntoIterator<Item = ToolId>) -> Self {
        let mut selection = Self::new();
        for tool in tools {
            selection.insert(tool);
        }
        selection
    }

    /// Build from catalog keys, silently skipping keys the registry does not know.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut selection = Self::new();
        for key in keys {
            match ToolId::from_key(key) {
                Some(tool) => {
                    selection.insert(tool);
                }
                None => debug!(key, "ignoring unknown tool key"),
            }
        }
        selection
    }

    /// Append `tool` if not already present. Returns whether it was added.
    pub fn insert(&mut self, tool: ToolId) -> bool {
        if self.order.contains(&tool) {
            return false;
        }
        self.order.push(tool);
        true
    }

    pub fn remove(&mut self, tool: ToolId) -> bool {
        let before = self.order.len();
        self.order.retain(|t| *t != tool);
        before != self.order.len()
    }

    /// Deselect if selected, otherwise append at the end.
    pub fn toggle(&mut self, tool: ToolId) {
        if !self.remove(tool) {
            self.order.push(tool);
        }
    }

    pub fn contains(&self, tool: ToolId) -> bool {
        self.order.contains(&tool)
    }

    pub fn iter(&self) -> impl Iterator<Item = ToolId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

/// Settings per tool, independent of whether the tool is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettingsMap {
    settings: HashMap<ToolId, ToolSettings>,
}

impl ToolSettingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current settings for `tool`, falling back to the registry default.
    pub fn get(&self, tool: ToolId) -> ToolSettings {
        self.settings
            .get(&tool)
            .cloned()
            .unwrap_or_else(|| registry::descriptor(tool).default_settings())
    }

    /// Store settings under the tool they belong to.
    pub fn set(&mut self, settings: ToolSettings) -> Result<()> {
        settings.validate()?;
        self.settings.insert(settings.tool_id(), settings);
        Ok(())
    }

    /// Forget any customisation of `tool`.
    pub fn reset(&mut self, tool: ToolId) {
        self.settings.remove(&tool);
    }
}

/// Settings being edited for a single tool.
///
/// The editor works on the draft only; nothing reaches the map until
/// [`ToolConfigurationSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfigurationSession {
    tool: ToolId,
    draft: ToolSettings,
}

impl ToolConfigurationSession {
    pub fn begin(map: &ToolSettingsMap, tool: ToolId) -> Self {
        Self {
            tool,
            draft: map.get(tool),
        }
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn draft(&self) -> &ToolSettings {
        &self.draft
    }

    /// Replace the draft. Settings for a different tool are rejected.
    pub fn update(mut self, settings: ToolSettings) -> Result<Self> {
        if settings.tool_id() != self.tool {
            return Err(WhizError::InputRejected(format!(
                "settings for {} cannot configure {}",
                settings.tool_id(),
                self.tool
            )));
        }
        self.draft = settings;
        Ok(self)
    }

    /// Validate the draft and store it in `map`.
    pub fn commit(self, map: &mut ToolSettingsMap) -> Result<ToolId> {
        map.set(self.draft)?;
        Ok(self.tool)
    }
}
