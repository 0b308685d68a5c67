// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline executor: applies the ordered tool stages to the selected items.
//
// Stages run strictly in sequence. Within a stage every item is handed to a
// blocking worker at once and the stage completes only when all of them have
// settled, so stage N+1 never sees an item that has not finished stage N.

use std::sync::Arc;

use futures::future::join_all;
use imagewhiz_core::error::{Result, WhizError};
use imagewhiz_core::{
    ItemId, ItemSelection, MediaItem, TargetFormat, ToolId, ToolSelection, ToolSettings,
    ToolSettingsMap, ToolkitConfig,
};
use imagewhiz_document::{BitmapCodec, RasterOperator};
use tracing::{debug, info, instrument, warn};

/// An item that a stage passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWarning {
    pub stage: ToolId,
    pub item_id: ItemId,
    pub item_name: String,
    pub message: String,
}

impl std::fmt::Display for StageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} skipped ({})", self.item_name, self.stage, self.message)
    }
}

/// The processed subset, ready for packaging.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Selected items after every stage, in upload order.
    pub items: Vec<MediaItem>,
    pub warnings: Vec<StageWarning>,
    /// A reformat-to-PDF stage was part of the run.
    pub assemble_document: bool,
}

/// Runs raster tool stages over a batch of items.
#[derive(Clone)]
pub struct PipelineExecutor {
    codec: Arc<dyn BitmapCodec>,
    encode_quality: u8,
}

impl PipelineExecutor {
    pub fn new(codec: Arc<dyn BitmapCodec>, config: &ToolkitConfig) -> Self {
        Self {
            codec,
            encode_quality: config.encode_quality,
        }
    }

    /// Apply `order` to the items `selection` includes.
    ///
    /// Unselected items are not part of the output. Per-item decode/encode
    /// failures become [`StageWarning`]s; any other failure aborts the run and
    /// discards every completed stage.
    #[instrument(skip_all, fields(items = items.len(), selected = selection.len(), stages = order.len()))]
    pub async fn run(
        &self,
        items: &[MediaItem],
        selection: &ItemSelection,
        order: &ToolSelection,
        settings: &ToolSettingsMap,
    ) -> Result<PipelineOutput> {
        let mut working: Vec<MediaItem> = items
            .iter()
            .filter(|item| selection.includes(&item.id))
            .cloned()
            .collect();
        if working.is_empty() {
            return Err(WhizError::InputRejected("no images to process".into()));
        }

        let mut warnings = Vec::new();
        for tool in order.iter() {
            let tool_settings = settings.get(tool);
            let Some(operator) = RasterOperator::from_settings(&tool_settings, self.encode_quality) else {
                debug!(stage = %tool, "Not a raster tool; stage ignored");
                continue;
            };
            if operator.is_noop_stage() {
                if tool == ToolId::Crop {
                    warn!("Crop rectangle missing or empty; crop stage skipped");
                } else {
                    debug!(stage = %tool, "Stage leaves items unchanged");
                }
                continue;
            }
            if tool == ToolId::Crop && working.len() > 1 {
                warn!(items = working.len(), "One crop rectangle applied to every item, clamped per item");
            }

            working = self.run_stage(operator, working, &mut warnings).await?;
        }

        let assemble_document = order.contains(ToolId::Reformat)
            && matches!(
                settings.get(ToolId::Reformat),
                ToolSettings::Reformat {
                    target: TargetFormat::Pdf
                }
            );

        info!(
            processed = working.len(),
            warnings = warnings.len(),
            assemble_document,
            "Pipeline run complete"
        );
        Ok(PipelineOutput {
            items: working,
            warnings,
            assemble_document,
        })
    }

    /// Fan one stage out over all items and wait for every one to settle.
    async fn run_stage(
        &self,
        operator: RasterOperator,
        items: Vec<MediaItem>,
        warnings: &mut Vec<StageWarning>,
    ) -> Result<Vec<MediaItem>> {
        let stage = operator.tool_id();
        info!(stage = %stage, items = items.len(), "Stage started");

        let tasks = items.into_iter().map(|item| {
            let codec = Arc::clone(&self.codec);
            tokio::task::spawn_blocking(move || operator.apply(item, codec.as_ref()))
        });
        let settled = join_all(tasks).await;

        let mut next = Vec::with_capacity(settled.len());
        for joined in settled {
            let outcome = joined
                .map_err(|err| WhizError::Unexpected(format!("{stage} stage task failed: {err}")))??;
            if let Some(err) = outcome.fallback {
                warnings.push(StageWarning {
                    stage,
                    item_id: outcome.item.id,
                    item_name: outcome.item.name.clone(),
                    message: err.to_string(),
                });
            }
            next.push(outcome.item);
        }

        info!(stage = %stage, items = next.len(), "Stage finished");
        Ok(next)
    }
}
