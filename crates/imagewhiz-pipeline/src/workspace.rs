// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image workspace: the uploaded set, its previews, the item and tool
// selections, per-tool settings, and the run that ties them together.

use std::sync::Arc;

use imagewhiz_core::error::{Result, WhizError};
use imagewhiz_core::{
    ItemId, ItemSelection, MediaFormat, MediaItem, ToolConfigurationSession, ToolId, ToolSelection,
    ToolSettingsMap, ToolkitConfig,
};
use imagewhiz_document::image::processor::Rgb;
use imagewhiz_document::{BitmapCodec, ImageCodec, ImageProcessor};
use tracing::{info, instrument};

use crate::executor::PipelineExecutor;
use crate::packager::{Deliverable, OutputPackager};
use crate::preview::{PreviewHandle, PreviewPool};
use crate::run_blocking;

/// An item and the preview it owns.
struct Upload {
    item: MediaItem,
    preview: PreviewHandle,
}

/// Everything the image tools operate on.
pub struct Workspace {
    config: ToolkitConfig,
    codec: Arc<dyn BitmapCodec>,
    uploads: Vec<Upload>,
    selection: ItemSelection,
    tools: ToolSelection,
    settings: ToolSettingsMap,
    previews: PreviewPool,
}

impl Workspace {
    pub fn new(config: ToolkitConfig) -> Self {
        Self::with_codec(config, Arc::new(ImageCodec))
    }

    pub fn with_codec(config: ToolkitConfig, codec: Arc<dyn BitmapCodec>) -> Self {
        Self {
            config,
            codec,
            uploads: Vec::new(),
            selection: ItemSelection::all(),
            tools: ToolSelection::new(),
            settings: ToolSettingsMap::new(),
            previews: PreviewPool::new(),
        }
    }

    // -- Uploads --------------------------------------------------------------

    /// Accept a raster upload. The content is decoded once to record its
    /// dimensions and build the preview; the item selection is reset.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn add(&mut self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<ItemId> {
        let upload = self.make_upload(name, mime, bytes)?;
        let id = upload.item.id;
        self.uploads.push(upload);
        self.selection.clear();
        info!(item = %id, total = self.uploads.len(), "Image added");
        Ok(id)
    }

    /// Swap an item's content for a new upload, keeping its position. The old
    /// preview is released.
    pub fn replace(&mut self, id: ItemId, name: &str, mime: &str, bytes: Vec<u8>) -> Result<ItemId> {
        let index = self.position(id)?;
        let upload = self.make_upload(name, mime, bytes)?;
        let new_id = upload.item.id;
        self.uploads[index] = upload;
        self.selection.clear();
        info!(old = %id, new = %new_id, "Image replaced");
        Ok(new_id)
    }

    /// Remove an item and release its preview.
    pub fn remove(&mut self, id: ItemId) -> Result<MediaItem> {
        let index = self.position(id)?;
        let Upload { item, preview } = self.uploads.remove(index);
        drop(preview);
        self.selection.clear();
        info!(item = %id, total = self.uploads.len(), "Image removed");
        Ok(item)
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.uploads.clear();
        self.selection.clear();
    }

    pub fn items(&self) -> impl Iterator<Item = &MediaItem> + '_ {
        self.uploads.iter().map(|upload| &upload.item)
    }

    pub fn item(&self, id: ItemId) -> Option<&MediaItem> {
        self.items().find(|item| item.id == id)
    }

    pub fn preview(&self, id: ItemId) -> Option<&PreviewHandle> {
        self.uploads
            .iter()
            .find(|upload| upload.item.id == id)
            .map(|upload| &upload.preview)
    }

    pub fn previews(&self) -> &PreviewPool {
        &self.previews
    }

    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    // -- Item selection -----------------------------------------------------------

    pub fn selection(&self) -> &ItemSelection {
        &self.selection
    }

    pub fn toggle_item(&mut self, id: ItemId) -> Result<()> {
        self.position(id)?;
        self.selection.toggle(id);
        Ok(())
    }

    /// Select every current item explicitly.
    pub fn select_all(&mut self) {
        self.selection = ItemSelection::of(self.uploads.iter().map(|upload| upload.item.id));
    }

    /// Drop the explicit selection; the next run applies to every item.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -- Tools --------------------------------------------------------------------

    pub fn tools(&self) -> &ToolSelection {
        &self.tools
    }

    pub fn toggle_tool(&mut self, tool: ToolId) {
        self.tools.toggle(tool);
    }

    pub fn settings(&self) -> &ToolSettingsMap {
        &self.settings
    }

    /// Start editing a tool's settings from their current value.
    pub fn configure(&self, tool: ToolId) -> ToolConfigurationSession {
        ToolConfigurationSession::begin(&self.settings, tool)
    }

    /// Store an edited draft.
    pub fn commit(&mut self, session: ToolConfigurationSession) -> Result<ToolId> {
        session.commit(&mut self.settings)
    }

    // -- Analysis and processing ----------------------------------------------------

    /// The `count` most frequent colours of one item.
    pub fn palette(&self, id: ItemId, count: usize) -> Result<Vec<Rgb>> {
        let item = self
            .item(id)
            .ok_or_else(|| WhizError::InputRejected(format!("no image with id {id}")))?;
        let bitmap = self.codec.decode(&item.content)?;
        Ok(ImageProcessor::from_dynamic(bitmap).dominant_colors(count))
    }

    /// Run the selected tools over the selected items and package the result.
    pub async fn process(&self) -> Result<Deliverable> {
        let items: Vec<MediaItem> = self.items().cloned().collect();
        let executor = PipelineExecutor::new(Arc::clone(&self.codec), &self.config);
        let output = executor
            .run(&items, &self.selection, &self.tools, &self.settings)
            .await?;

        let packager = OutputPackager::new(Arc::clone(&self.codec), self.config.clone());
        run_blocking("package", move || packager.package(output)).await
    }

    // -- Helpers ------------------------------------------------------------------

    fn position(&self, id: ItemId) -> Result<usize> {
        self.uploads
            .iter()
            .position(|upload| upload.item.id == id)
            .ok_or_else(|| WhizError::InputRejected(format!("no image with id {id}")))
    }

    fn make_upload(&self, name: &str, mime: &str, bytes: Vec<u8>) -> Result<Upload> {
        let format = MediaFormat::from_mime(mime)
            .filter(MediaFormat::is_raster)
            .ok_or_else(|| {
                WhizError::InputRejected(format!("{name}: unsupported content type {mime}"))
            })?;
        let bitmap = self.codec.decode(&bytes)?;
        let (width, height) = (bitmap.width(), bitmap.height());
        let item = MediaItem::new(name, format, bytes, width, height);

        let thumbnail = ImageProcessor::from_dynamic(bitmap)
            .fit_within(self.config.preview_max_edge)
            .into_dynamic();
        let preview = self.previews.acquire(item.id, thumbnail);
        Ok(Upload { item, preview })
    }
}
