// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document sessions: merge, split, compress and remove-pages.
//
// Every session walks the same lifecycle:
//
//   Idle -> Loaded -> Selecting -> Processing -> Delivered | Failed
//
// A failure leaves the loaded sources in place. The next action recovers to
// `Loaded`, or to `Idle` when nothing was ever loaded successfully.

use std::collections::BTreeSet;

use image::DynamicImage;
use imagewhiz_core::error::{Result, WhizError};
use imagewhiz_core::types::rewrite_extension;
use imagewhiz_core::{MediaFormat, ToolkitConfig};
use imagewhiz_document::pdf::operators;
use imagewhiz_document::pdf::render::render_thumbnails;
use imagewhiz_document::{DocumentAdapter, LopdfAdapter, PageRenderer};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::packager::Deliverable;
use crate::run_blocking;

/// Where a document session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loaded,
    /// Pages or source order are being chosen.
    Selecting,
    Processing,
    Delivered,
    Failed,
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    fn enter(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Session state change");
        }
        self.state = next;
    }

    /// Leave `Failed` before the next action.
    fn recover(&mut self, has_source: bool) {
        if self.state == SessionState::Failed {
            self.enter(if has_source {
                SessionState::Loaded
            } else {
                SessionState::Idle
            });
        }
    }

    /// Record the outcome of a fallible step.
    fn settle<T>(&mut self, result: Result<T>, success: SessionState) -> Result<T> {
        match result {
            Ok(value) => {
                self.enter(success);
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "Document operation failed");
                self.enter(SessionState::Failed);
                Err(err)
            }
        }
    }
}

/// A parsed document and the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct DocumentSource<H> {
    pub name: String,
    pub page_count: usize,
    handle: H,
}

impl<H> DocumentSource<H> {
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Reject anything that is not a PDF, then parse it.
fn open_source<A: DocumentAdapter>(
    adapter: &A,
    name: &str,
    mime: &str,
    bytes: &[u8],
) -> Result<DocumentSource<A::Handle>> {
    if MediaFormat::from_mime(mime) != Some(MediaFormat::Pdf) {
        return Err(WhizError::InputRejected(format!(
            "{name}: content type {mime} is not a PDF"
        )));
    }
    let handle = adapter.parse(bytes)?;
    let page_count = adapter.page_count(&handle);
    info!(name, page_count, "Document loaded");
    Ok(DocumentSource {
        name: name.to_string(),
        page_count,
        handle,
    })
}

// -- Merge --------------------------------------------------------------------

/// Combine several documents, in a user-chosen order, into one.
pub struct MergeSession<A: DocumentAdapter = LopdfAdapter> {
    adapter: A,
    config: ToolkitConfig,
    lifecycle: Lifecycle,
    sources: Vec<DocumentSource<A::Handle>>,
}

impl<A: DocumentAdapter + Clone + 'static> MergeSession<A> {
    pub fn new(adapter: A, config: ToolkitConfig) -> Self {
        Self {
            adapter,
            config,
            lifecycle: Lifecycle::new(),
            sources: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state
    }

    pub fn sources(&self) -> &[DocumentSource<A::Handle>] {
        &self.sources
    }

    /// Parse and append a source document.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn add(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.lifecycle.recover(!self.sources.is_empty());
        let opened = open_source(&self.adapter, name, mime, bytes);
        let source = self.lifecycle.settle(opened, SessionState::Loaded)?;
        self.sources.push(source);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<DocumentSource<A::Handle>> {
        self.lifecycle.recover(!self.sources.is_empty());
        self.check_index(index)?;
        let removed = self.sources.remove(index);
        self.lifecycle.enter(if self.sources.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Selecting
        });
        Ok(removed)
    }

    /// Move the source at `from` so it ends up at position `to`.
    pub fn move_source(&mut self, from: usize, to: usize) -> Result<()> {
        self.lifecycle.recover(!self.sources.is_empty());
        self.check_index(from)?;
        self.check_index(to)?;
        let source = self.sources.remove(from);
        self.sources.insert(to, source);
        self.lifecycle.enter(SessionState::Selecting);
        Ok(())
    }

    /// Merge every source in the current order.
    pub async fn process(&mut self) -> Result<Deliverable> {
        self.lifecycle.recover(!self.sources.is_empty());
        self.lifecycle.enter(SessionState::Processing);

        let adapter = self.adapter.clone();
        let handles: Vec<A::Handle> = self.sources.iter().map(|s| s.handle.clone()).collect();
        let result = run_blocking("merge", move || operators::merge(&adapter, &handles)).await;

        let bytes = self.lifecycle.settle(result, SessionState::Delivered)?;
        Ok(Deliverable::document(self.config.merged_document_name.clone(), bytes))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.sources.len() {
            return Err(WhizError::InputRejected(format!(
                "no document at position {} (have {})",
                index + 1,
                self.sources.len()
            )));
        }
        Ok(())
    }
}

// -- Single-document sessions ---------------------------------------------------

/// One loaded document plus a page selection.
struct SingleSource<A: DocumentAdapter> {
    adapter: A,
    lifecycle: Lifecycle,
    source: Option<DocumentSource<A::Handle>>,
    pages: BTreeSet<usize>,
}

impl<A: DocumentAdapter + Clone + 'static> SingleSource<A> {
    fn new(adapter: A) -> Self {
        Self {
            adapter,
            lifecycle: Lifecycle::new(),
            source: None,
            pages: BTreeSet::new(),
        }
    }

    /// Replace the loaded document. The page selection starts empty.
    fn load(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.lifecycle.recover(self.source.is_some());
        let opened = open_source(&self.adapter, name, mime, bytes);
        let source = self.lifecycle.settle(opened, SessionState::Loaded)?;
        self.source = Some(source);
        self.pages.clear();
        Ok(())
    }

    fn loaded(&self) -> Result<&DocumentSource<A::Handle>> {
        self.source
            .as_ref()
            .ok_or_else(|| WhizError::InputRejected("no document loaded".into()))
    }

    fn toggle_page(&mut self, index: usize) -> Result<()> {
        self.lifecycle.recover(self.source.is_some());
        let page_count = self.loaded()?.page_count;
        if index >= page_count {
            return Err(WhizError::InputRejected(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                page_count
            )));
        }
        if !self.pages.remove(&index) {
            self.pages.insert(index);
        }
        self.lifecycle.enter(SessionState::Selecting);
        Ok(())
    }

    /// Run `job` on a copy of the document off the async runtime.
    async fn process<F>(&mut self, label: &'static str, job: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&A, A::Handle, BTreeSet<usize>) -> Result<Vec<u8>> + Send + 'static,
    {
        self.lifecycle.recover(self.source.is_some());
        let handle = self.loaded()?.handle.clone();
        self.lifecycle.enter(SessionState::Processing);

        let adapter = self.adapter.clone();
        let pages = self.pages.clone();
        let result = run_blocking(label, move || job(&adapter, handle, pages)).await;
        self.lifecycle.settle(result, SessionState::Delivered)
    }

    fn source_name(&self) -> &str {
        self.source.as_ref().map(|s| s.name.as_str()).unwrap_or("document.pdf")
    }
}

/// Extract selected pages into a new document.
pub struct SplitSession<A: DocumentAdapter = LopdfAdapter> {
    inner: SingleSource<A>,
}

impl<A: DocumentAdapter + Clone + 'static> SplitSession<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            inner: SingleSource::new(adapter),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lifecycle.state
    }

    pub fn load(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.inner.load(name, mime, bytes)
    }

    pub fn page_count(&self) -> usize {
        self.inner.source.as_ref().map_or(0, |s| s.page_count)
    }

    pub fn toggle_page(&mut self, index: usize) -> Result<()> {
        self.inner.toggle_page(index)
    }

    pub fn selected_pages(&self) -> &BTreeSet<usize> {
        &self.inner.pages
    }

    /// Render a bounded thumbnail of every page for selection.
    pub fn thumbnails(
        &self,
        renderer: &dyn PageRenderer<A::Handle>,
        max_edge: u32,
    ) -> Result<Vec<DynamicImage>> {
        let source = self.inner.loaded()?;
        render_thumbnails(renderer, &source.handle, source.page_count, max_edge)
    }

    /// Deliver the selected pages as `<stem>_split.pdf`.
    pub async fn process(&mut self) -> Result<Deliverable> {
        let file_name = rewrite_extension(self.inner.source_name(), "_split", "pdf");
        let bytes = self
            .inner
            .process("split", |adapter, handle, pages| {
                operators::split(adapter, &handle, pages)
            })
            .await?;
        Ok(Deliverable::document(file_name, bytes))
    }
}

/// Strip document metadata and re-serialise.
pub struct CompressSession<A: DocumentAdapter = LopdfAdapter> {
    inner: SingleSource<A>,
    config: ToolkitConfig,
}

impl<A: DocumentAdapter + Clone + 'static> CompressSession<A> {
    pub fn new(adapter: A, config: ToolkitConfig) -> Self {
        Self {
            inner: SingleSource::new(adapter),
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lifecycle.state
    }

    pub fn load(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.inner.load(name, mime, bytes)
    }

    pub async fn process(&mut self) -> Result<Deliverable> {
        let bytes = self
            .inner
            .process("compress", |adapter, handle, _| {
                operators::strip_metadata(adapter, handle)
            })
            .await?;
        Ok(Deliverable::document(self.config.compressed_document_name.clone(), bytes))
    }
}

/// Delete selected pages from a document.
pub struct RemovePagesSession<A: DocumentAdapter = LopdfAdapter> {
    inner: SingleSource<A>,
}

impl<A: DocumentAdapter + Clone + 'static> RemovePagesSession<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            inner: SingleSource::new(adapter),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lifecycle.state
    }

    pub fn load(&mut self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.inner.load(name, mime, bytes)
    }

    pub fn page_count(&self) -> usize {
        self.inner.source.as_ref().map_or(0, |s| s.page_count)
    }

    pub fn toggle_page(&mut self, index: usize) -> Result<()> {
        self.inner.toggle_page(index)
    }

    pub fn selected_pages(&self) -> &BTreeSet<usize> {
        &self.inner.pages
    }

    /// Deliver the remaining pages as `<stem>_trimmed.pdf`.
    pub async fn process(&mut self) -> Result<Deliverable> {
        let file_name = rewrite_extension(self.inner.source_name(), "_trimmed", "pdf");
        let bytes = self
            .inner
            .process("remove-pages", |adapter, handle, pages| {
                operators::remove_pages(adapter, handle, pages)
            })
            .await?;
        Ok(Deliverable::document(file_name, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::DeliverableKind;
    use imagewhiz_document::PdfHandle;
    use lopdf::{Dictionary, Document, Object, Stream};

    const PDF: &str = "application/pdf";

    /// A PDF whose page `i` has content `"{label}-{i}"` and a MediaBox of
    /// `600x800`.
    fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for index in 0..pages {
            let content = format!("% {label}-{index}\n").into_bytes();
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(600),
                    Object::Integer(800),
                ]),
            );
            kids.push(Object::Reference(doc.add_object(page)));
        }
        let mut tree = Dictionary::new();
        tree.set("Type", Object::Name(b"Pages".to_vec()));
        tree.set("Count", Object::Integer(pages as i64));
        tree.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(tree));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set("Author", Object::string_literal("Someone"));
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save fixture");
        bytes
    }

    fn labels(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).expect("reload");
        doc.get_pages()
            .into_values()
            .map(|id| {
                let content = doc.get_page_content(id).expect("content");
                String::from_utf8_lossy(&content).trim().trim_start_matches("% ").to_string()
            })
            .collect()
    }

    /// Renders every page as a blank bitmap the size of its MediaBox.
    struct BlankRenderer;

    impl PageRenderer<PdfHandle> for BlankRenderer {
        fn render_page(&self, handle: &PdfHandle, index: usize) -> Result<DynamicImage> {
            let page_id = *handle
                .page_ids()
                .get(index)
                .ok_or_else(|| WhizError::InputRejected(format!("no page {index}")))?;
            let media_box = handle
                .document()
                .get_dictionary(page_id)
                .and_then(|page| page.get(b"MediaBox"))
                .and_then(Object::as_array)
                .map_err(|err| WhizError::Parse(err.to_string()))?;
            let edge = |i: usize| media_box.get(i).and_then(|o| o.as_i64().ok()).unwrap_or(0) as u32;
            Ok(DynamicImage::new_rgb8(edge(2), edge(3)))
        }
    }

    #[tokio::test]
    async fn merge_three_and_two_pages_in_order() {
        let mut session = MergeSession::new(LopdfAdapter, ToolkitConfig::default());
        assert_eq!(session.state(), SessionState::Idle);
        session.add("a.pdf", PDF, &labelled_pdf("A", 3)).expect("add a");
        session.add("b.pdf", PDF, &labelled_pdf("B", 2)).expect("add b");
        assert_eq!(session.state(), SessionState::Loaded);

        let deliverable = session.process().await.expect("merge");
        assert_eq!(session.state(), SessionState::Delivered);
        assert_eq!(deliverable.kind, DeliverableKind::Document);
        assert_eq!(deliverable.file_name, "merged.pdf");
        assert_eq!(labels(&deliverable.bytes), vec!["A-0", "A-1", "A-2", "B-0", "B-1"]);
    }

    #[tokio::test]
    async fn reordering_sources_changes_page_order() {
        let mut session = MergeSession::new(LopdfAdapter, ToolkitConfig::default());
        session.add("a.pdf", PDF, &labelled_pdf("A", 1)).expect("add a");
        session.add("b.pdf", PDF, &labelled_pdf("B", 1)).expect("add b");
        session.move_source(1, 0).expect("move");
        assert_eq!(session.state(), SessionState::Selecting);

        let deliverable = session.process().await.expect("merge");
        assert_eq!(labels(&deliverable.bytes), vec!["B-0", "A-0"]);
    }

    #[tokio::test]
    async fn merge_with_one_source_fails_then_recovers() {
        let mut session = MergeSession::new(LopdfAdapter, ToolkitConfig::default());
        session.add("a.pdf", PDF, &labelled_pdf("A", 2)).expect("add");
        let err = session.process().await.expect_err("one source");
        assert!(matches!(err, WhizError::InsufficientInput { .. }));
        assert_eq!(session.state(), SessionState::Failed);

        session.add("b.pdf", PDF, &labelled_pdf("B", 1)).expect("retry");
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.sources().len(), 2);
    }

    #[test]
    fn wrong_content_type_is_rejected_at_load() {
        let mut session = MergeSession::new(LopdfAdapter, ToolkitConfig::default());
        let err = session
            .add("notes.txt", "text/plain", b"hello")
            .expect_err("not a pdf");
        assert!(matches!(err, WhizError::InputRejected(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.sources().is_empty());
    }

    #[test]
    fn corrupt_document_recovers_to_idle() {
        let mut session = SplitSession::new(LopdfAdapter);
        let err = session.load("bad.pdf", PDF, b"%PDF-1.4 truncated").expect_err("corrupt");
        assert!(matches!(err, WhizError::Parse(_)));
        assert_eq!(session.state(), SessionState::Failed);

        // Nothing is loaded, so the next action starts from Idle.
        let err = session.toggle_page(0).expect_err("no document");
        assert!(matches!(err, WhizError::InputRejected(_)));
        assert_eq!(session.state(), SessionState::Idle);

        session.load("ok.pdf", PDF, &labelled_pdf("S", 2)).expect("load");
        assert_eq!(session.state(), SessionState::Loaded);
    }

    #[test]
    fn failure_recovers_to_loaded_or_idle() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.enter(SessionState::Failed);
        lifecycle.recover(false);
        assert_eq!(lifecycle.state, SessionState::Idle);

        lifecycle.enter(SessionState::Failed);
        lifecycle.recover(true);
        assert_eq!(lifecycle.state, SessionState::Loaded);

        lifecycle.enter(SessionState::Selecting);
        lifecycle.recover(true);
        assert_eq!(lifecycle.state, SessionState::Selecting);
    }

    #[tokio::test]
    async fn split_delivers_selected_pages_in_ascending_order() {
        let mut session = SplitSession::new(LopdfAdapter);
        session.load("report.pdf", PDF, &labelled_pdf("P", 3)).expect("load");
        session.toggle_page(2).expect("toggle");
        session.toggle_page(0).expect("toggle");
        assert_eq!(session.state(), SessionState::Selecting);

        let deliverable = session.process().await.expect("split");
        assert_eq!(deliverable.file_name, "report_split.pdf");
        assert_eq!(labels(&deliverable.bytes), vec!["P-0", "P-2"]);
    }

    #[tokio::test]
    async fn split_without_selection_fails_and_keeps_the_document() {
        let mut session = SplitSession::new(LopdfAdapter);
        session.load("report.pdf", PDF, &labelled_pdf("P", 3)).expect("load");
        let err = session.process().await.expect_err("nothing selected");
        assert!(matches!(err, WhizError::NoSelection));
        assert_eq!(session.state(), SessionState::Failed);

        session.toggle_page(1).expect("toggle after failure");
        assert_eq!(session.page_count(), 3);
        let deliverable = session.process().await.expect("split");
        assert_eq!(labels(&deliverable.bytes), vec!["P-1"]);
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut session = SplitSession::new(LopdfAdapter);
        session.load("r.pdf", PDF, &labelled_pdf("P", 3)).expect("load");
        session.toggle_page(1).expect("toggle");
        session.toggle_page(1).expect("toggle");
        assert!(session.selected_pages().is_empty());
        assert!(session.toggle_page(3).is_err());
    }

    #[test]
    fn split_thumbnails_use_the_renderer() {
        let mut session = SplitSession::new(LopdfAdapter);
        session.load("r.pdf", PDF, &labelled_pdf("P", 2)).expect("load");
        let thumbs = session.thumbnails(&BlankRenderer, 80).expect("thumbnails");
        assert_eq!(thumbs.len(), 2);
        assert_eq!((thumbs[0].width(), thumbs[0].height()), (60, 80));
    }

    #[tokio::test]
    async fn compress_strips_metadata() {
        let mut session = CompressSession::new(LopdfAdapter, ToolkitConfig::default());
        session.load("big.pdf", PDF, &labelled_pdf("C", 2)).expect("load");
        let deliverable = session.process().await.expect("compress");
        assert_eq!(deliverable.file_name, "compressed.pdf");

        let reopened = LopdfAdapter.parse(&deliverable.bytes).expect("reparse");
        assert_eq!(
            LopdfAdapter.metadata_field(&reopened, imagewhiz_document::MetadataField::Author),
            None
        );
        assert_eq!(labels(&deliverable.bytes), vec!["C-0", "C-1"]);
    }

    #[tokio::test]
    async fn remove_pages_names_output_after_source() {
        let mut session = RemovePagesSession::new(LopdfAdapter);
        session.load("deck.pdf", PDF, &labelled_pdf("R", 3)).expect("load");
        session.toggle_page(1).expect("toggle");
        let deliverable = session.process().await.expect("remove");
        assert_eq!(deliverable.file_name, "deck_trimmed.pdf");
        assert_eq!(labels(&deliverable.bytes), vec!["R-0", "R-2"]);
    }

    #[tokio::test]
    async fn processing_without_a_document_is_rejected() {
        let mut session = CompressSession::new(LopdfAdapter, ToolkitConfig::default());
        let err = session.process().await.expect_err("nothing loaded");
        assert!(matches!(err, WhizError::InputRejected(_)));
    }
}
