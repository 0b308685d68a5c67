// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output packager: turns the processed set into one deliverable: an
// assembled PDF, a single file, or a zip archive.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use imagewhiz_core::error::{Result, WhizError};
use imagewhiz_core::types::split_extension;
use imagewhiz_core::{MediaFormat, MediaItem, ToolkitConfig};
use imagewhiz_document::{BitmapCodec, PdfWriter};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::executor::PipelineOutput;

pub const ARCHIVE_MIME: &str = "application/zip";

/// Shape of a deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableKind {
    SingleFile,
    Archive,
    Document,
}

/// A finished output, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct Deliverable {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub kind: DeliverableKind,
    /// Items that were skipped or passed through unchanged along the way.
    pub warnings: Vec<String>,
}

impl Deliverable {
    pub fn document(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: MediaFormat::Pdf.mime_type().to_string(),
            bytes,
            kind: DeliverableKind::Document,
            warnings: Vec::new(),
        }
    }
}

/// Chooses and builds the deliverable for a pipeline run.
#[derive(Clone)]
pub struct OutputPackager {
    codec: Arc<dyn BitmapCodec>,
    config: ToolkitConfig,
}

impl OutputPackager {
    pub fn new(codec: Arc<dyn BitmapCodec>, config: ToolkitConfig) -> Self {
        Self { codec, config }
    }

    /// Package `output`:
    ///
    /// 1. a reformat-to-PDF run becomes one assembled document;
    /// 2. otherwise a single item is delivered as itself;
    /// 3. otherwise every item goes into a zip archive.
    #[instrument(skip_all, fields(items = output.items.len(), assemble = output.assemble_document))]
    pub fn package(&self, output: PipelineOutput) -> Result<Deliverable> {
        let PipelineOutput {
            items,
            warnings: stage_warnings,
            assemble_document,
        } = output;
        if items.is_empty() {
            return Err(WhizError::InputRejected("nothing to package".into()));
        }
        let warnings: Vec<String> = stage_warnings.iter().map(ToString::to_string).collect();

        let mut deliverable = if assemble_document {
            self.assemble(&items)?
        } else if items.len() == 1 {
            let item = items.into_iter().next().ok_or_else(|| {
                WhizError::Unexpected("single item vanished while packaging".into())
            })?;
            Deliverable {
                mime_type: item.mime_type().to_string(),
                file_name: item.name,
                bytes: item.content,
                kind: DeliverableKind::SingleFile,
                warnings: Vec::new(),
            }
        } else {
            self.archive(&items)?
        };

        let mut all = warnings;
        all.append(&mut deliverable.warnings);
        deliverable.warnings = all;

        info!(
            file_name = %deliverable.file_name,
            kind = ?deliverable.kind,
            bytes = deliverable.bytes.len(),
            warnings = deliverable.warnings.len(),
            "Deliverable ready"
        );
        Ok(deliverable)
    }

    /// One page per decodable item, in item order.
    fn assemble(&self, items: &[MediaItem]) -> Result<Deliverable> {
        let mut warnings = Vec::new();
        let mut bitmaps = Vec::with_capacity(items.len());
        for item in items {
            match self.codec.decode(&item.content) {
                Ok(bitmap) => bitmaps.push(bitmap),
                Err(err) if err.is_recoverable_per_item() => {
                    warn!(item = %item.id, error = %err, "Image left out of document");
                    warnings.push(format!("{}: left out of document ({})", item.name, err));
                }
                Err(err) => return Err(err),
            }
        }
        if bitmaps.is_empty() {
            return Err(WhizError::InputRejected(
                "none of the images could be read".into(),
            ));
        }

        let file_name = self.config.assembled_document_name.clone();
        let mut writer = PdfWriter::new(self.config.paper_size);
        writer.set_title(split_extension(&file_name).0);
        let bytes = writer.assemble(&bitmaps)?;

        let mut deliverable = Deliverable::document(file_name, bytes);
        deliverable.warnings = warnings;
        Ok(deliverable)
    }

    /// Zip every item under its current name.
    fn archive(&self, items: &[MediaItem]) -> Result<Deliverable> {
        let mut warnings = Vec::new();
        let mut used_names = HashSet::new();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for item in items {
            if item.content.is_empty() {
                warn!(item = %item.id, "Empty item left out of archive");
                warnings.push(format!("{}: no content, left out of archive", item.name));
                continue;
            }
            let entry_name = unique_name(&item.name, &mut used_names);
            zip.start_file(entry_name.as_str(), options)
                .map_err(|err| WhizError::Archive(format!("cannot add {entry_name}: {err}")))?;
            zip.write_all(&item.content)
                .map_err(|err| WhizError::Archive(format!("cannot write {entry_name}: {err}")))?;
            debug!(entry = %entry_name, bytes = item.content.len(), "Archive entry written");
        }

        let bytes = zip
            .finish()
            .map_err(|err| WhizError::Archive(format!("cannot finish archive: {err}")))?
            .into_inner();

        Ok(Deliverable {
            file_name: self.config.archive_name.clone(),
            mime_type: ARCHIVE_MIME.to_string(),
            bytes,
            kind: DeliverableKind::Archive,
            warnings,
        })
    }
}

/// `name`, or `stem (n).ext` with the smallest free `n`.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, extension) = split_extension(name);
    let mut n = 1;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
