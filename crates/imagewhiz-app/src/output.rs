// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reading inputs from disk and writing deliverables back out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use imagewhiz_core::MediaFormat;
use imagewhiz_document::image::codec::sniff_format;
use imagewhiz_pipeline::Deliverable;
use tracing::{debug, info};

const UNKNOWN_MIME: &str = "application/octet-stream";

/// A file read from disk, with the name and content type an upload carries.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Read `path`. The content type comes from the extension, then from the
    /// leading bytes.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} is not a file", path.display()))?;
        let mime = MediaFormat::from_file_name(&name)
            .or_else(|| sniff_format(&bytes))
            .map(|format| format.mime_type())
            .unwrap_or(UNKNOWN_MIME)
            .to_string();
        debug!(name = %name, mime = %mime, bytes = bytes.len(), "Input read");
        Ok(Self { name, mime, bytes })
    }
}

/// The directory deliverables go to: `out`, or the working directory.
/// Created if missing.
pub fn output_dir(out: Option<&Path>) -> Result<PathBuf> {
    let dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("cannot resolve the working directory")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    Ok(dir)
}

/// Write `deliverable` into `dir` under its own file name.
pub fn write_deliverable(dir: &Path, deliverable: &Deliverable) -> Result<PathBuf> {
    // Names derive from uploads; keep only the final component.
    let file_name = Path::new(&deliverable.file_name)
        .file_name()
        .with_context(|| format!("deliverable has no usable name: {:?}", deliverable.file_name))?;
    let path = dir.join(file_name);
    std::fs::write(&path, &deliverable.bytes)
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), bytes = deliverable.bytes.len(), "Deliverable written");
    Ok(path)
}
