// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each one drives a workspace or a document
// session exactly as an interactive front-end would, then hands back the
// deliverable for writing.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use imagewhiz_core::registry;
use imagewhiz_core::{
    CropRectangle, RotateOption, TargetFormat, ToolId, ToolSettings, ToolTarget, ToolkitConfig,
};
use imagewhiz_document::LopdfAdapter;
use imagewhiz_document::image::Rgb;
use imagewhiz_pipeline::{
    CompressSession, Deliverable, MergeSession, RemovePagesSession, SplitSession, Workspace,
};
use tracing::{debug, warn};

use crate::output::InputFile;

#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Image files, processed in the order given.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Tools to apply, in order: compress, convert, rotate, crop, enhance.
    #[arg(short, long, value_delimiter = ',')]
    pub tools: Vec<String>,

    /// Quality for the compress tool (1-100).
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Target of the convert tool: original, jpg, png, webp or pdf.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Rotation for the rotate tool: rotate90, rotate180, rotate270, flipH, flipV.
    #[arg(short, long)]
    pub rotate: Option<String>,

    /// Crop rectangle in pixels: X,Y,W,H.
    #[arg(long, allow_hyphen_values = true)]
    pub crop: Option<String>,

    /// Process only these files (1-based positions, e.g. 1,3). Default: all.
    #[arg(short, long)]
    pub select: Option<String>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// PDF files, merged in the order given.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// PDF file.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct PagesArgs {
    /// PDF file.
    pub file: PathBuf,

    /// Pages (1-based): 5, 3-6, or 1,3,5-7.
    #[arg(short, long)]
    pub pages: String,
}

#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// Image file.
    pub file: PathBuf,

    /// Number of colours to report.
    #[arg(short, long, default_value_t = 5)]
    pub count: usize,
}

/// One line per catalog entry.
pub fn catalog_lines() -> Vec<String> {
    registry::catalog()
        .iter()
        .map(|tool| {
            let target = match tool.applies_to {
                ToolTarget::Raster => "images",
                ToolTarget::Document => "pdf",
            };
            format!("{:<14} {:<7} {:<16} {}", tool.key, target, tool.label, tool.description)
        })
        .collect()
}

pub async fn images(config: ToolkitConfig, args: ImagesArgs) -> Result<Deliverable> {
    let mut workspace = Workspace::new(config);
    let mut ids = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let input = InputFile::read(path)?;
        let id = workspace
            .add(&input.name, &input.mime, input.bytes)
            .with_context(|| format!("cannot load {}", path.display()))?;
        ids.push(id);
    }

    if let Some(select) = &args.select {
        for position in parse_positions(select, ids.len())? {
            let id = ids
                .get(position)
                .with_context(|| format!("--select {}: only {} files given", position + 1, ids.len()))?;
            workspace.toggle_item(*id)?;
        }
    }

    for tool in parse_tools(&args.tools)? {
        if !workspace.tools().contains(tool) {
            workspace.toggle_tool(tool);
        }
    }

    if let Some(quality) = args.quality {
        configure(&mut workspace, ToolSettings::Recompress { quality })?;
    }
    if let Some(format) = &args.format {
        let target = TargetFormat::from_key(format)
            .with_context(|| format!("unknown format {format:?}"))?;
        configure(&mut workspace, ToolSettings::Reformat { target })?;
    }
    if let Some(rotate) = &args.rotate {
        let option = RotateOption::from_key(rotate)
            .with_context(|| format!("unknown rotation {rotate:?}"))?;
        configure(&mut workspace, ToolSettings::RotateFlip { option })?;
    }
    if let Some(crop) = &args.crop {
        let rect = parse_crop(crop)?;
        configure(&mut workspace, ToolSettings::Crop { rect: Some(rect) })?;
    }

    Ok(workspace.process().await?)
}

pub async fn merge(config: ToolkitConfig, args: MergeArgs) -> Result<Deliverable> {
    let mut session = MergeSession::new(LopdfAdapter, config);
    for path in &args.files {
        let input = InputFile::read(path)?;
        session
            .add(&input.name, &input.mime, &input.bytes)
            .with_context(|| format!("cannot load {}", path.display()))?;
    }
    Ok(session.process().await?)
}

pub async fn split(args: PagesArgs) -> Result<Deliverable> {
    let input = InputFile::read(&args.file)?;
    let mut session = SplitSession::new(LopdfAdapter);
    session.load(&input.name, &input.mime, &input.bytes)?;
    for page in parse_positions(&args.pages, session.page_count())? {
        session.toggle_page(page)?;
    }
    Ok(session.process().await?)
}

pub async fn compress(config: ToolkitConfig, args: DocumentArgs) -> Result<Deliverable> {
    let input = InputFile::read(&args.file)?;
    let mut session = CompressSession::new(LopdfAdapter, config);
    session.load(&input.name, &input.mime, &input.bytes)?;
    Ok(session.process().await?)
}

pub async fn remove_pages(args: PagesArgs) -> Result<Deliverable> {
    let input = InputFile::read(&args.file)?;
    let mut session = RemovePagesSession::new(LopdfAdapter);
    session.load(&input.name, &input.mime, &input.bytes)?;
    for page in parse_positions(&args.pages, session.page_count())? {
        session.toggle_page(page)?;
    }
    Ok(session.process().await?)
}

pub fn palette(config: ToolkitConfig, args: PaletteArgs) -> Result<Vec<Rgb>> {
    let input = InputFile::read(&args.file)?;
    let mut workspace = Workspace::new(config);
    let id = workspace.add(&input.name, &input.mime, input.bytes)?;
    Ok(workspace.palette(id, args.count)?)
}

fn configure(workspace: &mut Workspace, settings: ToolSettings) -> Result<()> {
    let tool = settings.tool_id();
    if !workspace.tools().contains(tool) {
        warn!(tool = %tool, "Settings given for a tool that is not selected");
    }
    let session = workspace.configure(tool).update(settings)?;
    workspace.commit(session)?;
    debug!(tool = %tool, "Tool configured");
    Ok(())
}

/// Catalog keys to raster tool ids, in the order given.
fn parse_tools(keys: &[String]) -> Result<Vec<ToolId>> {
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(|key| {
            let tool = ToolId::from_key(key)
                .with_context(|| format!("unknown tool {key:?}; run `imagewhiz tools` for the list"))?;
            if tool.target() != ToolTarget::Raster {
                bail!("{key} works on PDFs; use its own subcommand instead");
            }
            Ok(tool)
        })
        .collect()
}

/// 1-based positions (`5`, `3-6`, `1,3,5-7`) to zero-based indices. Every
/// position must be at most `limit`.
fn parse_positions(raw: &str, limit: usize) -> Result<BTreeSet<usize>> {
    let mut positions = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_position(start)?, parse_position(end)?),
            None => {
                let single = parse_position(part)?;
                (single, single)
            }
        };
        if start > end {
            bail!("invalid range '{part}': start must be <= end");
        }
        if end > limit {
            bail!("position {end} is out of range (only {limit} available)");
        }
        positions.extend(start - 1..end);
    }
    if positions.is_empty() {
        bail!("no positions given");
    }
    Ok(positions)
}

fn parse_position(raw: &str) -> Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid number '{}'", raw.trim()))?;
    if value < 1 {
        bail!("positions are 1-based, minimum is 1 (got {value})");
    }
    Ok(value)
}

/// `X,Y,W,H` in pixels. Negative and oversized values are clamped later,
/// per image.
fn parse_crop(raw: &str) -> Result<CropRectangle> {
    let values = raw
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .with_context(|| format!("invalid crop value '{}'", v.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    match values.as_slice() {
        [x, y, w, h] => Ok(CropRectangle::new(*x, *y, *w, *h)),
        _ => bail!("crop needs four values X,Y,W,H (got {})", values.len()),
    }
}
