// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ImageWhiz: batch image toolkit and PDF tools.
//
// Entry point. Initialises logging, loads the configuration, and dispatches
// to a subcommand. Deliverables are written to the output directory and their
// paths printed on stdout; logs and warnings go to stderr.

mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use imagewhiz_core::human_errors::humanize_error;
use imagewhiz_core::{ToolkitConfig, WhizError};
use tracing_subscriber::EnvFilter;

use commands::{DocumentArgs, ImagesArgs, MergeArgs, PagesArgs, PaletteArgs};

/// Batch image tools (compress, convert, rotate, crop, enhance) and PDF
/// merge, split, compress and page removal.
#[derive(Parser, Debug)]
#[command(name = "imagewhiz", version, arg_required_else_help = true)]
struct Cli {
    /// JSON settings file. Missing fields use defaults.
    #[arg(long, global = true, env = "IMAGEWHIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the output file (default: the working directory).
    #[arg(short, long, global = true, env = "IMAGEWHIZ_OUT")]
    out: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMAGEWHIZ_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every tool and what it works on.
    Tools,
    /// Run image tools over a batch and write one file, archive or PDF.
    Images(ImagesArgs),
    /// Combine two or more PDFs into one.
    Merge(MergeArgs),
    /// Extract pages into a new PDF.
    Split(PagesArgs),
    /// Drop document metadata and unused objects.
    Compress(DocumentArgs),
    /// Delete pages from a PDF.
    RemovePages(PagesArgs),
    /// Print the most frequent colours of an image.
    Palette(PaletteArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ToolkitConfig::load(path)?,
        None => ToolkitConfig::default(),
    };

    let deliverable = match cli.command {
        Command::Tools => {
            for line in commands::catalog_lines() {
                println!("{line}");
            }
            return Ok(());
        }
        Command::Palette(args) => {
            for colour in commands::palette(config, args)? {
                println!("{}", colour.hex());
            }
            return Ok(());
        }
        Command::Images(args) => commands::images(config, args).await?,
        Command::Merge(args) => commands::merge(config, args).await?,
        Command::Split(args) => commands::split(args).await?,
        Command::Compress(args) => commands::compress(config, args).await?,
        Command::RemovePages(args) => commands::remove_pages(args).await?,
    };

    for warning in &deliverable.warnings {
        eprintln!("warning: {warning}");
    }
    let dir = output::output_dir(cli.out.as_deref())?;
    let path = output::write_deliverable(&dir, &deliverable)?;
    println!("{}", path.display());
    Ok(())
}

/// Print a failure for people: the humanised message when the cause is a
/// toolkit error, the full context chain otherwise.
fn report(err: &anyhow::Error) {
    tracing::debug!(error = %format!("{err:#}"), "Command failed");
    match err.chain().find_map(|cause| cause.downcast_ref::<WhizError>()) {
        Some(whiz) => {
            let human = humanize_error(whiz);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            if human.retriable {
                eprintln!("  (retrying may help)");
            }
        }
        None => eprintln!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_pages_are_parsed_from_the_command_line() {
        let cli = Cli::try_parse_from(["imagewhiz", "split", "doc.pdf", "--pages", "1,3", "--out", "x"])
            .expect("parse");
        assert_eq!(cli.out, Some(PathBuf::from("x")));
        match cli.command {
            Command::Split(args) => assert_eq!(args.pages, "1,3"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn images_accept_a_tool_list() {
        let cli = Cli::try_parse_from([
            "imagewhiz", "images", "a.png", "b.png", "--tools", "rotate,convert", "--crop", "-5,0,10,10",
        ])
        .expect("parse");
        match cli.command {
            Command::Images(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.tools, vec!["rotate", "convert"]);
                assert_eq!(args.crop.as_deref(), Some("-5,0,10,10"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn quality_outside_range_is_refused() {
        assert!(Cli::try_parse_from(["imagewhiz", "images", "a.png", "--quality", "0"]).is_err());
    }
}
