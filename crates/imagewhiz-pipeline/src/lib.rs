// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imagewhiz-pipeline: Orchestration for ImageWhiz.
//
// Runs ordered tool stages over a batch of images, packages the processed set
// as a file, archive or document, and drives the PDF merge/split/compress
// sessions.

pub mod executor;
pub mod packager;
pub mod preview;
pub mod session;
pub mod workspace;

pub use executor::{PipelineExecutor, PipelineOutput, StageWarning};
pub use packager::{Deliverable, DeliverableKind, OutputPackager};
pub use preview::{PreviewHandle, PreviewPool};
pub use session::{CompressSession, MergeSession, RemovePagesSession, SessionState, SplitSession};
pub use workspace::Workspace;

use imagewhiz_core::error::{Result, WhizError};

/// Run CPU-bound work on the blocking pool. A panic inside `job` surfaces as
/// [`WhizError::Unexpected`].
pub(crate) async fn run_blocking<T, F>(label: &'static str, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| WhizError::Unexpected(format!("{label} task failed: {err}")))?
}
