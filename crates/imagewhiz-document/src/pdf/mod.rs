// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: document adapter, page-level operators, image assembly, and
// the consumed page-rendering capability.

pub mod adapter;
pub mod operators;
pub mod render;
pub mod writer;

pub use adapter::{DocumentAdapter, LopdfAdapter, MetadataField, PdfHandle};
pub use render::PageRenderer;
pub use writer::PdfWriter;
