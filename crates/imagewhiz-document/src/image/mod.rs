// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: codec adapter, bitmap transforms, and the per-item raster
// operators built on them.

pub mod codec;
pub mod operators;
pub mod processor;

pub use codec::{BitmapCodec, ImageCodec};
pub use operators::{OperatorOutcome, RasterOperator};
pub use processor::{ImageProcessor, Rgb};
