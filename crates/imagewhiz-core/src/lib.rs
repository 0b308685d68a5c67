// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ImageWhiz: Core types, tool catalog, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod registry;
pub mod tools;
pub mod types;

pub use config::ToolkitConfig;
pub use error::WhizError;
pub use tools::{ToolConfigurationSession, ToolId, ToolSelection, ToolSettings, ToolSettingsMap, ToolTarget};
pub use types::*;
