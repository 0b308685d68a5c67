// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ImageWhiz.

use thiserror::Error;

/// Top-level error type for all ImageWhiz operations.
#[derive(Debug, Error)]
pub enum WhizError {
    // -- Input preconditions --
    #[error("input rejected: {0}")]
    InputRejected(String),

    #[error("at least {required} documents are required, got {supplied}")]
    InsufficientInput { required: usize, supplied: usize },

    #[error("no pages selected")]
    NoSelection,

    // -- Per-item codec errors --
    #[error("image decoding failed: {0}")]
    Decode(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Document errors --
    #[error("PDF could not be parsed: {0}")]
    Parse(String),

    // -- Packaging --
    #[error("archive generation failed: {0}")]
    Archive(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used to decide how a failure propagates.
///
/// Per-item decode/encode failures are recovered locally by the operators;
/// everything else surfaces once to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputRejected,
    DecodeFailure,
    EncodeFailure,
    ParseFailure,
    Unexpected,
}

impl WhizError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputRejected(_) | Self::InsufficientInput { .. } | Self::NoSelection => {
                ErrorKind::InputRejected
            }
            Self::Decode(_) => ErrorKind::DecodeFailure,
            Self::Encode(_) => ErrorKind::EncodeFailure,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Archive(_) | Self::Unexpected(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Whether an operator may swallow this error and pass its item through.
    pub fn is_recoverable_per_item(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DecodeFailure | ErrorKind::EncodeFailure
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WhizError>;
