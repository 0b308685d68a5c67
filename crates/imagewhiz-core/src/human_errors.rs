// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a front-end presents it.

use crate::error::WhizError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something unexpected happened; trying again may help.
    Transient,
    /// User must change the input (upload more files, select pages).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same operation can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `WhizError` into a `HumanError`.
pub fn humanize_error(err: &WhizError) -> HumanError {
    match err {
        WhizError::InsufficientInput { required, .. } => HumanError {
            message: format!("Please upload at least {required} PDF files to merge."),
            suggestion: "Add another PDF to the list, then merge again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhizError::NoSelection => HumanError {
            message: "Please select at least one page.".into(),
            suggestion: "Click the page thumbnails you want to keep, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhizError::InputRejected(detail) => {
            let lower = detail.to_lowercase();
            if lower.contains("content type") || lower.contains("not a pdf") {
                HumanError {
                    message: "This type of file isn't supported here.".into(),
                    suggestion: format!(
                        "Images must be JPG, PNG, GIF, WebP, BMP or TIFF; documents must be PDF. ({detail})"
                    ),
                    retriable: false,
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "Please check your selection.".into(),
                    suggestion: detail.clone(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            }
        }

        WhizError::Decode(detail) => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: format!("The file may be damaged. Try re-saving it and upload it again. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhizError::Encode(detail) => HumanError {
            message: "We couldn't save the image in that format.".into(),
            suggestion: format!("Try a different output format. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhizError::Parse(_) => HumanError {
            message: "Could not read the PDF. It may be corrupted or protected.".into(),
            suggestion: "Open the file in a PDF viewer and save an unprotected copy, then try again."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhizError::Archive(_) | WhizError::Unexpected(_) => HumanError {
            message: "Processing failed.".into(),
            suggestion: format!("Please try again. ({err})"),
            retriable: true,
            severity: Severity::Transient,
        },

        WhizError::Io(io_err) => HumanError {
            message: "We couldn't read or write a file.".into(),
            suggestion: format!("Check the file exists and you have permission to use it. ({io_err})"),
            retriable: true,
            severity: Severity::Transient,
        },

        WhizError::Serialization(detail) => HumanError {
            message: "The settings file is not valid.".into(),
            suggestion: format!("Fix the JSON syntax or delete the file to use defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
