// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the PDF tools engine.

use thiserror::Error;

/// Top-level error type for all PDF tools operations.
#[derive(Debug, Error)]
pub enum PdfToolsError {
    // -- Document errors --
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Coordinator errors --
    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("no converted document to save")]
    NothingToSave,

    #[error("background job failed: {0}")]
    JobFailed(String),

    // -- Storage / persistence --
    #[error("storage permission is missing")]
    MissingPermissions,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfToolsError>;
