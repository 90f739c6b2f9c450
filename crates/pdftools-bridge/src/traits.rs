// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use pdftools_core::error::Result;

/// Unified bridge that groups all native capabilities the PDF tools need.
///
/// Implementations must be shareable across the blocking thread pool, since
/// codec calls run off the async runtime.
pub trait PlatformBridge: NativeFileAccess + NativeShare + Send + Sync {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Read resources handed to the app (picked images, opened PDFs).
pub trait NativeFileAccess {
    /// Read all bytes behind a source URI or path.
    fn read_source(&self, uri: &str) -> Result<Vec<u8>>;

    /// Display name of a source: the last path segment, without query.
    fn source_name(&self, uri: &str) -> Option<String> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains(':'))
            .map(str::to_owned)
    }
}

/// Share content via the OS share sheet.
pub trait NativeShare {
    /// Share in-memory bytes as a file named `filename`.
    fn share_bytes(&self, bytes: &[u8], filename: &str, mime_type: &str) -> Result<()>;

    /// Share an existing resource by URI. `mime_type` of `None` lets the
    /// platform infer it.
    fn share_uri(&self, uri: &str, mime_type: Option<&str>) -> Result<()>;
}
