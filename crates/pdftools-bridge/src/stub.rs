// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Sources are plain filesystem paths (optionally `file://` URIs). There is no
// share sheet, so sharing returns `PlatformUnavailable`.

use pdftools_core::error::{PdfToolsError, Result};

use crate::traits::*;

/// Filesystem-backed bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeFileAccess for StubBridge {
    fn read_source(&self, uri: &str) -> Result<Vec<u8>> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if path.contains("://") {
            tracing::warn!(uri, "non-file URI passed to stub bridge");
            return Err(PdfToolsError::PlatformUnavailable);
        }
        std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::PermissionDenied => PdfToolsError::MissingPermissions,
            _ => PdfToolsError::Io(err),
        })
    }
}

impl NativeShare for StubBridge {
    fn share_bytes(&self, bytes: &[u8], filename: &str, _mime_type: &str) -> Result<()> {
        tracing::warn!(filename, bytes = bytes.len(), "NativeShare::share_bytes called on stub bridge");
        Err(PdfToolsError::PlatformUnavailable)
    }

    fn share_uri(&self, uri: &str, _mime_type: Option<&str>) -> Result<()> {
        tracing::warn!(uri, "NativeShare::share_uri called on stub bridge");
        Err(PdfToolsError::PlatformUnavailable)
    }
}
