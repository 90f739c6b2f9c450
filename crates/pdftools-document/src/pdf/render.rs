// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Full page rasterisation through pdfium (feature `pdfium`).
//
// pdfium is not async-safe; callers run this on a blocking thread.

use image::DynamicImage;
use pdfium_render::prelude::*;
use pdftools_core::error::PdfToolsError;
use tracing::{debug, instrument};

/// Longest edge, in pixels, of a rendered page.
pub const MAX_RENDER_EDGE: i32 = 2000;

/// Render page `page_index` (0-based) of the PDF in `data`.
#[instrument(skip(data), fields(bytes_len = data.len()))]
pub fn render_page(data: &[u8], page_index: usize) -> Result<DynamicImage, PdfToolsError> {
    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| PdfToolsError::PdfError(format!("failed to bind pdfium: {:?}", e)))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| PdfToolsError::PdfError(format!("pdfium could not open PDF: {:?}", e)))?;

    let pages = document.pages();
    let index = page_index
        .try_into()
        .map_err(|_| PdfToolsError::PdfError(format!("page index {page_index} too large")))?;
    let page = pages.get(index).map_err(|e| {
        PdfToolsError::PdfError(format!("page {} unavailable: {:?}", page_index + 1, e))
    })?;

    let config = PdfRenderConfig::new()
        .set_target_width(MAX_RENDER_EDGE)
        .set_maximum_height(MAX_RENDER_EDGE);
    let bitmap = page.render_with_config(&config).map_err(|e| {
        PdfToolsError::PdfError(format!("page {} failed to render: {:?}", page_index + 1, e))
    })?;

    let image = bitmap.as_image();
    debug!(width = image.width(), height = image.height(), "Page rendered");
    Ok(image)
}
