// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page inspection, page image recovery, and image-to-PDF
// assembly.

pub mod reader;
#[cfg(feature = "pdfium")]
pub mod render;
pub mod writer;

pub use reader::PdfReader;
pub use writer::PdfWriter;
