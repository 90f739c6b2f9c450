// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdftools-document: Document processing for the PDF tools engine.
//
// Provides image processing (presets, resize, rotate, flip, filters,
// format-aware encoding), PDF reading and page image recovery, image-to-PDF
// assembly, and `DocumentCodec`, the `ImageCodec` the coordinator runs on.

pub mod codec;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `pdftools_document::PdfReader` etc.
pub use codec::DocumentCodec;
pub use self::image::{
    BrightnessFilter, ContrastFilter, GrayscaleFilter, ImageFilter, ImageProcessor,
};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
