// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble images into a new PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use pdftools_core::error::PdfToolsError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

/// Pixels are placed at 72 dpi so one pixel maps to one PDF point.
const PLACEMENT_DPI: f32 = 72.0;

/// Creates PDF documents where every page shows one image.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self { title: None }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Create a PDF with one page per image, in order.
    ///
    /// Each page is sized to its image. With `scale_small_to_large`, images
    /// narrower than the widest one are scaled up (keeping aspect ratio) so
    /// every page shares that width.
    #[instrument(skip(self, images), fields(images = images.len(), scale_small_to_large))]
    pub fn create_from_images(
        &self,
        images: &[DynamicImage],
        scale_small_to_large: bool,
    ) -> Result<Vec<u8>, PdfToolsError> {
        if images.is_empty() {
            return Err(PdfToolsError::PdfError(
                "cannot create a PDF without images".into(),
            ));
        }

        let title = self.title.as_deref().unwrap_or("PDF Tools Document");
        info!(title, "Creating PDF from images");

        let max_width = images.iter().map(DynamicImage::width).max().unwrap_or(0) as f32;

        let mut doc = PdfDocument::new(title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for image in images {
            let (w_px, h_px) = (image.width(), image.height());
            if w_px == 0 || h_px == 0 {
                warn!("Skipping empty image");
                continue;
            }

            let scale = if scale_small_to_large && (w_px as f32) < max_width {
                max_width / w_px as f32
            } else {
                1.0
            };

            let raw = RawImage {
                pixels: RawImageData::U8(image.to_rgb8().into_raw()),
                width: w_px as usize,
                height: h_px as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let page_w_pt = w_px as f32 * scale;
            let page_h_pt = h_px as f32 * scale;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(PLACEMENT_DPI),
                    rotate: None,
                },
            }];

            pages.push(PdfPage::new(pt_to_mm(page_w_pt), pt_to_mm(page_h_pt), ops));
        }

        if pages.is_empty() {
            return Err(PdfToolsError::PdfError(
                "no drawable images to place in the PDF".into(),
            ));
        }

        doc.with_pages(pages);
        debug!(pages = doc.pages.len(), "Image pages laid out");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        Ok(output)
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}
