// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ImageCodec` implementation backed by the document crate.
//
// Sources are read through the platform bridge, so `content://` URIs work on
// Android and plain paths work on desktop. The most recently opened PDF is
// kept parsed so a batch extraction does not re-read it for every page.

use std::sync::{Arc, Mutex};

use image::DynamicImage;
use pdftools_bridge::PlatformBridge;
use pdftools_core::codec::ImageCodec;
use pdftools_core::error::{PdfToolsError, Result};
use pdftools_core::types::{ImageFormat, ImageInfo, SourceRef};
use tracing::{debug, info, instrument};

use crate::image::{ImageFilter, ImageProcessor};
use crate::pdf::{PdfReader, PdfWriter};

/// A parsed PDF together with the bytes it came from.
struct LoadedPdf {
    source: SourceRef,
    #[cfg_attr(not(feature = "pdfium"), allow(dead_code))]
    bytes: Arc<Vec<u8>>,
    reader: Arc<PdfReader>,
}

/// Codec reading sources through a [`PlatformBridge`].
pub struct DocumentCodec {
    bridge: Arc<dyn PlatformBridge>,
    filters: Vec<Box<dyn ImageFilter>>,
    loaded: Mutex<Option<LoadedPdf>>,
}

impl DocumentCodec {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self {
            bridge,
            filters: Vec::new(),
            loaded: Mutex::new(None),
        }
    }

    /// Add a filter applied to every image before it is encoded.
    pub fn with_filter(mut self, filter: impl ImageFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Parsed PDF for `source`, reusing the cached one when it matches.
    fn load_pdf(&self, source: &SourceRef) -> Result<(Arc<Vec<u8>>, Arc<PdfReader>)> {
        {
            let guard = self.loaded.lock().expect("pdf cache lock poisoned");
            if let Some(loaded) = guard.as_ref().filter(|l| &l.source == source) {
                return Ok((Arc::clone(&loaded.bytes), Arc::clone(&loaded.reader)));
            }
        }

        let bytes = Arc::new(self.bridge.read_source(source.as_str())?);
        let reader = Arc::new(PdfReader::from_bytes(&bytes)?);
        debug!(%source, pages = reader.page_count(), "PDF cached");

        let mut guard = self.loaded.lock().expect("pdf cache lock poisoned");
        *guard = Some(LoadedPdf {
            source: source.clone(),
            bytes: Arc::clone(&bytes),
            reader: Arc::clone(&reader),
        });
        Ok((bytes, reader))
    }

    fn decode_source(&self, source: &SourceRef) -> Result<DynamicImage> {
        let data = self.bridge.read_source(source.as_str())?;
        Ok(ImageProcessor::from_bytes(&data)?.into_dynamic())
    }
}

impl ImageCodec for DocumentCodec {
    fn page_count(&self, source: &SourceRef) -> Result<usize> {
        let (_, reader) = self.load_pdf(source)?;
        Ok(reader.page_count())
    }

    #[instrument(skip(self), fields(%source))]
    fn rasterize_page(&self, source: &SourceRef, page_index: usize) -> Result<DynamicImage> {
        #[cfg(feature = "pdfium")]
        let (bytes, reader) = self.load_pdf(source)?;
        #[cfg(not(feature = "pdfium"))]
        let (_, reader) = self.load_pdf(source)?;
        if page_index >= reader.page_count() {
            return Err(PdfToolsError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_index + 1,
                reader.page_count()
            )));
        }

        #[cfg(feature = "pdfium")]
        {
            crate::pdf::render::render_page(&bytes, page_index)
        }
        #[cfg(not(feature = "pdfium"))]
        {
            reader.page_image(page_index)
        }
    }

    #[instrument(skip(self, image, info), fields(format = ?info.image_format))]
    fn compress(&self, image: &DynamicImage, info: &ImageInfo) -> Result<Vec<u8>> {
        let filtered = self
            .filters
            .iter()
            .fold(image.clone(), |img, filter| filter.apply(img));
        ImageProcessor::from_dynamic(filtered)
            .apply_info(info)
            .encode(info.image_format, info.quality)
    }

    #[instrument(skip(self, sources), fields(count = sources.len(), scale_up))]
    fn assemble(&self, sources: &[SourceRef], scale_up: bool) -> Result<Vec<u8>> {
        let images = sources
            .iter()
            .map(|source| self.decode_source(source))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = PdfWriter::new();
        if let Some(name) = sources
            .first()
            .and_then(|source| self.bridge.source_name(source.as_str()))
        {
            writer.set_title(name);
        }
        let pdf = writer.create_from_images(&images, scale_up)?;
        info!(pages = images.len(), bytes = pdf.len(), "PDF assembled");
        Ok(pdf)
    }

    fn share_bytes(&self, bytes: &[u8], filename: &str) -> Result<()> {
        self.bridge.share_bytes(bytes, filename, mime_type_for(filename))
    }

    fn share_by_reference(&self, source: &SourceRef) -> Result<()> {
        self.bridge.share_uri(source.as_str(), None)
    }
}

/// MIME type inferred from a filename's extension.
fn mime_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    if ext.eq_ignore_ascii_case("pdf") {
        return "application/pdf";
    }
    ImageFormat::from_extension(ext)
        .map(|format| format.mime_type())
        .unwrap_or("application/octet-stream")
}
