// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open and inspect existing PDF documents and recover page
// images using the `lopdf` crate.
//
// Without the `pdfium` feature there is no vector renderer. A page's image is
// recovered from the largest raster XObject it draws, which covers scans and
// every PDF assembled from images. Pages with no raster content are reported
// as unsupported.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdftools_core::error::PdfToolsError;
use tracing::{debug, instrument};

/// Maximum `/Parent` hops followed when looking for inherited resources.
const MAX_INHERITANCE_DEPTH: usize = 16;

/// Reads existing PDF files.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfToolsError> {
        let document = Document::load_mem(data).map_err(|err| {
            PdfToolsError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    // -- Extraction -----------------------------------------------------------

    /// Recover the image shown on page `page_index` (0-based).
    ///
    /// Picks the largest image XObject referenced from the page resources.
    #[instrument(skip(self), fields(page_index))]
    pub fn page_image(&self, page_index: usize) -> Result<DynamicImage, PdfToolsError> {
        let pages = self.document.get_pages();
        // lopdf pages are keyed by 1-indexed page number.
        let page_id: ObjectId = *pages.get(&(page_index as u32 + 1)).ok_or_else(|| {
            PdfToolsError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_index + 1,
                pages.len()
            ))
        })?;

        let xobjects = self.page_xobjects(page_id).ok_or_else(|| {
            PdfToolsError::UnsupportedDocument(format!(
                "page {} has no image resources",
                page_index + 1
            ))
        })?;

        let largest = xobjects
            .iter()
            .filter_map(|(_, value)| self.resolve(value))
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| name_of(&stream.dict, b"Subtype") == Some(b"Image".as_slice()))
            .max_by_key(|stream| {
                let w = int_of(&stream.dict, b"Width").unwrap_or(0);
                let h = int_of(&stream.dict, b"Height").unwrap_or(0);
                w.saturating_mul(h)
            })
            .ok_or_else(|| {
                PdfToolsError::UnsupportedDocument(format!(
                    "page {} has no raster image to extract",
                    page_index + 1
                ))
            })?;

        let image = decode_image_stream(largest)?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Page image recovered"
        );
        Ok(image)
    }

    // -- Helpers --------------------------------------------------------------

    /// Follow a reference to its object; direct objects are returned as-is.
    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// The `/XObject` dictionary of a page, honouring inherited `/Resources`.
    fn page_xobjects(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let xobjects = node
                .get(b"Resources")
                .ok()
                .and_then(|r| self.resolve(r))
                .and_then(|r| r.as_dict().ok())
                .and_then(|r| r.get(b"XObject").ok());
            if let Some(xobjects) = xobjects {
                return self.resolve(xobjects).and_then(|o| o.as_dict().ok());
            }
            node = match node.get(b"Parent") {
                Ok(parent) => self.resolve(parent)?.as_dict().ok()?,
                Err(_) => return None,
            };
        }
        None
    }
}

/// Decode an image XObject stream.
///
/// Supports `DCTDecode` (JPEG) streams and 8-bit DeviceRGB/DeviceGray pixel
/// data stored raw or `FlateDecode`d.
fn decode_image_stream(stream: &Stream) -> Result<DynamicImage, PdfToolsError> {
    let filters = filters_of(&stream.dict);

    if filters.last().map(Vec::as_slice) == Some(b"DCTDecode".as_slice()) {
        let jpeg = if filters.len() > 1 {
            stream.decompressed_content().map_err(|err| {
                PdfToolsError::PdfError(format!("failed to inflate JPEG stream: {}", err))
            })?
        } else {
            stream.content.clone()
        };
        return image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).map_err(
            |err| PdfToolsError::ImageError(format!("failed to decode embedded JPEG: {}", err)),
        );
    }

    let width = int_of(&stream.dict, b"Width")
        .and_then(|w| u32::try_from(w).ok())
        .ok_or_else(|| PdfToolsError::PdfError("image stream without /Width".into()))?;
    let height = int_of(&stream.dict, b"Height")
        .and_then(|h| u32::try_from(h).ok())
        .ok_or_else(|| PdfToolsError::PdfError("image stream without /Height".into()))?;
    let bits = int_of(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(PdfToolsError::UnsupportedDocument(format!(
            "{bits}-bit image streams are not supported"
        )));
    }

    let pixels = match filters.as_slice() {
        [] => stream.content.clone(),
        [only] if only.as_slice() == b"FlateDecode" => {
            stream.decompressed_content().map_err(|err| {
                PdfToolsError::PdfError(format!("failed to inflate image stream: {}", err))
            })?
        }
        _ => {
            return Err(PdfToolsError::UnsupportedDocument(format!(
                "image filter chain {:?} is not supported",
                filters
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect::<Vec<_>>()
            )));
        }
    };

    let area = width as usize * height as usize;
    let is_gray = name_of(&stream.dict, b"ColorSpace") == Some(b"DeviceGray".as_slice());
    if !is_gray && pixels.len() >= area * 3 {
        let mut rgb = pixels;
        rgb.truncate(area * 3);
        RgbImage::from_raw(width, height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| PdfToolsError::ImageError("RGB buffer size mismatch".into()))
    } else if pixels.len() >= area {
        let mut gray = pixels;
        gray.truncate(area);
        GrayImage::from_raw(width, height, gray)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| PdfToolsError::ImageError("grey buffer size mismatch".into()))
    } else {
        Err(PdfToolsError::PdfError(format!(
            "image stream holds {} bytes, expected at least {} for {}x{}",
            pixels.len(),
            area,
            width,
            height
        )))
    }
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    dict.get(key).ok().and_then(|o| o.as_name().ok())
}

fn int_of(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|o| o.as_i64().ok())
}

/// `/Filter` as a list of names (a single name or an array).
fn filters_of(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Build a one-page PDF that draws a single raw RGB image.
    pub(crate) fn pdf_with_raw_image(width: u32, height: u32, rgb: Vec<u8>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb,
        ));
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            format!("q {width} 0 0 {height} 0 0 cm /Im0 Do Q").into_bytes(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("serialise test PDF");
        out
    }

    #[test]
    fn counts_pages() {
        let pdf = pdf_with_raw_image(2, 2, vec![0; 12]);
        let reader = PdfReader::from_bytes(&pdf).unwrap();
        assert_eq!(reader.page_count(), 1);
    }

    #[test]
    fn recovers_inherited_raw_image() {
        let rgb: Vec<u8> = (0..4).flat_map(|i| [i * 10, 0, 255]).collect();
        let pdf = pdf_with_raw_image(2, 2, rgb);
        let image = PdfReader::from_bytes(&pdf).unwrap().page_image(0).unwrap().to_rgb8();
        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, [30, 0, 255]);
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let pdf = pdf_with_raw_image(1, 1, vec![1, 2, 3]);
        let err = PdfReader::from_bytes(&pdf).unwrap().page_image(3).unwrap_err();
        assert!(matches!(err, PdfToolsError::PdfError(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(PdfReader::from_bytes(b"not a pdf").is_err());
    }
}
