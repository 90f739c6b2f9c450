// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: preset application, resize, rotate, flip, contrast, and
// format-aware encoding. Operates on in-memory images using the `image` and
// `imageproc` crates.

use image::codecs::png::{CompressionType as PngCompression, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use pdftools_core::error::PdfToolsError;
use pdftools_core::types::{ImageFormat, ImageInfo, Preset};
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let info = ImageProcessor::apply_preset(&page, Preset::Numeric(50), &current);
/// let bytes = ImageProcessor::from_dynamic(page)
///     .apply_info(&info)
///     .encode(info.image_format, info.quality)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfToolsError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PdfToolsError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Presets --------------------------------------------------------------

    /// Derive the concrete output settings for `image` under `preset`.
    ///
    /// * `Numeric(p)` scales the source by `p`% and uses `p` as quality
    ///   (coerced into the current format's range).
    /// * `Telegram` fits the source inside 512×512 and switches to PNG.
    /// * `None` keeps `current`, filling any zero dimension from the source.
    pub fn apply_preset(image: &DynamicImage, preset: Preset, current: &ImageInfo) -> ImageInfo {
        let (src_w, src_h) = (image.width(), image.height());
        match preset {
            Preset::Numeric(percent) => {
                let factor = percent.max(1) as f32 / 100.0;
                ImageInfo {
                    width: scaled(src_w, factor),
                    height: scaled(src_h, factor),
                    quality: current.image_format.clamp_quality(percent as f32),
                    ..current.clone()
                }
            }
            Preset::Telegram => {
                let (width, height) = fit_within(src_w, src_h, Preset::TELEGRAM_MAX_EDGE);
                ImageInfo {
                    width,
                    height,
                    image_format: ImageFormat::Png,
                    quality: ImageFormat::Png.clamp_quality(current.quality),
                    ..current.clone()
                }
            }
            Preset::None => ImageInfo {
                width: if current.width == 0 { src_w } else { current.width },
                height: if current.height == 0 { src_h } else { current.height },
                ..current.clone()
            },
        }
    }

    /// Apply the geometric part of `info`: exact resize (zero dimensions keep
    /// the source size), rotation, then horizontal flip.
    #[instrument(skip(self, info), fields(width = info.width, height = info.height))]
    pub fn apply_info(self, info: &ImageInfo) -> Self {
        let target_w = if info.width == 0 { self.width() } else { info.width };
        let target_h = if info.height == 0 { self.height() } else { info.height };

        let mut processor = if (target_w, target_h) != (self.width(), self.height()) {
            self.resize_exact(target_w, target_h)
        } else {
            self
        };
        if info.rotation_degrees.rem_euclid(360.0).abs() >= 0.01 {
            processor = processor.rotate(info.rotation_degrees);
        }
        if info.is_flipped {
            processor = processor.flip_horizontal();
        }
        processor
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles, bilinear interpolation about the centre is applied.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let default_pixel = image::Rgba([255u8, 255, 255, 0]);
        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &rgba,
            degrees.to_radians(),
            Interpolation::Bilinear,
            default_pixel,
        );

        debug!("General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Mirror the image left-to-right.
    pub fn flip_horizontal(self) -> Self {
        Self {
            image: self.image.fliph(),
        }
    }

    /// Convert to 8-bit luma.
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Shift brightness by `delta` (negative darkens).
    pub fn brighten(self, delta: i32) -> Self {
        Self {
            image: self.image.brighten(delta),
        }
    }

    /// Adjust contrast by a factor. Values > 1.0 increase contrast; values
    /// < 1.0 decrease it. A value of 1.0 is a no-op.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let contrasted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let adjust = |channel: u8| -> u8 {
                let val = factor * (channel as f32 - 128.0) + 128.0;
                val.clamp(0.0, 255.0) as u8
            };
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });

        Self {
            image: DynamicImage::ImageRgba8(contrasted),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image in `format`.
    ///
    /// `quality` is the JPEG quality percentage or the PNG effort level
    /// (0–9); it is ignored by formats without a compression control.
    pub fn encode(&self, format: ImageFormat, quality: f32) -> Result<Vec<u8>, PdfToolsError> {
        let level = format.clamp_quality(quality);
        match format {
            ImageFormat::Jpeg => self.to_jpeg_bytes(level as u8),
            ImageFormat::Png => self.to_png_bytes_with_effort(level as u8),
            ImageFormat::Webp => encode_to_format(
                &DynamicImage::ImageRgba8(self.image.to_rgba8()),
                image::ImageFormat::WebP,
            ),
            ImageFormat::Bmp => encode_to_format(&self.image, image::ImageFormat::Bmp),
        }
    }

    /// Encode as PNG, mapping effort 0–9 onto the encoder's compression levels.
    fn to_png_bytes_with_effort(&self, effort: u8) -> Result<Vec<u8>, PdfToolsError> {
        let compression = match effort {
            0..=2 => PngCompression::Fast,
            3..=6 => PngCompression::Default,
            _ => PngCompression::Best,
        };
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilter::Adaptive);
        self.image.write_with_encoder(encoder).map_err(|err| {
            PdfToolsError::ImageError(format!("PNG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, PdfToolsError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(|err| {
            PdfToolsError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}

/// `value * factor`, rounded, never below one pixel.
fn scaled(value: u32, factor: f32) -> u32 {
    ((value as f32 * factor).round() as u32).max(1)
}

/// Largest size with the source aspect ratio whose longest edge is at most
/// `max_edge`. Images already inside the box are left alone.
fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }
    let factor = max_edge as f32 / longest as f32;
    (scaled(width, factor), scaled(height, factor))
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: image::ImageFormat,
) -> Result<Vec<u8>, PdfToolsError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PdfToolsError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
