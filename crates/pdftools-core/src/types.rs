// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the PDF tools engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle identifying an image or PDF resource outside the engine's
/// ownership (a `content://` URI on Android, a path or `file://` URI on
/// desktop).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment with any extension removed.
    ///
    /// Falls back to `"source"` when the reference has no usable segment
    /// (e.g. a bare `content://` authority).
    pub fn file_stem(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        let segment = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        let stem = match segment.rfind('.') {
            Some(0) | None => segment,
            Some(dot) => &segment[..dot],
        };
        if stem.is_empty() || stem.ends_with(':') {
            "source"
        } else {
            stem
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for a background job (extraction, assembly, save, share).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a format exposes its compression control, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    /// Lossy quality percentage.
    Quality { min: u8, max: u8 },
    /// Lossless encoder effort level.
    Effort { min: u8, max: u8 },
}

impl CompressionType {
    pub fn range(&self) -> (u8, u8) {
        match *self {
            Self::Quality { min, max } | Self::Effort { min, max } => (min, max),
        }
    }
}

/// Output image formats for extracted pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless WebP.
    Webp,
    Bmp,
}

impl ImageFormat {
    /// Compression control offered by this format.
    pub fn compression_type(&self) -> Option<CompressionType> {
        match self {
            Self::Jpeg => Some(CompressionType::Quality { min: 1, max: 100 }),
            Self::Png => Some(CompressionType::Effort { min: 0, max: 9 }),
            Self::Webp | Self::Bmp => None,
        }
    }

    /// Whether the quality/effort slider applies to this format.
    pub fn can_change_compression_value(&self) -> bool {
        self.compression_type().is_some()
    }

    /// Coerce a requested compression value into this format's range.
    ///
    /// Formats without a compression control keep the value unchanged.
    pub fn clamp_quality(&self, value: f32) -> f32 {
        match self.compression_type() {
            Some(kind) => {
                let (min, max) = kind.range();
                value.round().clamp(min as f32, max as f32)
            }
            None => value,
        }
    }

    /// Unit suffix shown next to the compression value.
    pub fn compression_label(&self) -> &'static str {
        match self.compression_type() {
            Some(CompressionType::Quality { .. }) => "%",
            _ => "",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Output settings for an encoded image.
///
/// `width`/`height` of zero mean "keep the source dimension".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub quality: f32,
    pub image_format: ImageFormat,
    pub rotation_degrees: f32,
    pub is_flipped: bool,
}

impl Default for ImageInfo {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quality: 100.0,
            image_format: ImageFormat::default(),
            rotation_degrees: 0.0,
            is_flipped: false,
        }
    }
}

impl ImageInfo {
    /// Copy of `self` with quality coerced into the format's range.
    pub fn normalized(mut self) -> Self {
        self.quality = self.image_format.clamp_quality(self.quality);
        self
    }
}

/// Size/quality preset applied to each extracted page before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Percentage of the source size; doubles as the quality value.
    Numeric(u8),
    /// Fit inside a 512×512 box as PNG (sticker-sized output).
    Telegram,
    /// Keep the source size and the current settings.
    None,
}

impl Preset {
    /// Longest edge of a [`Preset::Telegram`] output.
    pub const TELEGRAM_MAX_EDGE: u32 = 512;
}

impl Default for Preset {
    fn default() -> Self {
        Self::Numeric(100)
    }
}
