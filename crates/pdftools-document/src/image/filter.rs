// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel filters applied to pages before encoding.

use std::ops::RangeInclusive;

use image::DynamicImage;

use super::processor::ImageProcessor;

/// A single adjustable image filter.
pub trait ImageFilter: Send + Sync {
    /// Stable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Apply the filter, returning the transformed image.
    fn apply(&self, image: DynamicImage) -> DynamicImage;
}

/// Contrast adjustment. `1.0` leaves the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastFilter {
    value: f32,
}

impl ContrastFilter {
    /// Accepted contrast factors; `0.0` flattens to mid-grey.
    pub const RANGE: RangeInclusive<f32> = 0.0..=4.0;

    /// Values outside [`Self::RANGE`] are clamped into it.
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(*Self::RANGE.start(), *Self::RANGE.end()),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

impl Default for ContrastFilter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ImageFilter for ContrastFilter {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        ImageProcessor::from_dynamic(image)
            .adjust_contrast(self.value)
            .into_dynamic()
    }
}

/// Desaturate to 8-bit grey.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleFilter;

impl ImageFilter for GrayscaleFilter {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        ImageProcessor::from_dynamic(image).grayscale().into_dynamic()
    }
}

/// Brightness shift added to every channel, saturating at 0 and 255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrightnessFilter {
    delta: i32,
}

impl BrightnessFilter {
    pub fn new(delta: i32) -> Self {
        Self { delta }
    }
}

impl ImageFilter for BrightnessFilter {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn apply(&self, image: DynamicImage) -> DynamicImage {
        if self.delta == 0 {
            return image;
        }
        ImageProcessor::from_dynamic(image)
            .brighten(self.delta)
            .into_dynamic()
    }
}
