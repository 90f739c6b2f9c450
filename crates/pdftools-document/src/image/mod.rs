// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: presets, resize/rotate/flip, filters, and encoding.

pub mod filter;
pub mod processor;

pub use filter::{BrightnessFilter, ContrastFilter, GrayscaleFilter, ImageFilter};
pub use processor::ImageProcessor;
