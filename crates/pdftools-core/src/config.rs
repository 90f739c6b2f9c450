// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{ImageInfo, Preset};

/// Persistent PDF tools settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Preset a fresh session starts with.
    pub default_preset: Preset,
    /// Output settings a fresh session starts with.
    pub default_image_info: ImageInfo,
    /// Initial state of the "scale small images up to the largest" toggle.
    pub scale_small_images_to_large: bool,
    /// Prefix for generated PDF filenames.
    pub pdf_filename_prefix: String,
    /// Directory extracted pages are written to. `None` uses the data dir.
    pub save_dir: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_preset: Preset::Numeric(100),
            default_image_info: ImageInfo::default(),
            scale_small_images_to_large: false,
            pdf_filename_prefix: "PDF".into(),
            save_dir: None,
        }
    }
}
