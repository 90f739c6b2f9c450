// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator contracts consumed by the PDF tools coordinator.
//
// The coordinator never decodes, rasterises, or writes anything itself. It
// talks to an `ImageCodec` for pixels and PDF bytes and to a `Persistence`
// layer for finished artifacts. Both are blocking interfaces; the coordinator
// runs them on the blocking thread pool.

use image::DynamicImage;

use crate::error::Result;
use crate::types::{ImageInfo, SourceRef};

/// Image and PDF operations backing the PDF tools.
pub trait ImageCodec: Send + Sync {
    /// Number of pages in the PDF behind `source`.
    fn page_count(&self, source: &SourceRef) -> Result<usize>;

    /// Render (or recover) page `page_index` (0-based) as an image.
    fn rasterize_page(&self, source: &SourceRef, page_index: usize) -> Result<DynamicImage>;

    /// Encode `image` according to `info` (size, rotation, format, quality).
    fn compress(&self, image: &DynamicImage, info: &ImageInfo) -> Result<Vec<u8>>;

    /// Assemble the ordered `sources` into a single PDF, one image per page.
    ///
    /// With `scale_up`, images smaller than the largest one are enlarged to
    /// match its width.
    fn assemble(&self, sources: &[SourceRef], scale_up: bool) -> Result<Vec<u8>>;

    /// Hand raw bytes to the platform share sheet under `filename`.
    fn share_bytes(&self, bytes: &[u8], filename: &str) -> Result<()>;

    /// Share an existing resource without copying it.
    fn share_by_reference(&self, source: &SourceRef) -> Result<()>;
}

/// A finished artifact ready to be written to storage.
#[derive(Debug, Clone)]
pub struct SaveTarget {
    /// Settings the artifact was encoded with (drives the file extension).
    pub image_info: ImageInfo,
    /// Resource the artifact was derived from.
    pub original: SourceRef,
    /// 1-based position of the artifact within its batch.
    pub sequence_number: usize,
    /// Encoded bytes.
    pub data: Vec<u8>,
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written; carries the output path.
    Saved(String),
    /// The platform refused access to the save location.
    MissingPermissions,
    /// Any other failure.
    Failed(String),
}

/// Storage for finished artifacts.
pub trait Persistence: Send + Sync {
    fn save(&self, target: SaveTarget) -> SaveOutcome;

    /// Location new artifacts are written to.
    fn current_save_path(&self) -> String;
}
