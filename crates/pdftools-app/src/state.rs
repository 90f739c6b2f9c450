// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF tools state: a plain value type with I/O-free transitions.
//
// The coordinator owns one `ToolState` behind a mutex, applies transitions to
// it, and publishes a clone after each one.

use std::sync::Arc;

use pdftools_core::types::{ImageInfo, Preset, SourceRef};

/// Which tool is active, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Preview,
    ImagesToPdf,
    PdfToImages,
}

/// The active PDF tool and the payload it was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionMode {
    /// Show an existing PDF.
    Preview(Option<SourceRef>),
    /// Assemble images, in order, into one PDF.
    ImagesToPdf(Option<Vec<SourceRef>>),
    /// Export selected pages of a PDF as images.
    PdfToImages(Option<SourceRef>),
}

impl ConversionMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            ConversionMode::Preview(_) => ModeKind::Preview,
            ConversionMode::ImagesToPdf(_) => ModeKind::ImagesToPdf,
            ConversionMode::PdfToImages(_) => ModeKind::PdfToImages,
        }
    }
}

/// Coarse lifecycle stage, as the UI would present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Preview,
    AssemblingImages,
    ExtractingPages,
}

/// A PDF opened for page export and the pages chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfToImagesState {
    pub source: SourceRef,
    /// Number of pages in the document.
    pub page_count: usize,
    /// Selected 0-based page indices, in export order.
    pub pages: Vec<usize>,
}

/// Batch progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Self { done: 0, total: 1 }
    }
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Lifecycle of the most recent batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Running,
    Cancelled,
    Completed,
    Failed(String),
}

/// Everything the UI can observe about the PDF tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub mode: Option<ConversionMode>,
    pub preview: Option<SourceRef>,
    pub images_to_pdf: Option<Vec<SourceRef>>,
    pub pdf_to_images: Option<PdfToImagesState>,
    /// Assembled PDF waiting for an explicit save or share.
    pub pending_artifact: Option<Arc<Vec<u8>>>,
    pub image_info: ImageInfo,
    pub preset: Preset,
    pub scale_small_images_to_large: bool,
    pub busy: bool,
    pub progress: Progress,
    pub job: Option<JobPhase>,
    /// Bumped on every mode change and clear; background results carry the
    /// generation they were started under.
    mode_generation: u64,
    /// Output settings a fresh or cleared session starts from.
    default_preset: Preset,
    default_image_info: ImageInfo,
}

/// Snapshot published to observers.
pub type ToolSnapshot = ToolState;

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: None,
            preview: None,
            images_to_pdf: None,
            pdf_to_images: None,
            pending_artifact: None,
            image_info: ImageInfo::default(),
            preset: Preset::default(),
            scale_small_images_to_large: false,
            busy: false,
            progress: Progress::default(),
            job: None,
            mode_generation: 0,
            default_preset: Preset::default(),
            default_image_info: ImageInfo::default(),
        }
    }
}

impl ToolState {
    /// Fresh state seeded with the configured output settings.
    pub fn with_defaults(preset: Preset, image_info: ImageInfo, scale_up: bool) -> Self {
        let image_info = image_info.normalized();
        Self {
            preset,
            image_info: image_info.clone(),
            scale_small_images_to_large: scale_up,
            default_preset: preset,
            default_image_info: image_info,
            ..Self::default()
        }
    }

    /// Generation of the current mode; see [`ToolState::store_artifact`].
    pub fn mode_generation(&self) -> u64 {
        self.mode_generation
    }

    pub fn mode_kind(&self) -> Option<ModeKind> {
        self.mode.as_ref().map(ConversionMode::kind)
    }

    pub fn stage(&self) -> Stage {
        match self.mode_kind() {
            None => Stage::Idle,
            Some(ModeKind::Preview) => Stage::Preview,
            Some(ModeKind::ImagesToPdf) => Stage::AssemblingImages,
            Some(ModeKind::PdfToImages) => Stage::ExtractingPages,
        }
    }

    // -- Mode transitions -----------------------------------------------------

    /// Replace the mode unless one with the same tag is already active, in
    /// which case its payload is kept.
    fn switch_mode(&mut self, incoming: ConversionMode) {
        if self.mode_kind() != Some(incoming.kind()) {
            self.mode = Some(incoming);
        }
        self.pending_artifact = None;
        self.mode_generation += 1;
    }

    pub fn apply_preview(&mut self, source: Option<SourceRef>) {
        self.switch_mode(ConversionMode::Preview(source.clone()));
        self.preview = source;
        self.images_to_pdf = None;
        self.pdf_to_images = None;
    }

    pub fn apply_images_to_pdf(&mut self, sources: Option<Vec<SourceRef>>) {
        self.switch_mode(ConversionMode::ImagesToPdf(sources.clone()));
        self.images_to_pdf = sources;
        self.preview = None;
        self.pdf_to_images = None;
    }

    /// Enter page export for `source`; the page list arrives later through
    /// [`ToolState::finish_page_lookup`] with the returned generation.
    pub fn begin_pdf_to_images(&mut self, source: Option<SourceRef>) -> u64 {
        self.pdf_to_images = None;
        self.switch_mode(ConversionMode::PdfToImages(source));
        self.images_to_pdf = None;
        self.preview = None;
        self.mode_generation
    }

    /// Install the page list of a finished lookup. Returns `false` when the
    /// lookup was superseded and its result dropped.
    pub fn finish_page_lookup(
        &mut self,
        generation: u64,
        source: SourceRef,
        page_count: usize,
    ) -> bool {
        if generation != self.mode_generation || self.mode_kind() != Some(ModeKind::PdfToImages)
        {
            return false;
        }
        self.pdf_to_images = Some(PdfToImagesState {
            source,
            page_count,
            pages: (0..page_count).collect(),
        });
        true
    }

    /// Keep an assembled PDF as the pending artifact, but only if images to
    /// PDF is still the tool it was assembled for. Returns `false` when the
    /// result was dropped.
    pub fn store_artifact(&mut self, generation: u64, pdf: Vec<u8>) -> bool {
        if generation != self.mode_generation || self.mode_kind() != Some(ModeKind::ImagesToPdf) {
            return false;
        }
        self.pending_artifact = Some(Arc::new(pdf));
        true
    }

    /// Leave every tool and restore the configured output settings.
    pub fn clear(&mut self) {
        self.mode = None;
        self.preview = None;
        self.images_to_pdf = None;
        self.pdf_to_images = None;
        self.pending_artifact = None;
        self.preset = self.default_preset;
        self.image_info = self.default_image_info.clone();
        self.mode_generation += 1;
    }

    // -- Image list -----------------------------------------------------------

    /// Append to the image list. Does nothing when no list exists.
    pub fn append_images(&mut self, sources: Vec<SourceRef>) {
        if let Some(list) = self.images_to_pdf.as_mut() {
            list.extend(sources);
        }
    }

    /// Remove one image. Out-of-range indices are ignored.
    pub fn remove_image_at(&mut self, index: usize) {
        match self.images_to_pdf.as_mut() {
            Some(list) if index < list.len() => {
                list.remove(index);
            }
            _ => {}
        }
    }

    pub fn reorder_images(&mut self, sources: Vec<SourceRef>) {
        self.images_to_pdf = Some(sources);
    }

    // -- Page selection -------------------------------------------------------

    /// Replace the page selection, dropping out-of-range and repeated
    /// indices. Ignored while no PDF is loaded for export.
    pub fn select_pages(&mut self, pages: Vec<usize>) {
        let Some(state) = self.pdf_to_images.as_mut() else {
            return;
        };
        let mut selected = Vec::with_capacity(pages.len());
        for page in pages {
            if page < state.page_count && !selected.contains(&page) {
                selected.push(page);
            }
        }
        state.pages = selected;
    }

    // -- Settings & jobs ------------------------------------------------------

    pub fn set_image_info(&mut self, info: ImageInfo) {
        self.image_info = info.normalized();
    }

    pub fn reset_progress(&mut self) {
        self.progress = Progress::default();
    }

    /// No unsaved artifact and output settings still at their configured
    /// defaults.
    pub fn can_discard_without_prompt(&self) -> bool {
        self.pending_artifact.is_none() && self.image_info == self.default_image_info
    }
}
