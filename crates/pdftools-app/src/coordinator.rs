// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF tools coordinator: owns the tool state, runs at most one batch job at
// a time, and publishes snapshots for the UI.
//
// Collaborator calls are blocking and run on `spawn_blocking`. The state
// mutex is never held across an `.await` or while a completion callback runs.
// A job only touches shared state while its cancellation token is still
// clear, so a superseded job can never overwrite the state of its successor.
// Results that belong to a tool session are checked against the mode
// generation they were started under.

use std::io::Write;
use std::sync::{Arc, Mutex};

use pdftools_core::codec::{ImageCodec, Persistence, SaveOutcome, SaveTarget};
use pdftools_core::config::ToolConfig;
use pdftools_core::error::{PdfToolsError, Result};
use pdftools_core::types::{ImageInfo, JobId, Preset, SourceRef};
use pdftools_document::ImageProcessor;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::job::{CancellationToken, JobSlot};
use crate::state::{ConversionMode, JobPhase, ModeKind, PdfToImagesState, ToolSnapshot, ToolState};

/// Shared internals; the coordinator itself is a cheap `Arc` handle.
struct Inner {
    codec: Arc<dyn ImageCodec>,
    persistence: Arc<dyn Persistence>,
    config: ToolConfig,
    runtime: Handle,
    state: Mutex<ToolState>,
    job: Mutex<Option<JobSlot>>,
    snapshots: watch::Sender<ToolSnapshot>,
}

/// Entry point for the PDF tools: preview, images → PDF, PDF → images.
///
/// Cloning yields another handle onto the same coordinator.
#[derive(Clone)]
pub struct PdfToolsCoordinator {
    inner: Arc<Inner>,
}

/// Result of processing one page of an extraction.
enum PageOutcome {
    Saved(String),
    MissingPermissions,
    Skipped(String),
}

/// What a share request resolves to once the mode is inspected.
enum ShareRequest {
    Bytes {
        pending: Option<Arc<Vec<u8>>>,
        sources: Vec<SourceRef>,
        scale_up: bool,
        filename: String,
    },
    Reference(SourceRef),
}

impl PdfToolsCoordinator {
    /// Build a coordinator on the current tokio runtime.
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        persistence: Arc<dyn Persistence>,
        config: ToolConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| PdfToolsError::JobFailed(format!("no tokio runtime available: {e}")))?;
        Ok(Self::with_runtime(codec, persistence, config, runtime))
    }

    /// Build a coordinator that spawns its jobs on `runtime`.
    pub fn with_runtime(
        codec: Arc<dyn ImageCodec>,
        persistence: Arc<dyn Persistence>,
        config: ToolConfig,
        runtime: Handle,
    ) -> Self {
        let initial = ToolState::with_defaults(
            config.default_preset,
            config.default_image_info.clone(),
            config.scale_small_images_to_large,
        );
        let (snapshots, _) = watch::channel(initial.clone());
        Self {
            inner: Arc::new(Inner {
                codec,
                persistence,
                config,
                runtime,
                state: Mutex::new(initial),
                job: Mutex::new(None),
                snapshots,
            }),
        }
    }

    // -- Observation ----------------------------------------------------------

    /// Receiver that sees every published state change.
    pub fn subscribe(&self) -> watch::Receiver<ToolSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ToolSnapshot {
        self.inner.state.lock().expect("state lock poisoned").clone()
    }

    // -- Mode switching -------------------------------------------------------

    /// Activate a tool. Re-activating the tool that is already active keeps
    /// the payload it was first opened with.
    pub fn set_mode(&self, mode: ConversionMode) {
        match mode {
            ConversionMode::Preview(source) => self.set_preview(source),
            ConversionMode::ImagesToPdf(sources) => self.set_images_to_pdf(sources),
            ConversionMode::PdfToImages(source) => self.open_pdf_for_extraction(source),
        }
    }

    pub fn set_preview(&self, source: Option<SourceRef>) {
        info!(source = ?source, "preview mode");
        self.update(|s| s.apply_preview(source));
    }

    pub fn set_images_to_pdf(&self, sources: Option<Vec<SourceRef>>) {
        info!(count = ?sources.as_ref().map(Vec::len), "images-to-PDF mode");
        self.update(|s| s.apply_images_to_pdf(sources));
    }

    /// Enter page export and look up the page count in the background.
    ///
    /// Returns immediately. The lookup result is dropped if another mode
    /// change happened in the meantime.
    pub fn open_pdf_for_extraction(&self, source: Option<SourceRef>) {
        info!(source = ?source, "PDF-to-images mode");
        let generation = self.update(|s| s.begin_pdf_to_images(source.clone()));
        let Some(source) = source else {
            return;
        };

        let this = self.clone();
        self.inner.runtime.spawn(async move {
            let codec = Arc::clone(&this.inner.codec);
            let lookup = source.clone();
            let counted = tokio::task::spawn_blocking(move || codec.page_count(&lookup)).await;
            match counted {
                Ok(Ok(page_count)) => {
                    let applied =
                        this.update(|s| s.finish_page_lookup(generation, source, page_count));
                    if applied {
                        debug!(page_count, "page list ready");
                    } else {
                        debug!("page count arrived after a mode change; dropped");
                    }
                }
                Ok(Err(e)) => warn!(error = %e, %source, "page count lookup failed"),
                Err(e) => warn!(error = %e, "page count task did not finish"),
            }
        });
    }

    /// Leave every tool and restore the default output settings.
    pub fn clear_mode(&self) {
        info!("PDF tools cleared");
        self.update(ToolState::clear);
    }

    // -- Image list -----------------------------------------------------------

    pub fn append_image_sources(&self, sources: Vec<SourceRef>) {
        self.update(|s| s.append_images(sources));
    }

    /// Out-of-range indices are ignored.
    pub fn remove_image_source_at(&self, index: usize) {
        self.update(|s| s.remove_image_at(index));
    }

    /// Replace the list; callers pass a permutation of the current one.
    pub fn reorder_image_sources(&self, sources: Vec<SourceRef>) {
        self.update(|s| s.reorder_images(sources));
    }

    // -- Settings -------------------------------------------------------------

    pub fn toggle_scale_small_images_to_large(&self) {
        self.update(|s| s.scale_small_images_to_large = !s.scale_small_images_to_large);
    }

    pub fn select_preset(&self, preset: Preset) {
        self.update(|s| s.preset = preset);
    }

    /// Quality is coerced into the format's range.
    pub fn update_image_info(&self, info: ImageInfo) {
        self.update(|s| s.set_image_info(info));
    }

    pub fn update_pdf_to_images_selection(&self, pages: Vec<usize>) {
        self.update(|s| s.select_pages(pages));
    }

    /// Whether leaving the screen would lose nothing.
    pub fn can_discard_without_prompt(&self) -> bool {
        self.snapshot().can_discard_without_prompt()
    }

    /// `"{prefix}_{yyyy-MM-dd_HH-mm-ss}.pdf"` in local time.
    pub fn generate_pdf_filename(&self) -> String {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        format!("{}_{}.pdf", self.inner.config.pdf_filename_prefix, stamp)
    }

    // -- Jobs -----------------------------------------------------------------

    /// Cancel the in-flight job, if any, and clear the busy flag.
    pub fn cancel_saving(&self) {
        let previous = self.inner.job.lock().expect("job lock poisoned").take();
        let had_job = previous.is_some();
        if let Some(slot) = previous {
            info!(job_id = %slot.id, "job cancelled");
            slot.cancel();
        }
        self.update(|s| {
            s.busy = false;
            if had_job && s.job == Some(JobPhase::Running) {
                s.job = Some(JobPhase::Cancelled);
            }
        });
    }

    /// Cancel the in-flight job and wait for its task to finish.
    ///
    /// A collaborator call already running completes first; nothing it
    /// produces reaches the state.
    pub async fn shutdown(&self) {
        let previous = self.inner.job.lock().expect("job lock poisoned").take();
        let Some(slot) = previous else {
            return;
        };
        info!(job_id = %slot.id, "shutting down running job");
        let handle = slot.cancel();
        self.update(|s| {
            s.busy = false;
            if s.job == Some(JobPhase::Running) {
                s.job = Some(JobPhase::Cancelled);
            }
        });
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "job task did not finish cleanly");
            }
        }
    }

    /// Export every selected page as an image.
    ///
    /// Pages are rasterised, shaped by the selected preset, encoded and
    /// persisted one after another. A page that fails is logged and skipped.
    /// If storage reports missing permissions the job stops and
    /// `on_complete` receives an empty path; otherwise it receives the save
    /// location once every page is done. A cancelled job never calls back.
    pub fn extract_to_images<F>(&self, on_complete: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let (id, token) = self.start_job();
        let (request, preset, info) = self.update(|s| {
            s.reset_progress();
            s.busy = false;
            s.job = Some(JobPhase::Running);
            (s.pdf_to_images.clone(), s.preset, s.image_info.clone())
        });

        let this = self.clone();
        let handle = self.inner.runtime.spawn(async move {
            this.run_extraction(&token, request, preset, info, on_complete)
                .await;
            this.finish_job(id);
        });
        self.attach_handle(id, handle);
    }

    async fn run_extraction<F>(
        &self,
        token: &CancellationToken,
        request: Option<PdfToImagesState>,
        preset: Preset,
        info: ImageInfo,
        on_complete: F,
    ) where
        F: FnOnce(String) + Send + 'static,
    {
        let Some(request) = request else {
            warn!("extraction requested without a loaded PDF");
            if self
                .update_if_live(token, |s| {
                    s.busy = false;
                    s.job = Some(JobPhase::Failed("no PDF loaded".into()));
                })
                .is_some()
            {
                on_complete(String::new());
            }
            return;
        };

        let total = request.pages.len();
        info!(source = %request.source, total, "extracting pages");
        if self
            .update_if_live(token, |s| {
                s.progress.total = total;
                s.busy = true;
            })
            .is_none()
        {
            return;
        }

        for (done, &page) in request.pages.iter().enumerate() {
            if token.is_cancelled() {
                debug!(done, "extraction stopped by cancellation");
                return;
            }

            let outcome = self
                .process_page(&request.source, page, preset, &info, done + 1)
                .await;
            match outcome {
                PageOutcome::Saved(path) => debug!(page, path = %path, "page saved"),
                PageOutcome::MissingPermissions => {
                    warn!(page, "storage permission missing; stopping extraction");
                    let live = self.update_if_live(token, |s| {
                        s.busy = false;
                        s.job = Some(JobPhase::Cancelled);
                    });
                    token.cancel();
                    if live.is_some() {
                        on_complete(String::new());
                    }
                    return;
                }
                PageOutcome::Skipped(reason) => warn!(page, reason = %reason, "page skipped"),
            }

            if self.update_if_live(token, |s| s.progress.done += 1).is_none() {
                return;
            }
        }

        let persistence = Arc::clone(&self.inner.persistence);
        let path = tokio::task::spawn_blocking(move || persistence.current_save_path())
            .await
            .unwrap_or_default();

        let finished = self.update_if_live(token, |s| {
            s.busy = false;
            s.job = Some(JobPhase::Completed);
        });
        if finished.is_some() {
            info!(total, path = %path, "extraction complete");
            on_complete(path);
        }
    }

    /// Rasterise, shape, encode and persist one page.
    async fn process_page(
        &self,
        source: &SourceRef,
        page: usize,
        preset: Preset,
        info: &ImageInfo,
        sequence_number: usize,
    ) -> PageOutcome {
        let codec = Arc::clone(&self.inner.codec);
        let persistence = Arc::clone(&self.inner.persistence);
        let source = source.clone();
        let info = info.clone();

        let work = tokio::task::spawn_blocking(move || -> Result<SaveOutcome> {
            let image = codec.rasterize_page(&source, page)?;
            let image_info = ImageProcessor::apply_preset(&image, preset, &info);
            let data = codec.compress(&image, &image_info)?;
            Ok(persistence.save(SaveTarget {
                image_info,
                original: source,
                sequence_number,
                data,
            }))
        })
        .await;

        match work {
            Ok(Ok(SaveOutcome::Saved(path))) => PageOutcome::Saved(path),
            Ok(Ok(SaveOutcome::MissingPermissions)) => PageOutcome::MissingPermissions,
            Ok(Ok(SaveOutcome::Failed(reason))) => PageOutcome::Skipped(reason),
            Ok(Err(e)) => PageOutcome::Skipped(e.to_string()),
            Err(e) => PageOutcome::Skipped(format!("page task did not finish: {e}")),
        }
    }

    /// Assemble the image list into a PDF held as the pending artifact.
    ///
    /// On failure no artifact remains and `on_complete` receives the error.
    /// If the tool changes before assembly finishes, the PDF is dropped and
    /// `on_complete` is not called.
    pub fn assemble_from_images<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let (id, token) = self.start_job();
        let (sources, scale_up, generation) = self.update(|s| {
            s.busy = true;
            s.job = Some(JobPhase::Running);
            s.pending_artifact = None;
            (
                s.images_to_pdf.clone().unwrap_or_default(),
                s.scale_small_images_to_large,
                s.mode_generation(),
            )
        });

        let this = self.clone();
        let handle = self.inner.runtime.spawn(async move {
            info!(count = sources.len(), scale_up, "assembling PDF");
            let codec = Arc::clone(&this.inner.codec);
            let assembled = tokio::task::spawn_blocking(move || codec.assemble(&sources, scale_up))
                .await
                .unwrap_or_else(|e| Err(PdfToolsError::JobFailed(e.to_string())));

            match assembled {
                Ok(bytes) => {
                    let size = bytes.len();
                    let stored = this.update_if_live(&token, |s| {
                        let stored = s.store_artifact(generation, bytes);
                        if !stored {
                            s.busy = false;
                            s.job = Some(JobPhase::Cancelled);
                        }
                        stored
                    });
                    match stored {
                        Some(true) => {
                            info!(bytes = size, "PDF ready");
                            on_complete(Ok(()));
                            this.update_if_live(&token, |s| {
                                s.busy = false;
                                s.job = Some(JobPhase::Completed);
                            });
                        }
                        Some(false) => debug!(bytes = size, "tool changed during assembly; PDF dropped"),
                        None => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "PDF assembly failed");
                    let failed = this.update_if_live(&token, |s| {
                        s.busy = false;
                        s.job = Some(JobPhase::Failed(e.to_string()));
                    });
                    if failed.is_some() {
                        on_complete(Err(e));
                    }
                }
            }
            this.finish_job(id);
        });
        self.attach_handle(id, handle);
    }

    /// Write the pending artifact into `sink`.
    ///
    /// The sink is dropped on every path. Without a sink nothing is written
    /// and the callback receives `None`; with a sink but no artifact it
    /// receives [`PdfToolsError::NothingToSave`].
    pub fn save_artifact_to<F>(&self, sink: Option<Box<dyn Write + Send>>, on_complete: F)
    where
        F: FnOnce(Option<PdfToolsError>) + Send + 'static,
    {
        let (id, token) = self.start_job();
        let artifact = self.update(|s| {
            s.busy = true;
            s.job = Some(JobPhase::Running);
            s.pending_artifact.clone()
        });

        let this = self.clone();
        let handle = self.inner.runtime.spawn(async move {
            let writer_token = token.clone();
            let written =
                tokio::task::spawn_blocking(move || write_artifact(sink, artifact, &writer_token))
                    .await
                    .unwrap_or_else(|e| Err(PdfToolsError::JobFailed(e.to_string())));
            let error = written.err();

            if let Some(e) = &error {
                error!(error = %e, "saving PDF failed");
            }
            let finished = this.update_if_live(&token, |s| {
                s.busy = false;
                s.job = Some(match &error {
                    Some(e) => JobPhase::Failed(e.to_string()),
                    None => JobPhase::Completed,
                });
            });
            if finished.is_some() {
                on_complete(error);
            }
            this.finish_job(id);
        });
        self.attach_handle(id, handle);
    }

    /// Share the current tool's output.
    ///
    /// Images → PDF shares the pending artifact (assembling it first if
    /// needed) under a generated filename; preview shares the opened PDF by
    /// reference. Page export has no shareable output and fails with
    /// [`PdfToolsError::Unsupported`]. With no tool active this does nothing.
    pub fn share<F>(&self, on_complete: F) -> Result<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let state = self.snapshot();
        let request = match state.mode {
            None => return Ok(()),
            Some(ConversionMode::PdfToImages(_)) => {
                return Err(PdfToolsError::Unsupported(
                    "sharing extracted pages is not supported".into(),
                ));
            }
            Some(ConversionMode::Preview(None)) => {
                debug!("preview has no source to share");
                return Ok(());
            }
            Some(ConversionMode::Preview(Some(source))) => ShareRequest::Reference(source),
            Some(ConversionMode::ImagesToPdf(_)) => ShareRequest::Bytes {
                pending: state.pending_artifact.clone(),
                sources: state.images_to_pdf.clone().unwrap_or_default(),
                scale_up: state.scale_small_images_to_large,
                filename: self.generate_pdf_filename(),
            },
        };

        let (id, token) = self.start_job();
        self.update(|s| {
            s.busy = true;
            s.job = Some(JobPhase::Running);
        });

        let this = self.clone();
        let handle = self.inner.runtime.spawn(async move {
            let codec = Arc::clone(&this.inner.codec);
            let shared = tokio::task::spawn_blocking(move || match request {
                ShareRequest::Bytes {
                    pending,
                    sources,
                    scale_up,
                    filename,
                } => {
                    let bytes = match pending {
                        Some(bytes) => bytes,
                        None => Arc::new(codec.assemble(&sources, scale_up)?),
                    };
                    codec.share_bytes(&bytes, &filename)
                }
                ShareRequest::Reference(source) => codec.share_by_reference(&source),
            })
            .await
            .unwrap_or_else(|e| Err(PdfToolsError::JobFailed(e.to_string())));

            if let Err(e) = &shared {
                warn!(error = %e, "share failed");
            }
            let finished = this.update_if_live(&token, |s| {
                s.busy = false;
                s.job = Some(match &shared {
                    Ok(()) => JobPhase::Completed,
                    Err(e) => JobPhase::Failed(e.to_string()),
                });
            });
            if finished.is_some() {
                on_complete(shared);
            }
            this.finish_job(id);
        });
        self.attach_handle(id, handle);
        Ok(())
    }

    // -- Internals ------------------------------------------------------------

    /// Apply `f` to the state and publish the result.
    fn update<R>(&self, f: impl FnOnce(&mut ToolState) -> R) -> R {
        let mut state = self.inner.state.lock().expect("state lock poisoned");
        let result = f(&mut state);
        self.inner.snapshots.send_replace(state.clone());
        result
    }

    /// Like [`Self::update`], but only while `token` has not been cancelled.
    fn update_if_live<R>(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut ToolState) -> R,
    ) -> Option<R> {
        let mut state = self.inner.state.lock().expect("state lock poisoned");
        if token.is_cancelled() {
            return None;
        }
        let result = f(&mut state);
        self.inner.snapshots.send_replace(state.clone());
        Some(result)
    }

    /// Cancel whatever is running and claim the job slot.
    fn start_job(&self) -> (JobId, CancellationToken) {
        let mut slot = self.inner.job.lock().expect("job lock poisoned");
        if let Some(previous) = slot.take() {
            info!(job_id = %previous.id, "superseding running job");
            previous.cancel();
        }
        let id = JobId::new();
        let token = CancellationToken::new();
        *slot = Some(JobSlot::new(id, token.clone()));
        debug!(job_id = %id, "job started");
        (id, token)
    }

    fn attach_handle(&self, id: JobId, handle: tokio::task::JoinHandle<()>) {
        let mut slot = self.inner.job.lock().expect("job lock poisoned");
        if let Some(current) = slot.as_mut().filter(|s| s.id == id) {
            current.handle = Some(handle);
        }
    }

    /// Release the slot if `id` still owns it.
    fn finish_job(&self, id: JobId) {
        let mut slot = self.inner.job.lock().expect("job lock poisoned");
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
        }
    }

    /// Whether a batch job currently owns the slot.
    pub fn has_running_job(&self) -> bool {
        self.inner.job.lock().expect("job lock poisoned").is_some()
    }

    /// Kind of the active tool.
    pub fn mode_kind(&self) -> Option<ModeKind> {
        self.snapshot().mode_kind()
    }
}

/// Write `artifact` into `sink`, which is consumed and dropped here.
fn write_artifact(
    sink: Option<Box<dyn Write + Send>>,
    artifact: Option<Arc<Vec<u8>>>,
    token: &CancellationToken,
) -> Result<()> {
    let Some(mut sink) = sink else {
        debug!("no sink supplied; nothing written");
        return Ok(());
    };
    if token.is_cancelled() {
        return Ok(());
    }
    let artifact = artifact.ok_or(PdfToolsError::NothingToSave)?;
    sink.write_all(&artifact)?;
    sink.flush()?;
    debug!(bytes = artifact.len(), "artifact written");
    Ok(())
}

#[cfg(test)]
mod tests;
