// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinator behaviour against in-memory collaborators.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use image::{DynamicImage, RgbImage};
use pdftools_core::types::ImageFormat;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::*;
use crate::state::Stage;

const WAIT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeCodec {
    page_count: usize,
    failing_pages: Vec<usize>,
    fail_assembly: bool,
    /// When set, every rasterisation and assembly waits for one message (or
    /// a hang-up).
    gate: Mutex<Option<std_mpsc::Receiver<()>>>,
    rasterized: Mutex<Vec<usize>>,
    assembled: Mutex<usize>,
    shared_bytes: Mutex<Vec<(Vec<u8>, String)>>,
    shared_refs: Mutex<Vec<SourceRef>>,
}

impl FakeCodec {
    fn with_pages(page_count: usize) -> Self {
        Self {
            page_count,
            ..Self::default()
        }
    }

    fn gated(mut self) -> (Self, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        self.gate = Mutex::new(Some(rx));
        (self, tx)
    }

    fn wait_at_gate(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            let _ = gate.recv();
        }
    }
}

impl ImageCodec for FakeCodec {
    fn page_count(&self, _source: &SourceRef) -> Result<usize> {
        Ok(self.page_count)
    }

    fn rasterize_page(&self, _source: &SourceRef, page_index: usize) -> Result<DynamicImage> {
        self.wait_at_gate();
        self.rasterized.lock().unwrap().push(page_index);
        if self.failing_pages.contains(&page_index) {
            return Err(PdfToolsError::PdfError(format!("page {page_index} is corrupt")));
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::new(10, 10)))
    }

    fn compress(&self, _image: &DynamicImage, info: &ImageInfo) -> Result<Vec<u8>> {
        Ok(vec![info.width as u8])
    }

    fn assemble(&self, sources: &[SourceRef], scale_up: bool) -> Result<Vec<u8>> {
        self.wait_at_gate();
        *self.assembled.lock().unwrap() += 1;
        if self.fail_assembly {
            return Err(PdfToolsError::ImageError("undecodable image".into()));
        }
        Ok(format!("%PDF {} {}", sources.len(), scale_up).into_bytes())
    }

    fn share_bytes(&self, bytes: &[u8], filename: &str) -> Result<()> {
        self.shared_bytes
            .lock()
            .unwrap()
            .push((bytes.to_vec(), filename.to_string()));
        Ok(())
    }

    fn share_by_reference(&self, source: &SourceRef) -> Result<()> {
        self.shared_refs.lock().unwrap().push(source.clone());
        Ok(())
    }
}

#[derive(Default)]
struct FakePersistence {
    /// Sequence number from which saves report missing permissions.
    deny_from: Option<usize>,
    saved: Mutex<Vec<SaveTarget>>,
}

impl Persistence for FakePersistence {
    fn save(&self, target: SaveTarget) -> SaveOutcome {
        let sequence = target.sequence_number;
        self.saved.lock().unwrap().push(target);
        match self.deny_from {
            Some(from) if sequence >= from => SaveOutcome::MissingPermissions,
            _ => SaveOutcome::Saved(format!("/exports/page_{sequence}.jpg")),
        }
    }

    fn current_save_path(&self) -> String {
        "/exports".into()
    }
}

/// `Write` sink whose buffer outlives it, so tests can inspect what was
/// written and whether the sink was dropped.
#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn coordinator(
    codec: &Arc<FakeCodec>,
    persistence: &Arc<FakePersistence>,
) -> PdfToolsCoordinator {
    coordinator_with(codec, persistence, ToolConfig::default())
}

fn coordinator_with(
    codec: &Arc<FakeCodec>,
    persistence: &Arc<FakePersistence>,
    config: ToolConfig,
) -> PdfToolsCoordinator {
    PdfToolsCoordinator::new(codec.clone(), persistence.clone(), config).unwrap()
}

fn src(s: &str) -> SourceRef {
    SourceRef::new(s)
}

async fn wait_for(
    coordinator: &PdfToolsCoordinator,
    predicate: impl FnMut(&ToolSnapshot) -> bool,
) -> ToolSnapshot {
    let mut rx = coordinator.subscribe();
    let snapshot = timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("coordinator dropped")
        .clone();
    snapshot
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

/// Open `pdf` for extraction and wait for its page list.
async fn open_pdf(coordinator: &PdfToolsCoordinator, pdf: &str) {
    coordinator.open_pdf_for_extraction(Some(src(pdf)));
    wait_for(coordinator, |s| s.pdf_to_images.is_some()).await;
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn switching_to_another_mode_clears_foreign_state() {
    let codec = Arc::new(FakeCodec::with_pages(2));
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    c.set_mode(ConversionMode::ImagesToPdf(Some(vec![src("a.jpg")])));
    open_pdf(&c, "doc.pdf").await;
    let s = c.snapshot();
    assert_eq!(s.stage(), Stage::ExtractingPages);
    assert!(s.images_to_pdf.is_none());
    assert!(s.preview.is_none());

    c.set_mode(ConversionMode::Preview(Some(src("doc.pdf"))));
    let s = c.snapshot();
    assert!(s.images_to_pdf.is_none());
    assert!(s.pdf_to_images.is_none());
    assert_eq!(s.preview, Some(src("doc.pdf")));
}

#[tokio::test]
async fn reentering_the_same_mode_keeps_its_payload() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    c.set_mode(ConversionMode::Preview(Some(src("first.pdf"))));
    c.set_mode(ConversionMode::Preview(Some(src("second.pdf"))));
    assert_eq!(
        c.snapshot().mode,
        Some(ConversionMode::Preview(Some(src("first.pdf"))))
    );
}

#[tokio::test]
async fn page_list_is_loaded_in_the_background() {
    let codec = Arc::new(FakeCodec::with_pages(4));
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    open_pdf(&c, "doc.pdf").await;
    let state = c.snapshot().pdf_to_images.unwrap();
    assert_eq!(state.pages, vec![0, 1, 2, 3]);

    c.update_pdf_to_images_selection(vec![2, 0, 2, 7]);
    assert_eq!(c.snapshot().pdf_to_images.unwrap().pages, vec![2, 0]);
}

#[tokio::test]
async fn page_count_after_clear_is_dropped() {
    let codec = Arc::new(FakeCodec::with_pages(4));
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    c.open_pdf_for_extraction(Some(src("doc.pdf")));
    c.clear_mode();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(c.snapshot().pdf_to_images.is_none());
    assert_eq!(c.snapshot().stage(), Stage::Idle);
}

// ---------------------------------------------------------------------------
// Image list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_list_edits() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    c.set_images_to_pdf(Some(vec![src("a"), src("b")]));
    c.append_image_sources(vec![src("c")]);
    c.remove_image_source_at(10);
    assert_eq!(c.snapshot().images_to_pdf, Some(vec![src("a"), src("b"), src("c")]));

    c.remove_image_source_at(1);
    c.reorder_image_sources(vec![src("c"), src("a")]);
    assert_eq!(c.snapshot().images_to_pdf, Some(vec![src("c"), src("a")]));
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn extraction_reports_progress_and_save_path() {
    let (codec, release) = FakeCodec::with_pages(3).gated();
    let codec = Arc::new(codec);
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "report.pdf").await;
    c.select_preset(Preset::Numeric(50));

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });

    let started = wait_for(&c, |s| s.busy && s.progress.total == 3).await;
    assert_eq!(started.progress.done, 0);
    assert_eq!(started.job, Some(JobPhase::Running));

    drop(release);
    assert_eq!(recv(&mut rx).await, "/exports");

    let s = c.snapshot();
    assert_eq!((s.progress.done, s.progress.total), (3, 3));
    assert!(s.progress.is_complete());
    assert!(!s.busy);
    assert_eq!(s.job, Some(JobPhase::Completed));

    let saved = persistence.saved.lock().unwrap();
    let sequences: Vec<usize> = saved.iter().map(|t| t.sequence_number).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    // Preset 50% of the 10px page.
    assert!(saved.iter().all(|t| t.image_info.width == 5 && t.data == vec![5]));
    assert!(saved.iter().all(|t| t.original == src("report.pdf")));
}

#[tokio::test]
async fn failing_page_is_skipped_but_counted() {
    let codec = Arc::new(FakeCodec {
        page_count: 3,
        failing_pages: vec![1],
        ..FakeCodec::default()
    });
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "doc.pdf").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });

    assert_eq!(recv(&mut rx).await, "/exports");
    assert_eq!(c.snapshot().progress.done, 3);
    let sequences: Vec<usize> = persistence
        .saved
        .lock()
        .unwrap()
        .iter()
        .map(|t| t.sequence_number)
        .collect();
    // The page after the failure still uses done + 1.
    assert_eq!(sequences, vec![1, 3]);
}

#[tokio::test]
async fn missing_permissions_stop_extraction_with_empty_path() {
    let codec = Arc::new(FakeCodec::with_pages(5));
    let persistence = Arc::new(FakePersistence {
        deny_from: Some(2),
        ..FakePersistence::default()
    });
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "doc.pdf").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });

    assert_eq!(recv(&mut rx).await, "");
    tokio::time::sleep(Duration::from_millis(100)).await;
    // The sender was consumed by the single callback.
    assert!(rx.recv().await.is_none());

    assert_eq!(*codec.rasterized.lock().unwrap(), vec![0, 1]);
    assert_eq!(persistence.saved.lock().unwrap().len(), 2);
    let s = c.snapshot();
    assert!(!s.busy);
    assert_eq!(s.job, Some(JobPhase::Cancelled));
    assert_eq!(s.progress.done, 1);
}

#[tokio::test]
async fn extraction_without_a_pdf_reports_empty_path() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });
    assert_eq!(recv(&mut rx).await, "");
    assert!(matches!(c.snapshot().job, Some(JobPhase::Failed(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_job_cancels_running_extraction() {
    let (codec, release) = FakeCodec::with_pages(3).gated();
    let codec = Arc::new(codec);
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "doc.pdf").await;

    let (extract_tx, mut extract_rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = extract_tx.send(path);
    });
    wait_for(&c, |s| s.busy && s.progress.total == 3).await;

    let (save_tx, mut save_rx) = mpsc::unbounded_channel();
    c.save_artifact_to(None, move |err| {
        let _ = save_tx.send(err.is_none());
    });
    assert!(recv(&mut save_rx).await);

    drop(release);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(extract_rx.try_recv().is_err());
    // The page in flight finished; nothing after it started.
    assert!(codec.rasterized.lock().unwrap().len() <= 1);
    assert!(!c.snapshot().busy);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_saving_stops_the_job_silently() {
    let (codec, release) = FakeCodec::with_pages(2).gated();
    let codec = Arc::new(codec);
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "doc.pdf").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });
    wait_for(&c, |s| s.busy).await;

    c.cancel_saving();
    let s = c.snapshot();
    assert!(!s.busy);
    assert_eq!(s.job, Some(JobPhase::Cancelled));
    assert!(!c.has_running_job());

    drop(release);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Assembly, save, share
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assembly_stores_pending_artifact() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    c.set_images_to_pdf(Some(vec![src("a"), src("b")]));
    c.toggle_scale_small_images_to_large();

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.assemble_from_images(move |result| {
        let _ = tx.send(result.is_ok());
    });
    assert!(recv(&mut rx).await);

    let s = wait_for(&c, |s| !s.busy).await;
    assert_eq!(s.pending_artifact.as_deref(), Some(&b"%PDF 2 true".to_vec()));
    assert!(!c.can_discard_without_prompt());
}

#[tokio::test]
async fn failed_assembly_leaves_no_artifact() {
    let codec = Arc::new(FakeCodec {
        fail_assembly: true,
        ..FakeCodec::default()
    });
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    c.set_images_to_pdf(Some(vec![src("a")]));

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.assemble_from_images(move |result| {
        let _ = tx.send(result);
    });
    assert!(matches!(recv(&mut rx).await, Err(PdfToolsError::ImageError(_))));

    let s = c.snapshot();
    assert!(s.pending_artifact.is_none());
    assert!(!s.busy);
    assert!(matches!(s.job, Some(JobPhase::Failed(_))));
}

#[tokio::test]
async fn save_writes_artifact_and_releases_sink() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    c.set_images_to_pdf(Some(vec![src("a")]));

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.assemble_from_images(move |result| {
        let _ = tx.send(result.is_ok());
    });
    assert!(recv(&mut rx).await);
    wait_for(&c, |s| !s.busy).await;

    let sink = SharedSink::default();
    let buffer = Arc::clone(&sink.0);
    let (tx, mut rx) = mpsc::unbounded_channel();
    c.save_artifact_to(Some(Box::new(sink)), move |err| {
        let _ = tx.send(err);
    });
    assert!(recv(&mut rx).await.is_none());

    assert_eq!(*buffer.lock().unwrap(), b"%PDF 1 false".to_vec());
    assert_eq!(Arc::strong_count(&buffer), 1, "sink was not dropped");
    assert!(!c.snapshot().busy);
}

#[tokio::test]
async fn save_without_sink_or_artifact() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.save_artifact_to(None, move |err| {
        let _ = tx.send(err);
    });
    assert!(recv(&mut rx).await.is_none());
    assert!(!c.snapshot().busy);

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.save_artifact_to(Some(Box::new(SharedSink::default())), move |err| {
        let _ = tx.send(err);
    });
    assert!(matches!(recv(&mut rx).await, Some(PdfToolsError::NothingToSave)));
}

#[tokio::test]
async fn share_dispatches_by_mode() {
    let codec = Arc::new(FakeCodec::with_pages(1));
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    // No tool: nothing happens.
    c.share(|_| panic!("no callback without a mode")).unwrap();

    c.set_preview(Some(src("doc.pdf")));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sender = tx.clone();
    c.share(move |r| {
        let _ = sender.send(r.is_ok());
    })
    .unwrap();
    assert!(recv(&mut rx).await);
    assert_eq!(*codec.shared_refs.lock().unwrap(), vec![src("doc.pdf")]);

    c.set_images_to_pdf(Some(vec![src("a"), src("b")]));
    c.share(move |r| {
        let _ = tx.send(r.is_ok());
    })
    .unwrap();
    assert!(recv(&mut rx).await);
    let shared = codec.shared_bytes.lock().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].0, b"%PDF 2 false".to_vec());
    assert!(shared[0].1.starts_with("PDF_") && shared[0].1.ends_with(".pdf"));
    assert_eq!(*codec.assembled.lock().unwrap(), 1);
}

#[tokio::test]
async fn sharing_extracted_pages_is_unsupported() {
    let codec = Arc::new(FakeCodec::with_pages(1));
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    c.open_pdf_for_extraction(Some(src("doc.pdf")));

    let result = c.share(|_| panic!("unsupported share must not call back"));
    assert!(matches!(result, Err(PdfToolsError::Unsupported(_))));
}

// ---------------------------------------------------------------------------
// Settings & guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discard_guard_follows_settings_and_clear() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    assert!(c.can_discard_without_prompt());

    c.update_image_info(ImageInfo {
        quality: 250.0,
        ..ImageInfo::default()
    });
    // Clamped back into the JPEG range, so still the default.
    assert_eq!(c.snapshot().image_info.quality, 100.0);
    assert!(c.can_discard_without_prompt());

    c.update_image_info(ImageInfo {
        rotation_degrees: 90.0,
        ..ImageInfo::default()
    });
    c.select_preset(Preset::Telegram);
    assert!(!c.can_discard_without_prompt());

    c.clear_mode();
    assert!(c.can_discard_without_prompt());
    assert_eq!(c.snapshot().preset, Preset::Numeric(100));
}

#[tokio::test]
async fn generated_filename_has_prefix_and_timestamp() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);

    let name = c.generate_pdf_filename();
    // PDF_yyyy-MM-dd_HH-mm-ss.pdf
    assert_eq!(name.len(), "PDF_".len() + 19 + ".pdf".len(), "{name}");
    assert!(name.starts_with("PDF_") && name.ends_with(".pdf"));
    assert_eq!(&name[8..9], "-");
    assert_eq!(&name[14..15], "_");
}

#[tokio::test]
async fn configured_defaults_drive_guard_and_clear() {
    let codec = Arc::new(FakeCodec::default());
    let persistence = Arc::new(FakePersistence::default());
    let config = ToolConfig {
        default_preset: Preset::Telegram,
        default_image_info: ImageInfo {
            image_format: ImageFormat::Png,
            quality: 9.0,
            ..ImageInfo::default()
        },
        ..ToolConfig::default()
    };
    let c = coordinator_with(&codec, &persistence, config);
    assert!(c.can_discard_without_prompt());

    c.select_preset(Preset::Numeric(40));
    c.update_image_info(ImageInfo::default());
    assert!(!c.can_discard_without_prompt());

    c.clear_mode();
    let s = c.snapshot();
    assert_eq!(s.preset, Preset::Telegram);
    assert_eq!(s.image_info.image_format, ImageFormat::Png);
    assert!(c.can_discard_without_prompt());
}

// ---------------------------------------------------------------------------
// Late results & shutdown
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn assembly_finishing_after_a_mode_change_is_dropped() {
    let (codec, release) = FakeCodec::default().gated();
    let codec = Arc::new(codec);
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    c.set_images_to_pdf(Some(vec![src("a.jpg")]));

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.assemble_from_images(move |result| {
        let _ = tx.send(result.is_ok());
    });
    wait_for(&c, |s| s.busy).await;

    c.set_mode(ConversionMode::Preview(Some(src("doc.pdf"))));
    drop(release);

    let s = wait_for(&c, |s| !s.busy).await;
    assert_eq!(*codec.assembled.lock().unwrap(), 1);
    assert!(s.pending_artifact.is_none());
    assert_eq!(s.job, Some(JobPhase::Cancelled));
    assert!(c.can_discard_without_prompt());
    // The sender was dropped with the unused callback.
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.save_artifact_to(Some(Box::new(SharedSink::default())), move |err| {
        let _ = tx.send(err);
    });
    assert!(matches!(recv(&mut rx).await, Some(PdfToolsError::NothingToSave)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_waits_for_the_cancelled_job() {
    let (codec, release) = FakeCodec::with_pages(3).gated();
    let codec = Arc::new(codec);
    let persistence = Arc::new(FakePersistence::default());
    let c = coordinator(&codec, &persistence);
    open_pdf(&c, "doc.pdf").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    c.extract_to_images(move |path| {
        let _ = tx.send(path);
    });
    wait_for(&c, |s| s.busy).await;

    drop(release);
    timeout(WAIT, c.shutdown()).await.expect("shutdown hung");

    assert!(!c.has_running_job());
    let s = c.snapshot();
    assert!(!s.busy);
    assert_eq!(s.job, Some(JobPhase::Cancelled));
    // The task has exited, so no further page can start.
    let rasterized = codec.rasterized.lock().unwrap().len();
    assert!(rasterized <= 1);
    assert!(rx.recv().await.is_none());
}
