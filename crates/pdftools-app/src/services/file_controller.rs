// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filesystem persistence for extracted pages.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pdftools_core::codec::{Persistence, SaveOutcome, SaveTarget};
use tracing::{debug, warn};

/// Writes finished artifacts into one directory.
///
/// Files are named `{source}_{timestamp}_{sequence}.{ext}`, so pages from
/// repeated exports of the same PDF never overwrite each other.
#[derive(Debug, Clone)]
pub struct FileController {
    save_dir: PathBuf,
}

impl FileController {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    fn file_name(target: &SaveTarget) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!(
            "{}_{}_{}.{}",
            target.original.file_stem(),
            stamp,
            target.sequence_number,
            target.image_info.image_format.extension()
        )
    }
}

impl Persistence for FileController {
    fn save(&self, target: SaveTarget) -> SaveOutcome {
        let path = self.save_dir.join(Self::file_name(&target));
        let written = std::fs::create_dir_all(&self.save_dir)
            .and_then(|()| std::fs::write(&path, &target.data));

        match written {
            Ok(()) => {
                debug!(path = %path.display(), bytes = target.data.len(), "artifact saved");
                SaveOutcome::Saved(path.to_string_lossy().into_owned())
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(path = %path.display(), "no permission to write artifact");
                SaveOutcome::MissingPermissions
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write artifact");
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    fn current_save_path(&self) -> String {
        self.save_dir.to_string_lossy().into_owned()
    }
}
