// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch job plumbing: cooperative cancellation and the single job slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pdftools_core::types::JobId;
use tokio::task::JoinHandle;

/// Shared flag a running job polls between units of work.
///
/// Cancelling never interrupts a collaborator call already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The one in-flight batch job.
#[derive(Debug)]
pub struct JobSlot {
    pub id: JobId,
    pub token: CancellationToken,
    pub handle: Option<JoinHandle<()>>,
}

impl JobSlot {
    pub fn new(id: JobId, token: CancellationToken) -> Self {
        Self {
            id,
            token,
            handle: None,
        }
    }

    /// Signal cancellation and hand back the task handle. The task observes
    /// the token at its next check; it is never aborted, so a page being
    /// written finishes.
    pub fn cancel(self) -> Option<JoinHandle<()>> {
        self.token.cancel();
        self.handle
    }
}
