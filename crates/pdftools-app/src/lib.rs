// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdftools-app: The PDF tools coordinator and the services around it.
//
// `PdfToolsCoordinator` mediates the three PDF tools (preview, images → PDF,
// PDF → images), runs their batch jobs, and publishes `ToolSnapshot`s that a
// UI layer observes. `ToolServices` wires it to the document codec, the
// platform bridge, and filesystem persistence.

pub mod coordinator;
pub mod job;
pub mod logging;
pub mod services;
pub mod state;

pub use coordinator::PdfToolsCoordinator;
pub use job::CancellationToken;
pub use services::file_controller::FileController;
pub use services::tool_services::ToolServices;
pub use state::{ConversionMode, JobPhase, ModeKind, Progress, Stage, ToolSnapshot, ToolState};
