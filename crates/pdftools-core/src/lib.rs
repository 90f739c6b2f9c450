// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF tools: Core types, error definitions, and collaborator contracts
// shared across all crates.

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use codec::{ImageCodec, Persistence, SaveOutcome, SaveTarget};
pub use config::ToolConfig;
pub use error::PdfToolsError;
pub use types::*;
