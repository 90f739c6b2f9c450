// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: builds the coordinator with the platform codec and
// filesystem persistence, and owns the persisted configuration.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pdftools_bridge::PlatformBridge;
use pdftools_core::ToolConfig;
use pdftools_core::error::Result;
use pdftools_document::DocumentCodec;
use tracing::{info, warn};

use super::data_dir;
use super::file_controller::FileController;
use crate::coordinator::PdfToolsCoordinator;

const CONFIG_FILE: &str = "config.json";

/// Default directory name for exported pages.
const EXPORTS_DIR: &str = "exports";

/// Everything the UI layer needs, cheaply cloneable.
#[derive(Clone)]
pub struct ToolServices {
    coordinator: PdfToolsCoordinator,
    data_dir: PathBuf,
    config: Arc<Mutex<ToolConfig>>,
}

impl ToolServices {
    /// Initialise in the platform data directory. Call once at app startup,
    /// from inside a tokio runtime.
    pub fn init() -> Result<Self> {
        Self::open(data_dir::data_dir())
    }

    /// Initialise with `data_dir` as the root for config and exports.
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising PDF tools services");

        let config = match load_config(&data_dir) {
            Some(config) => config,
            None => {
                info!("no stored config; using defaults");
                ToolConfig::default()
            }
        };

        let save_dir = config
            .save_dir
            .clone()
            .unwrap_or_else(|| data_dir::data_subdir(&data_dir, EXPORTS_DIR));
        let bridge: Arc<dyn PlatformBridge> = Arc::from(pdftools_bridge::platform_bridge());
        info!(platform = bridge.platform_name(), save_dir = %save_dir.display(), "platform ready");

        let coordinator = PdfToolsCoordinator::new(
            Arc::new(DocumentCodec::new(bridge)),
            Arc::new(FileController::new(save_dir)),
            config.clone(),
        )?;

        Ok(Self {
            coordinator,
            data_dir,
            config: Arc::new(Mutex::new(config)),
        })
    }

    pub fn coordinator(&self) -> &PdfToolsCoordinator {
        &self.coordinator
    }

    /// Get a clone of the current config.
    pub fn config(&self) -> ToolConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Update and persist the config. Takes effect for the next session.
    pub fn save_config(&self, config: &ToolConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        persist_config(&self.data_dir, config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// -- Config file persistence -------------------------------------------------

fn load_config(data_dir: &Path) -> Option<ToolConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &ToolConfig) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(data_dir.join(CONFIG_FILE), json)?;
    Ok(())
}
