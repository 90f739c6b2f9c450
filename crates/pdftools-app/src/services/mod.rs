// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: wires the coordinator to the document codec, the platform
// bridge, filesystem persistence, and the persisted configuration.

pub mod data_dir;
pub mod file_controller;
pub mod tool_services;
