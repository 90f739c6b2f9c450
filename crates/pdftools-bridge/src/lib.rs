// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF tools: Native platform bridge abstractions.
//
// Defines the traits the document layer uses to read source resources and to
// reach the OS share sheet, plus the per-platform dispatch.

pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use traits::{NativeFileAccess, NativeShare, PlatformBridge};

/// Return the bridge implementation for the target operating system.
pub fn platform_bridge() -> Box<dyn traits::PlatformBridge> {
    #[cfg(target_os = "android")]
    {
        // Android: `jni-rs` calls into the hosting Activity.
        Box::new(android::AndroidBridge::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // Desktop/CI: filesystem access, no share sheet.
        Box::new(stub::StubBridge)
    }
}
