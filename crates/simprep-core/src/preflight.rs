//! The preflight pipeline: everything that must hold before a test session
//! starts.
//!
//! Control flows linearly: UDID auto-detection, capability normalization,
//! app identity resolution, toolchain version checks, device string
//! resolution, and the simulator availability check. No state is retained
//! across runs; each session owns its own capability set.
//!
//! # Example
//!
//! ```no_run
//! use simprep_core::capabilities::Capabilities;
//! use simprep_core::preflight::Preflight;
//! use simprep_core::toolchain::XcrunToolchain;
//!
//! #[tokio::main]
//! async fn main() {
//!     let caps = Capabilities {
//!         device_name: Some("iPhone 6".to_string()),
//!         platform_version: Some("8.4".to_string()),
//!         app: Some("/path/to/App.app".to_string()),
//!         ..Default::default()
//!     };
//!     let plan = Preflight::new(XcrunToolchain).run(caps).await.unwrap();
//!     println!("launching {}", plan.device_string);
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::check_simulator_available;
use crate::capabilities::{Capabilities, Version};
use crate::device::resolve_device_string;
use crate::error::PreflightError;
use crate::normalize::{normalize, resolve_app_identity};
use crate::toolchain::{check_sdk_version, check_xcode_version, Toolchain};
use crate::udid::detect_udid;

/// Returns the support directory (`~/.simprep/`), creating it if needed.
///
/// Hosts the bundled `udidetect` fallback helper.
pub fn simprep_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".simprep");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Best-effort removal of a leftover instruments socket path.
///
/// Handles both a directory and a plain file; errors are logged and
/// otherwise indistinguishable from success.
pub async fn remove_instruments_socket(sock: &Path) {
    debug!(path = %sock.display(), "removing any remaining instruments sockets");
    if tokio::fs::remove_dir_all(sock).await.is_err() {
        if let Err(e) = tokio::fs::remove_file(sock).await {
            debug!(path = %sock.display(), error = %e, "socket removal skipped");
            return;
        }
    }
    debug!(path = %sock.display(), "cleaned up instruments socket");
}

/// Everything resolved by a successful preflight run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    /// The fully normalized capability set.
    pub capabilities: Capabilities,
    /// Installed Xcode version (leading two components).
    pub xcode_version: Version,
    /// Maximum iOS SDK version the toolchain supports.
    pub sdk_version: Version,
    /// The simulator device string the instrumentation tool expects.
    pub device_string: String,
    /// Identifier of the matched simulator, when the SDK reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulator_udid: Option<String>,
}

/// Runs the preflight pipeline against a [`Toolchain`].
pub struct Preflight<T: Toolchain> {
    toolchain: T,
}

impl<T: Toolchain> Preflight<T> {
    pub fn new(toolchain: T) -> Self {
        Self { toolchain }
    }

    /// The toolchain this pipeline queries.
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Run every preflight step in order and produce a [`SessionPlan`].
    ///
    /// # Errors
    ///
    /// The first failing step's [`PreflightError`] is propagated; nothing
    /// after it runs.
    pub async fn run(&self, caps: Capabilities) -> Result<SessionPlan, PreflightError> {
        let caps = detect_udid(caps).await?;
        let caps = normalize(caps)?;
        let caps = resolve_app_identity(caps)?;

        let xcode_version = check_xcode_version(&self.toolchain, &caps).await?;
        let sdk_version = check_sdk_version(&self.toolchain).await?;

        let device_string = resolve_device_string(xcode_version, sdk_version, &caps);
        let simulator_udid = check_simulator_available(
            &self.toolchain,
            xcode_version,
            sdk_version,
            &caps,
            &device_string,
        )
        .await?;

        Ok(SessionPlan {
            capabilities: caps,
            xcode_version,
            sdk_version,
            device_string,
            simulator_udid,
        })
    }
}
