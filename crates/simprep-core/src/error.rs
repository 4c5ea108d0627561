//! Unified error type for session preflight.
//!
//! Every step of the pipeline fails with a [`PreflightError`]; no failure is
//! swallowed except the helper-lookup fallback during UDID detection, which
//! is an expected alternate path. Deprecation warnings are logged via
//! `tracing` and never surface here.

use thiserror::Error;

/// Errors that can occur while preparing a test session.
#[derive(Error, Debug)]
pub enum PreflightError {
    /// Missing or contradictory capabilities.
    #[error("Invalid capabilities: {0}")]
    Config(String),

    /// An Xcode or SDK version query failed.
    #[error("Toolchain query failed: {0}")]
    ToolchainQuery(String),

    /// The resolved device string matched nothing in the simulator list.
    #[error(
        "Could not find a device to launch. You requested '{requested}', \
         but the available devices were: {available:?}"
    )]
    DeviceNotFound {
        requested: String,
        available: Vec<String>,
    },

    /// UDID auto-detection produced no usable identifier.
    #[error("Could not detect udid: {0}")]
    Detection(String),

    /// An I/O error occurred while executing an external command.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
