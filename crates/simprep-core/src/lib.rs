//! # simprep-core
//!
//! Pre-session environment preparation for an iOS automation driver.
//!
//! Normalizes the caller-supplied capability set, resolves a human/config
//! device description into the exact simulator device string the
//! instrumentation toolchain understands, and performs the environment
//! checks (Xcode version, SDK version, device availability, UDID
//! auto-detection) that must pass before a test session starts.
//!
//! ## Modules
//!
//! - [`capabilities`] - The capability set and the `(major, minor)` version token
//! - [`normalize`] - Capability normalization and app identity resolution
//! - [`toolchain`] - Xcode/SDK version queries and device enumeration behind a trait seam
//! - [`device`] - The device string resolver and its correction table
//! - [`availability`] - Simulator availability check against the live device list
//! - [`udid`] - Physical-device UDID auto-detection
//! - [`preflight`] - The linear pipeline tying the steps together
//! - [`error`] - The unified [`error::PreflightError`] taxonomy
//!
//! ## External Dependencies
//!
//! The real toolchain backend requires Xcode (`xcodebuild`, `xcrun`,
//! `instruments`). UDID auto-detection prefers `idevice_id` from
//! libimobiledevice, falling back to the bundled helper in `~/.simprep/`.
//!
//! ## Example
//!
//! ```no_run
//! use simprep_core::capabilities::Capabilities;
//! use simprep_core::preflight::Preflight;
//! use simprep_core::toolchain::XcrunToolchain;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let caps: Capabilities = serde_json::from_str(
//!     r#"{"deviceName": "iPhone 6", "platformVersion": "8.4", "app": "/tmp/App.app"}"#
//! ).unwrap();
//!
//! let plan = Preflight::new(XcrunToolchain).run(caps).await.unwrap();
//! println!("device string: {}", plan.device_string);
//! # }
//! ```

pub mod availability;
pub mod capabilities;
pub mod device;
pub mod error;
pub mod normalize;
pub mod preflight;
pub mod toolchain;
pub mod udid;

pub use capabilities::{Capabilities, Version};
pub use error::PreflightError;
pub use preflight::{Preflight, SessionPlan};
