//! The capability set supplied by the test caller.
//!
//! Capabilities arrive as a JSON object (camelCase keys) describing the
//! desired device, app, and session behavior. The normalization steps in
//! [`crate::normalize`] consume a [`Capabilities`] value and return an
//! enriched copy; nothing in this module performs I/O.
//!
//! # Example
//!
//! ```
//! use simprep_core::capabilities::Capabilities;
//!
//! let caps: Capabilities = serde_json::from_str(
//!     r#"{"deviceName": "iPhone 6", "platformVersion": "8.4"}"#
//! ).unwrap();
//! assert_eq!(caps.device_name.as_deref(), Some("iPhone 6"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failed to parse a version string.
#[derive(Error, Debug)]
#[error("Invalid version string: {0:?}")]
pub struct VersionError(pub String);

/// A version number reduced to its leading two components.
///
/// Both Xcode and iOS/SDK versions are compared on `(major, minor)` only;
/// `"7.2.1"` parses as `7.2`. Ordering is numeric per component, so
/// `7.2 < 7.10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse the leading two dotted components of a version string.
    ///
    /// Trailing components are ignored (`"7.2.1"` → `7.2`); a bare major
    /// (`"8"`) gets a zero minor.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| VersionError(s.to_string()))?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| VersionError(s.to_string()))?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn default_robot_address() -> String {
    "0.0.0.0".to_string()
}

/// Desired-session capabilities.
///
/// Raw fields are what the caller supplies; the derived fields at the bottom
/// (`without_delay`, `reset`, `initial_orientation`, `use_robot`,
/// `robot_url`) are filled in by [`crate::normalize::normalize`] and are
/// meaningless before that step runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capabilities {
    /// Path to the app package, or a bundle identifier, or the synthetic
    /// name `"settings"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    /// Bundle identifier of an app already installed on the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    /// UDID of a physical device, or the sentinel `"auto"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,

    /// Requested simulator device name (e.g. `"iPhone 6"`). A leading `=`
    /// makes the remainder the literal device string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,

    /// Requested iOS version (e.g. `"8.4"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,

    pub native_instruments_lib: bool,
    pub no_reset: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    pub location_services_authorized: bool,

    #[serde(default = "default_robot_address")]
    pub robot_address: String,
    pub robot_port: u16,

    /// Force the iPhone form factor when no device name says otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_iphone: Option<bool>,
    /// Force the iPad form factor when no device name says otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_ipad: Option<bool>,

    // Derived by normalization.
    pub without_delay: bool,
    pub reset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_orientation: Option<String>,
    pub use_robot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot_url: Option<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            app: None,
            bundle_id: None,
            udid: None,
            device_name: None,
            platform_name: None,
            platform_version: None,
            native_instruments_lib: false,
            no_reset: false,
            device_orientation: None,
            orientation: None,
            location_services_authorized: false,
            robot_address: default_robot_address(),
            robot_port: 0,
            force_iphone: None,
            force_ipad: None,
            without_delay: false,
            reset: false,
            initial_orientation: None,
            use_robot: false,
            robot_url: None,
        }
    }
}

impl Capabilities {
    /// The requested platform version as a comparable token.
    ///
    /// Returns `None` when the capability is missing or unparseable, so
    /// version-gated branches simply don't fire.
    pub fn requested_platform(&self) -> Option<Version> {
        self.platform_version
            .as_deref()
            .and_then(|v| Version::parse(v).ok())
    }
}
