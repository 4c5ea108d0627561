//! Toolchain queries: Xcode version, maximum SDK version, device enumeration.
//!
//! The [`Toolchain`] trait is the narrow seam between the preflight pipeline
//! and the installed Xcode toolchain, so tests can substitute a deterministic
//! fake. [`XcrunToolchain`] is the real implementation, shelling out to
//! `xcodebuild`, `xcrun`, and `instruments`.
//!
//! # Requirements
//!
//! Xcode must be installed for [`XcrunToolchain`] to work.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::capabilities::{Capabilities, Version};
use crate::error::PreflightError;

/// Query surface of the installed Xcode toolchain.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// The full Xcode version string (e.g. `"7.2.1"`).
    async fn xcode_version(&self) -> Result<String, PreflightError>;

    /// The maximum iOS SDK version the toolchain can simulate.
    async fn max_sdk_version(&self) -> Result<Version, PreflightError>;

    /// The ordered list of simulator device labels, each optionally followed
    /// by a bracketed identifier (`"iPhone 6 (8.4 Simulator) [ABCD-1234]"`).
    async fn available_devices(
        &self,
        xcode: Version,
        sdk: Version,
    ) -> Result<Vec<String>, PreflightError>;
}

/// Real toolchain backed by the Xcode command line tools.
#[derive(Debug, Default)]
pub struct XcrunToolchain;

async fn run_tool(program: &str, args: &[&str]) -> Result<String, PreflightError> {
    let output = Command::new(program).args(args).output().await?;
    if !output.status.success() {
        return Err(PreflightError::ToolchainQuery(format!(
            "{} {} failed: {}",
            program,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[async_trait]
impl Toolchain for XcrunToolchain {
    async fn xcode_version(&self) -> Result<String, PreflightError> {
        // First line of `xcodebuild -version` is "Xcode <version>".
        let stdout = run_tool("xcodebuild", &["-version"]).await?;
        stdout
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Xcode "))
            .map(|v| v.trim().to_string())
            .ok_or_else(|| {
                PreflightError::ToolchainQuery(format!(
                    "unexpected xcodebuild -version output: {:?}",
                    stdout
                ))
            })
    }

    async fn max_sdk_version(&self) -> Result<Version, PreflightError> {
        let stdout = run_tool("xcrun", &["--sdk", "iphonesimulator", "--show-sdk-version"]).await?;
        Version::parse(stdout.trim())
            .map_err(|e| PreflightError::ToolchainQuery(e.to_string()))
    }

    async fn available_devices(
        &self,
        _xcode: Version,
        _sdk: Version,
    ) -> Result<Vec<String>, PreflightError> {
        let stdout = run_tool("xcrun", &["instruments", "-s", "devices"]).await?;
        Ok(parse_device_labels(&stdout))
    }
}

/// Parse `instruments -s devices` output into device labels, dropping the
/// header line and blanks.
pub fn parse_device_labels(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Known Devices:"))
        .map(str::to_string)
        .collect()
}

/// Query the Xcode version and warn on deprecated releases.
///
/// Versions below 6.3 are deprecated, with one carve-out: Xcode 6.0 is
/// accepted for platform version 8.0. Returns the leading two components as
/// a [`Version`].
///
/// # Errors
///
/// [`PreflightError::ToolchainQuery`] when the lookup fails or the reported
/// version does not parse.
pub async fn check_xcode_version<T: Toolchain + ?Sized>(
    toolchain: &T,
    caps: &Capabilities,
) -> Result<Version, PreflightError> {
    let version_string = toolchain.xcode_version().await.map_err(|e| {
        error!("could not determine Xcode version");
        e
    })?;
    let version = Version::parse(&version_string)
        .map_err(|e| PreflightError::ToolchainQuery(e.to_string()))?;

    let platform = caps.requested_platform();
    let xcode6_for_ios8 =
        version == Version::new(6, 0) && platform == Some(Version::new(8, 0));
    if version < Version::new(6, 3) && !xcode6_for_ios8 {
        warn!(
            xcode_version = %version_string,
            "support for Xcode versions below 6.3 is deprecated and will be \
             removed (6.0.1 remains supported for iOS 8.0)"
        );
    }

    debug!(xcode_version = %version, "xcode version");
    Ok(version)
}

/// Query the maximum supported iOS SDK version.
///
/// # Errors
///
/// [`PreflightError::ToolchainQuery`] when the lookup fails.
pub async fn check_sdk_version<T: Toolchain + ?Sized>(
    toolchain: &T,
) -> Result<Version, PreflightError> {
    let version = toolchain.max_sdk_version().await.map_err(|e| {
        error!("could not determine iOS SDK version");
        e
    })?;
    debug!(sdk_version = %version, "max iOS SDK version");
    Ok(version)
}
