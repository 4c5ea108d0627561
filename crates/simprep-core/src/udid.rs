//! Physical-device UDID auto-detection.
//!
//! When the `udid` capability is the literal sentinel `"auto"`, a
//! device-listing helper is run to discover the single attached device.
//! `idevice_id` from libimobiledevice is preferred when it is on the search
//! path; otherwise the bundled `udidetect` helper under the support
//! directory is used.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::capabilities::Capabilities;
use crate::error::PreflightError;
use crate::preflight::simprep_dir;

/// Hard bound on the helper invocation; exceeding it is a detection failure.
const DETECTION_TIMEOUT: Duration = Duration::from_millis(3000);

/// Name of the bundled fallback helper under the support directory.
const FALLBACK_HELPER: &str = "udidetect";

/// Auto-detect the attached device's UDID when requested.
///
/// Only acts when `udid` is `"auto"`; any other value (or none) passes
/// through unchanged. On success the returned capabilities carry the
/// detected identifier.
///
/// # Errors
///
/// [`PreflightError::Detection`] when the helper cannot be run, times out,
/// or prints an empty or implausibly short (≤ 2 characters) identifier.
pub async fn detect_udid(mut caps: Capabilities) -> Result<Capabilities, PreflightError> {
    if caps.udid.as_deref() != Some("auto") {
        debug!("not auto-detecting udid");
        return Ok(caps);
    }

    debug!("auto-detecting connected device udid");
    let udid = match which::which("idevice_id") {
        Ok(path) => capture_udid(path, &["-l"]).await?,
        Err(_) => {
            // Expected alternate path, not a failure.
            debug!("idevice_id not found on the search path, using bundled helper");
            capture_udid(simprep_dir().join(FALLBACK_HELPER), &[]).await?
        }
    };

    debug!(udid = %udid, "detected udid");
    caps.udid = Some(udid);
    Ok(caps)
}

/// Run a device-listing helper and return the first line of its output as
/// the candidate identifier, rejecting implausible results.
pub(crate) async fn capture_udid(
    program: PathBuf,
    args: &[&str],
) -> Result<String, PreflightError> {
    let program_name = program
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("helper")
        .to_string();

    // kill_on_drop so a hung helper dies when the bound fires instead of
    // lingering as an orphan.
    let output = timeout(
        DETECTION_TIMEOUT,
        Command::new(&program)
            .args(args)
            .kill_on_drop(true)
            .output(),
    )
    .await
        .map_err(|_| {
            PreflightError::Detection(format!("{} did not finish in time", program_name))
        })?
        .map_err(|e| PreflightError::Detection(format!("could not run {}: {}", program_name, e)))?;

    if !output.status.success() {
        return Err(PreflightError::Detection(format!(
            "{} failed: {}",
            program_name,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let udid = stdout.lines().next().unwrap_or("").to_string();
    if udid.len() <= 2 {
        return Err(PreflightError::Detection(format!(
            "{} produced no usable identifier (got {:?})",
            program_name, udid
        )));
    }
    Ok(udid)
}
