//! Simulator availability check.
//!
//! Cross-references a resolved device string against the live device list
//! reported by the toolchain. Freshness beats performance here: simulator
//! availability changes between Xcode installs, so the list is never cached.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::capabilities::{Capabilities, Version};
use crate::error::PreflightError;
use crate::toolchain::Toolchain;

/// Device enumeration attempts before giving up.
const ENUMERATION_ATTEMPTS: u32 = 3;

fn bracketed_identifier() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".+\[([^\]]+)\]").expect("identifier pattern is valid"))
}

/// Find a device label containing `device_string` as a substring.
///
/// Returns the matched label and, when the label carries a bracketed suffix,
/// the extracted identifier. When several labels match, the last one wins.
pub fn match_device_string<'a>(
    device_string: &str,
    available: &'a [String],
) -> Option<(&'a str, Option<String>)> {
    let mut matched = None;
    for label in available {
        if label.contains(device_string) {
            let udid = bracketed_identifier()
                .captures(label)
                .map(|c| c[1].to_string());
            matched = Some((label.as_str(), udid));
        }
    }
    matched
}

async fn fetch_devices<T: Toolchain + ?Sized>(
    toolchain: &T,
    xcode: Version,
    sdk: Version,
) -> Result<Vec<String>, PreflightError> {
    let mut last_err = None;
    for attempt in 1..=ENUMERATION_ATTEMPTS {
        match toolchain.available_devices(xcode, sdk).await {
            Ok(devices) => return Ok(devices),
            Err(e) => {
                warn!(attempt, error = %e, "device enumeration failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.expect("at least one enumeration attempt"))
}

/// Verify that the resolved device string matches an available simulator.
///
/// Skipped entirely when a physical device UDID is present or the SDK
/// predates 7.1 (no enumeration support). For SDK 8+ the matched label must
/// also carry an extractable bracketed identifier, which is returned.
///
/// # Errors
///
/// - [`PreflightError::DeviceNotFound`] when nothing matches; carries the
///   requested string and the full candidate list.
/// - [`PreflightError::ToolchainQuery`] when enumeration fails on all
///   attempts.
pub async fn check_simulator_available<T: Toolchain + ?Sized>(
    toolchain: &T,
    xcode: Version,
    sdk: Version,
    caps: &Capabilities,
    device_string: &str,
) -> Result<Option<String>, PreflightError> {
    if caps.udid.is_some() {
        debug!("on a real device, not checking simulator availability");
        return Ok(None);
    }
    if sdk < Version::new(7, 1) {
        debug!(sdk_version = %sdk, "sdk below 7.1, device enumeration unsupported");
        return Ok(None);
    }

    debug!(device_string, "checking whether instruments supports our device string");
    let available = fetch_devices(toolchain, xcode, sdk).await?;

    let not_found = || PreflightError::DeviceNotFound {
        requested: device_string.to_string(),
        available: available.clone(),
    };

    if sdk >= Version::new(8, 0) {
        match match_device_string(device_string, &available) {
            Some((label, Some(udid))) => {
                debug!(label, sim_udid = %udid, "simulator matched");
                Ok(Some(udid))
            }
            _ => Err(not_found()),
        }
    } else {
        match match_device_string(device_string, &available) {
            Some((label, _)) => {
                debug!(label, "simulator matched");
                Ok(None)
            }
            None => Err(not_found()),
        }
    }
}
