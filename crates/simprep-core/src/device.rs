//! Simulator device string resolution.
//!
//! Maps (Xcode version, SDK version, capability hints) to the exact device
//! string the instrumentation toolchain expects. Pure string work: no I/O,
//! deterministic for identical inputs, diagnostic logging only.
//!
//! Several tool releases ship mislabeled simulator entries; the generated
//! string is passed through a static correction table as a last step.

use tracing::debug;

use crate::capabilities::{Capabilities, Version};

/// Known-bad generated device strings and the labels the toolchain actually
/// recognizes. Some device configs are broken in Xcode 5.1 and the early
/// iOS 8 simulators.
pub const DEVICE_STRING_FIXES: &[(&str, &str)] = &[
    (
        "iPhone - Simulator - iOS 7.1",
        "iPhone Retina (4-inch 64-bit) - Simulator - iOS 7.1",
    ),
    (
        "iPad - Simulator - iOS 7.1",
        "iPad Retina (64-bit) - Simulator - iOS 7.1",
    ),
    ("iPad Simulator (8.0 Simulator)", "iPad 2 (8.0 Simulator)"),
    ("iPad Simulator (8.1 Simulator)", "iPad 2 (8.1 Simulator)"),
    ("iPad Simulator (8.2 Simulator)", "iPad 2 (8.2 Simulator)"),
    ("iPad Simulator (8.3 Simulator)", "iPad 2 (8.3 Simulator)"),
    ("iPad Simulator (8.4 Simulator)", "iPad 2 (8.4 Simulator)"),
    ("iPad Simulator (7.1 Simulator)", "iPad 2 (7.1 Simulator)"),
    ("iPhone Simulator (8.4 Simulator)", "iPhone 6 (8.4 Simulator)"),
    ("iPhone Simulator (8.3 Simulator)", "iPhone 6 (8.3 Simulator)"),
    ("iPhone Simulator (8.2 Simulator)", "iPhone 6 (8.2 Simulator)"),
    ("iPhone Simulator (8.1 Simulator)", "iPhone 6 (8.1 Simulator)"),
    ("iPhone Simulator (8.0 Simulator)", "iPhone 6 (8.0 Simulator)"),
    ("iPhone Simulator (7.1 Simulator)", "iPhone 5s (7.1 Simulator)"),
];

/// Look up a generated device string in the correction table.
pub fn fix_device_string(generated: &str) -> Option<&'static str> {
    DEVICE_STRING_FIXES
        .iter()
        .find(|(bad, _)| *bad == generated)
        .map(|(_, fixed)| *fixed)
}

/// Compute the simulator device string for the given toolchain versions and
/// capability hints.
///
/// A device name starting with `=` bypasses all heuristics: the remainder is
/// the device string, verbatim. Otherwise form-factor, tallness, retina, and
/// 64-bit flags are derived from the device name (falling back to the
/// `forceIphone`/`forceIpad` capabilities), formatted per Xcode generation,
/// suffixed with the simulator/version qualifier the SDK expects, and run
/// through the correction table.
pub fn resolve_device_string(xcode: Version, sdk: Version, caps: &Capabilities) -> String {
    debug!(
        force_iphone = ?caps.force_iphone,
        force_ipad = ?caps.force_ipad,
        xcode_version = %xcode,
        sdk_version = %sdk,
        device_name = ?caps.device_name,
        platform_version = ?caps.platform_version,
        "resolving device string from capabilities"
    );

    if let Some(rest) = caps.device_name.as_deref().and_then(|n| n.strip_prefix('=')) {
        return rest.to_string();
    }

    let mut is_iphone = caps.force_iphone.unwrap_or(false) || !caps.force_ipad.unwrap_or(false);
    let mut is_tall = is_iphone;
    let mut is_retina = xcode.major != 4;
    let mut is_64bit = false;

    let name_lower = caps
        .device_name
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    if let Some(name) = caps.device_name.as_deref() {
        if name_lower.contains("iphone") {
            is_iphone = true;
        } else if name_lower.contains("ipad") {
            is_iphone = false;
        }
        // Refine the flags only when an explicit non-default device was
        // requested (the name differs from the platform name).
        if Some(name) != caps.platform_name.as_deref() {
            is_tall = is_iphone && name_lower.contains("4-inch");
            is_retina = name_lower.contains("retina");
            is_64bit = name_lower.contains("64-bit");
        }
    }

    let mut device = String::from(if is_iphone { "iPhone" } else { "iPad" });
    match xcode.major {
        4 => {
            if is_iphone && is_retina {
                device.push_str(if is_tall {
                    " (Retina 4-inch)"
                } else {
                    " (Retina 3.5-inch)"
                });
            } else if is_retina {
                device.push_str(" (Retina)");
            }
        }
        5 => {
            if is_retina {
                device.push_str(" Retina");
            }
            if is_iphone {
                if is_retina && is_tall {
                    device.push_str(if is_64bit { " (4-inch 64-bit)" } else { " (4-inch)" });
                } else if name_lower.contains("3.5") {
                    device.push_str(" (3.5-inch)");
                }
            } else if is_64bit {
                device.push_str(" (64-bit)");
            }
        }
        // Xcode 6 and later name simulators directly, so the derived flags
        // don't apply.
        6.. => {
            device = caps
                .device_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| {
                    String::from(if is_iphone {
                        "iPhone Simulator"
                    } else {
                        "iPad Simulator"
                    })
                });
        }
        _ => {}
    }

    let requested_version = caps
        .platform_version
        .clone()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| sdk.to_string());
    if sdk >= Version::new(8, 0) {
        device.push_str(&format!(" ({} Simulator)", requested_version));
    } else if sdk >= Version::new(7, 1) {
        device.push_str(&format!(" - Simulator - iOS {}", requested_version));
    }

    if let Some(fixed) = fix_device_string(&device) {
        debug!(from = %device, to = %fixed, "substituting known-bad device string");
        device = fixed.to_string();
    }

    debug!(device_string = %device, "final device string");
    device
}
