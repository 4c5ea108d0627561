//! Capability normalization and app identity resolution.
//!
//! These are the first two steps of the preflight pipeline. Each step takes
//! a [`Capabilities`] value and returns an enriched copy or a typed failure,
//! so the steps compose without hidden ordering dependencies and test in
//! isolation.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::capabilities::{Capabilities, Version};
use crate::error::PreflightError;

/// Bundle identifier of the system Preferences app, used when the caller
/// requests the synthetic app name `"settings"` on iOS 8+.
pub const PREFERENCES_BUNDLE_ID: &str = "com.apple.Preferences";

fn bundle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9\-_]+\.[a-zA-Z0-9\-_]+)+$").expect("bundle pattern is valid")
    })
}

/// Returns true when `app` looks like a bundle/package identifier
/// (dotted reverse-domain string) rather than a filesystem path.
pub fn app_is_package_or_bundle(app: &str) -> bool {
    bundle_pattern().is_match(app)
}

/// Derive the secondary capability flags from the raw set.
///
/// Fills `without_delay`, `reset`, `initial_orientation` (defaulting to
/// `"PORTRAIT"`), `use_robot`, and `robot_url`. Warns when the requested
/// platform version predates 7.1.
///
/// # Errors
///
/// [`PreflightError::Config`] when `locationServicesAuthorized` is set
/// without a `bundleId`.
pub fn normalize(mut caps: Capabilities) -> Result<Capabilities, PreflightError> {
    caps.without_delay = caps.native_instruments_lib;
    caps.reset = !caps.no_reset;
    caps.initial_orientation = caps
        .device_orientation
        .clone()
        .or_else(|| caps.orientation.clone())
        .or_else(|| Some("PORTRAIT".to_string()));
    caps.use_robot = caps.robot_port > 0;
    caps.robot_url = if caps.use_robot {
        Some(format!("http://{}:{}", caps.robot_address, caps.robot_port))
    } else {
        None
    };

    if caps.location_services_authorized && caps.bundle_id.is_none() {
        return Err(PreflightError::Config(
            "You must set the bundleId capability when using locationServicesAuthorized"
                .to_string(),
        ));
    }

    if let Some(pv) = caps.requested_platform() {
        if pv < Version::new(7, 1) {
            warn!(
                platform_version = %pv,
                "iOS versions below 7.1 are deprecated and support will be removed"
            );
        }
    }

    Ok(caps)
}

/// Decide whether the supplied app identifier is a filesystem path or a
/// bundle identifier, and rewrite the capabilities accordingly.
///
/// - Copies a bundle-like `app` into `bundleId` when the latter is unset.
/// - Rewrites the synthetic app name `"settings"` to the system Preferences
///   bundle id on iOS 8+ (older versions keep it for the separate built-in
///   app preparation step).
/// - A bundle-like `bundleId` with no distinct app path means the app is
///   treated as already installed; no capability changes in that branch.
///
/// # Errors
///
/// [`PreflightError::Config`] when neither an `app` nor a usable
/// (`bundleId` + `udid`-or-iOS8) combination is present.
pub fn resolve_app_identity(mut caps: Capabilities) -> Result<Capabilities, PreflightError> {
    // On iOS 8 a bundle id is enough to launch an app on the simulator; on
    // earlier versions that only works on a real device.
    let ios8 = caps
        .requested_platform()
        .map_or(false, |pv| pv >= Version::new(8, 0));

    let has_app = caps.app.as_deref().map_or(false, |a| !a.is_empty());
    let has_bundle = caps.bundle_id.is_some();
    if !has_app && !((ios8 || caps.udid.is_some()) && has_bundle) {
        return Err(PreflightError::Config(
            "Please provide the 'app' capability. Alternatively, you may provide \
             the 'bundleId' and 'udid' capabilities for an app under test on a \
             real device, or 'bundleId' alone on iOS 8 and up"
                .to_string(),
        ));
    }

    // An app value that is itself a bundle id doubles as bundleId.
    if caps.bundle_id.is_none() {
        if let Some(app) = caps.app.as_deref() {
            if app_is_package_or_bundle(app) {
                caps.bundle_id = Some(app.to_string());
            }
        }
    }

    let app_is_settings = caps
        .app
        .as_deref()
        .map_or(false, |a| a.eq_ignore_ascii_case("settings"));

    if app_is_settings {
        if ios8 {
            debug!("running on iOS 8+, using the installed Preferences app");
            caps.bundle_id = Some(PREFERENCES_BUNDLE_ID.to_string());
            caps.app = None;
        }
        // Pre-8 the built-in app gets prepared by a later step.
    } else if caps
        .bundle_id
        .as_deref()
        .map_or(false, app_is_package_or_bundle)
        && caps
            .app
            .as_deref()
            .map_or(true, app_is_package_or_bundle)
    {
        debug!("app is an iOS bundle, will attempt to run as pre-existing");
    }

    Ok(caps)
}
