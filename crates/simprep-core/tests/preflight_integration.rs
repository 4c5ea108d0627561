//! End-to-end tests for the preflight pipeline against a fake toolchain.
//!
//! These cover the linear happy path, the short-circuit properties of the
//! availability check, the enumeration retry budget, and error propagation
//! from each stage.

mod common;

use common::FakeToolchain;

use simprep_core::availability::check_simulator_available;
use simprep_core::capabilities::{Capabilities, Version};
use simprep_core::error::PreflightError;
use simprep_core::preflight::Preflight;

fn sim_caps() -> Capabilities {
    Capabilities {
        device_name: Some("iPhone 6".to_string()),
        platform_version: Some("8.4".to_string()),
        app: Some("/tmp/App.app".to_string()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_pipeline_resolves_simulator() {
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &[
            "my-mac [0123]",
            "iPad 2 (8.4 Simulator) [EFGH-5678]",
            "iPhone 6 (8.4 Simulator) [ABCD-1234]",
        ],
    );
    let plan = Preflight::new(toolchain).run(sim_caps()).await.unwrap();

    assert_eq!(plan.device_string, "iPhone 6 (8.4 Simulator)");
    assert_eq!(plan.simulator_udid.as_deref(), Some("ABCD-1234"));
    assert_eq!(plan.xcode_version, Version::new(6, 3));
    assert_eq!(plan.sdk_version, Version::new(8, 4));
    // Normalization ran: derived fields are filled.
    assert_eq!(
        plan.capabilities.initial_orientation.as_deref(),
        Some("PORTRAIT")
    );
    assert!(plan.capabilities.reset);
}

#[tokio::test]
async fn pre_ios8_band_matches_without_identifier() {
    // SDK 7.1: the corrected device string must appear in the list, but no
    // bracketed identifier is extracted.
    let toolchain = FakeToolchain::new(
        "5.1.1",
        Version::new(7, 1),
        &["iPhone Retina (4-inch 64-bit) - Simulator - iOS 7.1"],
    );
    let caps = Capabilities {
        device_name: Some("iPhone".to_string()),
        platform_version: Some("7.1".to_string()),
        app: Some("/tmp/App.app".to_string()),
        ..Default::default()
    };
    let plan = Preflight::new(toolchain).run(caps).await.unwrap();

    assert_eq!(
        plan.device_string,
        "iPhone Retina (4-inch 64-bit) - Simulator - iOS 7.1"
    );
    assert!(plan.simulator_udid.is_none());
}

// ---------------------------------------------------------------------------
// Short circuits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn real_device_udid_skips_enumeration() {
    let toolchain = FakeToolchain::new("6.3.2", Version::new(8, 4), &[]);
    let caps = Capabilities {
        udid: Some("abcdef123456".to_string()),
        bundle_id: Some("com.example.App".to_string()),
        ..sim_caps()
    };
    let preflight = Preflight::new(toolchain);
    let plan = preflight.run(caps).await.unwrap();

    assert!(plan.simulator_udid.is_none());
    assert_eq!(preflight.toolchain().enumeration_calls(), 0);
}

#[tokio::test]
async fn old_sdk_skips_enumeration() {
    let toolchain = FakeToolchain::new("5.0.2", Version::new(6, 1), &[]);
    let caps = Capabilities {
        platform_version: Some("6.1".to_string()),
        ..sim_caps()
    };
    let preflight = Preflight::new(toolchain);
    let plan = preflight.run(caps).await.unwrap();

    assert!(plan.simulator_udid.is_none());
    assert_eq!(preflight.toolchain().enumeration_calls(), 0);
}

#[tokio::test]
async fn config_error_stops_before_toolchain_queries() {
    let toolchain = FakeToolchain::new("6.3.2", Version::new(8, 4), &[]);
    let preflight = Preflight::new(toolchain);
    let result = preflight.run(Capabilities::default()).await;

    assert!(matches!(result, Err(PreflightError::Config(_))));
    assert_eq!(preflight.toolchain().enumeration_calls(), 0);
}

// ---------------------------------------------------------------------------
// Enumeration retry budget
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enumeration_recovers_within_three_attempts() {
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &["iPhone 6 (8.4 Simulator) [ABCD-1234]"],
    )
    .failing_enumerations(2);

    let preflight = Preflight::new(toolchain);
    let plan = preflight.run(sim_caps()).await.unwrap();

    assert_eq!(plan.simulator_udid.as_deref(), Some("ABCD-1234"));
    assert_eq!(preflight.toolchain().enumeration_calls(), 3);
}

#[tokio::test]
async fn enumeration_gives_up_after_three_attempts() {
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &["iPhone 6 (8.4 Simulator) [ABCD-1234]"],
    )
    .failing_enumerations(5);

    let preflight = Preflight::new(toolchain);
    let result = preflight.run(sim_caps()).await;

    assert!(matches!(result, Err(PreflightError::ToolchainQuery(_))));
    assert_eq!(preflight.toolchain().enumeration_calls(), 3);
}

// ---------------------------------------------------------------------------
// Error propagation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_device_lists_candidates() {
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &["iPad 2 (8.4 Simulator) [EFGH-5678]"],
    );
    let result = Preflight::new(toolchain).run(sim_caps()).await;

    match result {
        Err(PreflightError::DeviceNotFound {
            requested,
            available,
        }) => {
            assert_eq!(requested, "iPhone 6 (8.4 Simulator)");
            assert_eq!(available, vec!["iPad 2 (8.4 Simulator) [EFGH-5678]"]);
        }
        other => panic!("expected DeviceNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn sdk8_match_without_identifier_is_not_found() {
    // The label matches as a substring but has no bracketed identifier, so
    // on SDK 8+ it counts as no match.
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &["iPhone 6 (8.4 Simulator)"],
    );
    let result = check_simulator_available(
        &toolchain,
        Version::new(6, 3),
        Version::new(8, 4),
        &sim_caps(),
        "iPhone 6 (8.4 Simulator)",
    )
    .await;

    assert!(matches!(
        result,
        Err(PreflightError::DeviceNotFound { .. })
    ));
}

#[tokio::test]
async fn broken_xcode_query_propagates() {
    let toolchain =
        FakeToolchain::new("6.3.2", Version::new(8, 4), &[]).broken_xcode("xcodebuild exploded");
    let result = Preflight::new(toolchain).run(sim_caps()).await;

    match result {
        Err(PreflightError::ToolchainQuery(msg)) => {
            assert!(msg.contains("xcodebuild exploded"))
        }
        other => panic!("expected ToolchainQuery, got {:?}", other),
    }
}

#[tokio::test]
async fn verbatim_device_name_flows_through_pipeline() {
    let toolchain = FakeToolchain::new(
        "6.3.2",
        Version::new(8, 4),
        &["Custom Sim Name (8.4 Simulator) [ZZZZ-9999]"],
    );
    let caps = Capabilities {
        device_name: Some("=Custom Sim Name".to_string()),
        ..sim_caps()
    };
    let plan = Preflight::new(toolchain).run(caps).await.unwrap();

    assert_eq!(plan.device_string, "Custom Sim Name");
    assert_eq!(plan.simulator_udid.as_deref(), Some("ZZZZ-9999"));
}
