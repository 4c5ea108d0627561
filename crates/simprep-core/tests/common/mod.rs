//! Shared test helpers for simprep-core integration tests.
//!
//! Provides a deterministic fake toolchain so the preflight pipeline can be
//! exercised without Xcode installed.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use simprep_core::capabilities::Version;
use simprep_core::error::PreflightError;
use simprep_core::toolchain::Toolchain;

// ---------------------------------------------------------------------------
// Fake toolchain
// ---------------------------------------------------------------------------

/// A scripted [`Toolchain`] with canned responses, failure injection for the
/// enumeration query, and call counters so short-circuit properties are
/// observable.
pub struct FakeToolchain {
    xcode: Result<String, String>,
    sdk: Result<Version, String>,
    devices: Vec<String>,
    /// Number of leading `available_devices` calls that fail.
    fail_enumerations: u32,
    enumeration_calls: AtomicU32,
}

impl FakeToolchain {
    pub fn new(xcode: &str, sdk: Version, devices: &[&str]) -> Self {
        Self {
            xcode: Ok(xcode.to_string()),
            sdk: Ok(sdk),
            devices: devices.iter().map(|s| s.to_string()).collect(),
            fail_enumerations: 0,
            enumeration_calls: AtomicU32::new(0),
        }
    }

    /// Make the first `n` enumeration calls fail with a transient error.
    pub fn failing_enumerations(mut self, n: u32) -> Self {
        self.fail_enumerations = n;
        self
    }

    /// Make the Xcode version query itself fail.
    pub fn broken_xcode(mut self, message: &str) -> Self {
        self.xcode = Err(message.to_string());
        self
    }

    /// How many times `available_devices` was called.
    pub fn enumeration_calls(&self) -> u32 {
        self.enumeration_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn xcode_version(&self) -> Result<String, PreflightError> {
        self.xcode
            .clone()
            .map_err(PreflightError::ToolchainQuery)
    }

    async fn max_sdk_version(&self) -> Result<Version, PreflightError> {
        self.sdk.clone().map_err(PreflightError::ToolchainQuery)
    }

    async fn available_devices(
        &self,
        _xcode: Version,
        _sdk: Version,
    ) -> Result<Vec<String>, PreflightError> {
        let call = self.enumeration_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_enumerations {
            return Err(PreflightError::ToolchainQuery(format!(
                "transient enumeration failure {}",
                call
            )));
        }
        Ok(self.devices.clone())
    }
}
