//! Preflight CLI for iOS test-session environment checks.
//!
//! Runs the simprep pipeline from the command line: normalize a capability
//! set, resolve the simulator device string, and verify the installed
//! toolchain can launch it.
//!
//! # Usage
//!
//! ```bash
//! # Full preflight against the installed Xcode toolchain
//! simprep check --caps caps.json
//!
//! # Same, reading capabilities from stdin, machine-readable output
//! cat caps.json | simprep --format json check
//!
//! # Offline device-string resolution with pinned toolchain versions
//! simprep resolve --caps caps.json --xcode-version 6.3 --sdk-version 8.4
//!
//! # List the simulator devices the toolchain reports
//! simprep devices
//! ```

use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use simprep_core::capabilities::{Capabilities, Version};
use simprep_core::device::resolve_device_string;
use simprep_core::preflight::Preflight;
use simprep_core::toolchain::{Toolchain, XcrunToolchain};

/// Preflight checks and simulator resolution for iOS test sessions.
#[derive(Parser)]
#[command(name = "simprep")]
#[command(about = "Preflight checks and simulator resolution for iOS test sessions")]
#[command(version)]
struct Cli {
    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full preflight pipeline against the installed toolchain
    Check {
        /// Capabilities JSON file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        caps: String,
    },

    /// Resolve the device string offline with pinned toolchain versions
    Resolve {
        /// Capabilities JSON file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        caps: String,
        /// Xcode version to assume (e.g. 6.3)
        #[arg(long)]
        xcode_version: Version,
        /// Maximum SDK version to assume (e.g. 8.4)
        #[arg(long)]
        sdk_version: Version,
    },

    /// List the simulator devices the toolchain reports
    Devices,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_caps(path: &str) -> Result<Capabilities, String> {
    let data = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("could not read capabilities from stdin: {}", e))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("could not read capabilities file {}: {}", path, e))?
    };
    serde_json::from_str(&data).map_err(|e| format!("invalid capabilities JSON: {}", e))
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Check { caps } => {
            let caps = load_caps(&caps)?;
            let plan = Preflight::new(XcrunToolchain)
                .run(caps)
                .await
                .map_err(|e| e.to_string())?;

            if cli.format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan).map_err(|e| e.to_string())?
                );
            } else {
                println!("Xcode version:  {}", plan.xcode_version);
                println!("SDK version:    {}", plan.sdk_version);
                println!("Device string:  {}", plan.device_string);
                match &plan.simulator_udid {
                    Some(udid) => println!("Simulator udid: {}", udid),
                    None => println!("Simulator udid: (not applicable)"),
                }
            }
        }

        Command::Resolve {
            caps,
            xcode_version,
            sdk_version,
        } => {
            let caps = load_caps(&caps)?;
            let device_string = resolve_device_string(xcode_version, sdk_version, &caps);
            if cli.format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::json!({ "deviceString": device_string })
                );
            } else {
                println!("{}", device_string);
            }
        }

        Command::Devices => {
            let toolchain = XcrunToolchain;
            let xcode = Version::parse(
                &toolchain
                    .xcode_version()
                    .await
                    .map_err(|e| e.to_string())?,
            )
            .map_err(|e| e.to_string())?;
            let sdk = toolchain
                .max_sdk_version()
                .await
                .map_err(|e| e.to_string())?;
            let devices = toolchain
                .available_devices(xcode, sdk)
                .await
                .map_err(|e| e.to_string())?;

            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "devices": devices }));
            } else if devices.is_empty() {
                eprintln!("No devices reported");
            } else {
                for device in devices {
                    println!("{}", device);
                }
            }
        }
    }
    Ok(())
}
