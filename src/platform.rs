// src/platform.rs

//! Host platform probing
//!
//! Determines the OS family and whether the CPU advertises the BMI
//! bit-manipulation extensions. Prebuilt packages are published per OS and
//! per BMI tier, so both answers gate package selection.

use crate::error::{Error, Result};
use std::fmt;
use std::process::Command;
use tracing::{debug, warn};

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Darwin,
}

impl OsFamily {
    /// Tag used in catalog package names
    pub fn tag(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Darwin => "darwin",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => write!(f, "Linux"),
            OsFamily::Darwin => write!(f, "macOS"),
        }
    }
}

/// Host characteristics relevant to package selection, computed once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostProfile {
    pub os: OsFamily,
    pub bmi: bool,
}

impl HostProfile {
    /// Feature tier tag the catalog uses for this host's BMI support
    pub fn feature_tier(&self) -> &'static str {
        if self.bmi { "bmi2-1" } else { "bmi2-0" }
    }
}

impl fmt::Display for HostProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, BMI {}",
            self.os,
            if self.bmi { "supported" } else { "not supported" }
        )
    }
}

/// Probe the running machine
///
/// Fails with [`Error::UnsupportedPlatform`] when the OS is neither Linux nor
/// macOS. BMI detection failures degrade to `bmi = false` rather than
/// aborting the run.
pub fn probe() -> Result<HostProfile> {
    let os = match std::env::consts::OS {
        "linux" => OsFamily::Linux,
        "macos" => OsFamily::Darwin,
        other => return Err(Error::UnsupportedPlatform(other.to_string())),
    };

    let bmi = match os {
        OsFamily::Linux => linux_has_bmi(),
        OsFamily::Darwin => darwin_has_bmi(),
    };

    debug!("host profile: os={} bmi={}", os.tag(), bmi);
    Ok(HostProfile { os, bmi })
}

/// Case-insensitive BMI marker search in a CPU feature string
fn feature_string_has_bmi(features: &str) -> bool {
    features.to_lowercase().contains("bmi")
}

/// Inspect the kernel-exposed CPU flags
fn linux_has_bmi() -> bool {
    match std::fs::read_to_string("/proc/cpuinfo") {
        Ok(cpuinfo) => cpuinfo_has_bmi(&cpuinfo),
        Err(e) => {
            warn!("could not read /proc/cpuinfo, assuming no BMI support: {}", e);
            false
        }
    }
}

/// Only the flags lines carry instruction-set extensions
fn cpuinfo_has_bmi(cpuinfo: &str) -> bool {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("flags") || line.starts_with("Features"))
        .any(feature_string_has_bmi)
}

/// Inspect the CPU feature string exposed through sysctl
fn darwin_has_bmi() -> bool {
    match Command::new("sysctl")
        .args(["-n", "machdep.cpu.features"])
        .output()
    {
        Ok(output) if output.status.success() => {
            feature_string_has_bmi(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            warn!(
                "sysctl exited with {}, assuming no BMI support",
                output.status
            );
            false
        }
        Err(e) => {
            warn!("could not run sysctl, assuming no BMI support: {}", e);
            false
        }
    }
}
