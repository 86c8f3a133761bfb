//! Target platform identification
//!
//! Host-reported platform strings are normalized into the small closed set
//! of labels the Chromium build understands: `linux`/`mac`/`win` for the
//! operating system and `x64`/`arm64`/`arm` for the CPU.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::{BuildError, Result};

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    Mac,
    Win,
}

/// Target CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCpu {
    X64,
    Arm64,
    Arm,
}

impl TargetOs {
    /// Detect the operating system of the build host
    pub fn host() -> Result<Self> {
        match env::consts::OS {
            "linux" => Ok(TargetOs::Linux),
            "macos" => Ok(TargetOs::Mac),
            "windows" => Ok(TargetOs::Win),
            other => Err(BuildError::UnsupportedOs(other.to_string())),
        }
    }

    /// Canonical GN label
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Mac => "mac",
            TargetOs::Win => "win",
        }
    }
}

impl TargetCpu {
    /// Detect the CPU architecture of the build host
    pub fn host() -> Result<Self> {
        match env::consts::ARCH {
            "x86_64" => Ok(TargetCpu::X64),
            "aarch64" => Ok(TargetCpu::Arm64),
            "arm" => Ok(TargetCpu::Arm),
            other => Err(BuildError::UnsupportedCpu(other.to_string())),
        }
    }

    /// Canonical GN label
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCpu::X64 => "x64",
            TargetCpu::Arm64 => "arm64",
            TargetCpu::Arm => "arm",
        }
    }
}

impl FromStr for TargetOs {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(TargetOs::Linux),
            "mac" | "macos" | "darwin" => Ok(TargetOs::Mac),
            "win" | "windows" => Ok(TargetOs::Win),
            _ => Err(BuildError::UnsupportedOs(s.to_string())),
        }
    }
}

impl FromStr for TargetCpu {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        let arch = s.to_ascii_lowercase();
        match arch.as_str() {
            "amd64" | "x86_64" | "x64" => Ok(TargetCpu::X64),
            "arm64" | "aarch64" => Ok(TargetCpu::Arm64),
            // Covers armv7 and friends, matching 32-bit ARM hosts.
            _ if arch.starts_with("arm") => Ok(TargetCpu::Arm),
            _ => Err(BuildError::UnsupportedCpu(s.to_string())),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TargetCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_aliases_normalize() {
        for s in ["linux", "Linux"] {
            assert_eq!(s.parse::<TargetOs>().unwrap(), TargetOs::Linux);
        }
        for s in ["mac", "macos", "darwin"] {
            assert_eq!(s.parse::<TargetOs>().unwrap(), TargetOs::Mac);
        }
        for s in ["win", "windows", "WIN"] {
            assert_eq!(s.parse::<TargetOs>().unwrap(), TargetOs::Win);
        }
    }

    #[test]
    fn unknown_os_is_rejected() {
        let err = "freebsd".parse::<TargetOs>().unwrap_err();
        assert!(err.to_string().contains("freebsd"));
    }

    #[test]
    fn cpu_aliases_normalize() {
        for s in ["amd64", "AMD64", "x86_64", "x64"] {
            assert_eq!(s.parse::<TargetCpu>().unwrap(), TargetCpu::X64);
        }
        for s in ["arm64", "aarch64", "ARM64"] {
            assert_eq!(s.parse::<TargetCpu>().unwrap(), TargetCpu::Arm64);
        }
        for s in ["arm", "armv7", "armv7l"] {
            assert_eq!(s.parse::<TargetCpu>().unwrap(), TargetCpu::Arm);
        }
    }

    #[test]
    fn unknown_cpu_is_rejected() {
        assert!("mips".parse::<TargetCpu>().is_err());
        assert!("riscv64".parse::<TargetCpu>().is_err());
    }

    #[test]
    fn host_resolves_to_one_canonical_label() {
        // Hosts this crate builds on are all in the closed set.
        let os = TargetOs::host().unwrap();
        assert!(["linux", "mac", "win"].contains(&os.as_str()));
        let cpu = TargetCpu::host().unwrap();
        assert!(["x64", "arm64", "arm"].contains(&cpu.as_str()));
    }
}
