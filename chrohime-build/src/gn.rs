//! GN build-file generation
//!
//! Assembles the flag list for each build configuration and invokes the
//! external `gn` generator with it. Flag order is deterministic so repeated
//! invocations are reproducible: user extras first, then the base flags,
//! the optional goma overlay, and the configuration overlay, matching what
//! the generator has always been handed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::depot::depot_tool;
use crate::platform::{TargetCpu, TargetOs};
use crate::process::{CommandSpec, EnvMap};
use crate::{BuildError, Result};

/// Warning gn prints in tarball checkouts; benign, suppressed from output
const SUPPRESSED_WARNING: &str = ".gclient_entries missing";

/// A named preset of build flags with its own output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildConfig {
    Component,
    Release,
    Debug,
}

impl BuildConfig {
    pub const ALL: [BuildConfig; 3] = [
        BuildConfig::Component,
        BuildConfig::Release,
        BuildConfig::Debug,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuildConfig::Component => "Component",
            BuildConfig::Release => "Release",
            BuildConfig::Debug => "Debug",
        }
    }

    pub fn out_dir(&self) -> &'static str {
        match self {
            BuildConfig::Component => "out/Component",
            BuildConfig::Release => "out/Release",
            BuildConfig::Debug => "out/Debug",
        }
    }

    /// Flags layered on top of the base argument set
    pub fn overlay(&self, target_os: TargetOs) -> Vec<String> {
        match self {
            BuildConfig::Component => vec![
                "is_component_build=true".to_string(),
                "is_debug=false".to_string(),
            ],
            BuildConfig::Release => vec![
                "is_component_build=false".to_string(),
                "is_debug=false".to_string(),
                "chrome_pgo_phase=0".to_string(),
                "is_official_build=true".to_string(),
                // ThinLTO cuts link time a lot but still breaks rust
                // targets on mac.
                format!("use_thin_lto={}", target_os != TargetOs::Mac),
            ],
            BuildConfig::Debug => vec![
                "is_component_build=true".to_string(),
                "is_debug=true".to_string(),
            ],
        }
    }
}

impl FromStr for BuildConfig {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Component" => Ok(BuildConfig::Component),
            "Release" => Ok(BuildConfig::Release),
            "Debug" => Ok(BuildConfig::Debug),
            _ => Err(BuildError::UnknownConfig(s.to_string())),
        }
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distributed-build flags imported from the vendored goma config
#[derive(Debug, Clone)]
pub struct GomaOverlay {
    import_file: PathBuf,
}

impl GomaOverlay {
    pub fn vendored(root_dir: &Path) -> Self {
        Self {
            import_file: root_dir.join("vendor/build_tools/third_party/goma.gn"),
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            format!("import(\"{}\")", self.import_file.display()),
            "use_goma_thin_lto=true".to_string(),
        ]
    }
}

/// The full flag list handed to gn for one configuration
pub fn assemble_args(
    extra: &[String],
    target_cpu: TargetCpu,
    target_os: TargetOs,
    goma: Option<&GomaOverlay>,
    config: BuildConfig,
) -> Vec<String> {
    let mut args = extra.to_vec();
    args.push("enable_nacl=false".to_string());
    args.push(format!("target_cpu=\"{target_cpu}\""));
    args.push(format!("target_os=\"{target_os}\""));
    if let Some(goma) = goma {
        args.extend(goma.args());
    }
    args.extend(config.overlay(target_os));
    args
}

/// Filter one line of generator output
///
/// The suppressed warning is dropped entirely; everything else is printed
/// with trailing whitespace stripped.
pub fn filter_output_line(line: &str) -> Option<&str> {
    if line.contains(SUPPRESSED_WARNING) {
        None
    } else {
        Some(line.trim_end())
    }
}

/// How a non-zero generator exit is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Propagate the failure (default)
    Fatal,
    /// Print the output and carry on
    Tolerated,
}

/// Invokes gn once per requested configuration
pub struct GnRunner {
    src_dir: PathBuf,
    env: EnvMap,
    host: TargetOs,
    failure_mode: FailureMode,
}

impl GnRunner {
    pub fn new(src_dir: impl Into<PathBuf>, env: EnvMap, host: TargetOs) -> Self {
        Self {
            src_dir: src_dir.into(),
            env,
            host,
            failure_mode: FailureMode::Fatal,
        }
    }

    pub fn failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Run `gn gen` for one configuration with the given flag list
    pub fn generate(&self, config: BuildConfig, args: &[String]) -> Result<()> {
        let gn = depot_tool("gn", self.host, &self.env)?;
        let joined = args.join(" ");

        let output = CommandSpec::new(gn)
            .arg("gen")
            .arg(config.out_dir())
            .arg(format!("--args={joined}"))
            .current_dir(&self.src_dir)
            .with_env(&self.env)
            .capture()?;

        print_filtered(&output.stdout);
        print_filtered(&output.stderr);

        if self.failure_mode == FailureMode::Fatal && !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: format!("gn gen {}", config.out_dir()),
                status: output.status,
            });
        }
        Ok(())
    }
}

fn print_filtered(bytes: &[u8]) {
    for line in String::from_utf8_lossy(bytes).lines() {
        if let Some(line) = filter_output_line(line) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_on_mac_disables_thin_lto() {
        let args = assemble_args(&[], TargetCpu::Arm64, TargetOs::Mac, None, BuildConfig::Release);
        assert!(args.contains(&"is_official_build=true".to_string()));
        assert!(args.contains(&"chrome_pgo_phase=0".to_string()));
        assert!(args.contains(&"use_thin_lto=false".to_string()));
        assert!(!args.contains(&"use_thin_lto=true".to_string()));
    }

    #[test]
    fn release_elsewhere_enables_thin_lto() {
        for os in [TargetOs::Linux, TargetOs::Win] {
            let args = assemble_args(&[], TargetCpu::X64, os, None, BuildConfig::Release);
            assert!(args.contains(&"use_thin_lto=true".to_string()));
        }
    }

    #[test]
    fn goma_debug_carries_overlay_and_import() {
        let goma = GomaOverlay::vendored(Path::new("/repo"));
        let args = assemble_args(
            &[],
            TargetCpu::X64,
            TargetOs::Linux,
            Some(&goma),
            BuildConfig::Debug,
        );
        assert!(args.contains(&r#"import("/repo/vendor/build_tools/third_party/goma.gn")"#.to_string()));
        assert!(args.contains(&"use_goma_thin_lto=true".to_string()));
        assert!(args.contains(&"is_component_build=true".to_string()));
        assert!(args.contains(&"is_debug=true".to_string()));
    }

    #[test]
    fn user_extras_come_first_and_order_is_deterministic() {
        let extra = vec!["cc_wrapper=\"ccache\"".to_string()];
        let once = assemble_args(&extra, TargetCpu::X64, TargetOs::Linux, None, BuildConfig::Component);
        let twice = assemble_args(&extra, TargetCpu::X64, TargetOs::Linux, None, BuildConfig::Component);
        assert_eq!(once, twice);
        assert_eq!(once[0], "cc_wrapper=\"ccache\"");
        assert_eq!(
            once[1..4],
            [
                "enable_nacl=false".to_string(),
                "target_cpu=\"x64\"".to_string(),
                "target_os=\"linux\"".to_string(),
            ]
        );
    }

    #[test]
    fn configs_map_to_fixed_out_dirs() {
        assert_eq!(BuildConfig::Component.out_dir(), "out/Component");
        assert_eq!(BuildConfig::Release.out_dir(), "out/Release");
        assert_eq!(BuildConfig::Debug.out_dir(), "out/Debug");
    }

    #[test]
    fn config_names_round_trip() {
        for config in BuildConfig::ALL {
            assert_eq!(config.name().parse::<BuildConfig>().unwrap(), config);
        }
        assert!("release".parse::<BuildConfig>().is_err());
    }

    #[test]
    fn benign_warning_is_suppressed() {
        assert_eq!(
            filter_output_line("WARNING: .gclient_entries missing, using DEPS"),
            None
        );
        assert_eq!(filter_output_line("Done. Made 18233 targets.  "), Some("Done. Made 18233 targets."));
        // Leading whitespace survives; only the trailing side is stripped.
        assert_eq!(filter_output_line("  indented line\t"), Some("  indented line"));
    }
}
