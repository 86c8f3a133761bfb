//! Post-sync toolchain hooks
//!
//! After the dependency sync a small fixed set of toolchain pieces is
//! fetched, conditional on the host and target platforms. The sequence is
//! computed as data first so it can be inspected without spawning anything;
//! each step is an independent, non-retried subprocess and any failure is
//! fatal.

use std::path::Path;

use crate::depot::depot_tool;
use crate::platform::{TargetCpu, TargetOs};
use crate::process::{CommandSpec, EnvMap};
use crate::Result;

/// Entry point for storage-bucket downloads inside depot_tools
const DOWNLOAD_SCRIPT: &str = "third_party/depot_tools/download_from_google_storage.py";

/// A single file fetched from a Google Storage bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFetch {
    pub bucket: String,
    pub sha_file: Option<String>,
    pub checksum: Option<String>,
    pub extract: bool,
    pub output: Option<String>,
}

impl StorageFetch {
    /// The Windows resource compiler, hosted per build platform
    fn rc(sha_file: &str) -> Self {
        Self {
            bucket: "chromium-browser-clang/rc".to_string(),
            sha_file: Some(format!("build/toolchain/win/rc/{sha_file}")),
            checksum: None,
            extract: false,
            output: None,
        }
    }

    /// The dsymutil binary used to extract debug symbols on mac
    fn dsymutil(host_cpu: TargetCpu) -> Self {
        Self {
            bucket: "chromium-browser-clang".to_string(),
            sha_file: Some(format!(
                "tools/clang/dsymutil/bin/dsymutil.{host_cpu}.sha1"
            )),
            checksum: None,
            extract: false,
            output: Some("tools/clang/dsymutil/bin/dsymutil".to_string()),
        }
    }
}

/// One post-sync step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hook {
    /// Refresh the Visual Studio toolchain via the source tree's updater
    UpdateVsToolchain,
    /// Fetch a toolchain binary from a storage bucket
    Fetch(StorageFetch),
}

/// The hook sequence for a host/target combination
pub fn hook_plan(host_os: TargetOs, host_cpu: TargetCpu, target_os: TargetOs) -> Vec<Hook> {
    let mut hooks = Vec::new();

    if host_os == TargetOs::Win {
        hooks.push(Hook::UpdateVsToolchain);
    }

    match host_os {
        TargetOs::Linux => {
            if target_os == TargetOs::Win {
                hooks.push(Hook::Fetch(StorageFetch::rc("linux64/rc.sha1")));
            }
        }
        TargetOs::Mac => {
            hooks.push(Hook::Fetch(StorageFetch::dsymutil(host_cpu)));
            if target_os == TargetOs::Win {
                hooks.push(Hook::Fetch(StorageFetch::rc("mac/rc.sha1")));
            }
        }
        TargetOs::Win => {
            hooks.push(Hook::Fetch(StorageFetch::rc("win/rc.exe.sha1")));
        }
    }

    hooks
}

/// Argument list for the storage download script
pub fn storage_args(fetch: &StorageFetch) -> Vec<String> {
    let mut args = vec![
        DOWNLOAD_SCRIPT.to_string(),
        "--no_resume".to_string(),
        "--no_auth".to_string(),
        "--bucket".to_string(),
        fetch.bucket.clone(),
    ];
    if let Some(checksum) = &fetch.checksum {
        args.push(checksum.clone());
    }
    if let Some(sha_file) = &fetch.sha_file {
        args.push("-s".to_string());
        args.push(sha_file.clone());
    }
    if fetch.extract {
        args.push("--extract".to_string());
    }
    if let Some(output) = &fetch.output {
        args.push("-o".to_string());
        args.push(output.clone());
    }
    args
}

/// Run a hook sequence inside the source tree
pub fn run_hooks(src_dir: &Path, env: &EnvMap, host_os: TargetOs, hooks: &[Hook]) -> Result<()> {
    for hook in hooks {
        let python = depot_tool("python3", host_os, env)?;
        let spec = match hook {
            Hook::UpdateVsToolchain => CommandSpec::new(python)
                .args(["build/vs_toolchain.py", "update", "--force"]),
            Hook::Fetch(fetch) => CommandSpec::new(python).args(storage_args(fetch)),
        };
        spec.current_dir(src_dir).with_env(env).run()?;
    }
    Ok(())
}
