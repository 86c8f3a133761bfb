//! Dependency synchronization
//!
//! Drives the external `gclient` client to populate the third-party deps
//! declared in the source tree's DEPS manifest. The checkout-specific
//! behavior lives in a [`SyncPolicy`] injected into the driver: what the
//! solutions file says, which dependency classes the client must skip, and
//! which package-manager roots run their own update pass afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::depot::depot_tool;
use crate::platform::{TargetCpu, TargetOs};
use crate::process::{CommandSpec, EnvMap};
use crate::Result;

/// Client-level toggles for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Bound on the client's parallel fetch workers
    pub jobs: u32,
    /// Suppress DEPS hooks
    pub nohooks: bool,
    /// Suppress pre-sync hooks
    pub noprehooks: bool,
    /// Shallow history for anything the client does fetch
    pub no_history: bool,
    pub verbose: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            jobs: 12,
            nohooks: true,
            noprehooks: true,
            no_history: true,
            verbose: false,
        }
    }
}

/// What a checkout needs from the sync client
///
/// Checkout flavors differ in how the client must treat the source tree,
/// not in how it is driven. The policy supplies those differences
/// explicitly instead of overriding client internals.
pub trait SyncPolicy {
    /// Contents of the `.gclient` solutions file
    fn solutions(&self) -> String;

    /// Dependency classes the client must not touch
    fn ignored_dep_types(&self) -> &[&'static str];

    /// Package-manager roots that perform their own update pass after the
    /// main sync
    fn package_roots(&self, src_dir: &Path) -> Vec<Box<dyn PackageRoot>>;
}

/// Policy for tarball checkouts
///
/// Git dependencies are already bundled in the source tarball, so the
/// client must leave them alone; cipd packages are not bundled and get
/// refreshed through the cipd root.
#[derive(Debug, Clone)]
pub struct TarballPolicy {
    pub target_os: TargetOs,
    pub target_cpu: TargetCpu,
}

impl SyncPolicy for TarballPolicy {
    fn solutions(&self) -> String {
        format!(
            r#"solutions = [
  {{
    "name": "src",
    "url": None,
    "deps_file": "DEPS",
    "managed": True,
    "custom_deps": {{}},
    "custom_vars": {{}},
  }},
]
target_os = ["{os}"]
target_cpu = ["{cpu}"]
"#,
            os = self.target_os,
            cpu = self.target_cpu
        )
    }

    fn ignored_dep_types(&self) -> &[&'static str] {
        &["git"]
    }

    fn package_roots(&self, src_dir: &Path) -> Vec<Box<dyn PackageRoot>> {
        vec![Box::new(CipdRoot::new(src_dir))]
    }
}

/// A package-manager root inside the checkout
pub trait PackageRoot {
    fn name(&self) -> &'static str;

    /// Whether the root exists on disk after the main sync
    fn is_present(&self) -> bool;

    /// Run the root's own update pass
    fn update(&self, host: TargetOs, env: &EnvMap) -> Result<()>;
}

/// The cipd package root under the source tree
pub struct CipdRoot {
    root: PathBuf,
}

impl CipdRoot {
    pub fn new(src_dir: &Path) -> Self {
        Self {
            root: src_dir.to_path_buf(),
        }
    }
}

impl PackageRoot for CipdRoot {
    fn name(&self) -> &'static str {
        "cipd"
    }

    fn is_present(&self) -> bool {
        self.root.join(".cipd").is_dir()
    }

    fn update(&self, host: TargetOs, env: &EnvMap) -> Result<()> {
        let cipd = depot_tool("cipd", host, env)?;
        CommandSpec::new(cipd)
            .arg("ensure")
            .arg("-root")
            .arg(&self.root)
            .arg("-ensure-file")
            .arg(self.root.join(".cipd/ensure"))
            .with_env(env)
            .run()
    }
}

/// Drives one full dependency sync for a checkout
pub struct SyncDriver<P> {
    policy: P,
    options: SyncOptions,
    env: EnvMap,
    src_dir: PathBuf,
}

impl<P: SyncPolicy> SyncDriver<P> {
    pub fn new(policy: P, options: SyncOptions, env: EnvMap, src_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            options,
            env,
            src_dir: src_dir.into(),
        }
    }

    /// The gclient argument list for the main sync
    pub fn sync_args(&self) -> Vec<String> {
        let mut args = vec![
            "sync".to_string(),
            "--jobs".to_string(),
            self.options.jobs.to_string(),
        ];
        if self.options.nohooks {
            args.push("--nohooks".to_string());
        }
        if self.options.noprehooks {
            args.push("--noprehooks".to_string());
        }
        if self.options.no_history {
            args.push("--no-history".to_string());
        }
        if self.options.verbose {
            args.push("--verbose".to_string());
        }
        for dep_type in self.policy.ignored_dep_types() {
            args.push(format!("--ignore_dep_type={dep_type}"));
        }
        args
    }

    /// Directory holding the `.gclient` file, one level above the source
    fn checkout_root(&self) -> &Path {
        match self.src_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Write the solutions file the client reads its configuration from
    pub fn write_solutions(&self) -> Result<PathBuf> {
        let path = self.checkout_root().join(".gclient");
        fs::write(&path, self.policy.solutions())?;
        Ok(path)
    }

    /// Run the main sync
    pub fn sync(&self, host: TargetOs) -> Result<()> {
        self.write_solutions()?;
        let gclient = depot_tool("gclient", host, &self.env)?;
        CommandSpec::new(gclient)
            .args(self.sync_args())
            .current_dir(self.checkout_root())
            .with_env(&self.env)
            .run()
    }

    /// Let each present package root update itself
    pub fn update_package_roots(&self, host: TargetOs) -> Result<()> {
        for root in self.policy.package_roots(&self.src_dir) {
            if root.is_present() {
                println!("Updating {} packages...", root.name());
                root.update(host, &self.env)?;
            }
        }
        Ok(())
    }
}
