//! depot_tools environment profiles
//!
//! Both entry points talk to depot_tools binaries, but with different
//! environments: the bootstrapper syncs against the depot_tools checkout
//! bundled in the source tarball and wants the Windows toolchain fetched,
//! while the GN wrapper uses the vendored depot_tools next to this repo and
//! leaves the Windows toolchain alone.

use std::path::Path;

use crate::platform::TargetOs;
use crate::process::{resolve_tool, wrapper_name, CommandSpec, EnvMap};
use crate::Result;

/// Base URL the Windows toolchain is mirrored at (required for reclient)
const WIN_TOOLCHAIN_BASE_URL: &str = "https://dev-cdn.electronjs.org/windows-toolchains/_";

/// MSVS toolchain hashes, keyed by the GYP_MSVS_HASH_* suffix
const WIN_TOOLCHAIN_HASHES: [(&str, &str); 2] = [
    ("GYP_MSVS_HASH_27370823e7", "28622d16b1"),
    ("GYP_MSVS_HASH_7393122652", "3ba76c5c20"),
];

/// Environment for the tarball bootstrapper
///
/// Uses the depot_tools and ninja checkouts inside the source tree and
/// enables the hermetic Windows toolchain download.
pub fn bootstrap_env(src_dir: &Path) -> Result<EnvMap> {
    let src_dir = if src_dir.is_absolute() {
        src_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(src_dir)
    };

    let mut env = EnvMap::new();
    env.set("DEPOT_TOOLS_UPDATE", "0");
    env.set("CHROMIUM_BUILDTOOLS_PATH", src_dir.join("buildtools"));
    env.prepend_path(src_dir.join("third_party/ninja"));
    env.prepend_path(src_dir.join("third_party/depot_tools"));

    env.set("DEPOT_TOOLS_WIN_TOOLCHAIN", "1");
    env.set("DEPOT_TOOLS_WIN_TOOLCHAIN_BASE_URL", WIN_TOOLCHAIN_BASE_URL);
    for (key, hash) in WIN_TOOLCHAIN_HASHES {
        env.set(key, hash);
    }
    Ok(env)
}

/// Environment for the GN wrapper
///
/// Uses the vendored depot_tools next to this repository and disables the
/// Windows toolchain machinery.
pub fn gn_env(root_dir: &Path, src_dir: &Path) -> EnvMap {
    let mut env = EnvMap::new();
    env.set("DEPOT_TOOLS_UPDATE", "0");
    env.set("DEPOT_TOOLS_WIN_TOOLCHAIN", "0");
    env.set("CHROMIUM_BUILDTOOLS_PATH", src_dir.join("buildtools"));
    env.prepend_path(src_dir.join("third_party/ninja"));
    env.prepend_path(root_dir.join("vendor/depot_tools"));
    env
}

/// One-time depot_tools setup on a Windows host
///
/// depot_tools ships its Windows binaries through a bootstrap batch file
/// that must run before gclient is usable.
pub fn bootstrap_win_tools(src_dir: &Path, env: &EnvMap) -> Result<()> {
    let win_tools = src_dir.join("third_party/depot_tools/bootstrap/win_tools.bat");
    CommandSpec::new(win_tools).with_env(env).run()
}

/// Resolve a depot_tools wrapper (gclient, gn, cipd, ...) for the host
pub fn depot_tool(base: &str, host: TargetOs, env: &EnvMap) -> Result<std::path::PathBuf> {
    resolve_tool(&wrapper_name(base, host), env)
}
