//! End-to-end planning behavior shared by the two CLI tools

use std::fs;
use std::path::Path;

use chrohime_build::depot;
use chrohime_build::gn::{self, BuildConfig, GomaOverlay};
use chrohime_build::hooks::{self, Hook};
use chrohime_build::platform::{TargetCpu, TargetOs};
use chrohime_build::source;
use chrohime_build::sync::{SyncDriver, SyncOptions, SyncPolicy, TarballPolicy};
use tempfile::TempDir;

#[test]
fn existing_checkout_is_left_alone() {
    let tmp = TempDir::new().unwrap();
    let src_dir = tmp.path().join("src");
    fs::create_dir(&src_dir).unwrap();
    fs::write(src_dir.join("DEPS"), "deps").unwrap();

    // The URL is unreachable on purpose: with an existing source dir the
    // acquisition must finish without any download.
    source::acquire(&src_dir, "https://invalid.example/chromium-1.tar.xz").unwrap();

    assert_eq!(fs::read_to_string(src_dir.join("DEPS")).unwrap(), "deps");
    assert!(!tmp.path().join("chromium-1").exists());
}

#[test]
fn cross_compiling_windows_from_linux_is_fully_planned() {
    let src_dir = Path::new("/checkout/src");

    let env = depot::bootstrap_env(src_dir).unwrap();
    assert!(env
        .vars()
        .any(|(k, _)| k == std::ffi::OsStr::new("DEPOT_TOOLS_WIN_TOOLCHAIN")));

    let policy = TarballPolicy {
        target_os: TargetOs::Win,
        target_cpu: TargetCpu::X64,
    };
    assert!(policy.solutions().contains(r#"target_os = ["win"]"#));

    let driver = SyncDriver::new(policy, SyncOptions::default(), env, src_dir);
    let args = driver.sync_args();
    assert_eq!(args[0], "sync");
    assert!(args.contains(&"--ignore_dep_type=git".to_string()));

    let plan = hooks::hook_plan(TargetOs::Linux, TargetCpu::X64, TargetOs::Win);
    assert_eq!(plan.len(), 1);
    assert!(matches!(&plan[0], Hook::Fetch(fetch)
        if fetch.sha_file.as_deref() == Some("build/toolchain/win/rc/linux64/rc.sha1")));
}

#[test]
fn default_generation_covers_all_three_configs() {
    let goma = GomaOverlay::vendored(Path::new("/repo"));

    let mut out_dirs = Vec::new();
    for config in BuildConfig::ALL {
        let args = gn::assemble_args(
            &["use_sysroot=false".to_string()],
            TargetCpu::Arm64,
            TargetOs::Linux,
            Some(&goma),
            config,
        );
        // Every configuration shares the base flags and the goma overlay.
        assert_eq!(args[0], "use_sysroot=false");
        assert!(args.contains(&"enable_nacl=false".to_string()));
        assert!(args.contains(&"target_cpu=\"arm64\"".to_string()));
        assert!(args.contains(&"target_os=\"linux\"".to_string()));
        assert!(args.contains(&"use_goma_thin_lto=true".to_string()));
        out_dirs.push(config.out_dir());
    }

    assert_eq!(out_dirs, ["out/Component", "out/Release", "out/Debug"]);
}

#[test]
fn release_overlay_differs_per_target_os() {
    let mac = gn::assemble_args(&[], TargetCpu::Arm64, TargetOs::Mac, None, BuildConfig::Release);
    let win = gn::assemble_args(&[], TargetCpu::Arm64, TargetOs::Win, None, BuildConfig::Release);

    assert!(mac.contains(&"use_thin_lto=false".to_string()));
    assert!(win.contains(&"use_thin_lto=true".to_string()));
    for args in [&mac, &win] {
        assert!(args.contains(&"is_official_build=true".to_string()));
        assert!(args.contains(&"chrome_pgo_phase=0".to_string()));
    }
}
