//! Bootstrap a chrohime checkout
//!
//! Downloads the Chromium source tarball for a revision (or an explicit
//! URL), syncs the third-party dependencies with gclient and fetches the
//! platform toolchain pieces.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use chrohime_build::depot;
use chrohime_build::hooks;
use chrohime_build::platform::{TargetCpu, TargetOs};
use chrohime_build::source;
use chrohime_build::sync::{SyncDriver, SyncOptions, TarballPolicy};

#[derive(Parser, Debug)]
#[command(version, about = "Bootstrap the chrohime source checkout")]
struct Cli {
    /// The revision to checkout
    #[arg(long, conflicts_with = "tarball_url")]
    revision: Option<String>,

    /// Path to Chromium source tarball
    #[arg(long)]
    tarball_url: Option<String>,

    /// The path of src dir
    #[arg(long, default_value = "./src")]
    src_dir: PathBuf,

    /// Target CPU architecture
    #[arg(long)]
    target_cpu: Option<TargetCpu>,

    /// Target operating system (win, mac, or linux)
    #[arg(long)]
    target_os: Option<TargetOs>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Validated before anything touches the network or the filesystem.
    let Some(tarball_url) =
        source::resolve_tarball_url(cli.revision.as_deref(), cli.tarball_url.as_deref())
    else {
        println!("Must specify either --revision or --tarball-url.");
        return ExitCode::FAILURE;
    };

    match run(&cli, &tarball_url) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, tarball_url: &str) -> Result<()> {
    source::acquire(&cli.src_dir, tarball_url)?;

    let host_os = TargetOs::host()?;
    let host_cpu = TargetCpu::host()?;
    let target_os = cli.target_os.unwrap_or(host_os);
    let target_cpu = cli.target_cpu.unwrap_or(host_cpu);

    let env = depot::bootstrap_env(&cli.src_dir)?;
    if host_os == TargetOs::Win {
        depot::bootstrap_win_tools(&cli.src_dir, &env)?;
    }

    let policy = TarballPolicy {
        target_os,
        target_cpu,
    };
    let driver = SyncDriver::new(policy, SyncOptions::default(), env.clone(), &cli.src_dir);
    driver.sync(host_os)?;
    driver.update_package_roots(host_os)?;

    let plan = hooks::hook_plan(host_os, host_cpu, target_os);
    hooks::run_hooks(&cli.src_dir, &env, host_os, &plan)?;

    Ok(())
}
