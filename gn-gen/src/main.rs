//! Generate GN build configs
//!
//! Invokes the gn generator once per requested configuration (or all of
//! Component/Release/Debug) with the assembled flag list.

use std::env;

use anyhow::Result;
use clap::Parser;

use chrohime_build::depot;
use chrohime_build::gn::{self, BuildConfig, FailureMode, GnRunner, GomaOverlay};
use chrohime_build::platform::{TargetCpu, TargetOs};

#[derive(Parser)]
#[command(version, about = "Generate GN build config")]
struct Cli {
    /// Target CPU architecture
    #[arg(long)]
    target_cpu: Option<TargetCpu>,

    /// Target operating system (win, mac, or linux)
    #[arg(long)]
    target_os: Option<TargetOs>,

    /// Pass arguments to GN
    #[arg(long = "arg", value_name = "FLAG")]
    extra_args: Vec<String>,

    /// Build with GOMA
    #[arg(long)]
    goma: bool,

    /// Which config to generate (Component, Release or Debug)
    #[arg(long)]
    config: Option<BuildConfig>,

    /// Keep going when gn exits non-zero
    #[arg(long)]
    lenient: bool,
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let root_dir = env::current_dir()?;
    let src_dir = root_dir.join("src");

    let host_os = TargetOs::host()?;
    let target_os = cli.target_os.unwrap_or(host_os);
    let target_cpu = match cli.target_cpu {
        Some(cpu) => cpu,
        None => TargetCpu::host()?,
    };

    let env_map = depot::gn_env(&root_dir, &src_dir);
    let goma = if cli.goma {
        Some(GomaOverlay::vendored(&root_dir))
    } else {
        None
    };

    let failure_mode = if cli.lenient {
        FailureMode::Tolerated
    } else {
        FailureMode::Fatal
    };
    let runner = GnRunner::new(&src_dir, env_map, host_os).failure_mode(failure_mode);

    let configs = match cli.config {
        Some(config) => vec![config],
        None => BuildConfig::ALL.to_vec(),
    };
    for config in configs {
        let args = gn::assemble_args(&cli.extra_args, target_cpu, target_os, goma.as_ref(), config);
        runner.generate(config, &args)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_args_accumulate_in_order() {
        let cli = Cli::try_parse_from([
            "gn-gen",
            "--arg",
            "cc_wrapper=\"ccache\"",
            "--arg",
            "use_sysroot=false",
        ])
        .unwrap();
        assert_eq!(
            cli.extra_args,
            ["cc_wrapper=\"ccache\"", "use_sysroot=false"]
        );
    }

    #[test]
    fn config_accepts_the_three_presets() {
        for (name, config) in [
            ("Component", BuildConfig::Component),
            ("Release", BuildConfig::Release),
            ("Debug", BuildConfig::Debug),
        ] {
            let cli = Cli::try_parse_from(["gn-gen", "--config", name]).unwrap();
            assert_eq!(cli.config, Some(config));
        }
    }

    #[test]
    fn unknown_config_is_a_parse_error() {
        assert!(Cli::try_parse_from(["gn-gen", "--config", "Profile"]).is_err());
    }

    #[test]
    fn goma_and_lenient_default_off() {
        let cli = Cli::try_parse_from(["gn-gen"]).unwrap();
        assert!(!cli.goma);
        assert!(!cli.lenient);
        assert!(cli.config.is_none());
    }
}
