//! Shared build logic for the chrohime bootstrap tools
//!
//! Everything both entry points need: platform identification, the explicit
//! environment/process-spawning layer, depot_tools environment profiles,
//! source tarball acquisition, the gclient sync driver, post-sync toolchain
//! hooks, and GN argument assembly.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub mod depot;
pub mod gn;
pub mod hooks;
pub mod platform;
pub mod process;
pub mod source;
pub mod sync;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Unsupported platform: {0}")]
    UnsupportedOs(String),

    #[error("Unrecognized CPU architecture: {0}")]
    UnsupportedCpu(String),

    #[error("Not a tarball URL: {0}")]
    InvalidTarballUrl(String),

    #[error("Unable to download tarball since {} exists.", .0.display())]
    StagingDirExists(PathBuf),

    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{command} failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Invalid PATH entry: {0}")]
    InvalidPath(String),

    #[error("Unknown build config: {0} (expected Component, Release or Debug)")]
    UnknownConfig(String),

    #[error("Download failed: {0}")]
    Download(#[from] Box<ureq::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for BuildError {
    fn from(err: ureq::Error) -> Self {
        BuildError::Download(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
