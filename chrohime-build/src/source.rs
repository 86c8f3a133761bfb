//! Source tarball acquisition
//!
//! The Chromium source snapshot comes from a released tarball rather than a
//! git checkout. Acquisition is idempotent: an existing source directory is
//! left alone, otherwise the archive is streamed, extracted next to the
//! target and renamed into place.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tar::Archive;
use xz2::read::XzDecoder;

use crate::{BuildError, Result};

/// Release bucket the per-revision source tarballs are published to
pub const TARBALL_BASE_URL: &str =
    "https://github.com/chrohime/chromium_source_tarball/releases/download";

/// Tarball URL for a Chromium revision, e.g. `119.0.6045.0`
pub fn tarball_url_for_revision(revision: &str) -> String {
    format!("{TARBALL_BASE_URL}/{revision}/chromium-{revision}.tar.xz")
}

/// Pick the tarball URL from the CLI inputs
///
/// A revision derives the released tarball URL and takes precedence over an
/// explicit URL. `None` means the caller passed neither.
pub fn resolve_tarball_url(revision: Option<&str>, tarball_url: Option<&str>) -> Option<String> {
    match (revision, tarball_url) {
        (Some(revision), _) => Some(tarball_url_for_revision(revision)),
        (None, Some(url)) => Some(url.to_string()),
        (None, None) => None,
    }
}

/// Name of the archive's top-level directory: the URL basename minus `.tar.xz`
pub fn staging_dir_name(url: &str) -> Result<String> {
    let basename = url.rsplit('/').next().unwrap_or(url);
    basename
        .strip_suffix(".tar.xz")
        .map(str::to_string)
        .ok_or_else(|| BuildError::InvalidTarballUrl(url.to_string()))
}

/// What acquisition will do, decided before any side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquirePlan {
    /// Source directory already exists; nothing to download
    AlreadyPresent,
    /// Download and extract, staging at `staging_dir` before the rename
    Download { url: String, staging_dir: PathBuf },
}

/// Decide whether the source tree needs to be downloaded
///
/// Fails if the staging directory already exists: extracting over an
/// unrelated directory would be destructive.
pub fn plan_acquisition(src_dir: &Path, url: &str) -> Result<AcquirePlan> {
    if src_dir.is_dir() {
        return Ok(AcquirePlan::AlreadyPresent);
    }
    let staging_dir = staging_parent(src_dir).join(staging_dir_name(url)?);
    if staging_dir.exists() {
        return Err(BuildError::StagingDirExists(staging_dir));
    }
    Ok(AcquirePlan::Download {
        url: url.to_string(),
        staging_dir,
    })
}

fn staging_parent(src_dir: &Path) -> &Path {
    match src_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Populate `src_dir` from the tarball at `url`, if it is not there already
pub fn acquire(src_dir: &Path, url: &str) -> Result<()> {
    let (url, staging_dir) = match plan_acquisition(src_dir, url)? {
        AcquirePlan::AlreadyPresent => return Ok(()),
        AcquirePlan::Download { url, staging_dir } => (url, staging_dir),
    };

    let extract_path = staging_parent(src_dir);
    fs::create_dir_all(extract_path)?;

    let staging_name = staging_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    print!("Download and extract {staging_name}");
    std::io::stdout().flush()?;

    let response = ureq::get(&url).call()?;
    extract_tarball(response.into_reader(), extract_path)?;
    println!("Done");

    fs::rename(&staging_dir, src_dir)?;
    Ok(())
}

/// Extract an xz-compressed tar stream into `extract_path`
///
/// Individual members that cannot be materialized (the tarball carries
/// linux symbolic links that may not exist on this platform) are skipped;
/// only a broken archive stream is fatal.
pub fn extract_tarball(reader: impl Read, extract_path: &Path) -> Result<()> {
    let decoder = XzDecoder::new(reader);
    let mut archive = Archive::new(decoder);

    for (index, entry) in archive.entries()?.enumerate() {
        if (index + 1) % 5000 == 0 {
            print!(".");
            std::io::stdout().flush()?;
        }
        let mut entry = entry?;
        let _ = entry.unpack_in(extract_path);
    }
    Ok(())
}
