use std::env;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use eyre::{ensure, eyre, Context, Report, Result};

/// CUDA toolkit version as reported by `nvcc -V`.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct CudaVersion {
    pub major: u32,
    pub minor: u32,
}

impl Display for CudaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for CudaVersion {
    type Err = Report;

    fn from_str(version: &str) -> Result<Self> {
        let version = version.trim();
        ensure!(!version.is_empty(), "empty CUDA version string");

        let mut parts_iter = version.split('.');
        let major = parts_iter
            .next()
            .ok_or_else(|| eyre!("version does not contain a major component: {version}"))?
            .parse()
            .with_context(|| format!("version must consist of numbers: {version}"))?;
        let minor = parts_iter
            .next()
            .map(|part| part.parse())
            .unwrap_or(Ok(0))
            .with_context(|| format!("cannot parse minor version in: {version}"))?;

        ensure!(
            parts_iter.next().is_none(),
            "version contains more than two components: {version}"
        );

        Ok(CudaVersion { major, minor })
    }
}

/// Locate the `release` token in an `nvcc -V` banner and parse the following
/// comma-delimited token as a version.
pub fn parse_release_banner(banner: &str) -> Result<CudaVersion> {
    let mut tokens = banner.split_whitespace();
    tokens
        .find(|token| *token == "release")
        .ok_or_else(|| eyre!("no `release` token in nvcc output"))?;
    let version = tokens
        .next()
        .ok_or_else(|| eyre!("nvcc output ends after the `release` token"))?;
    version.trim_end_matches(',').parse()
}

/// CUDA installation root: `CUDA_HOME`, then `CUDA_PATH`, then the
/// conventional `/usr/local/cuda`.
pub fn toolkit_root() -> PathBuf {
    env::var_os("CUDA_HOME")
        .or_else(|| env::var_os("CUDA_PATH"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/usr/local/cuda"))
}

/// Query `<root>/bin/nvcc -V` for the installed toolkit version.
///
/// Flag selection is driven entirely by the manifest; nothing in generation
/// consults this.
pub fn bare_metal_version(root: &Path) -> Result<CudaVersion> {
    let nvcc = root.join("bin").join("nvcc");
    let output = Command::new(&nvcc)
        .arg("-V")
        .output()
        .wrap_err_with(|| format!("Cannot run {}", nvcc.display()))?;
    ensure!(
        output.status.success(),
        "{} -V failed with {}",
        nvcc.display(),
        output.status
    );
    parse_release_banner(&String::from_utf8_lossy(&output.stdout))
}
