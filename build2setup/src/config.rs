use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arch::CudaCapability;

/// A parsed `build.toml` manifest.
///
/// Extensions are kept in a sorted map so generated output is stable.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Build {
    pub general: General,
    pub torch: Option<Torch>,

    #[serde(rename = "extension", default)]
    pub extensions: BTreeMap<String, Extension>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct General {
    pub name: String,
    pub description: Option<String>,
    pub python_requires: Option<String>,
    pub python_depends: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Torch {
    /// Directory names excluded from Python package discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One compiled extension module. Paths are relative to the manifest's
/// directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Extension {
    pub src: Vec<String>,
    pub include: Option<Vec<String>>,
    pub cuda_capabilities: Option<Vec<String>>,

    #[serde(default = "default_cxx_flags")]
    pub cxx_flags: Vec<String>,
    #[serde(default = "default_nvcc_flags")]
    pub nvcc_flags: Vec<String>,
}

fn default_cxx_flags() -> Vec<String> {
    ["-O3", "-std=c++17"].map(String::from).into()
}

fn default_nvcc_flags() -> Vec<String> {
    [
        "-O3",
        "-std=c++17",
        "-U__CUDA_NO_HALF_OPERATORS__",
        "-U__CUDA_NO_HALF_CONVERSIONS__",
        "-U__CUDA_NO_HALF2_OPERATORS__",
        "-U__CUDA_NO_BFLOAT16_CONVERSIONS__",
        "--expt-relaxed-constexpr",
        "--expt-extended-lambda",
        "--use_fast_math",
        "-lineinfo",
        "--ptxas-options=-v",
        "--ptxas-options=-O2",
    ]
    .map(String::from)
    .into()
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest declares no extension modules")]
    NoExtensions,
    #[error("extension `{ext}`: source file does not exist: {}", path.display())]
    MissingSource { ext: String, path: PathBuf },
    #[error("extension `{ext}`: include directory does not exist: {}", path.display())]
    MissingInclude { ext: String, path: PathBuf },
    #[error("extension `{ext}`: invalid compute capability `{value}`: {reason}")]
    InvalidCapability {
        ext: String,
        value: String,
        reason: String,
    },
}

impl Build {
    /// Check the manifest against the files on disk. Sources and include
    /// directories are resolved relative to `manifest_dir`.
    pub fn validate(&self, manifest_dir: &Path) -> Vec<ManifestError> {
        let mut issues = Vec::new();

        if self.extensions.is_empty() {
            issues.push(ManifestError::NoExtensions);
        }

        for (name, extension) in &self.extensions {
            for src in &extension.src {
                let path = manifest_dir.join(src);
                if !path.is_file() {
                    issues.push(ManifestError::MissingSource {
                        ext: name.clone(),
                        path,
                    });
                }
            }

            for include in extension.include.iter().flatten() {
                let path = manifest_dir.join(include);
                if !path.is_dir() {
                    issues.push(ManifestError::MissingInclude {
                        ext: name.clone(),
                        path,
                    });
                }
            }

            for capability in extension.cuda_capabilities.iter().flatten() {
                if let Err(err) = capability.parse::<CudaCapability>() {
                    issues.push(ManifestError::InvalidCapability {
                        ext: name.clone(),
                        value: capability.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        issues
    }
}
