pub mod arch;
pub mod config;
pub mod nvcc;
pub mod torch;

#[cfg(test)]
mod e2e_test;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{bail, Context, Result};
use minijinja::Environment;

pub use config::{Build, Extension, General, ManifestError, Torch};
pub use torch::write_torch_ext;

/// In-memory set of generated files, keyed by target-relative path.
#[derive(Debug, Default)]
pub struct FileSet {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl FileSet {
    /// Writer for the file at `path`, creating an empty entry if needed.
    pub fn entry(&mut self, path: impl Into<PathBuf>) -> &mut Vec<u8> {
        self.files.entry(path.into()).or_default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    /// Persist all entries under `target_dir`. Existing files are only
    /// replaced when `force` is set.
    pub fn write(&self, target_dir: &Path, force: bool) -> Result<()> {
        for (path, content) in &self.files {
            let target = target_dir.join(path);
            if target.exists() && !force {
                bail!(
                    "{} already exists, pass --force to overwrite",
                    target.display()
                );
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Cannot create directory: {}", parent.display()))?;
            }
            fs::write(&target, content)
                .wrap_err_with(|| format!("Cannot write file: {}", target.display()))?;
        }
        Ok(())
    }
}

/// Load a build manifest, returning it together with its containing
/// directory. Paths inside the manifest are relative to that directory.
pub fn load_manifest(path: &Path) -> Result<(Build, PathBuf)> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Cannot read build manifest: {}", path.display()))?;
    let build: Build = toml::from_str(&content)
        .wrap_err_with(|| format!("Cannot parse build manifest: {}", path.display()))?;
    let manifest_dir = path
        .parent()
        .map(Path::to_path_buf)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((build, manifest_dir))
}

fn template_environment() -> Environment<'static> {
    let mut env = Environment::new();
    minijinja_embed::load_templates!(&mut env);
    env
}

/// Render all build files for the manifest into `target_dir` and return the
/// paths written.
pub fn generate_torch_ext(build: &Build, target_dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let env = template_environment();
    let mut file_set = FileSet::default();
    torch::write_torch_ext(&env, build, &mut file_set)?;
    file_set.write(target_dir, force)?;
    Ok(file_set.paths().map(|path| target_dir.join(path)).collect())
}
