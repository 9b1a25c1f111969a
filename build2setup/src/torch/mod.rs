mod common;
mod cuda;

use eyre::Result;
use minijinja::Environment;

use crate::{config::Build, FileSet};

pub use common::write_pyproject_toml;
pub use cuda::write_setup_py;

/// Render the setuptools build files for a Torch extension package.
pub fn write_torch_ext(env: &Environment, build: &Build, file_set: &mut FileSet) -> Result<()> {
    cuda::write_setup_py(env, build, file_set)?;
    common::write_pyproject_toml(env, &build.general, file_set)?;
    Ok(())
}
