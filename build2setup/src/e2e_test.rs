use std::fs;

use tempfile::tempdir;

use crate::{generate_torch_ext, load_manifest};

const TINY_PKG_MANIFEST: &str = r#"
[general]
name = "tiny_pkg"
description = "Tiny cuda and c api binding for pytorch."
python-requires = ">=3.7"
python-depends = ["torch", "einops", "packaging", "ninja"]

[torch]
exclude = [
    "build",
    "csrc",
    "include",
    "tests",
    "dist",
    "docs",
    "benchmarks",
    "tiny_pkg.egg-info",
]

[extension.tiny_api_cuda]
src = ["csrc/cuda_api.cu"]
include = ["csrc", "include"]
cuda-capabilities = ["9.0"]
"#;

#[test]
fn generates_setup_py_and_pyproject() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let manifest_path = temp_dir.path().join("build.toml");
    fs::write(&manifest_path, TINY_PKG_MANIFEST)?;

    let (build, manifest_dir) = load_manifest(&manifest_path)?;
    let written = generate_torch_ext(&build, &manifest_dir, false)?;
    assert_eq!(written.len(), 2);

    let setup_py = fs::read_to_string(temp_dir.path().join("setup.py"))?;
    assert!(setup_py.contains("name=\"tiny_api_cuda\""));
    assert!(setup_py.contains("sources=[\"csrc/cuda_api.cu\"]"));
    assert!(setup_py.contains("\"arch=compute_90,code=sm_90\""));
    assert!(setup_py.contains("\"-std=c++17\""));
    assert!(setup_py.contains("\"--use_fast_math\""));
    assert!(setup_py.contains("str(this_dir / \"csrc\"), str(this_dir / \"include\")"));
    assert!(setup_py.contains("\"tiny_pkg.egg-info\","));
    assert!(setup_py.contains("name=\"tiny_pkg\""));
    assert!(setup_py.contains("cmdclass={\"build_ext\": BuildExtension}"));
    assert!(setup_py.contains("python_requires=\">=3.7\""));
    assert!(setup_py
        .contains("install_requires=[\"torch\", \"einops\", \"packaging\", \"ninja\"]"));

    let pyproject = fs::read_to_string(temp_dir.path().join("pyproject.toml"))?;
    assert!(pyproject.contains("name = \"tiny_pkg\""));
    assert!(pyproject.contains("requires-python = \">=3.7\""));
    assert!(pyproject.contains("build-backend = \"setuptools.build_meta\""));

    Ok(())
}

#[test]
fn refuses_to_overwrite_without_force() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let manifest_path = temp_dir.path().join("build.toml");
    fs::write(&manifest_path, TINY_PKG_MANIFEST)?;

    let (build, manifest_dir) = load_manifest(&manifest_path)?;
    generate_torch_ext(&build, &manifest_dir, false)?;

    let err = generate_torch_ext(&build, &manifest_dir, false).unwrap_err();
    assert!(err.to_string().contains("--force"));

    // A forced run replaces the files.
    generate_torch_ext(&build, &manifest_dir, true)?;

    Ok(())
}

#[test]
fn validate_checks_sources_and_includes() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let manifest_path = temp_dir.path().join("build.toml");
    fs::write(&manifest_path, TINY_PKG_MANIFEST)?;

    let (build, manifest_dir) = load_manifest(&manifest_path)?;

    // Nothing exists yet: one missing source, two missing include dirs.
    let issues = build.validate(&manifest_dir);
    assert_eq!(issues.len(), 3);

    fs::create_dir_all(temp_dir.path().join("csrc"))?;
    fs::create_dir_all(temp_dir.path().join("include"))?;
    fs::write(temp_dir.path().join("csrc/cuda_api.cu"), "// kernel\n")?;

    let issues = build.validate(&manifest_dir);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");

    Ok(())
}
