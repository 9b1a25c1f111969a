use eyre::{Context, Result};
use itertools::Itertools;
use minijinja::{context, Environment};
use serde::Serialize;

use crate::arch::CudaCapability;
use crate::config::{Build, Extension};
use crate::FileSet;

/// One `CUDAExtension(...)` entry, with all list-valued fields already
/// quoted and joined for the template.
#[derive(Debug, Serialize)]
struct ExtensionContext {
    name: String,
    sources: String,
    cxx_flags: String,
    nvcc_flags: String,
    include_dirs: String,
}

fn quote_join<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    items
        .into_iter()
        .map(|item| format!("\"{item}\""))
        .join(", ")
}

fn extension_context(name: &str, extension: &Extension) -> Result<ExtensionContext> {
    let capabilities: Vec<CudaCapability> = extension
        .cuda_capabilities
        .iter()
        .flatten()
        .map(|capability| {
            capability
                .parse()
                .map_err(|err: eyre::Report| err.wrap_err(format!("extension `{name}`")))
        })
        .collect::<Result<_>>()?;

    // Architecture flags go after the manifest's own nvcc flags, one
    // -gencode pair per capability.
    let mut nvcc_flags = extension.nvcc_flags.clone();
    for capability in &capabilities {
        nvcc_flags.extend(capability.gencode_flags());
    }

    // Include directories are anchored to the generated script's own
    // directory, matching where the manifest's relative paths resolve.
    let include_dirs = extension
        .include
        .iter()
        .flatten()
        .map(|dir| format!("str(this_dir / \"{dir}\")"))
        .join(", ");

    Ok(ExtensionContext {
        name: name.to_string(),
        sources: quote_join(&extension.src),
        cxx_flags: quote_join(&extension.cxx_flags),
        nvcc_flags: quote_join(&nvcc_flags),
        include_dirs,
    })
}

/// Python tuple literal for `find_packages(exclude=...)`. A single-element
/// tuple needs the trailing comma, so one is always emitted.
fn exclude_tuple(exclude: &[String]) -> String {
    if exclude.is_empty() {
        return String::new();
    }
    let mut joined = exclude.iter().map(|dir| format!("\"{dir}\"")).join(", ");
    joined.push(',');
    joined
}

pub fn write_setup_py(env: &Environment, build: &Build, file_set: &mut FileSet) -> Result<()> {
    let extensions = build
        .extensions
        .iter()
        .map(|(name, extension)| extension_context(name, extension))
        .collect::<Result<Vec<_>>>()?;

    let exclude = exclude_tuple(
        build
            .torch
            .as_ref()
            .map(|torch| torch.exclude.as_slice())
            .unwrap_or(&[]),
    );

    let python_depends = quote_join(build.general.python_depends.as_ref().unwrap_or(&vec![]));

    let writer = file_set.entry("setup.py");

    env.get_template("setup.py")
        .wrap_err("Cannot get setup.py template")?
        .render_to_write(
            context! {
                name => &build.general.name,
                description => &build.general.description,
                python_requires => &build.general.python_requires,
                python_depends => python_depends,
                exclude => exclude,
                extensions => extensions,
            },
            writer,
        )
        .wrap_err("Cannot render setup.py template")?;

    Ok(())
}
