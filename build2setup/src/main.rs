use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Context, Result};
use serde::Serialize;

use build2setup::{generate_torch_ext, load_manifest};

#[derive(Parser)]
#[command(
    name = "build2setup",
    version,
    about = "Generate setuptools build files for Torch CUDA extension projects"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render setup.py and pyproject.toml from a build manifest.
    GenerateTorch {
        /// Path to the build.toml manifest.
        manifest: PathBuf,

        /// Directory to write into, defaults to the manifest's directory.
        #[arg(long)]
        target_dir: Option<PathBuf>,

        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },

    /// Check that a manifest is consistent with the files on disk.
    Validate {
        /// Path to the build.toml manifest.
        manifest: PathBuf,

        #[arg(long, value_enum, default_value = "console")]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    #[default]
    Console,
    Json,
}

impl Format {
    fn is_json(self) -> bool {
        matches!(self, Format::Json)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateTorch {
            manifest,
            target_dir,
            force,
        } => {
            let (build, manifest_dir) = load_manifest(&manifest)?;
            let target_dir = target_dir.unwrap_or(manifest_dir);
            let written = generate_torch_ext(&build, &target_dir, force)?;
            for path in written {
                println!("Wrote {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { manifest, format } => validate(&manifest, format),
    }
}

#[derive(Serialize)]
struct ValidationReport {
    manifest: String,
    status: &'static str,
    issues: Vec<String>,
}

fn validate(manifest: &Path, format: Format) -> Result<ExitCode> {
    let (build, manifest_dir) = load_manifest(manifest)?;
    let issues: Vec<String> = build
        .validate(&manifest_dir)
        .iter()
        .map(ToString::to_string)
        .collect();

    if format.is_json() {
        let report = ValidationReport {
            manifest: manifest.display().to_string(),
            status: if issues.is_empty() { "ok" } else { "invalid" },
            issues: issues.clone(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .context("Failed to serialize validation report")?
        );
    } else if issues.is_empty() {
        println!("{}: OK", manifest.display());
    } else {
        for issue in &issues {
            eprintln!("{}: {}", manifest.display(), issue);
        }
    }

    Ok(if issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
