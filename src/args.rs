use clap::Parser;
use std::path::PathBuf;

/// Weave modification capsules into the project's target archives.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Project root containing `weave.json`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Directory of compiled capsule files (default: `<project>/capsules`).
    #[arg(long, value_name = "DIR")]
    pub capsule_dir: Option<PathBuf>,

    /// Published output directory for final archives (default: `<project>/build`).
    #[arg(long, value_name = "DIR")]
    pub publish_dir: Option<PathBuf>,

    /// Create a default `weave.json` if the project has none, then proceed.
    #[arg(long, default_value_t = false)]
    pub init: bool,

    /// Remove build outputs and restore original library references, instead
    /// of building.
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Discover and print the normalized phase mapping without building.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Build number reported in diagnostics.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub build_number: u64,
}
