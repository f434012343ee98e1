//! Archweave CLI.
//!
//! Runs one full build of a weave project: discovers the declared build phases
//! in the project's capsules, normalizes them, and applies every directive
//! phase by phase to the configured target archives. Per-directive problems
//! are reported as warnings; only an unreadable `weave.json` fails the run.

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use archweave_core::config::BUILD_CONFIG_FILENAME;
use archweave_core::discover::discover_phases;
use archweave_core::executor;
use archweave_core::{BuildConfig, BuildContext, CapsuleWalker, LoggingIntegration, PhaseMap};

use crate::args::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = args.project_dir.join(BUILD_CONFIG_FILENAME);
    let config = if args.init {
        BuildConfig::load_or_create(&config_path)?
    } else {
        BuildConfig::load(&config_path)?
    };

    let mut ctx = BuildContext::new(args.project_dir.clone()).with_build_number(args.build_number);
    if let Some(dir) = args.capsule_dir {
        ctx = ctx.with_capsule_dir(dir);
    }
    if let Some(dir) = args.publish_dir {
        ctx = ctx.with_publish_dir(dir);
    }

    let mut integration = LoggingIntegration;

    if args.clean {
        return executor::clean(&config, &ctx, &mut integration);
    }

    if args.dry_run {
        let walker = CapsuleWalker::new(&ctx.capsule_dir);
        let discovered = discover_phases(&walker);
        let mut map = PhaseMap::normalize(&discovered);
        if map.is_empty() {
            map = PhaseMap::implicit();
        }
        println!("phase mapping: {map}");
        return Ok(());
    }

    let summary = executor::run_build(&config, &ctx, &mut integration)?;
    info!(
        "build complete: {} phase(s), {} archive(s) published",
        summary.phase_map.len(),
        summary.published.len()
    );
    for name in &summary.published {
        println!("published: {}", ctx.published_archive_path(name).display());
    }
    Ok(())
}
