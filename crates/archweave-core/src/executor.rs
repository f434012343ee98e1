//! Phase execution - dispatching directives and persisting phase outputs.
//!
//! [`run_build`] drives one complete build: discovery, normalization, then the
//! phase loop of resolve -> dispatch -> persist, and finally publication. Every
//! per-capsule and per-directive failure inside the loop is logged and skipped;
//! only an environment that cannot be set up at all aborts the build.

use std::fs;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use archweave_types::{Capsule, Directive};

use crate::classify::classify;
use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::discover::discover_phases;
use crate::integrate::ProjectIntegration;
use crate::phases::PhaseMap;
use crate::resolve::{resolve_targets, PhaseEngines};
use crate::walk::CapsuleWalker;

/// What one build produced.
#[derive(Debug)]
pub struct BuildSummary {
    pub phase_map: PhaseMap,
    /// Archive names published after the final phase.
    pub published: Vec<String>,
}

/// Run one complete build.
pub fn run_build(
    config: &BuildConfig,
    ctx: &BuildContext,
    integration: &mut dyn ProjectIntegration,
) -> Result<BuildSummary> {
    info!(build = ctx.build_number, "starting build");
    fs::create_dir_all(&ctx.build_dir)
        .with_context(|| format!("create build directory {}", ctx.build_dir.display()))?;

    let walker = CapsuleWalker::new(&ctx.capsule_dir);

    // Discover and normalize phases once per build.
    let discovered = discover_phases(&walker);
    let mut phase_map = PhaseMap::normalize(&discovered);
    info!(
        "discovered {} explicit build phase{}; normalized mapping: {}",
        phase_map.len(),
        if phase_map.len() == 1 { "" } else { "s" },
        phase_map
    );
    if phase_map.is_empty() {
        phase_map = PhaseMap::implicit();
        info!("no phase declared anywhere; added implicit build phase");
    }

    let total = phase_map.len();
    let mut previous: Option<(i32, i32)> = None;
    let mut published = Vec::new();

    for (idx, &(normalized, original)) in phase_map.entries().iter().enumerate() {
        let is_last = idx + 1 == total;

        // Fresh engines and a fresh entry index every phase.
        let mut engines = resolve_targets(config, ctx, previous);
        execute_phase(&walker, &mut engines, original);
        persist_phase(ctx, &engines, normalized, original);

        if is_last {
            published = publish(ctx, &engines, normalized, original, integration);
        }

        if normalized != original {
            info!("phase {normalized} (identified as {original}) completed");
        } else {
            info!("phase {normalized} completed");
        }
        previous = Some((normalized, original));
    }

    Ok(BuildSummary {
        phase_map,
        published,
    })
}

/// Re-classify every capsule and dispatch its directives for one phase.
fn execute_phase(walker: &CapsuleWalker, engines: &mut PhaseEngines, original_phase: i32) {
    for handle in walker.capsules() {
        let bytes = match handle.read() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(capsule = %handle.path().display(), error = %e, "skipping unreadable capsule");
                continue;
            }
        };
        let capsule = match Capsule::decode(&bytes) {
            Ok(capsule) => capsule,
            Err(e) => {
                warn!(capsule = %handle.path().display(), error = %e, "skipping malformed capsule");
                continue;
            }
        };
        for directive in classify(&capsule) {
            // Directives store original phase numbers; a capsule may declare
            // directives for a future phase that must not fire early.
            if directive.phase() != original_phase {
                continue;
            }
            dispatch(engines, &capsule, &directive);
        }
    }
}

/// Apply one directive to the engines it resolves to.
fn dispatch(engines: &mut PhaseEngines, capsule: &Capsule, directive: &Directive) {
    match directive.owning_entry() {
        Some(entry) => {
            let Some(slots) = engines.owners(entry).map(|s| s.to_vec()) else {
                warn!(
                    directive = directive.kind_name(),
                    entry,
                    "entry could not be found in any of the target archives; directive skipped"
                );
                return;
            };
            for slot in slots {
                apply_to(engines, slot, capsule, directive);
            }
        }
        // Define has no pre-existing owner: broadcast to every active engine.
        None => {
            for slot in 0..engines.len() {
                apply_to(engines, slot, capsule, directive);
            }
        }
    }
}

fn apply_to(engines: &mut PhaseEngines, slot: usize, capsule: &Capsule, directive: &Directive) {
    let engine = &mut engines.engines_mut()[slot];
    debug!(
        directive = directive.kind_name(),
        capsule = %capsule.declaration.name,
        archive = %engine.archive_name(),
        "applying directive"
    );
    if let Err(e) = engine.apply(capsule, directive) {
        warn!(
            directive = directive.kind_name(),
            capsule = %capsule.declaration.name,
            archive = %engine.archive_name(),
            error = %e,
            "directive failed; skipped"
        );
    }
}

/// Save every active engine's snapshot to the phase output directory.
fn persist_phase(ctx: &BuildContext, engines: &PhaseEngines, normalized: i32, original: i32) {
    for engine in engines.engines() {
        let path = ctx.phase_archive_path(engine.archive_name(), normalized, original);
        match engine.save(&path) {
            Ok(()) => info!("modified: {}", path.display()),
            Err(e) => error!(
                archive = %engine.archive_name(),
                error = %e,
                "failed to persist phase snapshot"
            ),
        }
    }
}

/// Copy final snapshots to the published output location and swap the
/// project's library references, bracketed by the external-build toggle.
fn publish(
    ctx: &BuildContext,
    engines: &PhaseEngines,
    normalized: i32,
    original: i32,
    integration: &mut dyn ProjectIntegration,
) -> Vec<String> {
    let mut published = Vec::new();

    if let Err(e) = fs::create_dir_all(&ctx.publish_dir) {
        error!(dir = %ctx.publish_dir.display(), error = %e, "cannot create publish directory");
        return published;
    }

    integration.suppress_external_build();
    for engine in engines.engines() {
        let name = engine.archive_name();
        let from = ctx.phase_archive_path(name, normalized, original);
        let to = ctx.published_archive_path(name);
        if from == to {
            continue;
        }
        if let Err(e) = fs::copy(&from, &to) {
            error!(archive = %name, error = %e, "failed to publish final archive");
            continue;
        }
        if let Err(e) = integration.replace_library_reference(name, &to) {
            warn!(archive = %name, error = %e, "library reference update failed");
        }
        published.push(name.to_string());
    }
    integration.resume_external_build();

    published
}

/// Remove build outputs and restore original library references.
pub fn clean(
    config: &BuildConfig,
    ctx: &BuildContext,
    integration: &mut dyn ProjectIntegration,
) -> Result<()> {
    info!("cleaning {}", ctx.build_dir.display());
    if ctx.build_dir.exists() {
        fs::remove_dir_all(&ctx.build_dir)
            .with_context(|| format!("remove {}", ctx.build_dir.display()))?;
    }

    integration.suppress_external_build();
    for name in config.targets() {
        match config.original_archive_path(&ctx.project_dir, name) {
            Some(original) => {
                if let Err(e) = integration.replace_library_reference(name, &original) {
                    warn!(archive = %name, error = %e, "failed to restore library reference");
                }
            }
            None => warn!(archive = %name, "no original archive to restore"),
        }
    }
    integration.resume_external_build();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use archweave_engine::Archive;
    use archweave_types::{Annotation, Declaration, Member};

    use crate::integrate::{IntegrationEvent, RecordingIntegration};

    fn write_capsule(dir: &Path, name: &str, capsule: &Capsule) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), capsule.encode().unwrap()).unwrap();
    }

    fn write_original(project: &Path, name: &str, archive: &Archive) {
        archive.save(&project.join("libs").join(name)).unwrap();
    }

    fn project_with_target() -> (tempfile::TempDir, BuildConfig, BuildContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(dir.path());
        let mut config = BuildConfig::default();
        config.add_target("core.weave");
        config.add_original_library("libs/core.weave");
        (dir, config, ctx)
    }

    #[test]
    fn test_build_with_no_capsules_runs_implicit_phase() {
        let (dir, config, ctx) = project_with_target();
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        write_original(dir.path(), "core.weave", &archive);

        let mut integration = RecordingIntegration::default();
        let summary = run_build(&config, &ctx, &mut integration).unwrap();

        assert_eq!(summary.phase_map, PhaseMap::implicit());
        assert!(ctx.phase_archive_path("core.weave", 1, 1).exists());
        // Implicit phase is also the last phase: the output gets published.
        assert_eq!(summary.published, vec!["core.weave".to_string()]);
    }

    #[test]
    fn test_purge_directive_removes_entry_from_output() {
        let (dir, config, ctx) = project_with_target();
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        archive.insert(Declaration::new("core/Gone"));
        write_original(dir.path(), "core.weave", &archive);

        let capsule = Capsule::new(Declaration::new("p/Purger")).with_annotation(
            Annotation::new("purge.type")
                .with_int("phase", 1)
                .with_text("target", "core/Gone"),
        );
        write_capsule(&ctx.capsule_dir, "purger.awc", &capsule);

        let mut integration = RecordingIntegration::default();
        run_build(&config, &ctx, &mut integration).unwrap();

        let out = Archive::load(&ctx.phase_archive_path("core.weave", 1, 1)).unwrap();
        assert!(!out.contains("core/Gone"));
        assert!(out.contains("core/A"));
    }

    #[test]
    fn test_unresolved_purge_is_noop_with_unchanged_entry_count() {
        let (dir, config, ctx) = project_with_target();
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        write_original(dir.path(), "core.weave", &archive);

        let capsule = Capsule::new(Declaration::new("p/Purger")).with_annotation(
            Annotation::new("purge.type")
                .with_int("phase", 1)
                .with_text("target", "core/Nowhere"),
        );
        write_capsule(&ctx.capsule_dir, "purger.awc", &capsule);

        let mut integration = RecordingIntegration::default();
        run_build(&config, &ctx, &mut integration).unwrap();

        let out = Archive::load(&ctx.phase_archive_path("core.weave", 1, 1)).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_future_phase_directive_does_not_fire_early() {
        let (dir, config, ctx) = project_with_target();
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        write_original(dir.path(), "core.weave", &archive);

        // Declares phases 1 and 2; the define only fires in phase 2.
        let marker = Capsule::new(Declaration::new("p/Marker")).with_annotation(
            Annotation::new("finality.type")
                .with_int("phase", 1)
                .with_text("target", "core/A")
                .with_bool("final", true),
        );
        let definer = Capsule::new(
            Declaration::new("patch/Late").with_method(Member::new("go()")),
        )
        .with_annotation(Annotation::new("define.type").with_int("phase", 2));
        write_capsule(&ctx.capsule_dir, "marker.awc", &marker);
        write_capsule(&ctx.capsule_dir, "definer.awc", &definer);

        let mut integration = RecordingIntegration::default();
        run_build(&config, &ctx, &mut integration).unwrap();

        let phase1 = Archive::load(&ctx.phase_archive_path("core.weave", 1, 1)).unwrap();
        assert!(!phase1.contains("patch/Late"));
        let phase2 = Archive::load(&ctx.phase_archive_path("core.weave", 2, 2)).unwrap();
        assert!(phase2.contains("patch/Late"));
    }

    #[test]
    fn test_publish_brackets_replacement_with_build_toggle() {
        let (dir, config, mut ctx) = project_with_target();
        ctx.publish_dir = dir.path().join("out");
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        write_original(dir.path(), "core.weave", &archive);

        let mut integration = RecordingIntegration::default();
        run_build(&config, &ctx, &mut integration).unwrap();

        assert_eq!(
            integration.events,
            vec![
                IntegrationEvent::Suppressed,
                IntegrationEvent::Replaced {
                    name: "core.weave".to_string(),
                    path: dir.path().join("out/core.weave"),
                },
                IntegrationEvent::Resumed,
            ]
        );
        assert!(dir.path().join("out/core.weave").exists());
    }

    #[test]
    fn test_clean_removes_build_dir_and_restores_references() {
        let (dir, config, ctx) = project_with_target();
        let mut archive = Archive::new();
        archive.insert(Declaration::new("core/A"));
        write_original(dir.path(), "core.weave", &archive);

        let mut integration = RecordingIntegration::default();
        run_build(&config, &ctx, &mut integration).unwrap();
        assert!(ctx.build_dir.exists());

        let mut integration = RecordingIntegration::default();
        clean(&config, &ctx, &mut integration).unwrap();
        assert!(!ctx.build_dir.exists());
        assert_eq!(
            integration.events,
            vec![
                IntegrationEvent::Suppressed,
                IntegrationEvent::Replaced {
                    name: "core.weave".to_string(),
                    path: dir.path().join("libs/core.weave"),
                },
                IntegrationEvent::Resumed,
            ]
        );
    }
}
