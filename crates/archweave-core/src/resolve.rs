//! Target resolution - loading fresh engines and the phase-scoped entry index.
//!
//! Invoked once per phase. The first phase loads each target's original archive
//! from the project's pristine library set; later phases load the previous
//! phase's saved output, falling back to the original for archives untouched so
//! far. Loading failures exclude the target from the phase with a warning -
//! directives aimed at it stay unresolved and are skipped, never fatal.
//!
//! Engines are never reused across phases: the resolution context can change
//! per snapshot, so every phase constructs its own set and its own entry index.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use archweave_engine::{Archive, Engine, ResolutionContext};

use crate::config::BuildConfig;
use crate::context::BuildContext;

/// The engines active for one phase, plus the entry index mapping archive entry
/// name to the engines whose snapshot currently contains it.
#[derive(Debug, Default)]
pub struct PhaseEngines {
    engines: Vec<Engine>,
    index: BTreeMap<String, Vec<usize>>,
}

impl PhaseEngines {
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut [Engine] {
        &mut self.engines
    }

    /// Engine slots whose archive contains `entry`; `None` when the entry is
    /// unresolved in every loaded engine.
    pub fn owners(&self, entry: &str) -> Option<&[usize]> {
        self.index.get(entry).map(|v| v.as_slice())
    }

    fn push(&mut self, engine: Engine) {
        let slot = self.engines.len();
        for entry in engine.original_entries() {
            self.index.entry(entry.clone()).or_default().push(slot);
        }
        self.engines.push(engine);
    }
}

/// Load the engine set for one phase.
///
/// `previous_phase` is the `(normalized, original)` pair of the phase that ran
/// before, or `None` on the first phase.
pub fn resolve_targets(
    config: &BuildConfig,
    ctx: &BuildContext,
    previous_phase: Option<(i32, i32)>,
) -> PhaseEngines {
    let mut result = PhaseEngines::default();

    for name in config.targets() {
        let Some(original_path) = config.original_archive_path(&ctx.project_dir, name) else {
            warn!(archive = %name, "original archive not found; target excluded from this phase");
            continue;
        };

        let input_path = phase_input_path(ctx, name, &original_path, previous_phase);

        let original = match Archive::load(&original_path) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(archive = %name, error = %e, "failed to load original archive; target excluded");
                continue;
            }
        };
        let input = if input_path == original_path {
            original.clone()
        } else {
            match Archive::load(&input_path) {
                Ok(archive) => archive,
                Err(e) => {
                    warn!(
                        archive = %name,
                        path = %input_path.display(),
                        error = %e,
                        "failed to load phase input archive; target excluded"
                    );
                    continue;
                }
            }
        };

        // The runtime's own standard library resolves against the builder's
        // loaded snapshot; everything else resolves against the pristine
        // original, never the in-progress snapshot.
        let context = if config.is_runtime_archive(name) {
            ResolutionContext::Runtime
        } else {
            ResolutionContext::scoped(original)
        };

        debug!(
            archive = %name,
            input = %input_path.display(),
            entries = input.len(),
            "engine initialized"
        );
        result.push(Engine::from_archive(
            input,
            name.clone(),
            config.merge_renaming_prefix(),
            context,
        ));
    }

    result
}

/// Choose the input snapshot for a target: previous phase output when it
/// exists, otherwise the original archive.
fn phase_input_path(
    ctx: &BuildContext,
    name: &str,
    original_path: &std::path::Path,
    previous_phase: Option<(i32, i32)>,
) -> PathBuf {
    if let Some((normalized, original)) = previous_phase {
        let candidate = ctx.phase_archive_path(name, normalized, original);
        if candidate.exists() {
            return candidate;
        }
    }
    original_path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_types::Declaration;

    fn project() -> (tempfile::TempDir, BuildConfig, BuildContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(dir.path());
        let mut config = BuildConfig::default();
        config.add_target("core.weave");
        config.add_original_library("libs/core.weave");
        (dir, config, ctx)
    }

    fn write_original(dir: &std::path::Path, name: &str, entries: &[&str]) {
        let mut archive = Archive::new();
        for entry in entries {
            archive.insert(Declaration::new(*entry));
        }
        archive.save(&dir.join("libs").join(name)).unwrap();
    }

    #[test]
    fn test_first_phase_loads_originals_and_indexes_entries() {
        let (dir, config, ctx) = project();
        write_original(dir.path(), "core.weave", &["core/A", "core/B"]);

        let engines = resolve_targets(&config, &ctx, None);
        assert_eq!(engines.len(), 1);
        assert_eq!(engines.owners("core/A"), Some(&[0usize][..]));
        assert!(engines.owners("core/Missing").is_none());
    }

    #[test]
    fn test_missing_original_excludes_target() {
        let (_dir, config, ctx) = project();
        let engines = resolve_targets(&config, &ctx, None);
        assert!(engines.is_empty());
    }

    #[test]
    fn test_later_phase_prefers_previous_output() {
        let (dir, config, ctx) = project();
        write_original(dir.path(), "core.weave", &["core/A"]);

        // Simulate a phase-1 output with an extra entry.
        let mut phase_out = Archive::new();
        phase_out.insert(Declaration::new("core/A"));
        phase_out.insert(Declaration::new("patch/New"));
        phase_out
            .save(&ctx.phase_archive_path("core.weave", 1, 1))
            .unwrap();

        let engines = resolve_targets(&config, &ctx, Some((1, 1)));
        assert_eq!(engines.len(), 1);
        assert!(engines.owners("patch/New").is_some());
    }

    #[test]
    fn test_later_phase_falls_back_to_original() {
        let (dir, config, ctx) = project();
        write_original(dir.path(), "core.weave", &["core/A"]);

        // No phase-1 output on disk for this target.
        let engines = resolve_targets(&config, &ctx, Some((1, 1)));
        assert_eq!(engines.len(), 1);
        assert!(engines.owners("core/A").is_some());
    }

    #[test]
    fn test_shared_entry_indexes_both_engines() {
        let (dir, mut config, ctx) = project();
        config.add_target("extra.weave");
        config.add_original_library("libs/extra.weave");
        write_original(dir.path(), "core.weave", &["shared/Entry"]);
        write_original(dir.path(), "extra.weave", &["shared/Entry"]);

        let engines = resolve_targets(&config, &ctx, None);
        assert_eq!(engines.len(), 2);
        assert_eq!(engines.owners("shared/Entry").map(|s| s.len()), Some(2));
    }
}
