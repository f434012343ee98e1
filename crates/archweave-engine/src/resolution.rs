//! Per-snapshot resolution contexts.
//!
//! During a merge the engine needs to look up declarations that are referenced
//! but not necessarily present in the snapshot being modified - most notably
//! the supertype chain of a merge target. Which source those lookups use is an
//! explicit per-engine value rather than hidden loader state:
//!
//! - [`ResolutionContext::Runtime`]: the archive is the runtime's own standard
//!   library; lookups resolve against the engine's loaded input snapshot (the
//!   builder is itself running on these declarations).
//! - [`ResolutionContext::Scoped`]: lookups resolve against the *original,
//!   unmodified* archive from the project's pristine library set - never the
//!   in-progress snapshot.
//!
//! Contexts are built fresh for every engine at phase start, because the right
//! resolution source can change between snapshots.

use archweave_types::Declaration;

use crate::archive::Archive;

/// Where an engine resolves declarations during transformation.
#[derive(Debug, Clone)]
pub enum ResolutionContext {
    /// Resolve against the engine's own loaded input snapshot.
    Runtime,
    /// Resolve against a pristine copy of the original archive.
    Scoped { original: Archive },
}

impl ResolutionContext {
    pub fn scoped(original: Archive) -> Self {
        ResolutionContext::Scoped { original }
    }

    /// Look up a declaration, given the engine's input snapshot as loaded at
    /// phase start.
    pub fn resolve<'a>(&'a self, name: &str, input_snapshot: &'a Archive) -> Option<&'a Declaration> {
        match self {
            ResolutionContext::Runtime => input_snapshot.get(name),
            ResolutionContext::Scoped { original } => original.get(name),
        }
    }
}
