//! Phase discovery - the union of phase numbers declared by any directive.
//!
//! Walks every capsule, classifies it, and accumulates declared phase numbers.
//! Member-level internals of merge and define capsules share their owning
//! type's phase by construction, so discovery never recurses into them.
//! Per-capsule failures are logged and contribute nothing; discovery itself
//! cannot fail.

use std::collections::BTreeSet;

use tracing::warn;

use crate::classify::classify_bytes;
use crate::walk::CapsuleWalker;

/// Collect the sorted, deduplicated set of original phase numbers declared
/// anywhere under the walker's root. Empty if no directives exist.
pub fn discover_phases(walker: &CapsuleWalker) -> Vec<i32> {
    let mut phases: BTreeSet<i32> = BTreeSet::new();
    for handle in walker.capsules() {
        let bytes = match handle.read() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(capsule = %handle.path().display(), error = %e, "skipping unreadable capsule");
                continue;
            }
        };
        for directive in classify_bytes(&bytes) {
            phases.insert(directive.phase());
        }
    }
    phases.into_iter().collect()
}
