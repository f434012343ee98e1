//! Phase normalization - mapping declared phase numbers onto a dense order.
//!
//! Directives may declare arbitrary, sparse phase numbers ({5, 2, 9}). The
//! executor runs phases as a dense ascending sequence 1..N, but directives
//! store the *original* number, so the mapping is retained for dispatch and
//! display. Pure data, no I/O.

use std::collections::BTreeSet;
use std::fmt;

/// Ordered mapping from normalized phase index (1..N, dense) to original
/// declared phase number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseMap {
    /// `(normalized, original)` pairs, ascending in both components.
    entries: Vec<(i32, i32)>,
}

impl PhaseMap {
    /// Normalize a set of declared phase numbers. Input order does not matter;
    /// duplicates collapse.
    pub fn normalize(discovered: &[i32]) -> Self {
        let sorted: BTreeSet<i32> = discovered.iter().copied().collect();
        let entries = sorted
            .into_iter()
            .enumerate()
            .map(|(i, original)| (i as i32 + 1, original))
            .collect();
        Self { entries }
    }

    /// The implicit single phase used when no directive declares any phase.
    pub fn implicit() -> Self {
        Self {
            entries: vec![(1, 1)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(normalized, original)` pairs in execution order.
    pub fn entries(&self) -> &[(i32, i32)] {
        &self.entries
    }

    pub fn original_of(&self, normalized: i32) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, o)| *o)
    }
}

impl fmt::Display for PhaseMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (normalized, original)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{normalized}->{original}")?;
        }
        write!(f, "}}")
    }
}
