//! Capsule discovery - a lazy, restartable walk over compiled capsule files.
//!
//! The same walker is consumed identically by the phase discoverer and the
//! phase executor: each call to [`CapsuleWalker::capsules`] starts a fresh
//! depth-first traversal. Directory entries are visited in sorted order so a
//! build applies capsules in a stable order regardless of filesystem
//! enumeration order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use archweave_types::capsule::CAPSULE_EXTENSION;

/// Handle to one capsule file discovered on disk.
#[derive(Debug, Clone)]
pub struct CapsuleHandle {
    path: PathBuf,
}

impl CapsuleHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the capsule's raw bytes.
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("read capsule {}", self.path.display()))
    }
}

/// Restartable producer of [`CapsuleHandle`]s under one root directory.
#[derive(Debug, Clone)]
pub struct CapsuleWalker {
    root: PathBuf,
}

impl CapsuleWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a fresh traversal. Unreadable directories are logged and skipped;
    /// a missing root yields an empty sequence.
    pub fn capsules(&self) -> CapsuleIter {
        CapsuleIter {
            pending: vec![self.root.clone()],
        }
    }
}

/// Depth-first iterator over capsule files. Lazy: directories are only read
/// when the traversal reaches them.
#[derive(Debug)]
pub struct CapsuleIter {
    /// Paths not yet visited; directories are expanded on pop.
    pending: Vec<PathBuf>,
}

impl Iterator for CapsuleIter {
    type Item = CapsuleHandle;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.pending.pop() {
            if path.is_dir() {
                // Symlinked directories could loop the traversal back into
                // itself; capsule trees are plain directories, so skip them.
                let is_symlink = fs::symlink_metadata(&path)
                    .map(|m| m.file_type().is_symlink())
                    .unwrap_or(false);
                if is_symlink {
                    warn!(dir = %path.display(), "skipping symlinked directory");
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(entries) => {
                        let mut children: Vec<PathBuf> =
                            entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
                        // Reverse-sorted so popping yields ascending order.
                        children.sort();
                        children.reverse();
                        self.pending.extend(children);
                    }
                    Err(e) => {
                        warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
                    }
                }
            } else if path
                .extension()
                .map(|ext| ext == CAPSULE_EXTENSION)
                .unwrap_or(false)
            {
                return Some(CapsuleHandle { path });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_walk_finds_nested_capsules_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.awc"));
        touch(&dir.path().join("a.awc"));
        touch(&dir.path().join("nested/deep/c.awc"));
        touch(&dir.path().join("ignored.txt"));

        let walker = CapsuleWalker::new(dir.path());
        let names: Vec<String> = walker
            .capsules()
            .map(|h| {
                h.path()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.awc", "b.awc", "c.awc"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.awc"));

        let walker = CapsuleWalker::new(dir.path());
        assert_eq!(walker.capsules().count(), 1);
        assert_eq!(walker.capsules().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_symlinked_directory_cycle() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.awc"));
        // A link pointing back at the root would recurse forever if followed.
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let walker = CapsuleWalker::new(dir.path());
        assert_eq!(walker.capsules().count(), 1);
    }

    #[test]
    fn test_missing_root_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let walker = CapsuleWalker::new(dir.path().join("nope"));
        assert_eq!(walker.capsules().count(), 0);
    }
}
