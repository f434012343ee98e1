//! Per-invocation build context.
//!
//! One [`BuildContext`] value is created per build, threaded through discovery,
//! normalization, and execution, and discarded at completion. There is no
//! process-wide build state; the build number lives here, owned by whoever
//! drives consecutive builds.

use std::path::PathBuf;

/// Directory name prefix for per-phase output directories.
pub const PHASE_DIRECTORY_PREFIX: &str = "phase";

/// Default directory of capsule files, relative to the project root.
pub const DEFAULT_CAPSULE_DIRECTORY: &str = "capsules";

/// Default build output directory, relative to the project root.
pub const DEFAULT_BUILD_DIRECTORY: &str = "build";

/// Paths and identity of a single build invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_dir: PathBuf,
    /// Where compiled capsule files are discovered.
    pub capsule_dir: PathBuf,
    /// Root of per-phase output directories.
    pub build_dir: PathBuf,
    /// Published output location for final archives.
    pub publish_dir: PathBuf,
    /// Monotonic build number, for diagnostics only.
    pub build_number: u64,
}

impl BuildContext {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let build_dir = project_dir.join(DEFAULT_BUILD_DIRECTORY);
        Self {
            capsule_dir: project_dir.join(DEFAULT_CAPSULE_DIRECTORY),
            publish_dir: build_dir.clone(),
            build_dir,
            project_dir,
            build_number: 1,
        }
    }

    pub fn with_capsule_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capsule_dir = dir.into();
        self
    }

    pub fn with_publish_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.publish_dir = dir.into();
        self
    }

    pub fn with_build_number(mut self, n: u64) -> Self {
        self.build_number = n;
        self
    }

    /// Output directory for one phase, named deterministically from the
    /// normalized index and the original phase number.
    pub fn phase_output_dir(&self, normalized: i32, original: i32) -> PathBuf {
        self.build_dir
            .join(format!("{PHASE_DIRECTORY_PREFIX}-{normalized}-{original}"))
    }

    /// Path of one target archive's snapshot within a phase output directory.
    pub fn phase_archive_path(&self, name: &str, normalized: i32, original: i32) -> PathBuf {
        self.phase_output_dir(normalized, original).join(name)
    }

    /// Path of a published final archive.
    pub fn published_archive_path(&self, name: &str) -> PathBuf {
        self.publish_dir.join(name)
    }
}
