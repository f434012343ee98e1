//! Shared fixtures for archweave pipeline integration tests.
//!
//! Builds throwaway weave projects on disk: a config, original target
//! archives, and capsule files, all rooted in a caller-owned directory.

use std::fs;
use std::path::{Path, PathBuf};

use archweave_core::{BuildConfig, BuildContext};

/// A scratch weave project rooted at `dir`.
pub struct FixtureProject {
    pub dir: PathBuf,
    pub config: BuildConfig,
}

impl FixtureProject {
    /// Create an empty project (no targets yet) under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(dir.join("libs")).expect("create libs dir");
        fs::create_dir_all(dir.join("capsules")).expect("create capsule dir");
        Self {
            dir,
            config: BuildConfig::default(),
        }
    }

    /// Register `name` as a build target backed by `libs/<name>`.
    pub fn add_target(&mut self, name: &str) {
        self.config.add_target(name);
        self.config
            .add_original_library(Path::new("libs").join(name));
    }

    /// Path where the original archive for `name` belongs.
    pub fn original_path(&self, name: &str) -> PathBuf {
        self.dir.join("libs").join(name)
    }

    /// Write raw capsule bytes under the capsule directory.
    pub fn write_capsule_bytes(&self, file_name: &str, bytes: &[u8]) {
        fs::write(self.dir.join("capsules").join(file_name), bytes).expect("write capsule");
    }

    /// Build context rooted at this project.
    pub fn context(&self) -> BuildContext {
        BuildContext::new(self.dir.clone())
    }
}
