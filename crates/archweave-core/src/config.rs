//! Build configuration - the `weave.json` file at the project root.
//!
//! The configuration names the target archives the build modifies and records
//! the project's pristine library list so references can be restored on clean.
//! An unreadable or unparsable configuration is the one fatal error category in
//! the whole pipeline; everything downstream is recoverable.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name of the build configuration file in the project root.
pub const BUILD_CONFIG_FILENAME: &str = "weave.json";

fn default_runtime_archives() -> BTreeSet<String> {
    ["runtime.weave".to_string()].into_iter().collect()
}

fn default_merge_prefix() -> String {
    "aw_".to_string()
}

/// Project build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Archive file names the build targets.
    #[serde(default)]
    targets: BTreeSet<String>,
    /// The project's original (pristine) library archives, as paths relative to
    /// the project root or absolute.
    #[serde(default)]
    original_libraries: Vec<PathBuf>,
    /// Archive names treated as the runtime's own standard library. Kept as a
    /// configurable name list rather than a single hard-coded name.
    #[serde(default = "default_runtime_archives")]
    runtime_archives: BTreeSet<String>,
    /// Prefix applied to methods displaced by a merge.
    #[serde(default = "default_merge_prefix")]
    merge_renaming_prefix: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            targets: BTreeSet::new(),
            original_libraries: Vec::new(),
            runtime_archives: default_runtime_archives(),
            merge_renaming_prefix: default_merge_prefix(),
        }
    }
}

impl BuildConfig {
    /// Read the configuration from disk. Failure here is build-fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read build configuration {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("parse build configuration {}", path.display()))
    }

    /// Write the configuration back to disk (pretty-printed, stable key order).
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("serialize build configuration")?;
        fs::write(path, data)
            .with_context(|| format!("write build configuration {}", path.display()))
    }

    /// Return the existing configuration or create a default one on disk.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            info!("created build configuration {}", path.display());
            Ok(config)
        }
    }

    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    pub fn add_target(&mut self, name: impl Into<String>) {
        self.targets.insert(name.into());
    }

    pub fn remove_target(&mut self, name: &str) {
        self.targets.remove(name);
    }

    pub fn original_libraries(&self) -> &[PathBuf] {
        &self.original_libraries
    }

    pub fn add_original_library(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.original_libraries.contains(&path) {
            self.original_libraries.push(path);
        }
    }

    pub fn remove_original_library(&mut self, path: &Path) {
        self.original_libraries.retain(|p| p != path);
    }

    /// Locate the original (pristine) archive for a target name by matching the
    /// file name of each recorded library entry. Relative entries resolve
    /// against the project root. Returns `None` when no entry matches or the
    /// matched file does not exist.
    pub fn original_archive_path(&self, project_dir: &Path, name: &str) -> Option<PathBuf> {
        for entry in &self.original_libraries {
            let matches = entry
                .file_name()
                .map(|f| f.to_string_lossy() == name)
                .unwrap_or(false);
            if matches {
                let resolved = if entry.is_absolute() {
                    entry.clone()
                } else {
                    project_dir.join(entry)
                };
                if resolved.exists() {
                    return Some(resolved);
                }
            }
        }
        None
    }

    /// Whether a target archive is the runtime's own standard library.
    pub fn is_runtime_archive(&self, name: &str) -> bool {
        self.runtime_archives.contains(name)
    }

    pub fn merge_renaming_prefix(&self) -> &str {
        &self.merge_renaming_prefix
    }
}
