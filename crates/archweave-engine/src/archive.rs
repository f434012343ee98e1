//! On-disk archive container format.
//!
//! An archive is a versioned map from entry name to [`Declaration`], serialized
//! with `bincode`. Entries live in a `BTreeMap`, so serialization order is the
//! entry-name order and the output bytes are fully determined by the contents -
//! two structurally equal archives serialize to identical bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use archweave_types::Declaration;

/// Current archive serialization format version.
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// A binary library archive: named entries, each holding one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    pub format_version: u32,
    entries: BTreeMap<String, Declaration>,
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive {
    pub fn new() -> Self {
        Self {
            format_version: ARCHIVE_FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Read an archive from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read(path).with_context(|| format!("read archive {}", path.display()))?;
        let archive: Archive = bincode::deserialize(&data)
            .with_context(|| format!("deserialize archive {}", path.display()))?;
        if archive.format_version != ARCHIVE_FORMAT_VERSION {
            anyhow::bail!(
                "unsupported archive format version {} in {} (expected {})",
                archive.format_version,
                path.display(),
                ARCHIVE_FORMAT_VERSION
            );
        }
        Ok(archive)
    }

    /// Write the archive to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let data = bincode::serialize(self).context("serialize archive")?;
        fs::write(path, data).with_context(|| format!("write archive {}", path.display()))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Declaration> {
        self.entries.get_mut(name)
    }

    /// Insert or replace an entry under the declaration's own name.
    pub fn insert(&mut self, declaration: Declaration) -> Option<Declaration> {
        self.entries.insert(declaration.name.clone(), declaration)
    }

    pub fn remove(&mut self, name: &str) -> Option<Declaration> {
        self.entries.remove(name)
    }

    /// Entry names in serialization (sorted) order.
    pub fn entry_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex SHA-256 of the serialized archive, for determinism checks and logs.
    pub fn digest(&self) -> Result<String> {
        let data = bincode::serialize(self).context("serialize archive")?;
        Ok(hex::encode(Sha256::digest(&data)))
    }
}
