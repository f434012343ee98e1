//! Capsules - specially authored compiled units carrying directive metadata.
//!
//! A capsule is a [`Declaration`] plus a list of loosely typed [`Annotation`]
//! records attached at declaration level. Annotations are what the directive
//! classifier parses into typed directives; they are invisible to the woven
//! output (engines insert only the declaration, never its metadata).
//!
//! Capsules are serialized with `bincode`. Decoding is deliberately tolerant at
//! the call sites: a malformed capsule contributes no directives and never
//! aborts a scan.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::declaration::Declaration;

/// Current capsule serialization format version.
pub const CAPSULE_FORMAT_VERSION: u32 = 1;

/// File extension for capsule files on disk.
pub const CAPSULE_EXTENSION: &str = "awc";

/// A single loosely typed metadata field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl AnnotationValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// One declaration-level metadata record.
///
/// `kind` is a dotted tag such as `"purge.field"` or `"merge.type"`; `fields`
/// holds the kind-specific values (`"phase"`, `"target"`, `"final"`,
/// `"visibility"`, `"supertype"`). Unknown kinds and malformed fields are the
/// classifier's problem, not the capsule's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: String,
    pub fields: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_int(mut self, key: &str, value: i64) -> Self {
        self.fields
            .insert(key.to_string(), AnnotationValue::Int(value));
        self
    }

    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        self.fields
            .insert(key.to_string(), AnnotationValue::Bool(value));
        self
    }

    pub fn with_text(mut self, key: &str, value: &str) -> Self {
        self.fields
            .insert(key.to_string(), AnnotationValue::Text(value.to_string()));
        self
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(AnnotationValue::as_int)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(AnnotationValue::as_bool)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(AnnotationValue::as_text)
    }
}

/// A specially authored compiled unit: one declaration plus attached metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capsule {
    pub format_version: u32,
    pub declaration: Declaration,
    pub annotations: Vec<Annotation>,
}

impl Capsule {
    pub fn new(declaration: Declaration) -> Self {
        Self {
            format_version: CAPSULE_FORMAT_VERSION,
            declaration,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Serialize to the on-disk capsule format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("serialize capsule")
    }

    /// Deserialize from the on-disk capsule format.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let capsule: Capsule = bincode::deserialize(bytes).context("deserialize capsule")?;
        if capsule.format_version != CAPSULE_FORMAT_VERSION {
            anyhow::bail!(
                "unsupported capsule format version {} (expected {})",
                capsule.format_version,
                CAPSULE_FORMAT_VERSION
            );
        }
        Ok(capsule)
    }
}
