//! Modification directives - the closed set of structural edits the pipeline
//! can weave into a target archive.
//!
//! Directives are produced by the classifier from capsule metadata and consumed
//! by the phase executor. Representing them as a closed enum makes dispatch a
//! total pattern match; there is no "unrecognized directive" case past
//! classification.

use serde::{Deserialize, Serialize};

use crate::declaration::{split_target, Visibility};

/// What a directive targets inside the owning compiled unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Type,
    Field,
    Method,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Type => "type",
            TargetKind::Field => "field",
            TargetKind::Method => "method",
        }
    }
}

/// One structural edit to apply to a target archive.
///
/// The `phase` field always holds the *original* (declared) phase number, never
/// the normalized index; the executor compares it against the original number of
/// the phase currently running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Remove a declaration or one of its members.
    Purge {
        phase: i32,
        target_kind: TargetKind,
        /// Qualified target: `pkg/Type`, `pkg/Type#field`, or `pkg/Type#sig(...)`.
        target_name: String,
    },
    /// Change the finality of a declaration or member.
    Finality {
        phase: i32,
        target_kind: TargetKind,
        target_name: String,
        is_final: bool,
    },
    /// Change the visibility of a declaration or member.
    Visibility {
        phase: i32,
        target_kind: TargetKind,
        target_name: String,
        visibility: Visibility,
    },
    /// Fold the capsule's members into an existing supertype entry.
    Merge { phase: i32, supertype_name: String },
    /// Insert or replace the capsule's whole declaration in every target.
    Define { phase: i32 },
}

impl Directive {
    /// The original (declared) phase number.
    pub fn phase(&self) -> i32 {
        match self {
            Directive::Purge { phase, .. }
            | Directive::Finality { phase, .. }
            | Directive::Visibility { phase, .. }
            | Directive::Merge { phase, .. }
            | Directive::Define { phase } => *phase,
        }
    }

    /// Short kind tag for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Directive::Purge { .. } => "purge",
            Directive::Finality { .. } => "finality",
            Directive::Visibility { .. } => "visibility",
            Directive::Merge { .. } => "merge",
            Directive::Define { .. } => "define",
        }
    }

    /// The archive entry this directive must be resolved against, if any.
    ///
    /// For member-level targets this is the owning-entry prefix of the
    /// qualified target name. Define directives resolve against nothing; they
    /// are broadcast to every active engine.
    pub fn owning_entry(&self) -> Option<&str> {
        match self {
            Directive::Purge { target_name, .. }
            | Directive::Finality { target_name, .. }
            | Directive::Visibility { target_name, .. } => Some(split_target(target_name).0),
            Directive::Merge { supertype_name, .. } => Some(supertype_name),
            Directive::Define { .. } => None,
        }
    }
}
