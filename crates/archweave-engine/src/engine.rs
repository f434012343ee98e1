//! The per-archive transformation engine.
//!
//! An [`Engine`] owns exactly one loaded archive snapshot plus the list of entry
//! names the input originally contained, and it is the only writer of that
//! snapshot. Engines are created fresh at the start of each phase from the
//! correct input snapshot and discarded after being saved; they are never reused
//! across phases, because the resolution context can change per snapshot.
//!
//! All operations are structural. Applying a directive whose member-level target
//! is absent from a resolved entry is a warning and a no-op, never an error.

use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use archweave_types::{Capsule, Declaration, Directive, Member, TargetKind};

use crate::archive::Archive;
use crate::resolution::ResolutionContext;

/// Maximum supertype-chain depth consulted during merge collision checks.
/// Guards against cyclic supertype references in malformed archives.
const MAX_SUPERTYPE_DEPTH: usize = 64;

/// Owner of one loaded archive snapshot, responsible for applying directives
/// and emitting the updated snapshot.
#[derive(Debug)]
pub struct Engine {
    archive_name: String,
    /// The input archive exactly as loaded at phase start.
    input: Archive,
    /// The snapshot being modified.
    snapshot: Archive,
    original_entries: Vec<String>,
    context: ResolutionContext,
    merge_renaming_prefix: String,
}

impl Engine {
    /// Load an engine from an archive file.
    pub fn load(
        path: &Path,
        archive_name: impl Into<String>,
        merge_renaming_prefix: impl Into<String>,
        context: ResolutionContext,
    ) -> Result<Self> {
        let input = Archive::load(path)?;
        Ok(Self::from_archive(
            input,
            archive_name,
            merge_renaming_prefix,
            context,
        ))
    }

    /// Build an engine over an already loaded archive.
    pub fn from_archive(
        input: Archive,
        archive_name: impl Into<String>,
        merge_renaming_prefix: impl Into<String>,
        context: ResolutionContext,
    ) -> Self {
        let original_entries = input.entry_names();
        let snapshot = input.clone();
        Self {
            archive_name: archive_name.into(),
            input,
            snapshot,
            original_entries,
            context,
            merge_renaming_prefix: merge_renaming_prefix.into(),
        }
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Entry names the input archive contained when this engine was created.
    pub fn original_entries(&self) -> &[String] {
        &self.original_entries
    }

    pub fn snapshot(&self) -> &Archive {
        &self.snapshot
    }

    /// Apply one parsed directive, using the carrying capsule as payload where
    /// the directive needs one (merge, define).
    pub fn apply(&mut self, capsule: &Capsule, directive: &Directive) -> Result<()> {
        match directive {
            Directive::Purge {
                target_kind,
                target_name,
                ..
            } => self.purge(*target_kind, target_name),
            Directive::Finality {
                target_kind,
                target_name,
                is_final,
                ..
            } => self.set_finality(*target_kind, target_name, *is_final),
            Directive::Visibility {
                target_kind,
                target_name,
                visibility,
                ..
            } => self.set_visibility(*target_kind, target_name, *visibility),
            Directive::Merge { supertype_name, .. } => {
                self.merge(supertype_name, &capsule.declaration)
            }
            Directive::Define { .. } => self.define(&capsule.declaration),
        }
    }

    /// Write the modified snapshot to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.snapshot.save(path)
    }

    fn purge(&mut self, kind: TargetKind, target: &str) -> Result<()> {
        let (entry, member) = archweave_types::declaration::split_target(target);
        match kind {
            TargetKind::Type => {
                if self.snapshot.remove(entry).is_none() {
                    warn!(archive = %self.archive_name, entry, "purge target entry not present");
                }
            }
            TargetKind::Field | TargetKind::Method => {
                let Some(member_name) = member else {
                    return Err(anyhow!(
                        "{} purge target '{}' has no member part",
                        kind.as_str(),
                        target
                    ));
                };
                let Some(decl) = self.snapshot.get_mut(entry) else {
                    warn!(archive = %self.archive_name, entry, "purge target entry not present");
                    return Ok(());
                };
                let members = match kind {
                    TargetKind::Field => &mut decl.fields,
                    _ => &mut decl.methods,
                };
                let before = members.len();
                members.retain(|m| m.name != member_name);
                if members.len() == before {
                    warn!(
                        archive = %self.archive_name,
                        entry,
                        member = member_name,
                        "purge target member not present"
                    );
                }
            }
        }
        Ok(())
    }

    fn set_finality(&mut self, kind: TargetKind, target: &str, is_final: bool) -> Result<()> {
        self.modify_target(kind, target, "finality", |m| m.is_final = is_final, |d| {
            d.is_final = is_final
        })
    }

    fn set_visibility(
        &mut self,
        kind: TargetKind,
        target: &str,
        visibility: archweave_types::Visibility,
    ) -> Result<()> {
        self.modify_target(
            kind,
            target,
            "visibility",
            |m| m.visibility = visibility,
            |d| d.visibility = visibility,
        )
    }

    /// Shared dispatch shape for finality and visibility edits.
    fn modify_target(
        &mut self,
        kind: TargetKind,
        target: &str,
        what: &str,
        apply_member: impl Fn(&mut Member),
        apply_decl: impl Fn(&mut Declaration),
    ) -> Result<()> {
        let (entry, member) = archweave_types::declaration::split_target(target);
        let Some(decl) = self.snapshot.get_mut(entry) else {
            warn!(archive = %self.archive_name, entry, "{what} target entry not present");
            return Ok(());
        };
        match kind {
            TargetKind::Type => apply_decl(decl),
            TargetKind::Field | TargetKind::Method => {
                let Some(member_name) = member else {
                    return Err(anyhow!(
                        "{} {} target '{}' has no member part",
                        kind.as_str(),
                        what,
                        target
                    ));
                };
                let found = match kind {
                    TargetKind::Field => decl.field_mut(member_name),
                    _ => decl.method_mut(member_name),
                };
                match found {
                    Some(m) => apply_member(m),
                    None => warn!(
                        archive = %self.archive_name,
                        entry,
                        member = member_name,
                        "{what} target member not present"
                    ),
                }
            }
        }
        Ok(())
    }

    /// Fold the donor declaration's members into an existing supertype entry.
    ///
    /// A method whose signature collides with one already declared on the target
    /// replaces it; the displaced original is kept under the renaming prefix so
    /// the woven method can still delegate to it. Fields replace on collision.
    /// A collision with a *final* method inherited from further up the supertype
    /// chain is skipped with a warning.
    fn merge(&mut self, supertype: &str, donor: &Declaration) -> Result<()> {
        if !self.snapshot.contains(supertype) {
            return Err(anyhow!(
                "merge supertype '{}' not present in archive {}",
                supertype,
                self.archive_name
            ));
        }

        let inherited_final = self.inherited_final_methods(supertype);
        let prefix = self.merge_renaming_prefix.clone();
        let decl = self
            .snapshot
            .get_mut(supertype)
            .ok_or_else(|| anyhow!("merge supertype '{}' vanished", supertype))?;

        for field in &donor.fields {
            match decl.field_mut(&field.name) {
                Some(existing) => *existing = field.clone(),
                None => decl.fields.push(field.clone()),
            }
        }

        for method in &donor.methods {
            if let Some(existing) = decl.method_mut(&method.name) {
                // Preserve the displaced original under the renaming prefix.
                let mut displaced = existing.clone();
                *existing = method.clone();
                displaced.name = format!("{}{}", prefix, displaced.name);
                match decl.method_mut(&displaced.name) {
                    Some(slot) => *slot = displaced,
                    None => decl.methods.push(displaced),
                }
            } else if inherited_final.contains(&method.name) {
                warn!(
                    archive = %self.archive_name,
                    supertype,
                    method = %method.name,
                    "merge would override a final inherited method; skipped"
                );
            } else {
                decl.methods.push(method.clone());
            }
        }

        debug!(archive = %self.archive_name, supertype, donor = %donor.name, "merged");
        Ok(())
    }

    /// Signatures of final methods declared anywhere up the target's supertype
    /// chain, resolved through this engine's resolution context.
    fn inherited_final_methods(&self, entry: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = self
            .snapshot
            .get(entry)
            .and_then(|d| d.supertype.clone());
        let mut depth = 0;
        while let Some(name) = current {
            if depth >= MAX_SUPERTYPE_DEPTH {
                warn!(archive = %self.archive_name, entry, "supertype chain too deep; truncating");
                break;
            }
            let Some(decl) = self.context.resolve(&name, &self.input) else {
                debug!(archive = %self.archive_name, supertype = %name, "supertype not resolvable");
                break;
            };
            for m in &decl.methods {
                if m.is_final {
                    result.push(m.name.clone());
                }
            }
            current = decl.supertype.clone();
            depth += 1;
        }
        result
    }

    /// Insert or replace the whole declaration. Idempotent: re-defining the same
    /// declaration leaves the snapshot unchanged.
    fn define(&mut self, declaration: &Declaration) -> Result<()> {
        self.snapshot.insert(declaration.clone());
        Ok(())
    }
}
