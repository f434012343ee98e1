//! Shared types for the archweave workspace.
//!
//! This crate provides the foundational data model used across the workspace,
//! breaking circular dependency chains between the engine and the pipeline:
//!
//! - [`declaration`]: the structural content of archive entries and capsules
//! - [`capsule`]: specially authored compiled units with attached directive metadata
//! - [`directive`]: the closed set of modification directives woven into archives

pub mod capsule;
pub mod declaration;
pub mod directive;

// Re-export the commonly used types at crate root
pub use capsule::{Annotation, AnnotationValue, Capsule};
pub use declaration::{Declaration, Member, Visibility};
pub use directive::{Directive, TargetKind};
