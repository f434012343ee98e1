//! Archweave Engine
//!
//! Archive container format and the per-archive transformation engine.
//!
//! This crate provides:
//! - [`archive`]: the on-disk container format (named entries holding declarations)
//! - [`resolution`]: explicit per-snapshot resolution contexts for type lookups
//! - [`engine`]: the [`Engine`](engine::Engine), which owns one loaded archive
//!   snapshot and applies parsed directives to it
//!
//! # Capability contract
//!
//! The engine exposes exactly the capability the pipeline depends on: load an
//! archive, index its entries, apply one modification given its parsed directive
//! and the capsule carrying it, and emit an updated archive. The pipeline never
//! reaches into the container format directly.

pub mod archive;
pub mod engine;
pub mod resolution;

pub use archive::Archive;
pub use engine::Engine;
pub use resolution::ResolutionContext;
