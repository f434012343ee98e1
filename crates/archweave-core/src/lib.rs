//! Archweave Core
//!
//! The phased, directive-driven transformation pipeline: discover which build
//! phases exist, normalize them into a dense execution order, resolve which
//! target archive(s) each directive applies to, apply the transformations
//! through per-archive engines, and chain each phase's output archives as the
//! next phase's input.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        One build                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │ discover   walk capsules, union declared phase numbers       │
//! │ normalize  sparse phase numbers -> dense 1..N map            │
//! ├─────────────────────────────────────────────────────────────┤
//! │ per phase:                                                   │
//! │   resolve   load input archives into fresh engines,          │
//! │             build entry name -> engines index                │
//! │   dispatch  re-classify capsules, apply directives           │
//! │   persist   save every engine's snapshot                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ publish    copy final snapshots, swap library references     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases are strictly sequential: each phase's input is the previous phase's
//! output. Within a phase, per-capsule and per-directive failures are logged
//! and skipped; only an unreadable build configuration aborts a build.

pub mod classify;
pub mod config;
pub mod context;
pub mod discover;
pub mod executor;
pub mod integrate;
pub mod phases;
pub mod resolve;
pub mod walk;

pub use config::BuildConfig;
pub use context::BuildContext;
pub use executor::{run_build, BuildSummary};
pub use integrate::{LoggingIntegration, ProjectIntegration, RecordingIntegration};
pub use phases::PhaseMap;
pub use walk::CapsuleWalker;
