//! Project integration - the collaborator that swaps library references.
//!
//! After the final phase the pipeline tells the surrounding project to point
//! its effective library references at the published archives. The nature
//! toggle hooks bracket that replacement so an external compiler pass does not
//! react to intermediate states.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

/// External collaborator driven around library replacement.
pub trait ProjectIntegration {
    /// Suppress the external build before touching library references.
    fn suppress_external_build(&mut self);

    /// Resume the external build after references are swapped.
    fn resume_external_build(&mut self);

    /// Point the project's reference for `name` at `path`.
    fn replace_library_reference(&mut self, name: &str, path: &Path) -> Result<()>;
}

/// Integration that only logs - the CLI default, where no host project exists.
#[derive(Debug, Default)]
pub struct LoggingIntegration;

impl ProjectIntegration for LoggingIntegration {
    fn suppress_external_build(&mut self) {
        info!("external build suppressed");
    }

    fn resume_external_build(&mut self) {
        info!("external build resumed");
    }

    fn replace_library_reference(&mut self, name: &str, path: &Path) -> Result<()> {
        info!(library = name, path = %path.display(), "library reference updated");
        Ok(())
    }
}

/// One observed integration call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationEvent {
    Suppressed,
    Resumed,
    Replaced { name: String, path: PathBuf },
}

/// Integration that records every call; used by tests to assert ordering.
#[derive(Debug, Default)]
pub struct RecordingIntegration {
    pub events: Vec<IntegrationEvent>,
}

impl ProjectIntegration for RecordingIntegration {
    fn suppress_external_build(&mut self) {
        self.events.push(IntegrationEvent::Suppressed);
    }

    fn resume_external_build(&mut self) {
        self.events.push(IntegrationEvent::Resumed);
    }

    fn replace_library_reference(&mut self, name: &str, path: &Path) -> Result<()> {
        self.events.push(IntegrationEvent::Replaced {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }
}
