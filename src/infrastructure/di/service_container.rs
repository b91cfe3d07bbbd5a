//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{DiagnosticFormatter, ExpressionService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding the settings and I/O boundaries services are built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Directory relative source paths in diagnostics are resolved against
    pub source_root: Option<PathBuf>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            source_root: None,
        }
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Formatter for compiler output.
    pub fn formatter(&self) -> InfraResult<DiagnosticFormatter> {
        let formatter = DiagnosticFormatter::new(Arc::clone(&self.fs), Arc::clone(&self.settings))?;
        Ok(match &self.source_root {
            Some(root) => formatter.with_source_root(root),
            None => formatter,
        })
    }

    /// Standalone expression prettifier.
    pub fn expressions(&self) -> InfraResult<ExpressionService> {
        Ok(ExpressionService::new(&self.settings)?)
    }
}
