//! Error conversion helpers for source file reads

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Turns an `io::Result` from opening a source file into an `ApplicationResult`.
pub trait IoResultExt<T> {
    /// Mark a source file as unreadable for excerpt extraction.
    fn source_unavailable(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn source_unavailable(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
    }
}
