//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Open a file for one sequential read; the handle closes when dropped.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn given_existing_file_when_opening_then_reads_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "val x = 1").unwrap();

        let mut content = String::new();
        RealFileSystem
            .open(file.path())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();

        assert_eq!(content, "val x = 1");
    }

    #[test]
    fn given_missing_file_when_opening_then_not_found() {
        let result = RealFileSystem.open(Path::new("/nonexistent/patsfmt/missing.dats"));
        assert_eq!(result.err().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
    }
}
