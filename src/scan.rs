//! Filesystem primitives
//!
//! Thin wrappers over `std::fs` and `walkdir` that distinguish the one
//! recoverable condition discovery cares about (listing a non-directory)
//! from genuine I/O failures.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors from directory listing.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The listed path exists but is not a directory. Discovery treats
    /// this as an empty listing.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// Any other I/O failure while reading the directory
    #[error("IO error listing {path}: {error}")]
    Io {
        /// The path being listed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        error: std::io::Error,
    },
}

/// Whether a file (not a directory) exists at `path`.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// List the files under `path`, optionally descending into
/// subdirectories. Directories themselves are not returned. Entries
/// come back in a deterministic (sorted) order so discovery results are
/// stable across platforms.
pub fn list_directory(path: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    if !path.exists() {
        return Err(ScanError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ScanError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let entry_path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path.to_path_buf());
            ScanError::Io {
                path: entry_path,
                error: e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walk error")
                }),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
