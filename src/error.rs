//! Loader error types

use thiserror::Error;

/// Type alias for loader results
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while configuring the loader.
///
/// Only structural misconfiguration is surfaced as an error; a
/// resolution miss is an expected steady-state outcome and is reported
/// as a boolean `false` so the strategy chain can continue.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A prefix or namespace root does not exist on disk
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The missing root, relative to the configured base dir when possible
        path: String,
    },

    /// An unrecognized namespace-variant tag was supplied
    #[error("Invalid namespace variant: {variant}")]
    InvalidVariant {
        /// The unrecognized tag
        variant: String,
    },
}
