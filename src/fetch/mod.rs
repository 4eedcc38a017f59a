//! Retrieval of remote artifacts into local paths.
//!
//! The descriptor store and the repository cache only depend on the
//! [`ArtifactFetcher`] trait; transports live behind it.

pub mod local;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use local::LocalFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("could not extract archive {}: {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Blocking retrieval of artifacts addressed by URI.
pub trait ArtifactFetcher {
    /// Fetch a single file to `dest`.
    fn fetch_file(&self, dest: &Path, uri: &str) -> Result<(), FetchError>;

    /// Fetch a directory or archive and materialize it as a tree under `dest`.
    fn fetch_tree(&self, dest: &Path, uri: &str) -> Result<(), FetchError>;
}
