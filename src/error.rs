use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Broad failure classes; each one calls for a different fix from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was missing or empty.
    InvalidArgument,
    /// The descriptor or a repository could not be fetched.
    Unreachable,
    /// Malformed documents, encoding failures and local filesystem errors.
    Internal,
    /// Unknown secret, plugin or plugin parameter.
    NotFound,
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("could not fetch descriptor {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("could not fetch repo {repo} from {uri}: {source}")]
    RepoFetch {
        repo: String,
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not write descriptor to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no secret named {0}")]
    SecretNotFound(String),

    #[error("secret {0} has no source")]
    SecretWithoutSource(String),

    #[error("plugin {0} is not defined")]
    PluginNotFound(String),

    #[error("plugin {plugin} has no parameter {parameter}")]
    ParameterNotFound { plugin: String, parameter: String },

    #[error("plugin {plugin} does not match the requested shape: {source}")]
    PluginShape {
        plugin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not encode spec for plugin {plugin}: {reason}")]
    PluginEncode { plugin: String, reason: String },
}

impl DescriptorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Fetch { .. } | Self::RepoFetch { .. } => ErrorKind::Unreachable,
            Self::Io { .. }
            | Self::Parse { .. }
            | Self::Serialize(_)
            | Self::Write { .. }
            | Self::SecretWithoutSource(_)
            | Self::PluginShape { .. }
            | Self::PluginEncode { .. } => ErrorKind::Internal,
            Self::SecretNotFound(_) | Self::PluginNotFound(_) | Self::ParameterNotFound { .. } => {
                ErrorKind::NotFound
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
