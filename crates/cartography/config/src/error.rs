use std::path::PathBuf;
use thiserror::Error;

/// A single config line could not be understood. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason} ('{content}')")]
pub struct ConfigParseError {
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// A cost value was unusable; the default cost is used instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid cost '{value}': {reason}")]
pub struct InvalidCostSpec {
    pub value: String,
    pub reason: String,
}

/// Errors from the configuration store.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ConfigParseError),

    #[error(transparent)]
    InvalidCost(#[from] InvalidCostSpec),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error prevents loading the source at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigError::Io { .. })
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
