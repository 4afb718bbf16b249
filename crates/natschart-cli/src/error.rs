//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Harness(#[from] natschart_harness::HarnessError),

    #[error("configuration error: {0}")]
    Conf(#[from] natschart_conf::ConfError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown slot: {id}")]
    UnknownSlot { id: String },

    #[error("{count} slot mismatch(es)")]
    Mismatches { count: usize },
}

impl Error {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_slot(id: impl Into<String>) -> Self {
        Error::UnknownSlot { id: id.into() }
    }
}
