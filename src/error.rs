use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Scan target not found: {0}")]
    TargetNotFound(String),

    #[error("Failed to write report to {path}")]
    WriteReport {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown report format: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
