//! Configuration resolution.
//!
//! Zero or more partial configuration documents are layered over a baked-in
//! default, filtered, environment-substituted, and resolved into one
//! [`EffectiveConfig`] that drives which scanners run and with what options.

mod envsub;
mod filter;
mod ignore;
mod loading;
mod merge;
mod resolver;

pub use envsub::substitute_env;
pub use filter::{ConfigFilter, FilterChain};
pub use ignore::IgnoreRule;
pub use loading::{ConfigSource, Fetcher};
pub use merge::deep_merge;
pub use resolver::{ConfigResolver, EffectiveConfig, ReportTarget};

use thiserror::Error;

/// Fatal configuration errors. All of these abort the run before any
/// scanner starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid project_name {0:?}: must not contain whitespace or ';'")]
    InvalidProjectName(String),

    #[error("Invalid {key} value: expected \"all\", \"none\", or a sequence of scanner names")]
    InvalidScannerSet { key: String },

    #[error("Unknown scanner {name:?} in {key}")]
    UnknownScanner { key: String, name: String },

    #[error("Failed to read config source {path}")]
    ReadSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch config from {uri}: {message}")]
    Fetch { uri: String, message: String },

    #[error("Failed to parse YAML config {path}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON config {path}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML config {path}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unsupported config format for {0}: .{1}")]
    UnsupportedFormat(String, String),

    #[error("Config document {0} is not a mapping")]
    NotAMapping(String),
}
