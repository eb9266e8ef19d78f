//! Configuration source loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use super::ConfigError;

/// Boundary for remote configuration sources. The core only needs bytes;
/// transport is the caller's concern.
pub trait Fetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, ConfigError>;
}

/// One configuration document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A local file, parsed by extension (yaml/yml/json/toml).
    Path(PathBuf),
    /// Document text already in hand (remote fetches land here). Parsed as
    /// YAML, which is a superset of the JSON the fetch may have returned.
    Inline { name: String, text: String },
}

impl ConfigSource {
    /// Resolve a URI into a source: `file://` and bare paths load locally,
    /// anything else goes through the fetch boundary.
    pub fn from_uri(uri: &str, fetcher: Option<&dyn Fetcher>) -> Result<Self, ConfigError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(Self::Path(PathBuf::from(path)));
        }
        if !uri.contains("://") {
            return Ok(Self::Path(PathBuf::from(uri)));
        }
        let fetcher = fetcher.ok_or_else(|| ConfigError::Fetch {
            uri: uri.to_string(),
            message: "no fetcher configured for remote sources".to_string(),
        })?;
        let bytes = fetcher.fetch(uri)?;
        let text = String::from_utf8(bytes).map_err(|e| ConfigError::Fetch {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::Inline {
            name: uri.to_string(),
            text,
        })
    }

    /// Load and parse this source into a mapping document.
    ///
    /// Empty documents load as an empty mapping; a non-mapping top level is
    /// rejected. Parsing uses safe-load semantics throughout: no tag in a
    /// document can trigger code execution or object construction.
    pub fn load(&self) -> Result<Value, ConfigError> {
        let (name, doc) = match self {
            Self::Path(path) => (path.display().to_string(), parse_file(path)?),
            Self::Inline { name, text } => (
                name.clone(),
                serde_yaml::from_str(text).map_err(|e| ConfigError::ParseYaml {
                    path: name.clone(),
                    source: e,
                })?,
            ),
        };
        debug!(source = %name, "Loaded config document");
        into_mapping(doc, &name)
    }
}

fn parse_file(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadSource {
        path: path.display().to_string(),
        source: e,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.display().to_string(),
            source: e,
        }),
        "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
            path: path.display().to_string(),
            source: e,
        }),
        "toml" => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Err(ConfigError::UnsupportedFormat(
            path.display().to_string(),
            ext,
        )),
    }
}

fn into_mapping(doc: Value, name: &str) -> Result<Value, ConfigError> {
    match doc {
        Value::Mapping(_) => Ok(doc),
        Value::Null => Ok(Value::Mapping(serde_yaml::Mapping::new())),
        _ => Err(ConfigError::NotAMapping(name.to_string())),
    }
}
