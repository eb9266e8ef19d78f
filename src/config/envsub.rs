//! Environment substitution over the merged configuration document.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yaml::Value;

use super::ConfigError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is valid")
});

/// Rewrite `{{IDENTIFIER}}` placeholders anywhere in `doc` using process
/// environment values.
///
/// Substitution is textual: the document is serialized, placeholders with a
/// matching environment variable are replaced, and the text is re-parsed.
/// Placeholders with no matching variable are left untouched.
pub fn substitute_env(doc: &Value) -> Result<Value, ConfigError> {
    let text = serde_yaml::to_string(doc).map_err(|e| ConfigError::ParseYaml {
        path: "<merged>".to_string(),
        source: e,
    })?;

    let substituted = PLACEHOLDER.replace_all(&text, |caps: &Captures<'_>| {
        match std::env::var(&caps[1]) {
            Ok(value) => value,
            Err(_) => caps[0].to_string(),
        }
    });

    serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseYaml {
        path: "<merged>".to_string(),
        source: e,
    })
}
