//! Effective configuration derived from layered documents.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::{ConfigError, FilterChain, IgnoreRule, deep_merge, ignore, substitute_env};
use crate::report::ReportFormat;
use crate::scanner::{ALIAS_GROUPS, KNOWN_SCANNERS};

const DEFAULT_DOCUMENT: &str = include_str!("../../data/default_config.yaml");

/// One report destination descriptor from the `reports:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportTarget {
    pub uri: String,
    pub format: ReportFormat,
    pub verbose: bool,
    /// Identifier used by `<section>:<id>` ignore rules.
    pub id: Option<String>,
}

impl Default for ReportTarget {
    fn default() -> Self {
        Self {
            uri: String::new(),
            format: ReportFormat::Txt,
            verbose: false,
            id: None,
        }
    }
}

/// The single resolved configuration. Built once at process start,
/// read-only thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub project_name: String,
    pub custom_info: Value,
    pub builds: Mapping,
    pub reports: Vec<ReportTarget>,
    pub active_scanners: BTreeSet<String>,
    pub enforced_scanners: BTreeSet<String>,
    /// Option dictionary per known scanner identity; never absent.
    pub scanner_configs: BTreeMap<String, Mapping>,
}

impl EffectiveConfig {
    pub fn is_active(&self, scanner: &str) -> bool {
        self.active_scanners.contains(scanner)
    }

    pub fn is_enforced(&self, scanner: &str) -> bool {
        self.enforced_scanners.contains(scanner)
    }

    pub fn scanner_config(&self, scanner: &str) -> Option<&Mapping> {
        self.scanner_configs.get(scanner)
    }

    /// Look up one option value for a scanner.
    pub fn scanner_option(&self, scanner: &str, key: &str) -> Option<&Value> {
        self.scanner_configs.get(scanner)?.get(key)
    }
}

/// Resolves layered configuration documents into an [`EffectiveConfig`].
///
/// The filter chain and ignore rules are fixed at construction; resolution
/// itself mutates nothing outside the returned value.
pub struct ConfigResolver {
    filters: FilterChain,
    ignore_ids: Vec<IgnoreRule>,
    substitute_env: bool,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            filters: FilterChain::new(),
            ignore_ids: Vec::new(),
            substitute_env: true,
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Accept `"<section>:<id>"` rules; malformed entries are dropped.
    pub fn with_ignore_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_ids = ids
            .into_iter()
            .filter_map(|s| IgnoreRule::parse(s.as_ref()))
            .collect();
        self
    }

    /// Disable the environment substitution pass (test mode).
    pub fn with_env_substitution(mut self, enabled: bool) -> Self {
        self.substitute_env = enabled;
        self
    }

    /// Layer `user_docs` over the baked-in default, apply filters and
    /// environment substitution, and derive the effective configuration.
    pub fn resolve(&self, user_docs: &[Value]) -> Result<EffectiveConfig, ConfigError> {
        let mut doc: Value =
            serde_yaml::from_str(DEFAULT_DOCUMENT).map_err(|e| ConfigError::ParseYaml {
                path: "<default>".to_string(),
                source: e,
            })?;

        for user in user_docs {
            let mut filtered = user.clone();
            ignore::strip_ignored(&mut filtered, &self.ignore_ids);
            deep_merge(&mut doc, &filtered);
        }

        doc = self.filters.apply_all(doc);

        if self.substitute_env {
            doc = substitute_env(&doc)?;
        }

        derive(&doc)
    }
}

fn derive(doc: &Value) -> Result<EffectiveConfig, ConfigError> {
    let project_name = doc
        .get("project_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    if project_name.contains(char::is_whitespace) || project_name.contains(';') {
        return Err(ConfigError::InvalidProjectName(project_name));
    }

    let active_scanners = scanner_set(doc, "active_scanners")?;
    let enforced_scanners = scanner_set(doc, "enforced_scanners")?;

    let custom_info = doc.get("custom_info").cloned().unwrap_or(Value::Null);
    let builds = doc
        .get("builds")
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default();

    let reports = match doc.get("reports") {
        Some(section) => {
            serde_yaml::from_value(section.clone()).map_err(|e| ConfigError::ParseYaml {
                path: "reports".to_string(),
                source: e,
            })?
        }
        None => Vec::new(),
    };

    let scanner_configs = derive_scanner_configs(doc);
    debug!(
        active = active_scanners.len(),
        enforced = enforced_scanners.len(),
        "Resolved effective configuration"
    );

    Ok(EffectiveConfig {
        project_name,
        custom_info,
        builds,
        reports,
        active_scanners,
        enforced_scanners,
        scanner_configs,
    })
}

/// Three-way activation rule: `"all"`, `"none"`, or an explicit sequence of
/// known scanner identities. Anything else is a configuration error.
fn scanner_set(doc: &Value, key: &str) -> Result<BTreeSet<String>, ConfigError> {
    let Some(value) = doc.get(key) else {
        return Ok(BTreeSet::new());
    };
    match value {
        Value::String(s) if s == "all" => {
            Ok(KNOWN_SCANNERS.iter().map(|s| s.to_string()).collect())
        }
        Value::String(s) if s == "none" => Ok(BTreeSet::new()),
        Value::Sequence(items) => {
            let mut set = BTreeSet::new();
            for item in items {
                let Some(name) = item.as_str() else {
                    return Err(ConfigError::InvalidScannerSet {
                        key: key.to_string(),
                    });
                };
                if !KNOWN_SCANNERS.contains(&name) {
                    return Err(ConfigError::UnknownScanner {
                        key: key.to_string(),
                        name: name.to_string(),
                    });
                }
                set.insert(name.to_string());
            }
            Ok(set)
        }
        _ => Err(ConfigError::InvalidScannerSet {
            key: key.to_string(),
        }),
    }
}

/// Seed every known scanner with engine defaults, merge user options, then
/// consolidate alias groups so every member observes the union.
fn derive_scanner_configs(doc: &Value) -> BTreeMap<String, Mapping> {
    let user = doc.get("scanner_configs").and_then(Value::as_mapping);

    let mut configs = BTreeMap::new();
    for &name in KNOWN_SCANNERS {
        let mut cfg = default_scanner_config();
        if let Some(Value::Mapping(user_cfg)) = user.and_then(|m| m.get(name)) {
            merge_mapping(&mut cfg, user_cfg);
        }
        configs.insert(name.to_string(), cfg);
    }

    for group in ALIAS_GROUPS {
        let mut union = Mapping::new();
        for &member in group.members {
            if let Some(cfg) = configs.get(member) {
                let member_cfg = cfg.clone();
                merge_mapping(&mut union, &member_cfg);
            }
        }
        // Options the user wrote under the canonical group key win last.
        if let Some(Value::Mapping(canonical)) = user.and_then(|m| m.get(group.canonical)) {
            merge_mapping(&mut union, canonical);
        }
        for &member in group.members {
            configs.insert(member.to_string(), union.clone());
        }
    }

    configs
}

fn merge_mapping(base: &mut Mapping, overlay: &Mapping) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(slot) => deep_merge(slot, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn default_scanner_config() -> Mapping {
    let mut cfg = Mapping::new();
    // A raised scanner error counts as a scan failure unless overridden.
    cfg.insert(Value::from("pass_on_raise"), Value::from(false));
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn resolver() -> ConfigResolver {
        ConfigResolver::new().with_env_substitution(false)
    }

    #[test]
    fn test_defaults_activate_all_scanners() {
        let config = resolver().resolve(&[]).unwrap();
        assert_eq!(config.active_scanners.len(), KNOWN_SCANNERS.len());
        assert_eq!(config.enforced_scanners.len(), KNOWN_SCANNERS.len());
        assert_eq!(config.project_name, "");
    }

    #[test]
    fn test_active_all_yields_full_set() {
        let config = resolver()
            .resolve(&[yaml("active_scanners: all")])
            .unwrap();
        for &name in KNOWN_SCANNERS {
            assert!(config.is_active(name), "{name} should be active");
        }
    }

    #[test]
    fn test_active_none_yields_empty_set() {
        let config = resolver()
            .resolve(&[yaml("active_scanners: none")])
            .unwrap();
        assert!(config.active_scanners.is_empty());
    }

    #[test]
    fn test_explicit_sequence_with_duplicates() {
        let config = resolver()
            .resolve(&[yaml(
                "active_scanners: [PatternSearch, BundleAudit, PatternSearch]",
            )])
            .unwrap();
        assert_eq!(config.active_scanners.len(), 2);
        assert!(config.is_active("PatternSearch"));
        assert!(config.is_active("BundleAudit"));
    }

    #[test]
    fn test_invalid_activation_value_errors() {
        let err = resolver()
            .resolve(&[yaml("active_scanners: 42")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidScannerSet { .. }));
    }

    #[test]
    fn test_unknown_scanner_errors() {
        let err = resolver()
            .resolve(&[yaml("enforced_scanners: [NoSuchScanner]")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScanner { .. }));
    }

    #[test]
    fn test_project_name_whitespace_rejected() {
        let err = resolver()
            .resolve(&[yaml("project_name: \"two words\"")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProjectName(_)));
    }

    #[test]
    fn test_project_name_semicolon_rejected() {
        let err = resolver()
            .resolve(&[yaml("project_name: \"evil;rm\"")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProjectName(_)));
    }

    #[test]
    fn test_later_documents_win() {
        let config = resolver()
            .resolve(&[yaml("project_name: first"), yaml("project_name: second")])
            .unwrap();
        assert_eq!(config.project_name, "second");
    }

    #[test]
    fn test_every_scanner_seeded_with_defaults() {
        let config = resolver().resolve(&[]).unwrap();
        for &name in KNOWN_SCANNERS {
            let cfg = config.scanner_config(name).unwrap();
            assert_eq!(cfg.get("pass_on_raise"), Some(&Value::from(false)));
        }
    }

    #[test]
    fn test_user_options_override_defaults() {
        let config = resolver()
            .resolve(&[yaml(
                "scanner_configs:\n  BundleAudit:\n    pass_on_raise: true\n    extra: 1\n",
            )])
            .unwrap();
        let cfg = config.scanner_config("BundleAudit").unwrap();
        assert_eq!(cfg.get("pass_on_raise"), Some(&Value::from(true)));
        assert_eq!(cfg.get("extra"), Some(&Value::from(1)));
    }

    #[test]
    fn test_alias_group_members_observe_union() {
        let config = resolver()
            .resolve(&[yaml(
                "scanner_configs:\n  NpmAudit:\n    registry: npm\n  YarnAudit:\n    offline: true\n",
            )])
            .unwrap();
        let npm = config.scanner_config("NpmAudit").unwrap();
        let yarn = config.scanner_config("YarnAudit").unwrap();
        assert_eq!(npm, yarn);
        assert_eq!(npm.get("registry"), Some(&Value::from("npm")));
        assert_eq!(npm.get("offline"), Some(&Value::from(true)));
    }

    #[test]
    fn test_canonical_alias_key_wins_last() {
        let config = resolver()
            .resolve(&[yaml(
                "scanner_configs:\n  NpmAudit:\n    level: low\n  NodeAudit:\n    level: high\n",
            )])
            .unwrap();
        assert_eq!(
            config.scanner_option("NpmAudit", "level"),
            Some(&Value::from("high"))
        );
        assert_eq!(
            config.scanner_option("YarnAudit", "level"),
            Some(&Value::from("high"))
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let docs = [yaml(
            "project_name: repo\nactive_scanners: [PatternSearch]\nscanner_configs:\n  PatternSearch:\n    matches: []\n",
        )];
        let first = resolver().resolve(&docs).unwrap();
        let second = resolver().resolve(&docs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reports_section_parsed() {
        let config = resolver()
            .resolve(&[yaml(
                "reports:\n  - uri: ./out.sarif\n    format: sarif\n  - uri: ./out.json\n    format: json\n    verbose: true\n",
            )])
            .unwrap();
        assert_eq!(config.reports.len(), 2);
        assert_eq!(config.reports[0].format, ReportFormat::Sarif);
        assert!(config.reports[1].verbose);
    }

    #[test]
    fn test_ignore_ids_strip_report_entries() {
        let config = ConfigResolver::new()
            .with_env_substitution(false)
            .with_ignore_ids(["reports:slack"])
            .resolve(&[yaml(
                "reports:\n  - id: slack\n    uri: https://hooks.example.com\n  - id: file\n    uri: ./out.json\n    format: json\n",
            )])
            .unwrap();
        assert_eq!(config.reports.len(), 1);
        assert_eq!(config.reports[0].uri, "./out.json");
    }

    #[test]
    fn test_filter_chain_applied_after_merge() {
        let mut filters = FilterChain::new();
        filters.register(|mut doc: Value| {
            if let Value::Mapping(ref mut map) = doc {
                map.insert(Value::from("project_name"), Value::from("rewritten"));
            }
            doc
        });
        let config = ConfigResolver::new()
            .with_env_substitution(false)
            .with_filters(filters)
            .resolve(&[yaml("project_name: original")])
            .unwrap();
        assert_eq!(config.project_name, "rewritten");
    }

    #[test]
    fn test_env_substitution_applied_when_enabled() {
        unsafe { std::env::set_var("POLYSCAN_TEST_RESOLVER_NAME", "from-env") };
        let config = ConfigResolver::new()
            .resolve(&[yaml("project_name: \"{{POLYSCAN_TEST_RESOLVER_NAME}}\"")])
            .unwrap();
        assert_eq!(config.project_name, "from-env");
    }

    #[test]
    fn test_builds_matrix_kept() {
        let config = resolver()
            .resolve(&[yaml("builds:\n  staging:\n    url: s\n  prod:\n    url: p\n")])
            .unwrap();
        assert_eq!(config.builds.len(), 2);
    }
}
