//! Ignore-id filtering applied to config documents before merge.

use serde_yaml::Value;

/// One `"<section>:<id>"` exclusion rule.
///
/// Removes elements from the top-level sequence under `section` whose `id`
/// field equals `id`. Only mapping elements carrying an `id` field are
/// removable; everything else is left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    pub section: String,
    pub id: String,
}

impl IgnoreRule {
    /// Parse a rule from its `section:id` string form. Returns `None` when
    /// the separator is missing or either side is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (section, id) = raw.split_once(':')?;
        if section.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self {
            section: section.to_string(),
            id: id.to_string(),
        })
    }
}

/// Strip every entry matching one of `rules` from `doc` in place.
pub fn strip_ignored(doc: &mut Value, rules: &[IgnoreRule]) {
    let Value::Mapping(map) = doc else {
        return;
    };

    for rule in rules {
        let Some(Value::Sequence(items)) = map.get_mut(rule.section.as_str()) else {
            continue;
        };
        items.retain(|item| {
            let Value::Mapping(entry) = item else {
                return true;
            };
            match entry.get("id") {
                Some(id) => !scalar_matches(id, &rule.id),
                None => true,
            }
        });
    }
}

/// Compare a scalar config value against an ignore id, matching numbers by
/// their canonical string rendering.
fn scalar_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        Value::Bool(b) => b.to_string() == id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_valid_rule() {
        let rule = IgnoreRule::parse("reports:slack").unwrap();
        assert_eq!(rule.section, "reports");
        assert_eq!(rule.id, "slack");
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(IgnoreRule::parse("reports"), None);
        assert_eq!(IgnoreRule::parse(":x"), None);
        assert_eq!(IgnoreRule::parse("x:"), None);
    }

    #[test]
    fn test_strip_matching_entry() {
        let mut doc = yaml(
            r#"
reports:
  - id: slack
    uri: https://example.com/hook
  - id: file
    uri: ./report.json
"#,
        );
        strip_ignored(&mut doc, &[IgnoreRule::parse("reports:slack").unwrap()]);
        let reports = doc.get("reports").unwrap().as_sequence().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].get("id").unwrap(), &Value::from("file"));
    }

    #[test]
    fn test_entries_without_id_survive() {
        let mut doc = yaml("reports:\n  - uri: ./report.json\n  - plain-string\n");
        strip_ignored(&mut doc, &[IgnoreRule::parse("reports:anything").unwrap()]);
        assert_eq!(doc.get("reports").unwrap().as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn test_non_sequence_section_untouched() {
        let mut doc = yaml("reports: scalar-value");
        strip_ignored(&mut doc, &[IgnoreRule::parse("reports:x").unwrap()]);
        assert_eq!(doc.get("reports").unwrap(), &Value::from("scalar-value"));
    }

    #[test]
    fn test_numeric_id_matches_by_rendering() {
        let mut doc = yaml("builds:\n  - id: 7\n  - id: 8\n");
        strip_ignored(&mut doc, &[IgnoreRule::parse("builds:7").unwrap()]);
        let builds = doc.get("builds").unwrap().as_sequence().unwrap();
        assert_eq!(builds.len(), 1);
    }
}
