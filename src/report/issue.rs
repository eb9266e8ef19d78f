//! Raw issue records and their normalization into canonical findings.
//!
//! Scanner families disagree on which identifying fields a finding
//! carries: dependency audits emit CVE or OSVDB advisories, pattern and
//! secret scanners emit a type tag plus a source location, and some tools
//! emit records with no stable identifier at all. [`RawIssue`] models
//! those shapes as a tagged union so the identifier derivation is a
//! pattern match instead of field probing at every call site.

use serde::Serialize;
use serde_yaml::Value;
use uuid::Uuid;

/// Fields common to every raw-record shape. Absent fields stay empty in
/// the canonical issue rather than erroring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFields {
    pub name: Option<String>,
    pub details: Option<String>,
    pub cvss: f64,
    pub url: Option<String>,
    pub resource: Option<String>,
}

/// One raw finding as produced by a scanner adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawIssue {
    /// Record with a CVE advisory identifier.
    Cve { id: String, fields: IssueFields },
    /// Record with an OSVDB advisory identifier and no CVE.
    Osvdb { id: String, fields: IssueFields },
    /// Record identified by a type tag, optionally locating a source.
    /// `rest` keeps the remaining record fields in original order for the
    /// details rendering.
    Tagged {
        kind: String,
        source: Option<String>,
        rest: Vec<(String, String)>,
        fields: IssueFields,
    },
    /// Record with no stable external identifier.
    Unidentified { fields: IssueFields },
}

// Field names consumed into IssueFields or variant selection; everything
// else lands in Tagged::rest.
const CLAIMED_KEYS: &[&str] = &[
    "cve",
    "osvdb",
    "type",
    "source",
    "name",
    "advisory_title",
    "details",
    "description",
    "cvss",
    "url",
    "resource",
    "file",
];

impl RawIssue {
    /// Classify a semi-structured record into its variant. Advisory
    /// identifiers take priority over a type tag: a patched-gem record
    /// carrying both `type` and `cve` is identified by the CVE.
    pub fn from_value(record: &Value) -> Self {
        let fields = IssueFields {
            name: string_field(record, &["name", "advisory_title"]),
            details: string_field(record, &["details", "description"]),
            cvss: record
                .get("cvss")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            url: string_field(record, &["url"]),
            resource: string_field(record, &["resource", "file"]),
        };

        if let Some(id) = string_field(record, &["cve"]) {
            return Self::Cve { id, fields };
        }
        if let Some(id) = string_field(record, &["osvdb"]) {
            return Self::Osvdb { id, fields };
        }
        if let Some(kind) = string_field(record, &["type"]) {
            return Self::Tagged {
                kind,
                source: string_field(record, &["source"]),
                rest: leftover_fields(record),
                fields,
            };
        }
        Self::Unidentified { fields }
    }

    pub fn fields(&self) -> &IssueFields {
        match self {
            Self::Cve { fields, .. }
            | Self::Osvdb { fields, .. }
            | Self::Tagged { fields, .. }
            | Self::Unidentified { fields } => fields,
        }
    }
}

/// One normalized finding, ready for classification and report assembly.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CanonicalIssue {
    pub id: String,
    pub name: String,
    pub details: String,
    pub cvss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// Derive the canonical form of a raw finding.
///
/// Identifier priority: CVE, then OSVDB, then the type tag, then a
/// generated fallback token when no stable identifier exists. Tagged
/// records render their name as `"{type} {source}"` and their details as
/// the newline-joined record fields with capitalized labels.
pub fn normalize(raw: &RawIssue) -> CanonicalIssue {
    match raw {
        RawIssue::Cve { id, fields } | RawIssue::Osvdb { id, fields } => CanonicalIssue {
            id: id.clone(),
            name: fields.name.clone().unwrap_or_default(),
            details: fields.details.clone().unwrap_or_default(),
            cvss: fields.cvss,
            url: fields.url.clone(),
            resource: fields.resource.clone(),
        },
        RawIssue::Tagged {
            kind,
            source,
            rest,
            fields,
        } => {
            let name = match source {
                Some(source) => format!("{kind} {source}"),
                None => fields.name.clone().unwrap_or_else(|| kind.clone()),
            };
            CanonicalIssue {
                id: kind.clone(),
                name,
                details: tagged_details(kind, source.as_deref(), rest, fields),
                cvss: fields.cvss,
                url: fields.url.clone(),
                resource: fields.resource.clone(),
            }
        }
        RawIssue::Unidentified { fields } => CanonicalIssue {
            id: Uuid::new_v4().to_string(),
            name: fields.name.clone().unwrap_or_default(),
            details: fields.details.clone().unwrap_or_default(),
            cvss: fields.cvss,
            url: fields.url.clone(),
            resource: fields.resource.clone(),
        },
    }
}

fn tagged_details(
    kind: &str,
    source: Option<&str>,
    rest: &[(String, String)],
    fields: &IssueFields,
) -> String {
    if let Some(details) = &fields.details {
        return details.clone();
    }
    let mut lines = vec![format!("Type: {kind}")];
    if let Some(source) = source {
        lines.push(format!("Source: {source}"));
    }
    for (key, value) in rest {
        lines.push(format!("{}: {value}", capitalize(key)));
    }
    lines.join("\n")
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// Empty strings count as absent: an identifier field that is present but
// blank must not become a rule id.
fn string_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key))
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
}

fn leftover_fields(record: &Value) -> Vec<(String, String)> {
    let Value::Mapping(map) = record else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?;
            if CLAIMED_KEYS.contains(&key) {
                return None;
            }
            Some((key.to_string(), scalar_to_string(value)?))
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
