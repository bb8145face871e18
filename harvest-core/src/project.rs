//! Single-language, display-ready view of resolved specialists.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::resolve::{ResolvedSpecialist, ServiceRef};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("Invalid identifier regex")
});

/// True if `s` has the 8-4-4-4-12 hex shape of a raw id.
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER_RE.is_match(s.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectedSpecialist {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub title: String,
    pub short_description: String,
    pub presentation: String,
    /// Human-readable service names only.
    pub services: Vec<String>,
}

impl ProjectedSpecialist {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Narrow a resolved specialist to `language`.
///
/// Missing translations become empty strings. Services that are still raw
/// ids (unresolved, or shaped like one) are dropped.
pub fn project(record: &ResolvedSpecialist, language: &str) -> ProjectedSpecialist {
    let services = record
        .services
        .iter()
        .filter_map(ServiceRef::label)
        .filter(|label| !label.trim().is_empty() && !is_identifier(label))
        .map(str::to_string)
        .collect();

    ProjectedSpecialist {
        id: record.id.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        image_uri: record.image_uri.clone().filter(|uri| !uri.is_empty()),
        title: record.title.get_or_empty(language).to_string(),
        short_description: record.short_description.get_or_empty(language).to_string(),
        presentation: record.presentation.get_or_empty(language).to_string(),
        services,
    }
}

pub fn project_all(records: &[ResolvedSpecialist], language: &str) -> Vec<ProjectedSpecialist> {
    records.iter().map(|r| project(r, language)).collect()
}

/// Distinct service names across all specialists, sorted.
pub fn filter_labels(records: &[ProjectedSpecialist]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.services.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
