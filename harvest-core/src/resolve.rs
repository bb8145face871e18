//! Cross-reference join: service ids on specialists to service names.

use std::collections::{HashMap, HashSet};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::types::{LocalizedText, ServiceEntry, SpecialistDetail};

/// A specialist's reference to a service after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRef {
    /// The service name in the requested language.
    Label(String),
    /// No name was found; the raw service id.
    Unresolved(String),
}

impl ServiceRef {
    /// The label if resolved, otherwise the raw id.
    pub fn as_str(&self) -> &str {
        match self {
            ServiceRef::Label(s) | ServiceRef::Unresolved(s) => s,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ServiceRef::Label(s) => Some(s),
            ServiceRef::Unresolved(_) => None,
        }
    }
}

impl Serialize for ServiceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Specialist detail with service ids relabeled where possible.
/// Serializes in the same shape as the detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSpecialist {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "ImageUri", skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(rename = "Title")]
    pub title: LocalizedText,
    #[serde(rename = "ShortDescription")]
    pub short_description: LocalizedText,
    #[serde(rename = "Presentation")]
    pub presentation: LocalizedText,
    #[serde(rename = "ServiceIds")]
    pub services: Vec<ServiceRef>,
    /// Detail fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Which catalog entries take part in resolution.
pub trait Membership {
    fn includes(&self, entry: &ServiceEntry) -> bool;
}

impl<F> Membership for F
where
    F: Fn(&ServiceEntry) -> bool,
{
    fn includes(&self, entry: &ServiceEntry) -> bool {
        self(entry)
    }
}

/// Accepts services that belong to at least one of the given parent services.
#[derive(Debug, Clone, Default)]
pub struct ParentServiceFilter {
    parents: HashSet<String>,
}

impl ParentServiceFilter {
    pub fn new<I, S>(parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parents: parents.into_iter().map(Into::into).collect(),
        }
    }
}

impl Membership for ParentServiceFilter {
    fn includes(&self, entry: &ServiceEntry) -> bool {
        entry
            .master_services
            .iter()
            .any(|m| self.parents.contains(&m.service_id))
    }
}

/// Build the service id -> name map for `language`.
///
/// Entries outside `membership`, or without a non-empty name in `language`,
/// contribute nothing and their ids stay unresolved.
pub fn build_lookup<M: Membership + ?Sized>(
    catalog: &[ServiceEntry],
    membership: &M,
    language: &str,
) -> HashMap<String, String> {
    catalog
        .iter()
        .filter(|entry| membership.includes(entry))
        .filter_map(|entry| {
            entry
                .name
                .get(language)
                .filter(|name| !name.is_empty())
                .map(|name| (entry.id.clone(), name.to_string()))
        })
        .collect()
}

/// Relabel one specialist's services. Never drops a reference.
pub fn resolve_one(record: &SpecialistDetail, lookup: &HashMap<String, String>) -> ResolvedSpecialist {
    let services = record
        .service_ids
        .iter()
        .map(|id| match lookup.get(id) {
            Some(label) => ServiceRef::Label(label.clone()),
            None => ServiceRef::Unresolved(id.clone()),
        })
        .collect();

    ResolvedSpecialist {
        id: record.id.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        image_uri: record.image_uri.clone(),
        title: record.title.clone(),
        short_description: record.short_description.clone(),
        presentation: record.presentation.clone(),
        services,
        extra: record.extra.clone(),
    }
}

pub fn resolve(records: &[SpecialistDetail], lookup: &HashMap<String, String>) -> Vec<ResolvedSpecialist> {
    records.iter().map(|r| resolve_one(r, lookup)).collect()
}

/// Distinct service ids across all specialists, in first-seen order.
pub fn distinct_service_ids(records: &[SpecialistDetail]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .flat_map(|r| r.service_ids.iter())
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
