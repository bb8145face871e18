use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A record that can live in a snapshot file, keyed by its id.
pub trait SnapshotRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Unique identifier of this record within its snapshot.
    fn record_id(&self) -> &str;

    /// Build a record from the detail response fetched for `id`.
    fn from_detail(id: &str, body: JsonValue) -> Result<Self, serde_json::Error>;
}

/// One language variant of a localized text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedValue {
    #[serde(rename = "TwoLetterISOLanguage", default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(rename = "Value", default, deserialize_with = "null_as_empty")]
    pub value: String,
}

/// A multi-language text field, as delivered by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub Vec<LocalizedValue>);

impl LocalizedText {
    /// Text in the given language, if the field carries that language.
    pub fn get(&self, language: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|v| v.language.eq_ignore_ascii_case(language))
            .map(|v| v.value.as_str())
    }

    /// Text in the given language, or an empty string.
    pub fn get_or_empty(&self, language: &str) -> &str {
        self.get(language).unwrap_or("")
    }
}

impl<const N: usize> From<[(&str, &str); N]> for LocalizedText {
    fn from(pairs: [(&str, &str); N]) -> Self {
        LocalizedText(
            pairs
                .iter()
                .map(|(language, value)| LocalizedValue {
                    language: language.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        )
    }
}

/// Minimal specialist record from the paginated list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialistStub {
    /// Empty when the listing sent no usable id; such stubs are not kept.
    #[serde(rename = "Id", default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(rename = "FirstName", default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(rename = "LastName", default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    /// Fields we don't interpret, kept so the snapshot mirrors the API.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// One page of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialistPage {
    #[serde(rename = "Specialists", default)]
    pub specialists: Vec<SpecialistStub>,
    /// Total number of matching specialists, when the API reports it.
    #[serde(rename = "TotalCount", alias = "Total", default)]
    pub total_count: Option<u64>,
}

/// Full specialist record from the detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialistDetail {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "FirstName", default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(rename = "LastName", default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(rename = "ImageUri", default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "null_as_default")]
    pub title: LocalizedText,
    #[serde(rename = "ShortDescription", default, deserialize_with = "null_as_default")]
    pub short_description: LocalizedText,
    #[serde(rename = "Presentation", default, deserialize_with = "null_as_default")]
    pub presentation: LocalizedText,
    #[serde(rename = "ServiceIds", default, deserialize_with = "non_null_items")]
    pub service_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SnapshotRecord for SpecialistDetail {
    fn record_id(&self) -> &str {
        &self.id
    }

    /// Keyed by the requested id, whatever `Id` the body carries.
    fn from_detail(id: &str, body: JsonValue) -> Result<Self, serde_json::Error> {
        let mut detail: SpecialistDetail = serde_json::from_value(body)?;
        if detail.id != id {
            if !detail.id.is_empty() {
                tracing::debug!(requested = id, returned = %detail.id, "Detail id differs from requested id");
            }
            detail.id = id.to_string();
        }
        Ok(detail)
    }
}

impl SnapshotRecord for SpecialistStub {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn from_detail(id: &str, body: JsonValue) -> Result<Self, serde_json::Error> {
        let mut stub: SpecialistStub = serde_json::from_value(body)?;
        stub.id = id.to_string();
        Ok(stub)
    }
}

/// Reference to a parent grouping of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterService {
    #[serde(rename = "ServiceID", default, deserialize_with = "null_as_empty")]
    pub service_id: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Service catalog entry from the service detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// The id the entry was requested with; stamped on at ingestion.
    #[serde(rename = "id", default)]
    pub id: String,
    #[serde(rename = "Name", default, deserialize_with = "null_as_default")]
    pub name: LocalizedText,
    #[serde(rename = "MasterServices", default, deserialize_with = "null_as_default")]
    pub master_services: Vec<MasterService>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SnapshotRecord for ServiceEntry {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn from_detail(id: &str, body: JsonValue) -> Result<Self, serde_json::Error> {
        let mut entry: ServiceEntry = serde_json::from_value(body)?;
        entry.id = id.to_string();
        Ok(entry)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    null_as_default(deserializer)
}

/// A list of strings where both the list and its elements may be null.
fn non_null_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items: Vec<Option<String>> = null_as_default(deserializer)?;
    Ok(items.into_iter().flatten().collect())
}
