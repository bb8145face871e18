//! Harvest configuration: built-in defaults, then environment, then flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_core::{HeaderSet, ListQuery, ParentServiceFilter, Throttle};

const DEFAULT_LIST_URL: &str = "https://www.terveystalo.com/api/specialist/search";
const DEFAULT_SPECIALIST_URL: &str =
    "https://api-prod.api.terveystalo.com/specialist/v2/v2/specialists";
const DEFAULT_SERVICE_URL: &str = "https://api-prod.api.terveystalo.com/service/v2/v2/services";
const DEFAULT_ORIGIN: &str = "https://ajanvaraus.terveystalo.com";
const DEFAULT_FILTER_ID: &str = "52dad52f-4d04-405c-812d-aa261dd0c038";
const DEFAULT_PARENT_SERVICES: [&str; 2] = [
    "50fa826b-8e93-4c55-bc2c-988fa3e021cc",
    "d5c76d66-52a0-4ad1-8fdf-59dafc976c97",
];
/// Number of specialists the default filter matched when this was set up.
/// Pagination is wrong if it drifts; a total reported by the API wins.
const DEFAULT_TOTAL_COUNT: u64 = 278;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub list_url: String,
    pub specialist_url: String,
    pub service_url: String,
    pub origin: String,
    pub subscription_key: String,
    pub filter_id: String,
    pub total_count: u64,
    pub language: String,
    pub parent_services: Vec<String>,
    pub data_dir: PathBuf,
    pub delay_ms: u64,
    pub service_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_LIST_URL.to_string(),
            specialist_url: DEFAULT_SPECIALIST_URL.to_string(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            subscription_key: String::new(),
            filter_id: DEFAULT_FILTER_ID.to_string(),
            total_count: DEFAULT_TOTAL_COUNT,
            language: "fi".to_string(),
            parent_services: DEFAULT_PARENT_SERVICES.iter().map(|s| s.to_string()).collect(),
            data_dir: PathBuf::from("data"),
            delay_ms: 300,
            service_delay_ms: 400,
            timeout_secs: 30,
        }
    }
}

impl HarvestConfig {
    /// Defaults overridden by the environment.
    ///
    /// Environment variables:
    /// - `HARVEST_LIST_URL`, `HARVEST_SPECIALIST_URL`, `HARVEST_SERVICE_URL`: endpoints
    /// - `HARVEST_ORIGIN`: `origin` header sent to the detail endpoints
    /// - `HARVEST_SUBSCRIPTION_KEY`: API subscription key for the detail endpoints
    /// - `HARVEST_FILTER_ID`: service id the listing is filtered by
    /// - `HARVEST_TOTAL_COUNT`: expected number of listed specialists
    /// - `HARVEST_LANGUAGE`: two-letter language code
    /// - `HARVEST_PARENT_SERVICES`: comma-separated parent service ids
    /// - `HARVEST_DATA_DIR`: where snapshots and outputs are written
    /// - `HARVEST_DELAY_MS`, `HARVEST_SERVICE_DELAY_MS`: pause after each request
    /// - `HARVEST_TIMEOUT_SECS`: per-request timeout
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("HARVEST_LIST_URL") {
            config.list_url = v;
        }
        if let Some(v) = var("HARVEST_SPECIALIST_URL") {
            config.specialist_url = v;
        }
        if let Some(v) = var("HARVEST_SERVICE_URL") {
            config.service_url = v;
        }
        if let Some(v) = var("HARVEST_ORIGIN") {
            config.origin = v;
        }
        if let Some(v) = var("HARVEST_SUBSCRIPTION_KEY") {
            config.subscription_key = v;
        }
        if let Some(v) = var("HARVEST_FILTER_ID") {
            config.filter_id = v;
        }
        if let Some(v) = var("HARVEST_TOTAL_COUNT").and_then(|v| v.trim().parse().ok()) {
            config.total_count = v;
        }
        if let Some(v) = var("HARVEST_LANGUAGE") {
            config.language = v.trim().to_lowercase();
        }
        if let Some(v) = var("HARVEST_PARENT_SERVICES") {
            config.parent_services = parse_list(&v);
        }
        if let Some(v) = var("HARVEST_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var("HARVEST_DELAY_MS").and_then(|v| v.trim().parse().ok()) {
            config.delay_ms = v;
        }
        if let Some(v) = var("HARVEST_SERVICE_DELAY_MS").and_then(|v| v.trim().parse().ok()) {
            config.service_delay_ms = v;
        }
        if let Some(v) = var("HARVEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            config.timeout_secs = v;
        }

        config
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            list_url: self.list_url.clone(),
            language: self.language.clone(),
            filter_id: self.filter_id.clone(),
            total_count: self.total_count,
        }
    }

    /// Headers for the detail endpoints.
    pub fn detail_headers(&self) -> HeaderSet {
        HeaderSet::detail_api(&self.subscription_key, &self.origin, &self.language)
    }

    pub fn membership(&self) -> ParentServiceFilter {
        ParentServiceFilter::new(self.parent_services.iter().cloned())
    }

    pub fn list_throttle(&self) -> Throttle {
        Throttle::from_millis(self.delay_ms)
    }

    pub fn service_throttle(&self) -> Throttle {
        Throttle::from_millis(self.service_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir, &self.language)
    }
}

/// Locations of every snapshot and artifact under the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub stubs: PathBuf,
    pub details: PathBuf,
    pub service_ids: PathBuf,
    pub services: PathBuf,
    pub resolved: PathBuf,
    pub csv: PathBuf,
    pub html: PathBuf,
    pub manifest: PathBuf,
}

impl DataPaths {
    pub fn new(dir: &Path, language: &str) -> Self {
        Self {
            stubs: dir.join("specialists.json"),
            details: dir.join("specialists_details.json"),
            service_ids: dir.join("distinct_service_ids.json"),
            services: dir.join("service_details.json"),
            resolved: dir.join("specialists_with_service_names.json"),
            csv: dir.join(format!("specialists_{}.csv", language)),
            html: dir.join("specialists.html"),
            manifest: dir.join("run_manifest.json"),
        }
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = HarvestConfig::from_lookup(lookup(&[]));
        assert_eq!(config.total_count, 278);
        assert_eq!(config.language, "fi");
        assert_eq!(config.delay_ms, 300);
        assert_eq!(config.service_delay_ms, 400);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.parent_services.len(), 2);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = HarvestConfig::from_lookup(lookup(&[
            ("HARVEST_LANGUAGE", " SV "),
            ("HARVEST_TOTAL_COUNT", "301"),
            ("HARVEST_PARENT_SERVICES", "a, b,,c"),
            ("HARVEST_DATA_DIR", "/tmp/harvest"),
            ("HARVEST_DELAY_MS", "not-a-number"),
            ("HARVEST_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.language, "sv");
        assert_eq!(config.total_count, 301);
        assert_eq!(config.parent_services, vec!["a", "b", "c"]);
        assert_eq!(config.paths().csv, PathBuf::from("/tmp/harvest/specialists_sv.csv"));
        assert_eq!(config.delay_ms, 300);
    }

    #[test]
    fn detail_headers_use_key_and_origin() {
        let config = HarvestConfig {
            subscription_key: "key".into(),
            ..HarvestConfig::default()
        };
        let headers = config.detail_headers();
        assert_eq!(headers.get("ocp-apim-subscription-key"), Some("key"));
        assert_eq!(headers.get("origin"), Some(DEFAULT_ORIGIN));
    }
}
