//! Pipeline stages as CLI operations, and the full run with its manifest.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use harvest_core::pipeline::{read_json, write_json_atomic};
use harvest_core::{
    build_lookup, collect_specialists, detail_url, distinct_service_ids, enrich, filter_labels,
    project_all, resolve, HeaderSet, HttpClient, ProjectedSpecialist, ResolvedSpecialist,
    Scheduler, ServiceEntry, Snapshot, SpecialistDetail, SpecialistStub, StageSummary,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::HarvestConfig;
use crate::{export, page};

// ============================================================================
// Run manifest
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub language: String,
    pub status: RunStatus,
    pub stages: Vec<StageSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunManifest {
    fn new(language: &str) -> Self {
        let started_at = Utc::now();
        Self {
            run_id: started_at.format("%Y%m%d-%H%M%S").to_string(),
            started_at,
            completed_at: None,
            language: language.to_string(),
            status: RunStatus::Running,
            stages: Vec::new(),
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
            .with_context(|| format!("Failed to write run manifest: {}", path.display()))
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Collect the paginated specialist listing.
pub async fn collect<C: HttpClient>(config: &HarvestConfig, client: &C) -> Result<StageSummary> {
    let paths = config.paths();
    let mut snapshot: Snapshot<SpecialistStub> = Snapshot::open(&paths.stubs)?;
    let mut scheduler = Scheduler::new(client, HeaderSet::new(), config.list_throttle());
    let summary = collect_specialists(&mut scheduler, &config.list_query(), &mut snapshot).await?;
    Ok(summary)
}

/// Fetch details for every collected specialist.
pub async fn enrich_specialists<C: HttpClient>(
    config: &HarvestConfig,
    client: &C,
) -> Result<StageSummary> {
    let paths = config.paths();
    let stubs: Vec<SpecialistStub> = read_json(&paths.stubs)
        .with_context(|| "No specialist list found; run `collect` first")?;
    warn_if_no_key(config);

    let mut snapshot: Snapshot<SpecialistDetail> = Snapshot::open(&paths.details)?;
    let mut scheduler = Scheduler::new(client, config.detail_headers(), config.list_throttle());
    let summary = enrich(
        "specialists",
        &mut scheduler,
        stubs.iter().map(|s| s.id.as_str()),
        |id| detail_url(&config.specialist_url, id),
        &mut snapshot,
    )
    .await?;
    Ok(summary)
}

/// Write the distinct service ids referenced by specialists.
pub fn extract_service_ids(config: &HarvestConfig) -> Result<Vec<String>> {
    let paths = config.paths();
    let details: Vec<SpecialistDetail> = read_json(&paths.details)
        .with_context(|| "No specialist details found; run `enrich-specialists` first")?;
    let ids = distinct_service_ids(&details);
    write_json_atomic(&paths.service_ids, &ids)?;
    info!(
        count = ids.len(),
        "Distinct service IDs have been saved to {}",
        paths.service_ids.display()
    );
    Ok(ids)
}

/// Fetch details for every referenced service.
pub async fn enrich_services<C: HttpClient>(
    config: &HarvestConfig,
    client: &C,
) -> Result<StageSummary> {
    let paths = config.paths();
    let ids: Vec<String> = read_json(&paths.service_ids)
        .with_context(|| "No service id list found; run `extract-service-ids` first")?;
    warn_if_no_key(config);

    let mut snapshot: Snapshot<ServiceEntry> = Snapshot::open(&paths.services)?;
    let mut scheduler = Scheduler::new(client, config.detail_headers(), config.service_throttle());
    let summary = enrich(
        "services",
        &mut scheduler,
        ids.iter().map(String::as_str),
        |id| detail_url(&config.service_url, id),
        &mut snapshot,
    )
    .await?;
    Ok(summary)
}

/// Join specialists with service names and write the resolved list.
pub fn link(config: &HarvestConfig) -> Result<Vec<ResolvedSpecialist>> {
    let paths = config.paths();
    let resolved = resolve_from_snapshots(config)?;
    write_json_atomic(&paths.resolved, &resolved)?;
    info!(
        specialists = resolved.len(),
        "Specialists with service names have been saved to {}",
        paths.resolved.display()
    );
    Ok(resolved)
}

/// Export the projected specialists as CSV.
pub fn export_csv(config: &HarvestConfig) -> Result<()> {
    let projected = projected_from_snapshots(config)?;
    export::export_csv(&projected, &config.paths().csv)
}

/// Render the projected specialists as a filterable HTML page.
pub fn generate_html(config: &HarvestConfig) -> Result<()> {
    let path = config.paths().html;
    let projected = projected_from_snapshots(config)?;
    let labels = filter_labels(&projected);
    let html = page::render_page(&projected, &labels, &config.language);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    std::fs::write(&path, html)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    info!(
        specialists = projected.len(),
        filters = labels.len(),
        "HTML file has been generated at {}",
        path.display()
    );
    Ok(())
}

fn resolve_from_snapshots(config: &HarvestConfig) -> Result<Vec<ResolvedSpecialist>> {
    let paths = config.paths();
    let details: Vec<SpecialistDetail> = read_json(&paths.details)
        .with_context(|| "No specialist details found; run `enrich-specialists` first")?;
    let services: Vec<ServiceEntry> = read_json(&paths.services)
        .with_context(|| "No service details found; run `enrich-services` first")?;

    let lookup = build_lookup(&services, &config.membership(), &config.language);
    info!(
        services = services.len(),
        resolvable = lookup.len(),
        "Built service name lookup"
    );
    Ok(resolve(&details, &lookup))
}

fn projected_from_snapshots(config: &HarvestConfig) -> Result<Vec<ProjectedSpecialist>> {
    let resolved = resolve_from_snapshots(config)?;
    Ok(project_all(&resolved, &config.language))
}

fn warn_if_no_key(config: &HarvestConfig) {
    if config.subscription_key.is_empty() {
        tracing::warn!("HARVEST_SUBSCRIPTION_KEY is not set; detail requests will likely be rejected");
    }
}

// ============================================================================
// Full run
// ============================================================================

/// Run every stage in order, recording each in the run manifest.
pub async fn run_all<C: HttpClient>(config: &HarvestConfig, client: &C) -> Result<RunManifest> {
    let manifest_path = config.paths().manifest;
    let mut manifest = RunManifest::new(&config.language);
    manifest.save(&manifest_path)?;

    let result = run_stages(config, client, &mut manifest, &manifest_path).await;

    manifest.completed_at = Some(Utc::now());
    manifest.status = if result.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    manifest.save(&manifest_path)?;
    result?;

    info!(run_id = %manifest.run_id, "Run completed");
    Ok(manifest)
}

async fn run_stages<C: HttpClient>(
    config: &HarvestConfig,
    client: &C,
    manifest: &mut RunManifest,
    manifest_path: &Path,
) -> Result<()> {
    record_stage(manifest, manifest_path, collect(config, client).await?)?;
    record_stage(manifest, manifest_path, enrich_specialists(config, client).await?)?;
    extract_service_ids(config)?;
    record_stage(manifest, manifest_path, enrich_services(config, client).await?)?;

    link(config)?;
    export_csv(config)?;
    generate_html(config)?;
    Ok(())
}

fn record_stage(manifest: &mut RunManifest, path: &Path, summary: StageSummary) -> Result<()> {
    info!(
        stage = %summary.stage,
        duration_ms = summary.duration_ms().unwrap_or_default(),
        requests = summary.requests,
        failed = summary.failed.len(),
        "Stage finished"
    );
    manifest.stages.push(summary);
    manifest.save(path)
}
