//! Resumable per-id detail enrichment.

use tracing::{info, warn};

use crate::error::{FetchError, SnapshotError};
use crate::http::HttpClient;
use crate::types::SnapshotRecord;

use super::scheduler::Scheduler;
use super::snapshot::Snapshot;
use super::StageSummary;

/// URL of the detail resource for `id` under `base` (e.g. `.../specialists`).
pub fn detail_url(base: &str, id: &str) -> Result<String, FetchError> {
    let mut url = url::Url::parse(base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .push(id);
    Ok(url.into())
}

/// Fetch detail records for `ids` into `snapshot`, in input order.
///
/// Ids already in the snapshot are not fetched again, which also covers ids
/// repeated in the input. Each fetched record is persisted before moving on.
/// A failed fetch is logged and skipped; the id stays unsatisfied so a later
/// run picks it up.
pub async fn enrich<'i, R, C, I, F>(
    stage: &str,
    scheduler: &mut Scheduler<'_, C>,
    ids: I,
    url_for: F,
    snapshot: &mut Snapshot<R>,
) -> Result<StageSummary, SnapshotError>
where
    R: SnapshotRecord,
    C: HttpClient,
    I: IntoIterator<Item = &'i str>,
    F: Fn(&str) -> Result<String, FetchError>,
{
    let mut summary = StageSummary::start(stage);
    let requests_before = scheduler.calls();

    for id in ids {
        if snapshot.contains(id) {
            summary.already_present += 1;
            continue;
        }

        info!(stage, id, "Fetching details");
        let record = match url_for(id) {
            Ok(url) => match scheduler.fetch(&url).await {
                Ok(body) => R::from_detail(id, body).map_err(FetchError::from),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match record {
            Ok(record) => {
                if snapshot.append(record)? {
                    summary.added += 1;
                } else {
                    warn!(stage, id, "Record id already in snapshot, not stored again");
                    summary.already_present += 1;
                }
            }
            Err(e) => {
                warn!(stage, id, status = ?e.status(), error = %e, "Error fetching details, skipping");
                summary.failed.push(id.to_string());
            }
        }
    }

    let requests = scheduler.calls() - requests_before;
    let summary = summary.finish(requests, snapshot.len());
    info!(
        stage,
        requests = summary.requests,
        added = summary.added,
        failed = summary.failed.len(),
        total = summary.snapshot_len,
        "Details saved to {}",
        snapshot.path().display()
    );
    Ok(summary)
}
