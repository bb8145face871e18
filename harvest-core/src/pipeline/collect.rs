//! Paginated collection of specialist stubs from the list endpoint.

use tracing::{info, warn};

use crate::error::{FetchError, SnapshotError};
use crate::http::HttpClient;
use crate::types::{SpecialistPage, SpecialistStub};

use super::scheduler::Scheduler;
use super::snapshot::Snapshot;
use super::StageSummary;

/// Parameters of the list endpoint query.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub list_url: String,
    pub language: String,
    /// Service id the directory listing is filtered by.
    pub filter_id: String,
    /// Expected number of matching specialists. The list endpoint does not
    /// reliably report it, so it is configured; a reported total wins.
    pub total_count: u64,
}

/// URL of one page of the list endpoint.
pub fn list_page_url(query: &ListQuery, page: u32) -> Result<String, FetchError> {
    let mut url =
        url::Url::parse(&query.list_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("twoLetterIsoLanguage", &query.language)
        .append_pair("page", &page.to_string())
        .append_pair("serviceid", &query.filter_id);
    Ok(url.into())
}

/// Number of pages needed to cover `total_count` items at `page_size` per page.
pub fn pages_for(total_count: u64, page_size: usize) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Yields page numbers in increasing order.
///
/// Until the page count is known only page 1 is yielded.
#[derive(Debug, Clone)]
pub struct PageCursor {
    next: u32,
    total_pages: Option<u32>,
}

impl PageCursor {
    pub fn new() -> Self {
        Self {
            next: 1,
            total_pages: None,
        }
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = Some(total_pages);
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for PageCursor {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next > self.total_pages.unwrap_or(1) {
            return None;
        }
        let page = self.next;
        self.next += 1;
        Some(page)
    }
}

/// Collect every page of the directory listing into `snapshot`.
///
/// Stubs already in the snapshot are kept and not appended twice. The whole
/// accumulated list is persisted after each page. A failed page is skipped;
/// an empty page ends collection.
pub async fn collect_specialists<C: HttpClient>(
    scheduler: &mut Scheduler<'_, C>,
    query: &ListQuery,
    snapshot: &mut Snapshot<SpecialistStub>,
) -> Result<StageSummary, SnapshotError> {
    let mut summary = StageSummary::start("collect");
    let requests_before = scheduler.calls();
    let mut cursor = PageCursor::new();

    while let Some(page) = cursor.next() {
        match cursor.total_pages() {
            Some(total) => info!(page, total, "Fetching page {} of {}", page, total),
            None => info!(page, "Fetching page {}", page),
        }

        let url = match list_page_url(query, page) {
            Ok(url) => url,
            Err(e) => {
                warn!(page, error = %e, "Cannot build list URL");
                summary.failed.push(format!("page {}", page));
                continue;
            }
        };

        let page_data = match scheduler.fetch(&url).await {
            Ok(body) => serde_json::from_value::<SpecialistPage>(body).map_err(FetchError::from),
            Err(e) => Err(e),
        };
        let page_data = match page_data {
            Ok(data) => data,
            Err(e) => {
                warn!(page, error = %e, "Error fetching page, skipping");
                summary.failed.push(format!("page {}", page));
                continue;
            }
        };

        if page_data.specialists.is_empty() {
            info!(page, "Page returned no specialists, stopping");
            break;
        }

        if cursor.total_pages().is_none() {
            let total_count = effective_total(query.total_count, page_data.total_count);
            let total_pages = pages_for(total_count, page_data.specialists.len());
            info!(
                total_count,
                page_size = page_data.specialists.len(),
                total_pages,
                "Derived page count"
            );
            cursor.set_total_pages(total_pages);
        }

        let (stubs, missing_id): (Vec<_>, Vec<_>) = page_data
            .specialists
            .into_iter()
            .partition(|stub| !stub.id.is_empty());
        if !missing_id.is_empty() {
            warn!(page, count = missing_id.len(), "Dropping specialists without an id");
        }
        let received = stubs.len();
        let added = snapshot.extend(stubs)?;
        summary.added += added;
        summary.already_present += received - added;
    }

    let requests = scheduler.calls() - requests_before;
    let summary = summary.finish(requests, snapshot.len());
    info!(
        requests = summary.requests,
        added = summary.added,
        total = summary.snapshot_len,
        "Collected specialists into {}",
        snapshot.path().display()
    );
    Ok(summary)
}

fn effective_total(configured: u64, reported: Option<u64>) -> u64 {
    match reported {
        Some(reported) if reported > 0 => {
            if reported != configured {
                warn!(
                    configured,
                    reported, "API reports a different total count, using the reported one"
                );
            }
            reported
        }
        _ => configured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HeaderSet, MockClient, Throttle};
    use serde_json::{json, Value as JsonValue};
    use tempfile::TempDir;

    fn query(total_count: u64) -> ListQuery {
        ListQuery {
            list_url: "https://directory.test/api/specialist/search".to_string(),
            language: "fi".to_string(),
            filter_id: "svc".to_string(),
            total_count,
        }
    }

    fn page_body(page: u32, size: usize) -> JsonValue {
        let specialists: Vec<JsonValue> = (0..size)
            .map(|i| json!({ "Id": format!("p{}-{}", page, i), "FirstName": "F", "LastName": "L" }))
            .collect();
        json!({ "Specialists": specialists })
    }

    fn client_with_pages(q: &ListQuery, sizes: &[usize]) -> MockClient {
        sizes
            .iter()
            .enumerate()
            .fold(MockClient::new(), |client, (i, size)| {
                let page = i as u32 + 1;
                client.with_json(&list_page_url(q, page).unwrap(), page_body(page, *size))
            })
    }

    #[test]
    fn page_url_carries_query() {
        let url = list_page_url(&query(278), 3).unwrap();
        assert_eq!(
            url,
            "https://directory.test/api/specialist/search?twoLetterIsoLanguage=fi&page=3&serviceid=svc"
        );
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(pages_for(278, 50), 6);
        assert_eq!(pages_for(250, 50), 5);
        assert_eq!(pages_for(278, 0), 0);
    }

    #[test]
    fn cursor_yields_one_page_until_total_known() {
        let mut cursor = PageCursor::new();
        assert_eq!(cursor.next(), Some(1));
        assert_eq!(cursor.next(), None);

        let mut cursor = PageCursor::new();
        assert_eq!(cursor.next(), Some(1));
        cursor.set_total_pages(3);
        assert_eq!(cursor.collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn stops_after_computed_page_count() {
        let dir = TempDir::new().unwrap();
        let q = query(278);
        // A seventh page exists but must never be requested.
        let client = client_with_pages(&q, &[50, 50, 50, 50, 50, 28, 50]);
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&dir.path().join("specialists.json")).unwrap();

        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.requests, 6);
        assert_eq!(summary.added, 278);
        assert_eq!(client.request_count(), 6);
        assert_eq!(client.requests()[5], list_page_url(&q, 6).unwrap());

        let on_disk: Vec<SpecialistStub> =
            crate::pipeline::read_json(&dir.path().join("specialists.json")).unwrap();
        assert_eq!(on_disk.len(), 278);
        assert_eq!(on_disk[0].id, "p1-0");
        assert_eq!(on_disk[277].id, "p6-27");
    }

    #[tokio::test]
    async fn empty_page_ends_collection_early() {
        let dir = TempDir::new().unwrap();
        let q = query(278);
        let client = client_with_pages(&q, &[50, 50, 0, 50]);
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&dir.path().join("specialists.json")).unwrap();

        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.requests, 3);
        assert_eq!(snapshot.len(), 100);
    }

    #[tokio::test]
    async fn failed_page_is_skipped() {
        let dir = TempDir::new().unwrap();
        let q = query(150);
        let client = client_with_pages(&q, &[50, 50, 50])
            .with_status(&list_page_url(&q, 2).unwrap(), 502);
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&dir.path().join("specialists.json")).unwrap();

        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.requests, 3);
        assert_eq!(summary.failed, vec!["page 2"]);
        assert_eq!(snapshot.len(), 100);
    }

    #[tokio::test]
    async fn rerun_keeps_existing_stubs_without_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("specialists.json");
        let q = query(100);
        let client = client_with_pages(&q, &[50, 50]);

        {
            let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
            let mut snapshot = Snapshot::open(&path).unwrap();
            collect_specialists(&mut scheduler, &q, &mut snapshot)
                .await
                .unwrap();
        }

        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&path).unwrap();
        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.already_present, 100);
        assert_eq!(snapshot.len(), 100);
    }

    #[tokio::test]
    async fn reported_total_overrides_configured_count() {
        let dir = TempDir::new().unwrap();
        let q = query(278);
        let first = json!({
            "Specialists": [{ "Id": "a" }, { "Id": "b" }],
            "TotalCount": 3
        });
        let client = MockClient::new()
            .with_json(&list_page_url(&q, 1).unwrap(), first)
            .with_json(&list_page_url(&q, 2).unwrap(), json!({ "Specialists": [{ "Id": "c" }] }));
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&dir.path().join("specialists.json")).unwrap();

        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.requests, 2);
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn stubs_without_id_are_dropped_but_page_is_kept() {
        let dir = TempDir::new().unwrap();
        let q = query(3);
        let client = MockClient::new().with_json(
            &list_page_url(&q, 1).unwrap(),
            json!({ "Specialists": [{ "Id": "a" }, { "Id": null }, { "FirstName": "X" }] }),
        );
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::disabled());
        let mut snapshot = Snapshot::open(&dir.path().join("specialists.json")).unwrap();

        let summary = collect_specialists(&mut scheduler, &q, &mut snapshot)
            .await
            .unwrap();

        assert_eq!(summary.requests, 1);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.added, 1);
        assert_eq!(snapshot.records()[0].id, "a");
    }
}
