pub mod error;
pub mod http;
pub mod pipeline;
pub mod project;
pub mod resolve;
pub mod types;

pub use error::{FetchError, SnapshotError};
pub use http::{ApiClient, ApiClientBuilder, HeaderSet, HttpClient, MockClient, MockResponse, Throttle};
pub use pipeline::{
    collect_specialists, detail_url, enrich, list_page_url, ListQuery, Scheduler, Snapshot,
    StageSummary,
};
pub use project::{filter_labels, is_identifier, project, project_all, ProjectedSpecialist};
pub use resolve::{
    build_lookup, distinct_service_ids, resolve, Membership, ParentServiceFilter,
    ResolvedSpecialist, ServiceRef,
};
pub use types::{
    LocalizedText, LocalizedValue, MasterService, ServiceEntry, SnapshotRecord, SpecialistDetail,
    SpecialistPage, SpecialistStub,
};
