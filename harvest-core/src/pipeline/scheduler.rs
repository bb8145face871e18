//! Sequential request scheduler.

use serde_json::Value as JsonValue;

use crate::error::FetchError;
use crate::http::{HeaderSet, HttpClient, Throttle};

/// Issues requests one at a time and pauses after each one.
///
/// Every stage drives its work through a scheduler, so the post-request
/// pause happens exactly once per call regardless of outcome.
pub struct Scheduler<'a, C: HttpClient> {
    client: &'a C,
    headers: HeaderSet,
    throttle: Throttle,
    calls: usize,
}

impl<'a, C: HttpClient> Scheduler<'a, C> {
    pub fn new(client: &'a C, headers: HeaderSet, throttle: Throttle) -> Self {
        Self {
            client,
            headers,
            throttle,
            calls: 0,
        }
    }

    /// Fetch one URL, then wait out the throttle interval.
    pub async fn fetch(&mut self, url: &str) -> Result<JsonValue, FetchError> {
        let result = self.client.fetch_json(url, &self.headers).await;
        self.calls += 1;
        self.throttle.pause().await;
        result
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn pauses_after_failures_too() {
        let client = MockClient::new()
            .with_json("https://api.test/ok", json!([]))
            .with_status("https://api.test/down", 500);
        let mut scheduler = Scheduler::new(&client, HeaderSet::new(), Throttle::from_millis(15));

        let start = Instant::now();
        assert!(scheduler.fetch("https://api.test/ok").await.is_ok());
        assert!(scheduler.fetch("https://api.test/down").await.is_err());

        assert_eq!(scheduler.calls(), 2);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
