// Data source trait for test run results
//
// The summary engine never talks to a transport directly. Implementations:
// - HTTP client against the remote metrics service (CLI)
// - In-memory source for tests and examples

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    AggregateQuery, AggregateQueryResult, Check, HttpUrlStat, MetricDescriptor, TestRun,
    TestRunSummary, Threshold,
};

/// Read-only access to the results of a completed test run
///
/// Every method is independent of the others, so callers may issue them
/// concurrently. Failures should be reported as
/// [`SummaryError::RemoteFetch`](crate::SummaryError::RemoteFetch).
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Run metadata
    async fn fetch_test_run(&self, test_run_id: u64) -> Result<TestRun>;

    /// Threshold, check and HTTP counters for the whole run
    async fn fetch_test_run_summary(&self, test_run_id: u64) -> Result<TestRunSummary>;

    /// All metrics recorded during the run
    async fn fetch_metrics(&self, test_run_id: u64) -> Result<Vec<MetricDescriptor>>;

    /// Evaluate one aggregate query server-side
    async fn fetch_aggregate(
        &self,
        test_run_id: u64,
        query: &AggregateQuery,
    ) -> Result<AggregateQueryResult>;

    async fn fetch_thresholds(&self, test_run_id: u64) -> Result<Vec<Threshold>>;

    async fn fetch_checks(&self, test_run_id: u64) -> Result<Vec<Check>>;

    async fn fetch_http_url_stats(&self, test_run_id: u64) -> Result<Vec<HttpUrlStat>>;
}
