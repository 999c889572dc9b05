// In-memory metrics source for examples and testing
//
// Holds a fully seeded test run in memory. Individual operations can be
// delayed or made to fail, which makes it possible to exercise
// out-of-order completion and error propagation without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{Result, SummaryError};
use crate::model::{
    AggregateQuery, AggregateQueryResult, Check, HttpUrlStat, MetricDescriptor, TestRun,
    TestRunSummary, Threshold,
};
use crate::source::MetricsSource;

/// The operations of [`MetricsSource`], used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOperation {
    TestRun,
    TestRunSummary,
    Metrics,
    Aggregate,
    Thresholds,
    Checks,
    HttpUrlStats,
}

type QueryKey = (String, String);

fn query_key(metric: &str, query: &str) -> QueryKey {
    (metric.to_string(), query.to_string())
}

/// In-memory metrics source
///
/// Aggregate answers are keyed by (metric name, query id). A query with no
/// seeded answer returns an empty result, which the fetcher rejects as
/// malformed.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    test_run: TestRun,
    summary: TestRunSummary,
    metrics: Vec<MetricDescriptor>,
    aggregates: HashMap<QueryKey, AggregateQueryResult>,
    thresholds: Vec<Threshold>,
    checks: Vec<Check>,
    http_urls: Vec<HttpUrlStat>,
    failures: HashMap<SourceOperation, String>,
    query_failures: HashMap<QueryKey, String>,
    delays: HashMap<SourceOperation, Duration>,
    query_delays: HashMap<QueryKey, Duration>,
    issued_queries: Arc<RwLock<Vec<AggregateQuery>>>,
}

impl InMemorySource {
    /// Create an empty source describing the given run
    pub fn new(test_run: TestRun) -> Self {
        Self {
            test_run,
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: TestRunSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_metric(mut self, metric: MetricDescriptor) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = MetricDescriptor>) -> Self {
        self.metrics.extend(metrics);
        self
    }

    /// Seed a scalar answer for `query` on `metric`
    pub fn with_aggregate(self, metric: &str, query: &str, value: f64) -> Self {
        self.with_aggregate_result(metric, query, AggregateQueryResult::scalar(value))
    }

    /// Seed a raw answer for `query` on `metric`
    pub fn with_aggregate_result(
        mut self,
        metric: &str,
        query: &str,
        result: AggregateQueryResult,
    ) -> Self {
        self.aggregates.insert(query_key(metric, query), result);
        self
    }

    pub fn with_thresholds(mut self, thresholds: impl IntoIterator<Item = Threshold>) -> Self {
        self.thresholds.extend(thresholds);
        self
    }

    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks.extend(checks);
        self
    }

    pub fn with_http_urls(mut self, urls: impl IntoIterator<Item = HttpUrlStat>) -> Self {
        self.http_urls.extend(urls);
        self
    }

    /// Make every call of `operation` fail with `message`
    pub fn failing(mut self, operation: SourceOperation, message: impl Into<String>) -> Self {
        self.failures.insert(operation, message.into());
        self
    }

    /// Make a single aggregate query fail with `message`
    pub fn failing_query(mut self, metric: &str, query: &str, message: impl Into<String>) -> Self {
        self.query_failures
            .insert(query_key(metric, query), message.into());
        self
    }

    /// Delay every call of `operation`
    pub fn delayed(mut self, operation: SourceOperation, delay: Duration) -> Self {
        self.delays.insert(operation, delay);
        self
    }

    /// Delay a single aggregate query
    pub fn delayed_query(mut self, metric: &str, query: &str, delay: Duration) -> Self {
        self.query_delays.insert(query_key(metric, query), delay);
        self
    }

    /// Aggregate queries received so far, in arrival order
    pub async fn issued_queries(&self) -> Vec<AggregateQuery> {
        self.issued_queries.read().await.clone()
    }

    async fn enter(&self, operation: SourceOperation) -> Result<()> {
        if let Some(delay) = self.delays.get(&operation) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(&operation) {
            Some(message) => Err(SummaryError::remote(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetricsSource for InMemorySource {
    async fn fetch_test_run(&self, _test_run_id: u64) -> Result<TestRun> {
        self.enter(SourceOperation::TestRun).await?;
        Ok(self.test_run.clone())
    }

    async fn fetch_test_run_summary(&self, _test_run_id: u64) -> Result<TestRunSummary> {
        self.enter(SourceOperation::TestRunSummary).await?;
        Ok(self.summary.clone())
    }

    async fn fetch_metrics(&self, _test_run_id: u64) -> Result<Vec<MetricDescriptor>> {
        self.enter(SourceOperation::Metrics).await?;
        Ok(self.metrics.clone())
    }

    async fn fetch_aggregate(
        &self,
        _test_run_id: u64,
        query: &AggregateQuery,
    ) -> Result<AggregateQueryResult> {
        self.issued_queries.write().await.push(query.clone());
        self.enter(SourceOperation::Aggregate).await?;

        let key = query_key(&query.metric, &query.query);
        if let Some(delay) = self.query_delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.query_failures.get(&key) {
            return Err(SummaryError::remote(message.clone()));
        }
        Ok(self.aggregates.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_thresholds(&self, _test_run_id: u64) -> Result<Vec<Threshold>> {
        self.enter(SourceOperation::Thresholds).await?;
        Ok(self.thresholds.clone())
    }

    async fn fetch_checks(&self, _test_run_id: u64) -> Result<Vec<Check>> {
        self.enter(SourceOperation::Checks).await?;
        Ok(self.checks.clone())
    }

    async fn fetch_http_url_stats(&self, _test_run_id: u64) -> Result<Vec<HttpUrlStat>> {
        self.enter(SourceOperation::HttpUrlStats).await?;
        Ok(self.http_urls.clone())
    }
}
