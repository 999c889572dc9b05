// Test run result types
//
// These mirror the resources served by the remote metrics service. They are
// plain data: fetched once per report, never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Origin value reserved for metrics emitted by the test engine itself
pub const BUILTIN_ORIGIN: &str = "builtin";

// ============================================================================
// TestRun
// ============================================================================

/// Share of virtual users executed from one load zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadZoneShare {
    pub load_zone: String,
    #[serde(default)]
    pub percent: u32,
}

/// A single execution of a load test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: u64,
    #[serde(default)]
    pub test_id: Option<u64>,
    /// Load zone distribution; empty for locally executed runs
    #[serde(default)]
    pub distribution: Vec<LoadZoneShare>,
    /// Execution duration in seconds
    #[serde(default)]
    pub execution_duration: f64,
    /// Virtual-user hours billed for the run
    #[serde(default)]
    pub vuh_cost: f64,
    #[serde(default)]
    pub run_status: Option<String>,
    #[serde(default)]
    pub vus: Option<u32>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub error_detail: Option<String>,
}

impl TestRun {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.distribution.is_empty() {
            ExecutionMode::Local
        } else {
            ExecutionMode::Cloud
        }
    }
}

/// Where the test run was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Local,
    Cloud,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Local => write!(f, "local"),
            ExecutionMode::Cloud => write!(f, "cloud"),
        }
    }
}

// ============================================================================
// TestRunSummary
// ============================================================================

/// Aggregate counters for a whole test run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRunSummary {
    #[serde(default)]
    pub thresholds: PassCounts,
    #[serde(default)]
    pub checks: PassCounts,
    #[serde(default)]
    pub http: HttpSummary,
}

/// Passed/total pair used by thresholds and checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCounts {
    pub passed: u64,
    pub total: u64,
}

/// Request totals and throughput for all HTTP traffic in a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpSummary {
    pub count: u64,
    pub failures: u64,
    pub rps_mean: f64,
    pub rps_max: f64,
}

impl HttpSummary {
    /// Requests that did not fail
    pub fn passed(&self) -> u64 {
        self.count.saturating_sub(self.failures)
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// A metric recorded during the test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    /// `builtin` or the name of a custom metric source
    pub origin: String,
    /// One of `trend`, `counter`, `rate`, `gauge`
    #[serde(rename = "type")]
    pub metric_type: String,
}

impl MetricDescriptor {
    pub fn new(
        name: impl Into<String>,
        origin: impl Into<String>,
        metric_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            metric_type: metric_type.into(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == BUILTIN_ORIGIN
    }

    /// Display order: builtin metrics first, then by origin, then by name
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        match (self.is_builtin(), other.is_builtin()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self
                .origin
                .cmp(&other.origin)
                .then_with(|| self.name.cmp(&other.name)),
        }
    }
}

/// Query for one server-side aggregate of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateQuery {
    /// Reducer expression, e.g. `histogram_quantile(0.95)`
    pub query: String,
    /// Metric name, optionally with a label selector
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl AggregateQuery {
    pub fn new(query: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            metric: metric.into(),
            start: None,
            end: None,
        }
    }

    /// Restrict the query to a time window; `None` keeps the run boundary
    pub fn with_window(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Raw answer to an aggregate query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateQueryResult {
    #[serde(default)]
    pub result: Vec<AggregateSeries>,
}

/// One labelled series of (timestamp, value) pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<(f64, f64)>,
}

impl AggregateQueryResult {
    /// A result holding exactly one series with one value
    pub fn scalar(value: f64) -> Self {
        Self {
            result: vec![AggregateSeries {
                metric: BTreeMap::new(),
                values: vec![(0.0, value)],
            }],
        }
    }
}

// ============================================================================
// Thresholds and checks
// ============================================================================

/// A pass/fail criterion evaluated over a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// `<metric expression>:<condition>`
    pub name: String,
    pub stat: String,
    /// True when the threshold was crossed
    #[serde(default)]
    pub tainted: bool,
    #[serde(default)]
    pub calculated_value: f64,
}

impl Threshold {
    /// Split the name at its last `:` into the metric expression and the
    /// condition with all whitespace removed.
    pub fn split_name(&self) -> (&str, String) {
        match self.name.rfind(':') {
            Some(idx) => (
                &self.name[..idx],
                self.name[idx + 1..]
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect(),
            ),
            None => (self.name.as_str(), String::new()),
        }
    }
}

/// A named assertion evaluated on every iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub success_count: u64,
    pub fail_count: u64,
    /// Fraction in `[0, 1]`
    pub success_rate: f64,
}

// ============================================================================
// HTTP URL stats
// ============================================================================

/// Request duration distribution in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub min: f64,
    pub mean: f64,
    pub stdev: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

/// Per-endpoint HTTP statistics for one (method, status) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpUrlStat {
    pub scenario: String,
    pub name: String,
    pub method: String,
    pub status: u16,
    #[serde(default)]
    pub expected_response: bool,
    #[serde(default)]
    pub duration: DurationStats,
    #[serde(default)]
    pub requests_count: u64,
}

impl HttpUrlStat {
    /// Ascending (scenario, name, method, status) order
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.scenario
            .cmp(&other.scenario)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.method.cmp(&other.method))
            .then_with(|| self.status.cmp(&other.status))
    }
}
