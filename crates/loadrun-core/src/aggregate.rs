//! Aggregate tables per metric type.
//!
//! Each metric type maps to a fixed, ordered list of server-side aggregate
//! queries. The order of the list is the order of the columns in the
//! rendered report, so the tables below are part of the output format.

use serde::Serialize;
use std::fmt;

use crate::error::{Result, SummaryError};

/// How an aggregate value is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// `12.34`
    Decimal,
    /// `12.34 u/s`
    PerSecond,
    /// `12.34%`
    Percent,
    /// `✓ 12`
    PassCount,
    /// `✗ 12`
    FailCount,
}

impl ValueFormat {
    pub fn render(self, value: f64) -> String {
        match self {
            ValueFormat::Decimal => format!("{value:.2}"),
            ValueFormat::PerSecond => format!("{value:.2} u/s"),
            ValueFormat::Percent => format!("{value:.2}%"),
            ValueFormat::PassCount => format!("✓ {value:.0}"),
            ValueFormat::FailCount => format!("✗ {value:.0}"),
        }
    }
}

/// One aggregate to compute for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateSpec {
    /// Identifier of the aggregate within its table
    pub name: &'static str,
    /// Prefix printed as `label=value`, if any
    pub label: Option<&'static str>,
    pub format: ValueFormat,
    /// Query id evaluated by the metrics service
    pub query: &'static str,
    /// Rendered in the dim secondary style
    pub muted: bool,
}

impl AggregateSpec {
    const fn plain(
        name: &'static str,
        label: Option<&'static str>,
        format: ValueFormat,
        query: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            format,
            query,
            muted: false,
        }
    }

    const fn muted(
        name: &'static str,
        label: Option<&'static str>,
        format: ValueFormat,
        query: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            format,
            query,
            muted: true,
        }
    }
}

const TREND: &[AggregateSpec] = &[
    AggregateSpec::plain("avg", Some("avg"), ValueFormat::Decimal, "histogram_avg"),
    AggregateSpec::plain("min", Some("min"), ValueFormat::Decimal, "histogram_min"),
    AggregateSpec::plain(
        "med",
        Some("med"),
        ValueFormat::Decimal,
        "histogram_quantile(0.5)",
    ),
    AggregateSpec::plain("max", Some("max"), ValueFormat::Decimal, "histogram_max"),
    AggregateSpec::plain(
        "p90",
        Some("p(90)"),
        ValueFormat::Decimal,
        "histogram_quantile(0.90)",
    ),
    AggregateSpec::plain(
        "p95",
        Some("p(95)"),
        ValueFormat::Decimal,
        "histogram_quantile(0.95)",
    ),
];

const COUNTER: &[AggregateSpec] = &[
    AggregateSpec::plain("total", None, ValueFormat::Decimal, "increase"),
    AggregateSpec::muted("rate", None, ValueFormat::PerSecond, "rate"),
];

const RATE: &[AggregateSpec] = &[
    AggregateSpec::plain("ratio", None, ValueFormat::Percent, "ratio"),
    AggregateSpec::muted("pass-count", None, ValueFormat::PassCount, "increase_nz"),
    AggregateSpec::muted("fail-count", None, ValueFormat::FailCount, "increase_z"),
];

const GAUGE: &[AggregateSpec] = &[
    AggregateSpec::plain("avg", None, ValueFormat::Decimal, "avg"),
    AggregateSpec::muted("min", Some("min"), ValueFormat::Decimal, "min"),
    AggregateSpec::muted("max", Some("max"), ValueFormat::Decimal, "max"),
];

/// The closed set of metric types the service reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Trend,
    Counter,
    Rate,
    Gauge,
}

impl MetricType {
    pub fn parse(metric_type: &str) -> Result<Self> {
        match metric_type {
            "trend" => Ok(MetricType::Trend),
            "counter" => Ok(MetricType::Counter),
            "rate" => Ok(MetricType::Rate),
            "gauge" => Ok(MetricType::Gauge),
            other => Err(SummaryError::unknown_metric_type(other)),
        }
    }

    pub fn aggregates(self) -> &'static [AggregateSpec] {
        match self {
            MetricType::Trend => TREND,
            MetricType::Counter => COUNTER,
            MetricType::Rate => RATE,
            MetricType::Gauge => GAUGE,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::Trend => "trend",
            MetricType::Counter => "counter",
            MetricType::Rate => "rate",
            MetricType::Gauge => "gauge",
        };
        f.write_str(name)
    }
}

/// Ordered aggregate list for a metric type string.
///
/// Fails with [`SummaryError::UnknownMetricType`] for anything outside
/// `trend`, `counter`, `rate` and `gauge`.
pub fn resolve_aggregates(metric_type: &str) -> Result<&'static [AggregateSpec]> {
    MetricType::parse(metric_type).map(MetricType::aggregates)
}
