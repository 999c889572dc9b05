// Metric aggregate fetching
//
// For every metric the resolver yields an ordered list of aggregate
// queries. Each query runs concurrently and writes into the slot of its
// spec, so result i always belongs to spec i.

use futures::future::FutureExt;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{resolve_aggregates, AggregateSpec};
use crate::error::{Result, SummaryError};
use crate::gather::{gather_ordered, Fetch};
use crate::model::{AggregateQuery, AggregateQueryResult, MetricDescriptor};
use crate::source::MetricsSource;

/// Query id whose fractional answer is reported as a percentage
const RATIO_QUERY: &str = "ratio";

/// Optional time window applied to aggregate queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// An aggregate spec paired with the value computed for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub spec: AggregateSpec,
    pub value: f64,
}

/// One metric with its aggregate results, index-aligned with its spec table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: MetricDescriptor,
    pub aggregates: Vec<AggregateResult>,
}

/// Fetch one value per spec for `metric`, preserving spec order.
///
/// All queries run concurrently. If any of them fails, the error of the
/// first failing spec is returned and no partial result is exposed.
pub async fn fetch_aggregate_values(
    source: &dyn MetricsSource,
    test_run_id: u64,
    metric: &str,
    specs: &[AggregateSpec],
    window: &TimeWindow,
) -> Result<Vec<AggregateResult>> {
    let ops: Vec<Fetch<'_, AggregateResult>> = specs
        .iter()
        .map(|spec| {
            let query = AggregateQuery::new(spec.query, metric)
                .with_window(window.start.clone(), window.end.clone());
            async move {
                let raw = source.fetch_aggregate(test_run_id, &query).await?;
                let value = scalar_value(&raw, &query)?;
                Ok::<_, SummaryError>(AggregateResult {
                    spec: *spec,
                    value: normalize(spec.query, value),
                })
            }
            .boxed()
        })
        .collect();

    gather_ordered(ops).await
}

/// Fetch the metric list of a run and every metric's aggregates.
///
/// Aggregate tables are resolved for all metrics before any query is
/// issued, so an unknown metric type fails without touching the service.
#[tracing::instrument(skip(source, window))]
pub async fn fetch_metric_summaries(
    source: &dyn MetricsSource,
    test_run_id: u64,
    window: &TimeWindow,
) -> Result<Vec<MetricSummary>> {
    let metrics = source.fetch_metrics(test_run_id).await?;

    let resolved = metrics
        .into_iter()
        .map(|metric| {
            let specs = resolve_aggregates(&metric.metric_type)?;
            Ok((metric, specs))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        metrics = resolved.len(),
        queries = resolved.iter().map(|(_, specs)| specs.len()).sum::<usize>(),
        "fetching metric aggregates"
    );

    let ops: Vec<Fetch<'_, MetricSummary>> = resolved
        .iter()
        .map(|(metric, specs)| {
            async move {
                let aggregates =
                    fetch_aggregate_values(source, test_run_id, &metric.name, specs, window)
                        .await?;
                Ok::<_, SummaryError>(MetricSummary {
                    metric: metric.clone(),
                    aggregates,
                })
            }
            .boxed()
        })
        .collect();

    gather_ordered(ops).await
}

/// Extract the single value of a single-series answer
fn scalar_value(raw: &AggregateQueryResult, query: &AggregateQuery) -> Result<f64> {
    let [series] = raw.result.as_slice() else {
        return Err(SummaryError::malformed(
            &query.metric,
            &query.query,
            format!("expected 1 result series, got {}", raw.result.len()),
        ));
    };
    let [(_, value)] = series.values.as_slice() else {
        return Err(SummaryError::malformed(
            &query.metric,
            &query.query,
            format!("expected 1 value pair, got {}", series.values.len()),
        ));
    };
    Ok(*value)
}

fn normalize(query: &str, value: f64) -> f64 {
    if query == RATIO_QUERY {
        value * 100.0
    } else {
        value
    }
}
