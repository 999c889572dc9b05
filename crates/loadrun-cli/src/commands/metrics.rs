// Metric commands

use std::collections::BTreeMap;

use crate::client::Client;
use crate::commands::{decimal, not_found};
use crate::output::{print_table, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use loadrun_core::{AggregateQuery, AggregateSeries, MetricDescriptor};

/// Series label holding the metric name, left out of label selectors
const NAME_LABEL: &str = "__name__";

#[derive(Subcommand)]
pub enum MetricsCommand {
    /// List the metrics recorded by a test run
    List {
        /// Test run ID
        #[arg(long)]
        test_run_id: u64,
    },

    /// Evaluate an aggregate query over a metric
    Aggregate {
        /// Test run ID
        #[arg(long)]
        test_run_id: u64,

        /// Metric name, optionally with a label selector
        #[arg(long)]
        metric: String,

        /// Aggregation, e.g. histogram_quantile(0.95)
        #[arg(long)]
        query: String,

        /// Window start (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// Window end (RFC 3339)
        #[arg(long)]
        end: Option<String>,
    },
}

pub async fn run(command: MetricsCommand, client: &Client, output: OutputFormat) -> Result<()> {
    match command {
        MetricsCommand::List { test_run_id } => list(client, output, test_run_id).await,
        MetricsCommand::Aggregate {
            test_run_id,
            metric,
            query,
            start,
            end,
        } => {
            let query = AggregateQuery::new(query, metric).with_window(start, end);
            aggregate(client, output, test_run_id, &query).await
        }
    }
}

async fn list(client: &Client, output: OutputFormat, test_run_id: u64) -> Result<()> {
    let mut metrics = client
        .metrics(test_run_id)
        .await
        .map_err(not_found("Test run", test_run_id))?;
    metrics.sort_by(MetricDescriptor::display_cmp);

    if output.is_text() {
        if metrics.is_empty() {
            println!("No metrics found");
            return Ok(());
        }

        print_table(
            &["NAME", "TYPE", "ORIGIN"],
            metrics
                .iter()
                .map(|m| vec![m.name.clone(), m.metric_type.clone(), m.origin.clone()])
                .collect(),
        );
    } else {
        output.print_value(&metrics)?;
    }

    Ok(())
}

async fn aggregate(
    client: &Client,
    output: OutputFormat,
    test_run_id: u64,
    query: &AggregateQuery,
) -> Result<()> {
    let result = client
        .aggregate(test_run_id, query)
        .await
        .map_err(not_found("Test run", test_run_id))?;

    if output.is_text() {
        if result.result.is_empty() {
            println!("No series found");
            return Ok(());
        }

        print_table(&["SERIES", "VALUE"], series_rows(&result.result));
    } else {
        output.print_value(&result)?;
    }

    Ok(())
}

/// One `[selector, value]` row per series, sorted by selector
fn series_rows(series: &[AggregateSeries]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = series
        .iter()
        .map(|s| {
            let value = s
                .values
                .last()
                .map_or_else(|| "-".to_string(), |(_, value)| decimal(*value));
            vec![label_selector(&s.metric), value]
        })
        .collect();
    rows.sort();
    rows
}

/// `{key="value",...}` in key order, without the metric name label
fn label_selector(labels: &BTreeMap<String, String>) -> String {
    let pairs: Vec<String> = labels
        .iter()
        .filter(|(key, _)| key.as_str() != NAME_LABEL)
        .map(|(key, value)| format!("{}=\"{}\"", key, value))
        .collect();
    format!("{{{}}}", pairs.join(","))
}
