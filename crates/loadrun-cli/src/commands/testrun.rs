// Test run commands

use crate::client::Client;
use crate::commands::{decimal, not_found};
use crate::output::{print_field, print_table, OutputFormat};
use anyhow::{Context, Result};
use clap::Subcommand;
use loadrun_core::{gather_summary, render_summary, HttpUrlStat, TestRun, Threshold};

#[derive(Subcommand)]
pub enum TestRunCommand {
    /// Show the execution summary of a test run
    Summary {
        /// Test run ID
        id: u64,
    },

    /// List the runs of a test
    List {
        /// Test ID
        test_id: u64,
    },

    /// Get test run by ID
    Get {
        /// Test run ID
        id: u64,
    },

    /// List the thresholds of a test run
    Thresholds {
        /// Test run ID
        id: u64,
    },

    /// List per-endpoint HTTP statistics of a test run
    #[command(name = "httpurls")]
    HttpUrls {
        /// Test run ID
        id: u64,
    },
}

pub async fn run(
    command: TestRunCommand,
    client: &Client,
    output: OutputFormat,
    color: bool,
) -> Result<()> {
    match command {
        TestRunCommand::Summary { id } => summary(client, output, color, id).await,
        TestRunCommand::List { test_id } => list(client, output, test_id).await,
        TestRunCommand::Get { id } => get(client, output, id).await,
        TestRunCommand::Thresholds { id } => thresholds(client, output, id).await,
        TestRunCommand::HttpUrls { id } => http_urls(client, output, id).await,
    }
}

async fn summary(client: &Client, output: OutputFormat, color: bool, id: u64) -> Result<()> {
    if output.is_text() {
        let mut stdout = std::io::stdout();
        render_summary(client, id, &mut stdout, color)
            .await
            .with_context(|| format!("Failed to render summary of test run {}", id))?;
    } else {
        let data = gather_summary(client, id)
            .await
            .with_context(|| format!("Failed to fetch summary of test run {}", id))?;
        output.print_value(&data)?;
    }

    Ok(())
}

async fn list(client: &Client, output: OutputFormat, test_id: u64) -> Result<()> {
    let runs = client
        .test_runs(test_id)
        .await
        .map_err(not_found("Test", test_id))?;

    if output.is_text() {
        if runs.is_empty() {
            println!("No test runs found");
            return Ok(());
        }

        print_table(
            &["ID", "STATUS", "VUS", "DURATION", "STARTED", "ERROR"],
            runs.iter().map(run_row).collect(),
        );
    } else {
        output.print_value(&runs)?;
    }

    Ok(())
}

fn run_row(run: &TestRun) -> Vec<String> {
    vec![
        run.id.to_string(),
        run.run_status.clone().unwrap_or_else(|| "-".to_string()),
        run.vus.map_or_else(|| "-".to_string(), |vus| vus.to_string()),
        format!("{}s", decimal(run.execution_duration)),
        run.started.clone().unwrap_or_else(|| "-".to_string()),
        run.error_detail.clone().unwrap_or_default(),
    ]
}

async fn get(client: &Client, output: OutputFormat, id: u64) -> Result<()> {
    let run = client
        .test_run(id)
        .await
        .map_err(not_found("Test run", id))?;

    if output.is_text() {
        print_field("ID", &run.id.to_string());
        if let Some(test_id) = run.test_id {
            print_field("Test", &test_id.to_string());
        }
        if let Some(status) = &run.run_status {
            print_field("Status", status);
        }
        print_field("Execution", &run.execution_mode().to_string());
        if let Some(vus) = run.vus {
            print_field("VUs", &vus.to_string());
        }
        print_field("Duration", &format!("{}s", decimal(run.execution_duration)));
        print_field("VUh cost", &decimal(run.vuh_cost));
        if !run.distribution.is_empty() {
            let zones: Vec<String> = run
                .distribution
                .iter()
                .map(|share| format!("{} ({}%)", share.load_zone, share.percent))
                .collect();
            print_field("Load zones", &zones.join(", "));
        }
        if let Some(started) = &run.started {
            print_field("Started", started);
        }
        if let Some(note) = &run.note {
            print_field("Note", note);
        }
        if let Some(error) = &run.error_detail {
            print_field("Error", error);
        }
    } else {
        output.print_value(&run)?;
    }

    Ok(())
}

async fn thresholds(client: &Client, output: OutputFormat, id: u64) -> Result<()> {
    let mut thresholds = client
        .thresholds(id)
        .await
        .map_err(not_found("Test run", id))?;
    thresholds.sort_by(|a, b| a.name.cmp(&b.name));

    if output.is_text() {
        if thresholds.is_empty() {
            println!("No thresholds found");
            return Ok(());
        }

        print_table(
            &["NAME", "TAINTED", "STAT", "CALCULATED VALUE"],
            thresholds.iter().map(threshold_row).collect(),
        );
    } else {
        output.print_value(&thresholds)?;
    }

    Ok(())
}

fn threshold_row(threshold: &Threshold) -> Vec<String> {
    vec![
        threshold.name.clone(),
        threshold.tainted.to_string(),
        threshold.stat.clone(),
        decimal(threshold.calculated_value),
    ]
}

async fn http_urls(client: &Client, output: OutputFormat, id: u64) -> Result<()> {
    let mut urls = client
        .http_urls(id)
        .await
        .map_err(not_found("Test run", id))?;
    urls.sort_by(|a, b| a.display_cmp(b));

    if output.is_text() {
        if urls.is_empty() {
            println!("No HTTP URLs found");
            return Ok(());
        }

        print_table(
            &[
                "SCENARIO",
                "METHOD",
                "NAME",
                "STATUS",
                "EXPECTED RESPONSE",
                "COUNT",
                "MIN",
                "AVG",
                "STDEV",
                "P(95)",
                "P(99)",
                "MAX",
            ],
            urls.iter().map(http_url_row).collect(),
        );
    } else {
        output.print_value(&urls)?;
    }

    Ok(())
}

fn http_url_row(url: &HttpUrlStat) -> Vec<String> {
    let d = &url.duration;
    vec![
        url.scenario.clone(),
        url.method.clone(),
        url.name.clone(),
        url.status.to_string(),
        url.expected_response.to_string(),
        url.requests_count.to_string(),
        decimal(d.min),
        decimal(d.mean),
        decimal(d.stdev),
        decimal(d.p95),
        decimal(d.p99),
        decimal(d.max),
    ]
}
