// Test run summary report
//
// One pass, two phases. The gather phase fetches every result set
// concurrently; the render phase lays them out in a fixed section order.
// Nothing reaches the sink before both phases have succeeded.

use futures::future::{Future, FutureExt};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

use crate::error::{Result, SummaryError};
use crate::fetch::{fetch_metric_summaries, AggregateResult, MetricSummary, TimeWindow};
use crate::gather::{gather_ordered, Fetch};
use crate::indent::IndentedWriter;
use crate::model::{Check, HttpUrlStat, TestRun, TestRunSummary, Threshold};
use crate::source::MetricsSource;
use crate::style::Palette;
use crate::table::{format_table_blocks, visible_width, TableBlock};

/// Extra indentation per level of the HTTP hierarchy
const NESTED_PAD: &str = "  ";

/// Gap between the field labels and their values
const FIELD_GAP: &str = "  ";

/// Everything a summary report is rendered from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryData {
    pub test_run: TestRun,
    pub summary: TestRunSummary,
    pub metrics: Vec<MetricSummary>,
    pub thresholds: Vec<Threshold>,
    pub checks: Vec<Check>,
    pub http_urls: Vec<HttpUrlStat>,
}

/// A rendered report, one text block per section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    sections: Vec<String>,
}

impl Report {
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Write the whole report with a single `write_all`
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        sink.write_all(self.to_string().as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sections.join("\n"))
    }
}

// ============================================================================
// Gather phase
// ============================================================================

/// Fetch every result set of a test run concurrently.
///
/// Fails with the error of the first failing fetch in the order run,
/// summary, metrics, thresholds, checks, HTTP URLs.
#[tracing::instrument(skip(source))]
pub async fn gather_summary(source: &dyn MetricsSource, test_run_id: u64) -> Result<SummaryData> {
    let window = TimeWindow::default();

    let mut test_run = None;
    let mut summary = None;
    let mut metrics = None;
    let mut thresholds = None;
    let mut checks = None;
    let mut http_urls = None;

    let ops: Vec<Fetch<'_, ()>> = vec![
        into_slot(&mut test_run, source.fetch_test_run(test_run_id)),
        into_slot(&mut summary, source.fetch_test_run_summary(test_run_id)),
        into_slot(
            &mut metrics,
            fetch_metric_summaries(source, test_run_id, &window),
        ),
        into_slot(&mut thresholds, source.fetch_thresholds(test_run_id)),
        into_slot(&mut checks, source.fetch_checks(test_run_id)),
        into_slot(&mut http_urls, source.fetch_http_url_stats(test_run_id)),
    ];
    gather_ordered(ops).await?;

    let data = SummaryData {
        test_run: filled(test_run, "test run")?,
        summary: filled(summary, "test run summary")?,
        metrics: filled(metrics, "metrics")?,
        thresholds: filled(thresholds, "thresholds")?,
        checks: filled(checks, "checks")?,
        http_urls: filled(http_urls, "http urls")?,
    };

    debug!(
        metrics = data.metrics.len(),
        thresholds = data.thresholds.len(),
        checks = data.checks.len(),
        http_urls = data.http_urls.len(),
        "gathered test run summary"
    );

    Ok(data)
}

/// Run `fetch` and store its output in `slot`, which no other fetch touches
fn into_slot<'a, T: Send + 'a>(
    slot: &'a mut Option<T>,
    fetch: impl Future<Output = Result<T>> + Send + 'a,
) -> Fetch<'a, ()> {
    async move {
        *slot = Some(fetch.await?);
        Ok(())
    }
    .boxed()
}

fn filled<T>(slot: Option<T>, what: &str) -> Result<T> {
    slot.ok_or_else(|| anyhow::anyhow!("{what} missing after a successful gather").into())
}

// ============================================================================
// Render phase
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Field {
    Execution,
    Duration,
    VuhCost,
    Metrics,
    Thresholds,
    Checks,
    Http,
}

impl Field {
    const ALL: [Field; 7] = [
        Field::Execution,
        Field::Duration,
        Field::VuhCost,
        Field::Metrics,
        Field::Thresholds,
        Field::Checks,
        Field::Http,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Execution => "execution",
            Field::Duration => "duration",
            Field::VuhCost => "vuh cost",
            Field::Metrics => "metrics",
            Field::Thresholds => "thresholds",
            Field::Checks => "checks",
            Field::Http => "http",
        }
    }
}

/// Right-aligned section labels; every value starts in the same column
struct FieldColumn {
    lines: Vec<String>,
    width: usize,
}

impl FieldColumn {
    fn new() -> Self {
        let cells = Field::ALL
            .iter()
            .map(|field| vec![field.label().to_string(), ":".to_string()])
            .collect();
        let lines: Vec<String> = format_table_blocks(&[TableBlock::new(cells).padding(2).align_right()])
            .into_iter()
            .map(|line| line + FIELD_GAP)
            .collect();
        let width = lines.iter().map(|line| visible_width(line)).max().unwrap_or(0);

        Self { lines, width }
    }

    fn label(&self, field: Field) -> &str {
        &self.lines[field as usize]
    }

    fn pad(&self) -> String {
        " ".repeat(self.width)
    }

    /// Render one section: its label, then `body` indented under the value column
    fn section(
        &self,
        field: Field,
        body: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) -> Result<String> {
        let mut buf = self.label(field).as_bytes().to_vec();
        {
            let mut writer = IndentedWriter::new(&mut buf, self.pad());
            body(&mut writer)?;
        }
        String::from_utf8(buf).map_err(|err| SummaryError::Internal(err.into()))
    }
}

/// Lay out gathered data as a text report
pub fn render_report(data: &SummaryData, palette: Palette) -> Result<Report> {
    let fields = FieldColumn::new();
    let run = &data.test_run;

    let header = format!(
        "{}{}\n{}{}\n{}{}\n",
        fields.label(Field::Execution),
        palette.value(&run.execution_mode().to_string()),
        fields.label(Field::Duration),
        palette.value(&format!("{:.2}s", run.execution_duration)),
        fields.label(Field::VuhCost),
        palette.value(&format!("{:.2} VUh", run.vuh_cost)),
    );

    let sections = vec![
        header,
        fields.section(Field::Metrics, |w| write_metrics(w, &data.metrics, palette))?,
        fields.section(Field::Thresholds, |w| {
            write_thresholds(w, &data.summary, &data.thresholds, palette)
        })?,
        fields.section(Field::Checks, |w| {
            write_checks(w, &data.summary, &data.checks, palette)
        })?,
        fields.section(Field::Http, |w| {
            write_http_urls(w, &data.summary, &data.http_urls, palette)
        })?,
    ];

    Ok(Report { sections })
}

/// Gather, render, then write the report to `sink` in one piece.
///
/// On any error the sink receives nothing.
#[tracing::instrument(skip(source, sink))]
pub async fn render_summary<W: Write + ?Sized>(
    source: &dyn MetricsSource,
    test_run_id: u64,
    sink: &mut W,
    color_enabled: bool,
) -> Result<()> {
    let data = gather_summary(source, test_run_id).await?;
    let report = render_report(&data, Palette::new(color_enabled))?;
    report.write_to(sink)
}

fn write_lines(w: &mut dyn Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(w, "{line}")?;
    }
    Ok(())
}

fn pass_ratio(passed: u64, total: u64, palette: Palette) -> String {
    format!(
        "{}/{}",
        palette.value(&passed.to_string()),
        palette.value(&total.to_string())
    )
}

fn row(cells: impl IntoIterator<Item = String>) -> Vec<String> {
    cells.into_iter().collect()
}

// Metrics

fn write_metrics(w: &mut dyn Write, metrics: &[MetricSummary], palette: Palette) -> io::Result<()> {
    let mut metrics: Vec<&MetricSummary> = metrics.iter().collect();
    metrics.sort_by(|a, b| a.metric.display_cmp(&b.metric));

    if metrics.is_empty() {
        return writeln!(w);
    }

    let columns = metrics
        .iter()
        .map(|m| m.aggregates.len())
        .max()
        .unwrap_or(0);

    let labels = metrics
        .iter()
        .map(|m| row([m.metric.name.clone(), ": ".to_string()]))
        .collect();
    let values = metrics
        .iter()
        .map(|m| {
            let mut cells: Vec<String> = m
                .aggregates
                .iter()
                .map(|agg| aggregate_cell(agg, palette))
                .collect();
            cells.resize(columns, String::new());
            cells
        })
        .collect();

    let lines = format_table_blocks(&[
        TableBlock::new(labels).padding(3).pad_char('.'),
        TableBlock::new(values),
    ]);

    let first_custom = metrics.iter().position(|m| !m.metric.is_builtin());
    for (idx, line) in lines.iter().enumerate() {
        // The blank line splits builtin rows from custom ones. With no builtin
        // rows it would only push the first value off the `metrics:` label line.
        if idx > 0 && Some(idx) == first_custom {
            writeln!(w)?;
        }
        writeln!(w, "{line}")?;
    }
    Ok(())
}

fn aggregate_cell(result: &AggregateResult, palette: Palette) -> String {
    let spec = &result.spec;
    let value = spec.format.render(result.value);
    let labelled = |value: &str| match spec.label {
        Some(label) => format!("{label}={value}"),
        None => value.to_string(),
    };

    if spec.muted {
        palette.muted(&labelled(&value))
    } else {
        labelled(&palette.value(&value))
    }
}

// Thresholds

fn write_thresholds(
    w: &mut dyn Write,
    summary: &TestRunSummary,
    thresholds: &[Threshold],
    palette: Palette,
) -> io::Result<()> {
    let counts = summary.thresholds;
    writeln!(w, "{}", pass_ratio(counts.passed, counts.total, palette))?;

    let mut thresholds: Vec<&Threshold> = thresholds.iter().collect();
    thresholds.sort_by(|a, b| a.name.cmp(&b.name));

    let mut labels = Vec::with_capacity(thresholds.len());
    let mut values = Vec::with_capacity(thresholds.len());
    for threshold in thresholds {
        let (expression, condition) = threshold.split_name();
        labels.push(row([
            format!("{} {}", palette.glyph(!threshold.tainted), expression),
            ": ".to_string(),
        ]));
        values.push(row([
            condition,
            format!(
                "{}={}",
                threshold.stat,
                palette.value(&format!("{:.2}", threshold.calculated_value))
            ),
        ]));
    }

    let lines = format_table_blocks(&[
        TableBlock::new(labels).padding(3).pad_char('.'),
        TableBlock::new(values),
    ]);
    write_lines(w, &lines)
}

// Checks

fn write_checks(
    w: &mut dyn Write,
    summary: &TestRunSummary,
    checks: &[Check],
    palette: Palette,
) -> io::Result<()> {
    let counts = summary.checks;
    writeln!(w, "{}", pass_ratio(counts.passed, counts.total, palette))?;

    let mut checks: Vec<&Check> = checks.iter().collect();
    checks.sort_by(|a, b| a.name.cmp(&b.name));

    let labels = checks
        .iter()
        .map(|check| row([check.name.clone(), ": ".to_string()]))
        .collect();
    let values = checks
        .iter()
        .map(|check| {
            row([
                palette.value(&format!("{:.2}%", check.success_rate * 100.0)),
                palette.muted(&format!("✓ {}", check.success_count)),
                palette.muted(&format!("✗ {}", check.fail_count)),
            ])
        })
        .collect();

    let lines = format_table_blocks(&[
        TableBlock::new(labels).padding(0),
        TableBlock::new(values),
    ]);
    write_lines(w, &lines)
}

// HTTP

fn write_http_urls(
    w: &mut dyn Write,
    summary: &TestRunSummary,
    urls: &[HttpUrlStat],
    palette: Palette,
) -> io::Result<()> {
    let http = &summary.http;
    write!(
        w,
        "{} requests{FIELD_GAP}{}{FIELD_GAP}{}",
        pass_ratio(http.passed(), http.count, palette),
        palette.value(&format!("{:.2} req/s", http.rps_mean)),
        palette.muted(&format!("max={:.2} req/s", http.rps_max)),
    )?;

    let mut urls: Vec<&HttpUrlStat> = urls.iter().collect();
    urls.sort_by(|a, b| a.display_cmp(b));

    let labels = urls
        .iter()
        .map(|url| {
            row([
                format!("{} {} ", palette.glyph(url.expected_response), url.method),
                palette.value(&url.status.to_string()),
                ": ".to_string(),
            ])
        })
        .collect();
    let values = urls.iter().map(|url| duration_cells(url, palette)).collect();
    let lines = format_table_blocks(&[
        TableBlock::new(labels).padding(0),
        TableBlock::new(values),
    ]);

    let rows: Vec<(&HttpUrlStat, String)> = urls.into_iter().zip(lines).collect();

    // Each header and row starts with its own line break so the nested
    // writers pad it.
    for scenario in rows.chunk_by(|a, b| a.0.scenario == b.0.scenario) {
        write!(w, "\n{}:", palette.value(&scenario[0].0.scenario))?;
        let mut scenario_writer = IndentedWriter::new(&mut *w, NESTED_PAD);

        for endpoint in scenario.chunk_by(|a, b| a.0.name == b.0.name) {
            write!(scenario_writer, "\n{}", endpoint[0].0.name)?;
            let mut endpoint_writer = IndentedWriter::new(&mut scenario_writer, NESTED_PAD);

            for (_, line) in endpoint {
                write!(endpoint_writer, "\n{line}")?;
            }
        }
    }

    writeln!(w)
}

fn duration_cells(url: &HttpUrlStat, palette: Palette) -> Vec<String> {
    let d = &url.duration;
    let stat = |label: &str, value: f64| format!("{label}={}", palette.value(&format!("{value:.2}")));

    vec![
        format!("count={}", palette.value(&url.requests_count.to_string())),
        stat("min", d.min),
        stat("avg", d.mean),
        stat("stdev", d.stdev),
        stat("p(95)", d.p95),
        stat("p(99)", d.p99),
        stat("max", d.max),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::resolve_aggregates;
    use crate::model::{DurationStats, HttpSummary, MetricDescriptor, PassCounts};

    const PAD: &str = "               ";

    fn data() -> SummaryData {
        SummaryData {
            test_run: TestRun {
                execution_duration: 12.5,
                vuh_cost: 0.25,
                ..TestRun::new(3)
            },
            summary: TestRunSummary::default(),
            metrics: Vec::new(),
            thresholds: Vec::new(),
            checks: Vec::new(),
            http_urls: Vec::new(),
        }
    }

    fn metric(name: &str, origin: &str, metric_type: &str, values: &[f64]) -> MetricSummary {
        let specs = resolve_aggregates(metric_type).unwrap();
        MetricSummary {
            metric: MetricDescriptor::new(name, origin, metric_type),
            aggregates: specs
                .iter()
                .zip(values)
                .map(|(spec, value)| AggregateResult {
                    spec: *spec,
                    value: *value,
                })
                .collect(),
        }
    }

    fn url(scenario: &str, name: &str, method: &str, status: u16) -> HttpUrlStat {
        HttpUrlStat {
            scenario: scenario.to_string(),
            name: name.to_string(),
            method: method.to_string(),
            status,
            expected_response: status < 400,
            duration: DurationStats::default(),
            requests_count: 1,
        }
    }

    fn section(report: &Report, idx: usize) -> &str {
        &report.sections()[idx]
    }

    #[test]
    fn test_header_and_empty_sections() {
        let report = render_report(&data(), Palette::plain()).unwrap();

        assert_eq!(report.sections().len(), 5);
        assert_eq!(
            section(&report, 0),
            "   execution:  local\n    duration:  12.50s\n    vuh cost:  0.25 VUh\n"
        );
        assert_eq!(section(&report, 1), "     metrics:  \n");
        assert_eq!(section(&report, 2), "  thresholds:  0/0\n");
        assert_eq!(section(&report, 3), "      checks:  0/0\n");
        assert_eq!(
            section(&report, 4),
            "        http:  0/0 requests  0.00 req/s  max=0.00 req/s\n"
        );
    }

    #[test]
    fn test_metrics_sorted_builtin_first_with_separator() {
        let mut data = data();
        data.metrics = vec![
            metric("b", "builtin", "counter", &[2.0, 1.0]),
            metric("a", "custom", "counter", &[3.0, 1.0]),
            metric("a", "builtin", "counter", &[1.0, 1.0]),
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        assert_eq!(
            section(&report, 1),
            format!(
                "     metrics:  a...: 1.00 1.00 u/s\n\
                 {PAD}b...: 2.00 1.00 u/s\n\
                 \n\
                 {PAD}a...: 3.00 1.00 u/s\n"
            )
        );
    }

    #[test]
    fn test_no_separator_when_all_metrics_are_custom() {
        let mut data = data();
        data.metrics = vec![
            metric("zeta", "k6-extension", "gauge", &[1.0, 0.0, 2.0]),
            metric("alpha", "a-source", "gauge", &[4.0, 3.0, 5.0]),
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        assert_eq!(
            section(&report, 1),
            format!(
                "     metrics:  alpha...: 4.00 min=3.00 max=5.00\n\
                 {PAD}zeta....: 1.00 min=0.00 max=2.00\n"
            )
        );
    }

    #[test]
    fn test_shorter_metric_rows_are_filled() {
        let mut data = data();
        data.metrics = vec![
            metric("iterations", "builtin", "counter", &[10.0, 0.5]),
            metric("vus", "builtin", "gauge", &[5.0, 1.0, 9.0]),
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        assert_eq!(
            section(&report, 1),
            format!(
                "     metrics:  iterations...: 10.00 0.50 u/s \n\
                 {PAD}vus..........: 5.00  min=1.00 max=9.00\n"
            )
        );
    }

    #[test]
    fn test_thresholds_section() {
        let mut data = data();
        data.summary.thresholds = PassCounts { passed: 1, total: 2 };
        data.thresholds = vec![
            Threshold {
                name: "http_req_duration:p(95) < 500".to_string(),
                stat: "p(95)".to_string(),
                tainted: false,
                calculated_value: 120.5,
            },
            Threshold {
                name: "checks:rate>0.9".to_string(),
                stat: "rate".to_string(),
                tainted: true,
                calculated_value: 0.25,
            },
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        assert_eq!(
            section(&report, 2),
            format!(
                "  thresholds:  1/2\n\
                 {PAD}✗ checks..............: rate>0.9  rate=0.25\n\
                 {PAD}✓ http_req_duration...: p(95)<500 p(95)=120.50\n"
            )
        );
    }

    #[test]
    fn test_checks_section() {
        let mut data = data();
        data.summary.checks = PassCounts { passed: 7, total: 8 };
        data.checks = vec![
            Check {
                name: "status is 200".to_string(),
                success_count: 3,
                fail_count: 1,
                success_rate: 0.75,
            },
            Check {
                name: "body ok".to_string(),
                success_count: 4,
                fail_count: 0,
                success_rate: 1.0,
            },
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        assert_eq!(
            section(&report, 3),
            format!(
                "      checks:  7/8\n\
                 {PAD}body ok      : 100.00% ✓ 4 ✗ 0\n\
                 {PAD}status is 200: 75.00%  ✓ 3 ✗ 1\n"
            )
        );
    }

    #[test]
    fn test_http_urls_are_grouped_by_scenario_then_endpoint() {
        let mut data = data();
        data.summary.http = HttpSummary {
            count: 4,
            failures: 1,
            rps_mean: 2.0,
            rps_max: 3.5,
        };
        data.http_urls = vec![
            url("default", "/b", "GET", 200),
            url("default", "/a", "POST", 500),
            url("default", "/a", "GET", 200),
            url("setup", "/a", "GET", 200),
        ];

        let report = render_report(&data, Palette::plain()).unwrap();

        let stats = "count=1 min=0.00 avg=0.00 stdev=0.00 p(95)=0.00 p(99)=0.00 max=0.00";
        assert_eq!(
            section(&report, 4),
            format!(
                "        http:  3/4 requests  2.00 req/s  max=3.50 req/s\n\
                 {PAD}default:\n\
                 {PAD}  /a\n\
                 {PAD}    ✓ GET  200: {stats}\n\
                 {PAD}    ✗ POST 500: {stats}\n\
                 {PAD}  /b\n\
                 {PAD}    ✓ GET  200: {stats}\n\
                 {PAD}setup:\n\
                 {PAD}  /a\n\
                 {PAD}    ✓ GET  200: {stats}\n"
            )
        );
    }

    #[test]
    fn test_report_joins_sections_with_blank_lines() {
        let report = render_report(&data(), Palette::plain()).unwrap();
        let text = report.to_string();

        assert!(text.starts_with("   execution:  local\n"));
        assert!(text.contains("0.25 VUh\n\n     metrics:  \n\n  thresholds:"));
        assert!(text.ends_with("max=0.00 req/s\n"));

        let mut sink = Vec::new();
        report.write_to(&mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), text);
    }

    #[test]
    fn test_colored_values_keep_alignment() {
        let mut data = data();
        data.metrics = vec![
            metric("iterations", "builtin", "counter", &[10.0, 0.5]),
            metric("vus", "builtin", "gauge", &[5.0, 1.0, 9.0]),
        ];

        let plain = render_report(&data, Palette::plain()).unwrap();
        let colored = render_report(&data, Palette::new(true)).unwrap();

        let plain_widths: Vec<usize> = plain.sections()[1].lines().map(visible_width).collect();
        let colored_widths: Vec<usize> = colored.sections()[1].lines().map(visible_width).collect();
        assert_ne!(plain.sections()[1], colored.sections()[1]);
        assert_eq!(plain_widths, colored_widths);
    }
}
