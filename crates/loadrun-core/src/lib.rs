// Load Test Run Summary
//
// This crate gathers the results of a completed load test run from a remote
// metrics service and renders them as a hierarchical text report.
//
// Key design decisions:
// - Data retrieval sits behind the MetricsSource trait (HTTP client, in-memory source)
// - Independent fetches run concurrently and are reassembled by input position
// - A failed fetch cancels the fetches after it; nothing outlives a gather
// - Rendering happens only after everything was gathered, so a failure writes nothing
// - Layout is built from side-by-side table blocks and nested indenting writers

pub mod error;
pub mod model;
pub mod source;

// Result retrieval
pub mod aggregate;
pub mod fetch;
pub mod gather;

// Text layout
pub mod indent;
pub mod report;
pub mod style;
pub mod table;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use aggregate::{resolve_aggregates, AggregateSpec, MetricType, ValueFormat};
pub use error::{Result, SummaryError};
pub use fetch::{
    fetch_aggregate_values, fetch_metric_summaries, AggregateResult, MetricSummary, TimeWindow,
};
pub use gather::{gather_ordered, Fetch};
pub use indent::IndentedWriter;
pub use memory::{InMemorySource, SourceOperation};
pub use model::{
    AggregateQuery, AggregateQueryResult, AggregateSeries, Check, DurationStats, ExecutionMode,
    HttpSummary, HttpUrlStat, LoadZoneShare, MetricDescriptor, PassCounts, TestRun,
    TestRunSummary, Threshold, BUILTIN_ORIGIN,
};
pub use report::{gather_summary, render_report, render_summary, Report, SummaryData};
pub use source::MetricsSource;
pub use style::Palette;
pub use table::{format_table_blocks, visible_width, Alignment, TableBlock};
