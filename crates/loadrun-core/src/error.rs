// Error types for summary gathering and rendering

use thiserror::Error;

/// Result type alias for summary operations
pub type Result<T> = std::result::Result<T, SummaryError>;

/// Errors that can occur while building a test run summary
///
/// Every variant is fatal to the report: nothing is retried or recovered
/// locally, and no output is written once one of these has been produced.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A data source call failed
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// A metric reported a type with no aggregate table
    #[error("Unknown metric type: {0}")]
    UnknownMetricType(String),

    /// An aggregate query answered with an unexpected payload shape
    #[error("Malformed aggregate response for {query}({metric}): {reason}")]
    MalformedAggregateResponse {
        metric: String,
        query: String,
        reason: String,
    },

    /// Writing the rendered report failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SummaryError {
    /// Create a remote fetch error
    pub fn remote(msg: impl Into<String>) -> Self {
        SummaryError::RemoteFetch(msg.into())
    }

    /// Create an unknown metric type error
    pub fn unknown_metric_type(metric_type: impl Into<String>) -> Self {
        SummaryError::UnknownMetricType(metric_type.into())
    }

    /// Create a malformed aggregate response error
    pub fn malformed(
        metric: impl Into<String>,
        query: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SummaryError::MalformedAggregateResponse {
            metric: metric.into(),
            query: query.into(),
            reason: reason.into(),
        }
    }
}
