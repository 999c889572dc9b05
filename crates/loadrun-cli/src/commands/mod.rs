// CLI subcommands

pub mod metrics;
pub mod testrun;

use crate::client::ClientError;

/// Replace a bare "Not found" with the resource that was missing
pub(crate) fn not_found(resource: &str, id: u64) -> impl FnOnce(ClientError) -> anyhow::Error + '_ {
    move |err| match err {
        ClientError::NotFound => anyhow::anyhow!("{} not found: {}", resource, id),
        err => err.into(),
    }
}

/// Two-decimal rendering used by every numeric table cell
pub(crate) fn decimal(value: f64) -> String {
    format!("{:.2}", value)
}
