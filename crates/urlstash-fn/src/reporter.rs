//! Error reporter client.
//!
//! Forwards failure reports to an external error-tracking endpoint. Strictly
//! best-effort: a report that cannot be delivered is logged at warn level and
//! never affects the workflow's own result.

use serde::Serialize;
use std::time::Duration;

const REPORT_TIMEOUT_SECS: u64 = 5;
const SERVICE_NAME: &str = "urlstash";

#[derive(Serialize)]
struct ErrorReport<'a> {
    service: &'static str,
    kind: &'a str,
    message: &'a str,
}

/// Client for the external error-tracking service.
///
/// With no endpoint configured every report is a no-op.
#[derive(Clone)]
pub struct ErrorReporter {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl ErrorReporter {
    pub fn new(endpoint: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REPORT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        ErrorReporter { endpoint, client }
    }

    /// Disabled reporter, for tests and local runs.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Forward one failure report. Never returns an error.
    pub async fn report(&self, message: &str, kind: &str) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            tracing::debug!(kind = %kind, "Error reporting disabled, skipping report");
            return;
        };

        let report = ErrorReport {
            service: SERVICE_NAME,
            kind,
            message,
        };

        match self.client.post(endpoint).json(&report).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(kind = %kind, "Error report delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    kind = %kind,
                    status = %response.status(),
                    "Error-tracking service rejected report"
                );
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Failed to deliver error report");
            }
        }
    }
}
