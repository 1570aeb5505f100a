//! urlstash function crate: the upload-by-URL workflow and its runtime
//! surroundings (telemetry, error reporting, HTTP download).

pub mod download;
pub mod reporter;
pub mod telemetry;
pub mod workflow;

pub use reporter::ErrorReporter;
pub use workflow::Workflow;
