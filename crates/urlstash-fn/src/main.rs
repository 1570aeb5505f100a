#![recursion_limit = "256"]

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use urlstash_core::{Config, TriggerEvent};
use urlstash_fn::{telemetry, ErrorReporter, Workflow};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_telemetry();
    tracing::info!("Loading function");

    let config = Config::from_env()?;
    let reporter = ErrorReporter::new(config.error_report_url().map(String::from));
    let workflow = Arc::new(Workflow::new(config, reporter)?);

    run(service_fn(move |event: LambdaEvent<TriggerEvent>| {
        let workflow = Arc::clone(&workflow);
        async move {
            let status = workflow.handle(&event.payload).await;
            Ok::<_, Error>(serde_json::json!({ "status": status }))
        }
    }))
    .await
}
