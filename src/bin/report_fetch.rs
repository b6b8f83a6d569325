use anyhow::Context as _;
use cost_notifier::config::Config;
use cost_notifier::report_fetch::ReportFetchHandler;
use cost_notifier::response::ApiResponse;
use cost_notifier::storage::S3ReportStore;
use cost_notifier::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::info;

static HANDLER: OnceCell<ReportFetchHandler<S3ReportStore>> = OnceCell::new();

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    let config = Config::from_env().context("failed to load configuration")?;
    info!(bucket = %config.report_bucket, prefix = %config.report_prefix, "report fetch starting");
    HANDLER.get_or_init(|| ReportFetchHandler::from_config(&config));
    lambda_runtime::run(service_fn(report_fetch_handler)).await
}

async fn report_fetch_handler(_: LambdaEvent<Value>) -> Result<ApiResponse, Error> {
    let handler = HANDLER.get().ok_or("report fetch handler not initialized")?;
    Ok(handler.handle().await)
}
