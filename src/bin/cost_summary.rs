use anyhow::Context as _;
use cost_notifier::config::Config;
use cost_notifier::cost_summary::CostSummaryHandler;
use cost_notifier::response::ApiResponse;
use cost_notifier::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::info;

// Lives for the whole warm instance, cache included.
static HANDLER: OnceCell<CostSummaryHandler> = OnceCell::new();

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        cache_seconds = config.cache_freshness.num_seconds(),
        data_source = ?config.data_source,
        "cost summary starting"
    );
    HANDLER.get_or_init(|| CostSummaryHandler::from_config(&config));
    lambda_runtime::run(service_fn(cost_summary_handler)).await
}

async fn cost_summary_handler(_: LambdaEvent<Value>) -> Result<ApiResponse, Error> {
    let handler = HANDLER.get().ok_or("cost summary handler not initialized")?;
    Ok(handler.handle().await?)
}
