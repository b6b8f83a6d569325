use anyhow::Context as _;
use chrono::Utc;
use cost_notifier::config::Config;
use cost_notifier::notification::SesMailer;
use cost_notifier::response::ApiResponse;
use cost_notifier::telemetry;
use cost_notifier::weekly_report::WeeklyReportHandler;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::info;

static HANDLER: OnceCell<WeeklyReportHandler<SesMailer>> = OnceCell::new();

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    let config = Config::from_env().context("failed to load configuration")?;
    HANDLER
        .get_or_try_init(|| WeeklyReportHandler::from_config(&config))
        .context("failed to build weekly report handler")?;
    info!(recipient = %config.recipient, period_days = config.period_days, "weekly report starting");
    lambda_runtime::run(service_fn(weekly_report_handler)).await
}

/// Invoked by the weekly schedule; the event payload is ignored.
async fn weekly_report_handler(_: LambdaEvent<Value>) -> Result<ApiResponse, Error> {
    let handler = HANDLER.get().ok_or("weekly report handler not initialized")?;
    Ok(handler.handle(Utc::now()).await?)
}
