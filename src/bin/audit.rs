use cost_notifier::audit::handle_audit;
use cost_notifier::response::ApiResponse;
use cost_notifier::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    lambda_runtime::run(service_fn(audit_handler)).await
}

async fn audit_handler(_: LambdaEvent<Value>) -> Result<ApiResponse, Error> {
    Ok(handle_audit(&mut rand::thread_rng())?)
}
