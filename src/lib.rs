pub mod audit;
pub mod billing;
pub mod cache;
pub mod config;
pub mod cost;
pub mod cost_summary;
pub mod delta;
pub mod error;
pub mod notification;
pub mod period;
pub mod recommendation;
pub mod report;
pub mod report_fetch;
pub mod response;
pub mod storage;
pub mod telemetry;
pub mod weekly_report;

#[cfg(test)]
mod test_support;
