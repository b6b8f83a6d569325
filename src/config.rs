use crate::error::CostReportError;
use chrono::Duration;
use rusoto_core::Region;
use std::str::FromStr;

pub const DEFAULT_RECIPIENT: &str = "your-email@example.com";
pub const DEFAULT_REPORT_BUCKET: &str = "my-reports-bucket-ko01";
pub const DEFAULT_REPORT_PREFIX: &str = "reports/";
pub const DEFAULT_CACHE_SECONDS: i64 = 6 * 3600;
pub const DEFAULT_PERIOD_DAYS: i64 = 7;
pub const MAX_CACHE_SECONDS: i64 = 30 * 24 * 3600;
pub const MAX_PERIOD_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataSourceKind {
    CostExplorer,
    Mock,
}

impl FromStr for DataSourceKind {
    type Err = CostReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cost-explorer" | "ce" => Ok(DataSourceKind::CostExplorer),
            "mock" => Ok(DataSourceKind::Mock),
            _ => Err(CostReportError::InvalidSetting {
                name: "COST_DATA_SOURCE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub region: Region,
    sender: Option<String>,
    pub recipient: String,
    pub report_bucket: String,
    pub report_prefix: String,
    pub cache_freshness: Duration,
    pub serve_stale_on_error: bool,
    pub period_days: i64,
    pub data_source: DataSourceKind,
}

impl Config {
    pub fn from_env() -> Result<Self, CostReportError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CostReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let region = match read("AWS_REGION") {
            Some(value) => Region::from_str(&value).map_err(|_| CostReportError::InvalidSetting {
                name: "AWS_REGION",
                value,
            })?,
            None => Region::UsEast1,
        };
        let cache_seconds = parse_or(read("COST_CACHE_SECONDS"), "COST_CACHE_SECONDS", DEFAULT_CACHE_SECONDS)?;
        let period_days = parse_or(read("REPORT_PERIOD_DAYS"), "REPORT_PERIOD_DAYS", DEFAULT_PERIOD_DAYS)?;
        if !(0..=MAX_CACHE_SECONDS).contains(&cache_seconds) {
            return Err(CostReportError::InvalidSetting {
                name: "COST_CACHE_SECONDS",
                value: cache_seconds.to_string(),
            });
        }
        if !(1..=MAX_PERIOD_DAYS).contains(&period_days) {
            return Err(CostReportError::InvalidSetting {
                name: "REPORT_PERIOD_DAYS",
                value: period_days.to_string(),
            });
        }

        Ok(Config {
            region,
            sender: read("SENDER_EMAIL"),
            recipient: read("RECIPIENT_EMAIL").unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            report_bucket: read("REPORT_BUCKET").unwrap_or_else(|| DEFAULT_REPORT_BUCKET.to_string()),
            report_prefix: read("REPORT_PREFIX").unwrap_or_else(|| DEFAULT_REPORT_PREFIX.to_string()),
            cache_freshness: Duration::seconds(cache_seconds),
            serve_stale_on_error: parse_or(
                read("COST_CACHE_SERVE_STALE"),
                "COST_CACHE_SERVE_STALE",
                false,
            )?,
            period_days,
            data_source: match read("COST_DATA_SOURCE") {
                Some(value) => value.parse()?,
                None => DataSourceKind::CostExplorer,
            },
        })
    }

    /// The sender address is only needed by the weekly report, so it is
    /// checked there rather than when the whole config is loaded.
    pub fn sender(&self) -> Result<&str, CostReportError> {
        self.sender
            .as_deref()
            .ok_or(CostReportError::MissingSetting("SENDER_EMAIL"))
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, CostReportError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| CostReportError::InvalidSetting { name, value }),
        None => Ok(default),
    }
}
