use bigdecimal::ParseBigDecimalError;
use rusoto_ce::GetCostAndUsageError;
use rusoto_core::RusotoError;
use rusoto_s3::{GetObjectError, ListObjectsV2Error};
use rusoto_ses::{SendEmailError, SendRawEmailError};

/// Coarse classification used by the handlers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Upstream,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum CostReportError {
    #[error("{0} environment variable not set")]
    MissingSetting(&'static str),
    #[error("invalid value {value:?} for {name}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("a {days}-day period ending {end} is out of range")]
    PeriodOutOfRange { end: chrono::NaiveDate, days: i64 },
    #[error("No reports found.")]
    NotFound,
    #[error("Value is None: {0}")]
    NoneValue(&'static str),
    #[error("Failed to convert bigDecimal to primitive")]
    ToPrimitive,
    #[error("invalid cost amount: {0}")]
    InvalidAmount(#[from] ParseBigDecimalError),
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error(transparent)]
    GetCostAndUsage(#[from] RusotoError<GetCostAndUsageError>),
    #[error(transparent)]
    ListObjects(#[from] RusotoError<ListObjectsV2Error>),
    #[error(transparent)]
    GetObject(#[from] RusotoError<GetObjectError>),
    #[error(transparent)]
    SendRawEmail(#[from] RusotoError<SendRawEmailError>),
    #[error(transparent)]
    SendEmail(#[from] RusotoError<SendEmailError>),
    #[error("failed to render report: {0}")]
    Template(#[from] liquid::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CostReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CostReportError::MissingSetting(_)
            | CostReportError::InvalidSetting { .. }
            | CostReportError::PeriodOutOfRange { .. } => {
                ErrorKind::Configuration
            }
            CostReportError::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Upstream,
        }
    }
}
