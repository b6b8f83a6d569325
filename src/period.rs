use crate::error::CostReportError;
use chrono::{Days, NaiveDate};
use std::convert::TryFrom;

const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// A contiguous range of days; `end` is exclusive, as Cost Explorer expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The `days` days that end on (and exclude) `end`.
    pub fn trailing(end: NaiveDate, days: i64) -> Result<Self, CostReportError> {
        let start = u64::try_from(days)
            .ok()
            .and_then(|count| end.checked_sub_days(Days::new(count)))
            .ok_or(CostReportError::PeriodOutOfRange { end, days })?;
        Ok(Period { start, end })
    }

    /// The period of the same length ending where this one starts.
    pub fn preceding(&self) -> Result<Self, CostReportError> {
        Period::trailing(self.start, self.days())
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn api_start(&self) -> String {
        self.start.format(API_DATE_FORMAT).to_string()
    }

    pub fn api_end(&self) -> String {
        self.end.format(API_DATE_FORMAT).to_string()
    }

    /// e.g. `October 01 - October 08, 2024`
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%B %d"),
            self.end.format("%B %d, %Y")
        )
    }

    pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(value, API_DATE_FORMAT)
    }
}
