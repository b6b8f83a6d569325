use crate::error::CostReportError;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::str::FromStr;

/// One cost line item as reported by the billing API.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    /// `None` for totals-only queries without a service dimension.
    pub service: Option<String>,
    pub amount: BigDecimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl CostRecord {
    pub fn new(
        service: Option<&str>,
        amount: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Self, CostReportError> {
        Ok(CostRecord {
            service: service.map(str::to_string),
            amount: BigDecimal::from_str(amount.trim())?,
            period_start,
            period_end,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedCosts {
    pub by_service: BTreeMap<String, BigDecimal>,
    pub total: BigDecimal,
}

impl Default for AggregatedCosts {
    fn default() -> Self {
        Self {
            by_service: BTreeMap::new(),
            total: BigDecimal::from(0),
        }
    }
}

impl AggregatedCosts {
    pub fn cost_of(&self, service: &str) -> BigDecimal {
        self.by_service
            .get(service)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Services costing more than `threshold`, most expensive first.
    pub fn ranked_above(&self, threshold: &BigDecimal) -> Vec<(&str, &BigDecimal)> {
        let mut ranked: Vec<(&str, &BigDecimal)> = self
            .by_service
            .iter()
            .filter(|(_, cost)| *cost > threshold)
            .map(|(service, cost)| (service.as_str(), cost))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Sums amounts per service across every time bucket. The total covers all
/// records, including ones that carry no service.
pub fn aggregate<'a, I>(records: I) -> AggregatedCosts
where
    I: IntoIterator<Item = &'a CostRecord>,
{
    let mut aggregated = AggregatedCosts::default();
    for record in records {
        if let Some(service) = &record.service {
            let entry = aggregated
                .by_service
                .entry(service.clone())
                .or_insert_with(|| BigDecimal::from(0));
            *entry = &*entry + &record.amount;
        }
        aggregated.total = &aggregated.total + &record.amount;
    }
    aggregated
}

/// Relative change against a base; undefined when the base is not positive.
#[derive(Debug, Clone, PartialEq)]
pub enum PercentChange {
    Change(BigDecimal),
    NotApplicable,
}

impl PercentChange {
    pub fn between(current: &BigDecimal, previous: &BigDecimal) -> Self {
        if *previous <= BigDecimal::from(0) {
            return PercentChange::NotApplicable;
        }
        PercentChange::Change((current - previous) / previous * BigDecimal::from(100))
    }

    pub fn exceeds(&self, threshold: &BigDecimal) -> bool {
        match self {
            PercentChange::Change(percent) => percent > threshold,
            PercentChange::NotApplicable => false,
        }
    }

    pub fn to_f64(&self) -> Result<Option<f64>, CostReportError> {
        match self {
            PercentChange::Change(percent) => to_amount(percent).map(Some),
            PercentChange::NotApplicable => Ok(None),
        }
    }
}

pub fn to_amount(value: &BigDecimal) -> Result<f64, CostReportError> {
    value.to_f64().ok_or(CostReportError::ToPrimitive)
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
