use crate::config::{Config, DataSourceKind};
use crate::cost::CostRecord;
use crate::error::CostReportError;
use crate::period::Period;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, FromPrimitive};
use rand::Rng;
use rusoto_ce::{
    CostExplorer, CostExplorerClient, DateInterval, GetCostAndUsageRequest, GroupDefinition,
    ResultByTime,
};
use rusoto_core::Region;
use tracing::{debug, info};

const COST_METRIC: &str = "UnblendedCost";
const DAILY: &str = "DAILY";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grouping {
    ByService,
    /// Period totals only, no service dimension.
    Total,
}

/// Where itemized cost data comes from.
#[async_trait]
pub trait CostSource: Send + Sync {
    async fn fetch_costs(
        &self,
        period: &Period,
        grouping: Grouping,
    ) -> Result<Vec<CostRecord>, CostReportError>;
}

pub fn source_from_config(config: &Config) -> Box<dyn CostSource> {
    match config.data_source {
        DataSourceKind::CostExplorer => Box::new(CostExplorerSource::new(config.region.clone())),
        DataSourceKind::Mock => Box::new(MockCostSource::default()),
    }
}

pub struct CostExplorerSource {
    client: CostExplorerClient,
}

impl CostExplorerSource {
    pub fn new(region: Region) -> Self {
        Self::new_with_client(CostExplorerClient::new(region))
    }

    pub fn new_with_client(client: CostExplorerClient) -> Self {
        CostExplorerSource { client }
    }

    fn records_from_results(
        &self,
        results: Option<Vec<ResultByTime>>,
        grouping: Grouping,
    ) -> Result<Vec<CostRecord>, CostReportError> {
        let mut records = Vec::new();
        for result in results.unwrap_or_default() {
            let time_period = result
                .time_period
                .ok_or(CostReportError::NoneValue("ResultsByTime.TimePeriod"))?;
            let start = parse_date(&time_period.start)?;
            let end = parse_date(&time_period.end)?;

            match grouping {
                Grouping::ByService => {
                    for group in result.groups.unwrap_or_default() {
                        let service = group
                            .keys
                            .and_then(|keys| keys.into_iter().next())
                            .ok_or(CostReportError::NoneValue("Groups.Keys"))?;
                        let amount = group
                            .metrics
                            .and_then(|mut metrics| metrics.remove(COST_METRIC))
                            .and_then(|metric| metric.amount)
                            .ok_or(CostReportError::NoneValue("Groups.Metrics.UnblendedCost"))?;
                        records.push(CostRecord::new(Some(&service), &amount, start, end)?);
                    }
                }
                Grouping::Total => {
                    let amount = result
                        .total
                        .and_then(|mut total| total.remove(COST_METRIC))
                        .and_then(|metric| metric.amount)
                        .ok_or(CostReportError::NoneValue("Total.UnblendedCost"))?;
                    records.push(CostRecord::new(None, &amount, start, end)?);
                }
            }
        }
        Ok(records)
    }
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate, CostReportError> {
    Period::parse_date(value).map_err(|source| CostReportError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

#[async_trait]
impl CostSource for CostExplorerSource {
    async fn fetch_costs(
        &self,
        period: &Period,
        grouping: Grouping,
    ) -> Result<Vec<CostRecord>, CostReportError> {
        let group_by = match grouping {
            Grouping::ByService => Some(vec![GroupDefinition {
                key: Some("SERVICE".to_string()),
                type_: Some("DIMENSION".to_string()),
            }]),
            Grouping::Total => None,
        };

        let mut records = Vec::new();
        let mut next_page_token = None;
        loop {
            let response = self
                .client
                .get_cost_and_usage(GetCostAndUsageRequest {
                    time_period: DateInterval {
                        start: period.api_start(),
                        end: period.api_end(),
                    },
                    granularity: DAILY.to_string(),
                    metrics: vec![COST_METRIC.to_string()],
                    group_by: group_by.clone(),
                    next_page_token: next_page_token.take(),
                    ..Default::default()
                })
                .await?;
            records.extend(self.records_from_results(response.results_by_time, grouping)?);

            match response.next_page_token {
                Some(token) if !token.is_empty() => {
                    debug!(%token, "fetching next cost and usage page");
                    next_page_token = Some(token);
                }
                _ => break,
            }
        }

        info!(
            start = %period.api_start(),
            end = %period.api_end(),
            ?grouping,
            records = records.len(),
            "fetched cost and usage"
        );
        Ok(records)
    }
}

const MOCK_SERVICES: [(&str, f64); 6] = [
    ("Amazon Elastic Compute Cloud - Compute", 14.0),
    ("Amazon Relational Database Service", 6.5),
    ("Amazon Simple Storage Service", 2.2),
    ("AWS Lambda", 0.9),
    ("Amazon CloudWatch", 0.6),
    ("Amazon Route 53", 0.07),
];

/// Generates plausible daily costs for a fixed service catalog, for
/// front-end work without billing access.
#[derive(Debug, Clone, Default)]
pub struct MockCostSource {
    seed: Option<u64>,
}

impl MockCostSource {
    pub fn with_seed(seed: u64) -> Self {
        MockCostSource { seed: Some(seed) }
    }

    fn generate<R: Rng>(
        rng: &mut R,
        period: &Period,
        grouping: Grouping,
    ) -> Result<Vec<CostRecord>, CostReportError> {
        let mut records = Vec::new();
        let mut day = period.start;
        while day < period.end {
            let next = day.succ_opt().ok_or(CostReportError::NoneValue("next day"))?;
            let mut daily_total = 0.0f64;
            for (service, base) in MOCK_SERVICES.iter() {
                let amount = (base * rng.gen_range(0.8..1.2) * 100.0).round() / 100.0;
                daily_total += amount;
                if grouping == Grouping::ByService {
                    records.push(mock_record(Some(*service), amount, day, next)?);
                }
            }
            if grouping == Grouping::Total {
                records.push(mock_record(None, daily_total, day, next)?);
            }
            day = next;
        }
        Ok(records)
    }
}

fn mock_record(
    service: Option<&str>,
    amount: f64,
    period_start: chrono::NaiveDate,
    period_end: chrono::NaiveDate,
) -> Result<CostRecord, CostReportError> {
    Ok(CostRecord {
        service: service.map(str::to_string),
        amount: BigDecimal::from_f64(amount)
            .ok_or(CostReportError::NoneValue("mock amount"))?
            .with_scale(2),
        period_start,
        period_end,
    })
}

#[async_trait]
impl CostSource for MockCostSource {
    async fn fetch_costs(
        &self,
        period: &Period,
        grouping: Grouping,
    ) -> Result<Vec<CostRecord>, CostReportError> {
        use rand::SeedableRng;

        let records = match self.seed {
            Some(seed) => Self::generate(&mut rand::rngs::StdRng::seed_from_u64(seed), period, grouping)?,
            None => Self::generate(&mut rand::thread_rng(), period, grouping)?,
        };
        debug!(records = records.len(), ?grouping, "generated mock cost records");
        Ok(records)
    }
}
