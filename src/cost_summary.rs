use crate::billing::{source_from_config, CostSource, Grouping};
use crate::cache::{Clock, Lookup, ResponseCache, SystemClock};
use crate::config::Config;
use crate::cost::{aggregate, round_to, to_amount, AggregatedCosts, PercentChange};
use crate::delta::materiality_threshold;
use crate::error::CostReportError;
use crate::period::Period;
use crate::report::format_percent;
use crate::response::ApiResponse;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCost {
    pub service: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub period_start: String,
    pub period_end: String,
    pub total_cost: f64,
    pub by_service: Vec<ServiceCost>,
    pub trend: String,
    pub cached_at: String,
    pub cache_expires_in: i64,
}

impl CostSummary {
    pub fn new(
        period: &Period,
        current: &AggregatedCosts,
        previous: &AggregatedCosts,
        fetched_at: DateTime<Utc>,
        freshness: Duration,
    ) -> Result<Self, CostReportError> {
        let by_service = current
            .ranked_above(&materiality_threshold())
            .into_iter()
            .map(|(service, cost)| {
                Ok(ServiceCost {
                    service: service.to_string(),
                    cost: round_to(to_amount(cost)?, 2),
                })
            })
            .collect::<Result<Vec<_>, CostReportError>>()?;

        Ok(CostSummary {
            period_start: period.api_start(),
            period_end: period.api_end(),
            total_cost: round_to(to_amount(&current.total)?, 2),
            by_service,
            trend: format_percent(&PercentChange::between(&current.total, &previous.total))?,
            cached_at: fetched_at.to_rfc3339(),
            cache_expires_in: freshness.num_seconds(),
        })
    }
}

pub struct CostSummaryHandler {
    source: Box<dyn CostSource>,
    cache: ResponseCache<CostSummary>,
    clock: Box<dyn Clock>,
    period_days: i64,
    serve_stale_on_error: bool,
}

impl CostSummaryHandler {
    pub fn new(
        source: Box<dyn CostSource>,
        cache: ResponseCache<CostSummary>,
        clock: Box<dyn Clock>,
        period_days: i64,
    ) -> Self {
        CostSummaryHandler {
            source,
            cache,
            clock,
            period_days,
            serve_stale_on_error: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            source_from_config(config),
            ResponseCache::new(config.cache_freshness),
            Box::new(SystemClock),
            config.period_days,
        )
        .serve_stale_on_error(config.serve_stale_on_error)
    }

    pub fn serve_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    pub async fn handle(&self) -> Result<ApiResponse, CostReportError> {
        let now = self.clock.now();
        let stale = match self.cache.lookup(now) {
            Lookup::Fresh { payload, age } => {
                info!(age_seconds = age.num_seconds(), "returning cached cost summary");
                return self.cached_response(&payload, "HIT", age);
            }
            Lookup::Stale { payload, age } => Some((payload, age)),
            Lookup::Empty => None,
        };

        info!("cache miss or expired, fetching cost data");
        match self.refresh(now).await {
            Ok(summary) => {
                self.cache.store(now, summary.clone());
                Ok(ApiResponse::json(200, &summary)?
                    .with_header("X-Cache-Status", "MISS")
                    .with_header("Cache-Control", &self.max_age()))
            }
            Err(failure) => {
                error!(error = %failure, "failed to fetch cost data");
                match stale {
                    Some((payload, age)) if self.serve_stale_on_error => {
                        warn!(age_seconds = age.num_seconds(), "serving stale cost summary");
                        self.cached_response(&payload, "STALE", age)
                    }
                    _ => Ok(ApiResponse::failure(500, "Failed to fetch cost data", &failure)),
                }
            }
        }
    }

    async fn refresh(&self, now: DateTime<Utc>) -> Result<CostSummary, CostReportError> {
        let period = Period::trailing(now.date_naive(), self.period_days)?;
        let previous_period = period.preceding()?;

        let current = self.source.fetch_costs(&period, Grouping::ByService).await?;
        let previous = self
            .source
            .fetch_costs(&previous_period, Grouping::Total)
            .await?;

        CostSummary::new(
            &period,
            &aggregate(&current),
            &aggregate(&previous),
            now,
            self.cache.freshness(),
        )
    }

    fn cached_response(
        &self,
        summary: &CostSummary,
        status: &str,
        age: Duration,
    ) -> Result<ApiResponse, CostReportError> {
        Ok(ApiResponse::json(200, summary)?
            .with_header("X-Cache-Status", status)
            .with_header("X-Cache-Age", &age.num_seconds().to_string())
            .with_header("Cache-Control", &self.max_age()))
    }

    fn max_age(&self) -> String {
        format!("max-age={}", self.cache.freshness().num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use crate::billing::{CostSource, Grouping};
    use crate::cache::{Clock, ResponseCache};
    use crate::cost::CostRecord;
    use crate::cost_summary::CostSummaryHandler;
    use crate::error::CostReportError;
    use crate::period::Period;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct FakeSource {
        calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
        current: Vec<(&'static str, &'static str)>,
        previous_total: &'static str,
    }

    impl FakeSource {
        fn new(current: Vec<(&'static str, &'static str)>, previous_total: &'static str) -> Self {
            FakeSource {
                calls: Arc::new(AtomicUsize::new(0)),
                failing: Arc::new(AtomicBool::new(false)),
                current,
                previous_total,
            }
        }
    }

    #[async_trait]
    impl CostSource for FakeSource {
        async fn fetch_costs(
            &self,
            period: &Period,
            grouping: Grouping,
        ) -> Result<Vec<CostRecord>, CostReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(CostReportError::NoneValue("ResultsByTime"));
            }
            match grouping {
                Grouping::ByService => self
                    .current
                    .iter()
                    .map(|(service, amount)| {
                        CostRecord::new(Some(*service), amount, period.start, period.end)
                    })
                    .collect(),
                Grouping::Total => Ok(vec![CostRecord::new(
                    None,
                    self.previous_total,
                    period.start,
                    period.end,
                )?]),
            }
        }
    }

    #[derive(Clone)]
    struct FakeClock(Arc<Mutex<DateTime<Utc>>>);

    impl FakeClock {
        fn at(now: DateTime<Utc>) -> Self {
            FakeClock(Arc::new(Mutex::new(now)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 8, 9, 0, 0).unwrap()
    }

    fn handler(source: &FakeSource, clock: &FakeClock) -> CostSummaryHandler {
        CostSummaryHandler::new(
            Box::new(source.clone()),
            ResponseCache::new(Duration::hours(6)),
            Box::new(clock.clone()),
            7,
        )
    }

    #[tokio::test]
    async fn test_miss_then_hit_then_expired() {
        let source = FakeSource::new(vec![("EC2", "100"), ("S3", "20")], "100");
        let clock = FakeClock::at(start());
        let handler = handler(&source, &clock);

        let first = handler.handle().await.unwrap();
        assert_eq!(first.status_code, 200);
        assert_eq!(first.header("X-Cache-Status"), Some("MISS"));
        assert_eq!(first.header("X-Cache-Age"), None);
        assert_eq!(first.header("Cache-Control"), Some("max-age=21600"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::minutes(30));
        let second = handler.handle().await.unwrap();
        assert_eq!(second.header("X-Cache-Status"), Some("HIT"));
        assert_eq!(second.header("X-Cache-Age"), Some("1800"));
        assert_eq!(second.body, first.body);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::hours(6));
        let third = handler.handle().await.unwrap();
        assert_eq!(third.header("X-Cache-Status"), Some("MISS"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_summary_body() {
        let source = FakeSource::new(
            vec![("EC2", "60"), ("S3", "20"), ("EC2", "40"), ("AWS KMS", "0.01")],
            "100",
        );
        let clock = FakeClock::at(start());
        let response = handler(&source, &clock).handle().await.unwrap();

        assert_eq!(
            response.body_json().unwrap(),
            json!({
                "periodStart": "2024-10-01",
                "periodEnd": "2024-10-08",
                "totalCost": 120.01,
                "byService": [
                    { "service": "EC2", "cost": 100.0 },
                    { "service": "S3", "cost": 20.0 }
                ],
                "trend": "+20.0%",
                "cachedAt": "2024-10-08T09:00:00+00:00",
                "cacheExpiresIn": 21600
            })
        );
    }

    #[tokio::test]
    async fn test_trend_without_previous_spend() {
        let source = FakeSource::new(vec![("EC2", "5")], "0");
        let clock = FakeClock::at(start());
        let response = handler(&source, &clock).handle().await.unwrap();

        assert_eq!(response.body_json().unwrap()["trend"], json!("N/A"));
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let source = FakeSource::new(vec![("EC2", "5")], "5");
        let clock = FakeClock::at(start());
        let handler = handler(&source, &clock);

        source.failing.store(true, Ordering::SeqCst);
        let failed = handler.handle().await.unwrap();
        assert_eq!(failed.status_code, 500);
        assert_eq!(
            failed.body_json().unwrap(),
            json!({
                "error": "Failed to fetch cost data",
                "message": "Value is None: ResultsByTime"
            })
        );

        source.failing.store(false, Ordering::SeqCst);
        let recovered = handler.handle().await.unwrap();
        assert_eq!(recovered.status_code, 200);
        assert_eq!(recovered.header("X-Cache-Status"), Some("MISS"));
    }

    #[tokio::test]
    async fn test_expired_entry_not_served_on_failure_by_default() {
        let source = FakeSource::new(vec![("EC2", "5")], "5");
        let clock = FakeClock::at(start());
        let handler = handler(&source, &clock);
        handler.handle().await.unwrap();

        clock.advance(Duration::hours(7));
        source.failing.store(true, Ordering::SeqCst);
        assert_eq!(handler.handle().await.unwrap().status_code, 500);
    }

    #[tokio::test]
    async fn test_serve_stale_on_error() {
        let source = FakeSource::new(vec![("EC2", "5")], "5");
        let clock = FakeClock::at(start());
        let handler = handler(&source, &clock).serve_stale_on_error(true);
        let fresh = handler.handle().await.unwrap();

        clock.advance(Duration::hours(7));
        source.failing.store(true, Ordering::SeqCst);
        let stale = handler.handle().await.unwrap();
        assert_eq!(stale.status_code, 200);
        assert_eq!(stale.header("X-Cache-Status"), Some("STALE"));
        assert_eq!(stale.header("X-Cache-Age"), Some("25200"));
        assert_eq!(stale.body, fresh.body);
    }
}
