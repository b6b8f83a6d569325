use crate::billing::{source_from_config, CostSource, Grouping};
use crate::config::Config;
use crate::cost::{aggregate, round_to, to_amount};
use crate::delta::CostComparison;
use crate::error::CostReportError;
use crate::notification::{Mailer, NotificationDispatcher, SesMailer};
use crate::period::Period;
use crate::recommendation::recommend;
use crate::report::{ReportInput, ReportRenderer};
use crate::response::ApiResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

const SUCCESS_MESSAGE: &str = "Weekly report sent successfully";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReportOutcome {
    pub message: String,
    pub recipient: String,
    pub current_week_cost: f64,
    pub previous_week_cost: f64,
    pub delta: f64,
    pub delta_percent: Option<f64>,
}

pub struct WeeklyReportHandler<M> {
    source: Box<dyn CostSource>,
    dispatcher: NotificationDispatcher<M>,
    renderer: ReportRenderer,
    period_days: i64,
}

impl WeeklyReportHandler<SesMailer> {
    pub fn from_config(config: &Config) -> Result<Self, CostReportError> {
        let dispatcher = NotificationDispatcher::new(
            SesMailer::new(config.region.clone()),
            config.sender()?,
            &config.recipient,
        );
        Ok(Self::new(
            source_from_config(config),
            dispatcher,
            ReportRenderer::new()?,
            config.period_days,
        ))
    }
}

impl<M: Mailer> WeeklyReportHandler<M> {
    pub fn new(
        source: Box<dyn CostSource>,
        dispatcher: NotificationDispatcher<M>,
        renderer: ReportRenderer,
        period_days: i64,
    ) -> Self {
        WeeklyReportHandler {
            source,
            dispatcher,
            renderer,
            period_days,
        }
    }

    /// Builds and mails the report for the period ending at `now`. Any failure
    /// triggers a plain-text alert to the same recipient.
    pub async fn handle(&self, now: DateTime<Utc>) -> Result<ApiResponse, CostReportError> {
        match self.generate_and_send(now).await {
            Ok(outcome) => ApiResponse::json(200, &outcome),
            Err(e) => {
                error!(error = %e, "weekly report failed");
                self.dispatcher.notify_failure(&e).await;
                Ok(ApiResponse::failure(500, "Failed to generate/send report", &e))
            }
        }
    }

    async fn generate_and_send(
        &self,
        now: DateTime<Utc>,
    ) -> Result<WeeklyReportOutcome, CostReportError> {
        let current_period = Period::trailing(now.date_naive(), self.period_days)?;
        let previous_period = current_period.preceding()?;
        info!(
            current_start = %current_period.api_start(),
            previous_start = %previous_period.api_start(),
            "generating weekly cost report"
        );

        let current = self
            .source
            .fetch_costs(&current_period, Grouping::ByService)
            .await?;
        let previous = self
            .source
            .fetch_costs(&previous_period, Grouping::ByService)
            .await?;
        let comparison = CostComparison::between(&aggregate(&current), &aggregate(&previous));

        let recommendations = recommend(
            &comparison.services,
            &comparison.total_delta,
            &comparison.total_percent,
        )?;
        let document = self.renderer.render(
            &ReportInput {
                current_period,
                previous_period,
                comparison: &comparison,
                recommendations: &recommendations,
            },
            now,
        )?;
        self.dispatcher.dispatch(&document).await?;

        Ok(WeeklyReportOutcome {
            message: SUCCESS_MESSAGE.to_string(),
            recipient: self.dispatcher.recipient().to_string(),
            current_week_cost: round_to(to_amount(&comparison.current_total)?, 2),
            previous_week_cost: round_to(to_amount(&comparison.previous_total)?, 2),
            delta: round_to(to_amount(&comparison.total_delta)?, 2),
            delta_percent: comparison
                .total_percent
                .to_f64()?
                .map(|percent| round_to(percent, 1)),
        })
    }
}
