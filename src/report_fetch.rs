use crate::config::Config;
use crate::error::{CostReportError, ErrorKind};
use crate::response::ApiResponse;
use crate::storage::{latest, ReportStore, S3ReportStore};
use tracing::{error, info};

pub struct ReportFetchHandler<S> {
    store: S,
}

impl ReportFetchHandler<S3ReportStore> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(S3ReportStore::new(
            config.region.clone(),
            &config.report_bucket,
            &config.report_prefix,
        ))
    }
}

impl<S: ReportStore> ReportFetchHandler<S> {
    pub fn new(store: S) -> Self {
        ReportFetchHandler { store }
    }

    /// Returns the newest stored report body as-is.
    pub async fn handle(&self) -> ApiResponse {
        match self.fetch_latest().await {
            Ok(body) => ApiResponse::new(200, body),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no reports found");
                ApiResponse::error(404, &e.to_string())
            }
            Err(e) => {
                error!(error = %e, "failed to fetch latest report");
                ApiResponse::error(500, &e.to_string())
            }
        }
    }

    async fn fetch_latest(&self) -> Result<String, CostReportError> {
        let reports = self.store.list_reports().await?;
        let newest = latest(&reports).ok_or(CostReportError::NotFound)?;
        info!(key = %newest.key, "reading latest report");
        self.store.read_report(&newest.key).await
    }
}
