use crate::error::CostReportError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusoto_core::Region;
use rusoto_s3::{GetObjectRequest, ListObjectsV2Request, S3Client, S3};
use tokio::io::AsyncReadExt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Read access to previously generated report artifacts.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn list_reports(&self) -> Result<Vec<StoredReport>, CostReportError>;

    async fn read_report(&self, key: &str) -> Result<String, CostReportError>;
}

/// The most recently modified report, if any.
pub fn latest(reports: &[StoredReport]) -> Option<&StoredReport> {
    reports.iter().max_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    })
}

pub struct S3ReportStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3ReportStore {
    pub fn new(region: Region, bucket: &str, prefix: &str) -> Self {
        Self::new_with_client(S3Client::new(region), bucket, prefix)
    }

    pub fn new_with_client(client: S3Client, bucket: &str, prefix: &str) -> Self {
        S3ReportStore {
            client,
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl ReportStore for S3ReportStore {
    async fn list_reports(&self) -> Result<Vec<StoredReport>, CostReportError> {
        let mut reports = Vec::new();
        let mut continuation_token = None;
        loop {
            let output = self
                .client
                .list_objects_v2(ListObjectsV2Request {
                    bucket: self.bucket.clone(),
                    prefix: Some(self.prefix.clone()),
                    continuation_token: continuation_token.take(),
                    ..ListObjectsV2Request::default()
                })
                .await?;

            for object in output.contents.unwrap_or_default() {
                let key = object.key.ok_or(CostReportError::NoneValue("Contents.Key"))?;
                let last_modified = object
                    .last_modified
                    .ok_or(CostReportError::NoneValue("Contents.LastModified"))?;
                let last_modified = DateTime::parse_from_rfc3339(&last_modified)
                    .map_err(|source| CostReportError::InvalidTimestamp {
                        value: last_modified.clone(),
                        source,
                    })?
                    .with_timezone(&Utc);
                reports.push(StoredReport { key, last_modified });
            }

            match output.next_continuation_token {
                Some(token) if output.is_truncated.unwrap_or(false) => {
                    continuation_token = Some(token);
                }
                _ => break,
            }
        }
        debug!(bucket = %self.bucket, prefix = %self.prefix, count = reports.len(), "listed reports");
        Ok(reports)
    }

    async fn read_report(&self, key: &str) -> Result<String, CostReportError> {
        let output = self
            .client
            .get_object(GetObjectRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                ..GetObjectRequest::default()
            })
            .await?;
        let body = output.body.ok_or(CostReportError::NoneValue("GetObject.Body"))?;

        let mut content = String::new();
        let mut reader = Box::pin(body.into_async_read());
        reader.read_to_string(&mut content).await?;
        Ok(content)
    }
}
