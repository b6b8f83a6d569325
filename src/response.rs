use crate::error::CostReportError;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// API Gateway proxy response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: String) -> Self {
        ApiResponse {
            status_code,
            headers: BTreeMap::new(),
            body,
        }
        .with_header("Content-Type", "application/json")
        .with_header("Access-Control-Allow-Origin", "*")
    }

    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Result<Self, CostReportError> {
        Ok(Self::new(status_code, serde_json::to_string(body)?))
    }

    /// `{"error": "..."}`
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::new(status_code, json!({ "error": message }).to_string())
    }

    /// `{"error": "...", "message": "..."}`
    pub fn failure(status_code: u16, summary: &str, cause: &CostReportError) -> Self {
        Self::new(
            status_code,
            json!({ "error": summary, "message": cause.to_string() }).to_string(),
        )
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body_json(&self) -> Result<Value, CostReportError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CostReportError;
    use crate::response::ApiResponse;
    use serde_json::json;

    #[test]
    fn test_serialize_envelope() {
        let response = ApiResponse::json(200, &json!({ "totalFindings": 2 })).unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "statusCode": 200,
                "headers": {
                    "Access-Control-Allow-Origin": "*",
                    "Content-Type": "application/json"
                },
                "body": "{\"totalFindings\":2}"
            })
        );
    }

    #[test]
    fn test_error_bodies() {
        let not_found = ApiResponse::error(404, "No reports found.");
        assert_eq!(not_found.status_code, 404);
        assert_eq!(not_found.body_json().unwrap(), json!({ "error": "No reports found." }));

        let failure = ApiResponse::failure(
            500,
            "Failed to fetch cost data",
            &CostReportError::NoneValue("Total.UnblendedCost"),
        );
        assert_eq!(
            failure.body_json().unwrap(),
            json!({
                "error": "Failed to fetch cost data",
                "message": "Value is None: Total.UnblendedCost"
            })
        );
        assert_eq!(failure.header("Content-Type"), Some("application/json"));
    }
}
