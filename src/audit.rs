//! Illustrative audit endpoint. Findings are simulated; no AWS API is queried.

use crate::error::CostReportError;
use crate::response::ApiResponse;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

const FINDING_PROBABILITY: f64 = 0.6;

pub const AUDITED_SERVICES: [&str; 9] = [
    "Amazon EC2",
    "Amazon EBS",
    "Amazon S3",
    "AWS Lambda",
    "Amazon RDS",
    "Amazon CloudWatch",
    "Amazon ECR",
    "Elastic Load Balancer",
    "Elastic IP",
];

pub const SAMPLE_RECOMMENDATIONS: [&str; 9] = [
    "Stopped instance; consider terminating.",
    "Unattached volume; delete to save cost.",
    "No lifecycle policy; enable Intelligent-Tiering.",
    "Large memory allocation; reduce if possible.",
    "Idle database; scale down.",
    "Too many custom metrics; review monitoring.",
    "Old image tags; clean repository.",
    "Unused load balancer; consider deletion.",
    "Unassociated Elastic IP; release to save cost.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub service: String,
    pub id: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_findings: usize,
    pub potential_savings_estimate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub findings: Vec<Finding>,
}

/// `Amazon EC2` -> `EC2`, `Elastic Load Balancer` -> `LOA`.
fn id_prefix(service: &str) -> String {
    service
        .split_whitespace()
        .nth(1)
        .unwrap_or(service)
        .chars()
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

pub fn simulate_audit<R: Rng>(rng: &mut R) -> AuditReport {
    let mut findings = Vec::new();
    for service in AUDITED_SERVICES.iter() {
        if !rng.gen_bool(FINDING_PROBABILITY) {
            continue;
        }
        let recommendation = SAMPLE_RECOMMENDATIONS
            .choose(rng)
            .copied()
            .unwrap_or(SAMPLE_RECOMMENDATIONS[0]);
        findings.push(Finding {
            service: service.to_string(),
            id: format!("{}-{}", id_prefix(service), rng.gen_range(1000..=9999)),
            recommendation: recommendation.to_string(),
        });
    }

    let savings = findings.len() * rng.gen_range(2..=8);
    AuditReport {
        summary: AuditSummary {
            total_findings: findings.len(),
            potential_savings_estimate: format!("${}.00/month (mock)", savings),
        },
        findings,
    }
}

pub fn handle_audit<R: Rng>(rng: &mut R) -> Result<ApiResponse, CostReportError> {
    let report = simulate_audit(rng);
    tracing::info!(findings = report.summary.total_findings, "simulated audit");
    ApiResponse::json(200, &report)
}

#[cfg(test)]
mod tests {
    use crate::audit::{
        handle_audit, id_prefix, simulate_audit, AUDITED_SERVICES, SAMPLE_RECOMMENDATIONS,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_id_prefix() {
        assert_eq!(id_prefix("Amazon EC2"), "EC2");
        assert_eq!(id_prefix("AWS Lambda"), "LAM");
        assert_eq!(id_prefix("Amazon CloudWatch"), "CLO");
        assert_eq!(id_prefix("Elastic Load Balancer"), "LOA");
        assert_eq!(id_prefix("Elastic IP"), "IP");
    }

    #[test]
    fn test_simulate_audit_shape() {
        for seed in 0..50 {
            let report = simulate_audit(&mut StdRng::seed_from_u64(seed));
            let count = report.findings.len();

            assert_eq!(report.summary.total_findings, count);
            assert!(count <= AUDITED_SERVICES.len());
            let savings: usize = report
                .summary
                .potential_savings_estimate
                .trim_start_matches('$')
                .trim_end_matches(".00/month (mock)")
                .parse()
                .unwrap();
            assert!(savings >= count * 2 && savings <= count * 8);

            for finding in &report.findings {
                assert!(AUDITED_SERVICES.contains(&finding.service.as_str()));
                assert!(SAMPLE_RECOMMENDATIONS.contains(&finding.recommendation.as_str()));
                let (prefix, number) = finding.id.split_once('-').unwrap();
                assert_eq!(prefix, id_prefix(&finding.service));
                let number: u32 = number.parse().unwrap();
                assert!((1000..=9999).contains(&number));
            }
        }
    }

    #[test]
    fn test_findings_follow_catalog_order() {
        let report = simulate_audit(&mut StdRng::seed_from_u64(3));
        let positions: Vec<usize> = report
            .findings
            .iter()
            .map(|finding| {
                AUDITED_SERVICES
                    .iter()
                    .position(|service| *service == finding.service)
                    .unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_handle_audit() {
        let response = handle_audit(&mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));

        let body = response.body_json().unwrap();
        let findings = body["findings"].as_array().unwrap();
        assert_eq!(
            body["summary"]["totalFindings"].as_u64().unwrap() as usize,
            findings.len()
        );
        assert!(body["summary"]["potentialSavingsEstimate"]
            .as_str()
            .unwrap()
            .ends_with("/month (mock)"));
    }
}
