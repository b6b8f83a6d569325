use crate::cost::{to_amount, PercentChange};
use crate::delta::ServiceDelta;
use crate::error::CostReportError;
use bigdecimal::BigDecimal;

pub const MAX_RECOMMENDATIONS: usize = 5;
const MAX_SERVICE_RECOMMENDATIONS: usize = 3;
const SHARP_INCREASE_PERCENT: i32 = 20;
const SERVICE_INCREASE_AMOUNT: i32 = 5;

struct ServiceAdvice {
    keywords: &'static [&'static str],
    label: &'static str,
    advice: &'static str,
}

static SERVICE_ADVICE: [ServiceAdvice; 4] = [
    ServiceAdvice {
        keywords: &["EC2", "Elastic Compute Cloud"],
        label: "EC2",
        advice: "Consider using Reserved Instances or Spot Instances for predictable workloads.",
    },
    ServiceAdvice {
        keywords: &["S3", "Simple Storage Service"],
        label: "S3",
        advice: "Enable Intelligent-Tiering and implement lifecycle policies.",
    },
    ServiceAdvice {
        keywords: &["RDS", "Relational Database Service"],
        label: "RDS",
        advice: "Review instance sizes and consider Aurora Serverless for variable workloads.",
    },
    ServiceAdvice {
        keywords: &["Lambda"],
        label: "Lambda",
        advice: "Optimize function memory allocation and execution time.",
    },
];

fn advice_for(service: &str) -> Option<&'static ServiceAdvice> {
    SERVICE_ADVICE
        .iter()
        .find(|advice| advice.keywords.iter().any(|keyword| service.contains(keyword)))
}

/// Advisory lines for the report, most actionable first. `deltas` is expected
/// in descending current-cost order.
pub fn recommend(
    deltas: &[ServiceDelta],
    total_delta: &BigDecimal,
    total_percent: &PercentChange,
) -> Result<Vec<String>, CostReportError> {
    let sharp_increase = BigDecimal::from(SHARP_INCREASE_PERCENT);
    let service_increase = BigDecimal::from(SERVICE_INCREASE_AMOUNT);
    let mut recommendations = Vec::new();

    if *total_delta > BigDecimal::from(0) && total_percent.exceeds(&sharp_increase) {
        if let Some(percent) = total_percent.to_f64()? {
            recommendations.push(format!(
                "Your spending increased by {:.1}% this week. \
                 Review your usage patterns to identify unexpected costs.",
                percent
            ));
        }
    }

    let increased = deltas
        .iter()
        .filter(|delta| {
            delta.delta > service_increase && delta.delta_percent.exceeds(&sharp_increase)
        })
        .take(MAX_SERVICE_RECOMMENDATIONS);
    for delta in increased {
        if let Some(advice) = advice_for(&delta.service) {
            recommendations.push(format!(
                "{} costs increased by ${:.2}. {}",
                advice.label,
                to_amount(&delta.delta)?,
                advice.advice
            ));
        }
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use crate::cost::PercentChange;
    use crate::delta::ServiceDelta;
    use crate::recommendation::{recommend, MAX_RECOMMENDATIONS};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn delta(service: &str, current: &str, previous: &str) -> ServiceDelta {
        ServiceDelta::new(service, decimal(current), decimal(previous))
    }

    #[test]
    fn test_empty_input() {
        let result = recommend(&[], &BigDecimal::from(0), &PercentChange::NotApplicable);
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_compute_advice_for_ec2() {
        let deltas = vec![delta("EC2", "100", "80"), delta("S3", "20", "20")];
        let result = recommend(
            &deltas,
            &decimal("20"),
            &PercentChange::Change(decimal("20")),
        )
        .unwrap();

        assert_eq!(
            result,
            vec!["EC2 costs increased by $20.00. \
                  Consider using Reserved Instances or Spot Instances for predictable workloads."
                .to_string()]
        );
    }

    #[test]
    fn test_sharp_overall_increase_comes_first() {
        let deltas = vec![delta("Amazon Relational Database Service", "60", "30")];
        let result = recommend(
            &deltas,
            &decimal("30"),
            &PercentChange::Change(decimal("100")),
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result[0].starts_with("Your spending increased by 100.0% this week."));
        assert!(result[1].starts_with("RDS costs increased by $30.00."));
    }

    #[test]
    fn test_thresholds() {
        let deltas = vec![
            // below the absolute threshold
            delta("AWS Lambda", "9", "4.5"),
            // below the relative threshold
            delta("Amazon EC2", "500", "450"),
            // new service, no previous cost to compare against
            delta("Amazon Simple Storage Service", "40", "0"),
        ];
        let result = recommend(
            &deltas,
            &decimal("-1"),
            &PercentChange::Change(decimal("-0.2")),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unmatched_service_emits_nothing() {
        let deltas = vec![delta("Amazon CloudFront", "50", "10")];
        let result = recommend(
            &deltas,
            &decimal("40"),
            &PercentChange::Change(decimal("400")),
        )
        .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_only_first_three_increases_considered() {
        let deltas = vec![
            delta("Amazon EC2", "400", "100"),
            delta("Amazon RDS", "300", "100"),
            delta("Amazon CloudFront", "200", "100"),
            delta("AWS Lambda", "150", "50"),
        ];
        let result = recommend(
            &deltas,
            &decimal("700"),
            &PercentChange::Change(decimal("200")),
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        assert!(result[1].starts_with("EC2"));
        assert!(result[2].starts_with("RDS"));
        assert!(result.len() <= MAX_RECOMMENDATIONS);
    }
}
