use crate::cost::{AggregatedCosts, PercentChange};
use bigdecimal::BigDecimal;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDelta {
    pub service: String,
    pub current: BigDecimal,
    pub previous: BigDecimal,
    pub delta: BigDecimal,
    pub delta_percent: PercentChange,
}

impl ServiceDelta {
    pub fn new(service: &str, current: BigDecimal, previous: BigDecimal) -> Self {
        let delta = &current - &previous;
        let delta_percent = PercentChange::between(&current, &previous);
        ServiceDelta {
            service: service.to_string(),
            current,
            previous,
            delta,
            delta_percent,
        }
    }
}

/// Period-level figures plus the per-service breakdown of one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CostComparison {
    pub current_total: BigDecimal,
    pub previous_total: BigDecimal,
    pub total_delta: BigDecimal,
    pub total_percent: PercentChange,
    pub services: Vec<ServiceDelta>,
}

impl CostComparison {
    pub fn between(current: &AggregatedCosts, previous: &AggregatedCosts) -> Self {
        CostComparison {
            current_total: current.total.clone(),
            previous_total: previous.total.clone(),
            total_delta: &current.total - &previous.total,
            total_percent: PercentChange::between(&current.total, &previous.total),
            services: calculate_deltas(current, previous),
        }
    }
}

/// Services whose cost stays at or below one cent in both periods are left out.
pub fn materiality_threshold() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Per-service change between two periods, most expensive current service
/// first. Equal current costs are ordered by service name.
pub fn calculate_deltas(current: &AggregatedCosts, previous: &AggregatedCosts) -> Vec<ServiceDelta> {
    let threshold = materiality_threshold();
    let services: BTreeSet<&String> = current
        .by_service
        .keys()
        .chain(previous.by_service.keys())
        .collect();

    let mut deltas: Vec<ServiceDelta> = services
        .into_iter()
        .map(|service| {
            ServiceDelta::new(
                service,
                current.cost_of(service),
                previous.cost_of(service),
            )
        })
        .filter(|delta| delta.current > threshold || delta.previous > threshold)
        .collect();

    deltas.sort_by(|a, b| {
        b.current
            .cmp(&a.current)
            .then_with(|| a.service.cmp(&b.service))
    });
    deltas
}
