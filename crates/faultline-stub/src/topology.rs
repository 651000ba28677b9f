//! A fixed e-commerce service graph whose health follows a 120 second cycle.
//!
//! Four traffic paths: browsing (web -> gateway -> product -> cache/db),
//! search (mobile -> search -> elasticsearch), checkout (gateway -> orders ->
//! users/inventory/payments/notifications) and a background analytics job.
//! Within each cycle the cache is slow during seconds `[30, 50)` and the
//! payment gateway is down during seconds `[60, 90)`.

use faultline_types::{Edge, GraphSnapshot, HealthStatus, Node, ProtocolError};

pub const CYCLE_SECS: i64 = 120;
pub const CACHE_SLOW: (i64, i64) = (30, 50);
pub const PAYMENT_DOWN: (i64, i64) = (60, 90);

const SERVICES: &[&str] = &[
    "web-frontend",
    "api-gateway",
    "product-service",
    "redis-cache",
    "postgres-primary",
    "mobile-app",
    "mobile-api",
    "product-search-service",
    "elasticsearch-cluster",
    "order-service",
    "user-service",
    "auth-service",
    "inventory-service",
    "postgres-inventory",
    "payment-gateway",
    "notification-service",
    "cron-scheduler",
    "analytics-aggregator",
    "bigquery-loader",
];

const DEPENDENCIES: &[(&str, &str)] = &[
    ("web-frontend", "api-gateway"),
    ("api-gateway", "product-service"),
    ("product-service", "redis-cache"),
    ("product-service", "postgres-primary"),
    ("mobile-app", "mobile-api"),
    ("mobile-api", "product-search-service"),
    ("product-search-service", "elasticsearch-cluster"),
    ("api-gateway", "order-service"),
    ("order-service", "user-service"),
    ("user-service", "auth-service"),
    ("order-service", "inventory-service"),
    ("inventory-service", "postgres-inventory"),
    ("order-service", "payment-gateway"),
    ("order-service", "notification-service"),
    ("cron-scheduler", "analytics-aggregator"),
    ("analytics-aggregator", "bigquery-loader"),
];

const BASELINE_CONFIDENCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incident {
    None,
    CacheSlow,
    PaymentDown,
}

/// Second within the cycle for `ts_ms`; negative timestamps wrap.
pub fn cycle_second(ts_ms: i64) -> i64 {
    ts_ms.div_euclid(1_000).rem_euclid(CYCLE_SECS)
}

pub fn incident_at(ts_ms: i64) -> Incident {
    let second = cycle_second(ts_ms);
    if (CACHE_SLOW.0..CACHE_SLOW.1).contains(&second) {
        Incident::CacheSlow
    } else if (PAYMENT_DOWN.0..PAYMENT_DOWN.1).contains(&second) {
        Incident::PaymentDown
    } else {
        Incident::None
    }
}

struct Impact {
    service: &'static str,
    status: HealthStatus,
    amplification: f64,
    failures: u64,
}

struct Propagation {
    source: &'static str,
    target: &'static str,
    confidence: f64,
}

fn incident_effects(incident: Incident, second: i64) -> (Vec<Impact>, Vec<Propagation>) {
    match incident {
        Incident::None => (Vec::new(), Vec::new()),
        Incident::CacheSlow => (
            vec![
                Impact {
                    service: "redis-cache",
                    status: HealthStatus::Degraded,
                    amplification: 2.4,
                    failures: 0,
                },
                Impact {
                    service: "product-service",
                    status: HealthStatus::Degraded,
                    amplification: 1.2,
                    failures: 0,
                },
            ],
            vec![
                Propagation {
                    source: "product-service",
                    target: "redis-cache",
                    confidence: 0.82,
                },
                Propagation {
                    source: "api-gateway",
                    target: "product-service",
                    confidence: 0.55,
                },
            ],
        ),
        Incident::PaymentDown => {
            // Failures accumulate for as long as the outage lasts.
            let elapsed = (second - PAYMENT_DOWN.0).max(0) as u64;
            (
                vec![
                    Impact {
                        service: "payment-gateway",
                        status: HealthStatus::Down,
                        amplification: 3.5,
                        failures: 12 + elapsed,
                    },
                    Impact {
                        service: "order-service",
                        status: HealthStatus::Degraded,
                        amplification: 2.1,
                        failures: 4 + elapsed / 2,
                    },
                    Impact {
                        service: "api-gateway",
                        status: HealthStatus::Degraded,
                        amplification: 1.4,
                        failures: 1 + elapsed / 4,
                    },
                ],
                vec![
                    Propagation {
                        source: "order-service",
                        target: "payment-gateway",
                        confidence: 0.93,
                    },
                    Propagation {
                        source: "api-gateway",
                        target: "order-service",
                        confidence: 0.78,
                    },
                    Propagation {
                        source: "web-frontend",
                        target: "api-gateway",
                        confidence: 0.4,
                    },
                ],
            )
        }
    }
}

/// The graph as it looked at `ts_ms`.
pub fn snapshot_at(ts_ms: i64) -> Result<GraphSnapshot, ProtocolError> {
    let second = cycle_second(ts_ms);
    let (impacts, propagations) = incident_effects(incident_at(ts_ms), second);

    let nodes = SERVICES
        .iter()
        .map(|&service| {
            let mut node = Node::healthy(service);
            if let Some(impact) = impacts.iter().find(|impact| impact.service == service) {
                node.health_status = impact.status;
                node.amplification_score = impact.amplification;
                node.downstream_failures = impact.failures;
            }
            node
        })
        .collect();

    let edges = DEPENDENCIES
        .iter()
        .map(|&(source, target)| {
            let mut edge = Edge::new(source, target);
            edge.causal_confidence = BASELINE_CONFIDENCE;
            if let Some(propagation) = propagations
                .iter()
                .find(|p| p.source == source && p.target == target)
            {
                edge.causal_confidence = propagation.confidence;
                edge.is_active = true;
            }
            edge
        })
        .collect();

    GraphSnapshot::new(ts_ms, nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_types::EdgeId;

    const CYCLE_START: i64 = 1_700_000_040_000;

    #[test]
    fn cycle_start_is_aligned() {
        assert_eq!(cycle_second(CYCLE_START), 0);
        assert_eq!(cycle_second(-1), 119);
    }

    #[test]
    fn quiet_phase_is_all_healthy() {
        let snapshot = snapshot_at(CYCLE_START + 5_000).expect("valid topology");
        assert_eq!(snapshot.nodes().len(), SERVICES.len());
        assert_eq!(snapshot.edges().len(), DEPENDENCIES.len());
        assert!(
            snapshot
                .nodes()
                .iter()
                .all(|node| node.health_status == HealthStatus::Healthy)
        );
        assert!(snapshot.edges().iter().all(|edge| !edge.is_active));
    }

    #[test]
    fn cache_window_degrades_cache() {
        let snapshot = snapshot_at(CYCLE_START + 30_000).expect("valid topology");
        assert_eq!(
            snapshot.node("redis-cache").map(|node| node.health_status),
            Some(HealthStatus::Degraded)
        );
        let edge = snapshot
            .edge(&EdgeId::new("product-service", "redis-cache"))
            .expect("cache edge");
        assert!(edge.is_active);

        assert_eq!(incident_at(CYCLE_START + 50_000), Incident::None);
    }

    #[test]
    fn payment_outage_accumulates_failures() {
        let early = snapshot_at(CYCLE_START + 60_000).expect("valid topology");
        let late = snapshot_at(CYCLE_START + 89_999).expect("valid topology");
        let failures = |snapshot: &GraphSnapshot| {
            snapshot
                .node("payment-gateway")
                .map(|node| (node.health_status, node.downstream_failures))
        };
        assert_eq!(failures(&early), Some((HealthStatus::Down, 12)));
        assert_eq!(failures(&late), Some((HealthStatus::Down, 41)));
        assert_eq!(incident_at(CYCLE_START + 90_000), Incident::None);
    }
}
