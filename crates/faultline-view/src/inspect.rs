//! Text for the detail panel and node badges.

use faultline_types::{Edge, HealthStatus, Node};

use crate::classify::classify;

pub fn health_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "Healthy / Operational",
        HealthStatus::Degraded => "Degraded Performance",
        HealthStatus::Down => "Critical Outage",
    }
}

/// Short annotations drawn on the node box; only non-zero metrics appear.
pub fn badges(node: &Node) -> Vec<String> {
    let mut badges = Vec::new();
    if node.amplification_score > 0.0 {
        badges.push(format!("{:.1}x", node.amplification_score));
    }
    if node.downstream_failures > 0 {
        badges.push(format!("{} Fails", node.downstream_failures));
    }
    badges
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspector {
    pub title: String,
    pub subtitle: String,
    pub rows: Vec<(&'static str, String)>,
}

pub fn inspect_node(node: &Node) -> Inspector {
    Inspector {
        title: node.service_name.clone(),
        subtitle: node.id.clone(),
        rows: vec![
            ("Kind", classify(&node.service_name).as_str().to_string()),
            ("Health Status", health_label(node.health_status).to_string()),
            ("Amplification", format!("{:.2}x", node.amplification_score)),
            ("Downstream Fails", node.downstream_failures.to_string()),
        ],
    }
}

pub fn inspect_edge(edge: &Edge) -> Inspector {
    Inspector {
        title: format!("{} → {}", edge.source, edge.target),
        subtitle: "Causal Dependency".to_string(),
        rows: vec![
            ("Confidence", format!("{:.0}%", edge.causal_confidence * 100.0)),
            ("Active", if edge.is_active { "yes" } else { "no" }.to_string()),
            (
                "Propagation",
                format!("failures in {} propagate to {}", edge.source, edge.target),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_inspector_formats_metrics() {
        let mut node = Node::healthy("pay");
        node.service_name = "payment-gateway".to_string();
        node.health_status = HealthStatus::Down;
        node.amplification_score = 3.456;
        node.downstream_failures = 7;

        let inspector = inspect_node(&node);
        assert_eq!(inspector.title, "payment-gateway");
        assert_eq!(inspector.subtitle, "pay");
        assert!(inspector.rows.contains(&("Health Status", "Critical Outage".to_string())));
        assert!(inspector.rows.contains(&("Amplification", "3.46x".to_string())));
        assert!(inspector.rows.contains(&("Downstream Fails", "7".to_string())));
        assert_eq!(badges(&node), vec!["3.5x".to_string(), "7 Fails".to_string()]);
    }

    #[test]
    fn healthy_node_has_no_badges() {
        assert!(badges(&Node::healthy("quiet")).is_empty());
        assert_eq!(health_label(HealthStatus::Degraded), "Degraded Performance");
    }

    #[test]
    fn edge_inspector_names_both_ends() {
        let mut edge = Edge::new("orders", "payments");
        edge.causal_confidence = 0.9;
        edge.is_active = true;
        let inspector = inspect_edge(&edge);
        assert_eq!(inspector.title, "orders → payments");
        assert_eq!(inspector.subtitle, "Causal Dependency");
        assert_eq!(inspector.rows[0], ("Confidence", "90%".to_string()));
        assert_eq!(inspector.rows[1], ("Active", "yes".to_string()));
    }
}
