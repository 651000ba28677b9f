//! JSON shape of `GET /api/graph` responses.
//!
//! The backend encodes protobuf messages, which omit zero values: a healthy
//! node has no `health_status`, an inactive edge has no `is_active`, and an
//! empty graph may carry `null` (or nothing) for `nodes` and `edges`. Every
//! field therefore defaults on decode.

use facet::Facet;

use crate::{Edge, GraphSnapshot, HealthStatus, Node, ProtocolError};

#[derive(Facet, Debug, Default)]
pub struct WireSnapshot {
    #[facet(default)]
    pub timestamp: i64,
    #[facet(default)]
    pub nodes: Option<Vec<WireNode>>,
    #[facet(default)]
    pub edges: Option<Vec<WireEdge>>,
}

#[derive(Facet, Debug, Default)]
pub struct WireNode {
    #[facet(default)]
    pub id: String,
    #[facet(default)]
    pub service_name: String,
    #[facet(default)]
    pub health_status: u8,
    #[facet(default)]
    pub amplification_score: f64,
    #[facet(default)]
    pub downstream_failures: u64,
}

#[derive(Facet, Debug, Default)]
pub struct WireEdge {
    #[facet(default)]
    pub source: String,
    #[facet(default)]
    pub target: String,
    #[facet(default)]
    pub causal_confidence: f64,
    #[facet(default)]
    pub is_active: bool,
}

impl WireSnapshot {
    /// Converts into a checked snapshot.
    pub fn into_snapshot(self) -> Result<GraphSnapshot, ProtocolError> {
        let nodes = self
            .nodes
            .unwrap_or_default()
            .into_iter()
            .map(WireNode::into_node)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self
            .edges
            .unwrap_or_default()
            .into_iter()
            .map(|edge| Edge {
                source: edge.source,
                target: edge.target,
                causal_confidence: edge.causal_confidence,
                is_active: edge.is_active,
            })
            .collect();
        GraphSnapshot::new(self.timestamp, nodes, edges)
    }
}

impl WireNode {
    fn into_node(self) -> Result<Node, ProtocolError> {
        let Some(health_status) = HealthStatus::from_code(self.health_status) else {
            return Err(ProtocolError::InvalidHealthStatus {
                node: self.id,
                code: self.health_status,
            });
        };
        Ok(Node {
            id: self.id,
            service_name: self.service_name,
            health_status,
            amplification_score: self.amplification_score,
            downstream_failures: self.downstream_failures,
        })
    }
}

impl From<&GraphSnapshot> for WireSnapshot {
    fn from(snapshot: &GraphSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp(),
            nodes: Some(
                snapshot
                    .nodes()
                    .iter()
                    .map(|node| WireNode {
                        id: node.id.clone(),
                        service_name: node.service_name.clone(),
                        health_status: node.health_status.code(),
                        amplification_score: node.amplification_score,
                        downstream_failures: node.downstream_failures,
                    })
                    .collect(),
            ),
            edges: Some(
                snapshot
                    .edges()
                    .iter()
                    .map(|edge| WireEdge {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        causal_confidence: edge.causal_confidence,
                        is_active: edge.is_active,
                    })
                    .collect(),
            ),
        }
    }
}

/// Decodes and validates a response body.
pub fn decode_snapshot(body: &str) -> Result<GraphSnapshot, ProtocolError> {
    let wire: WireSnapshot =
        facet_json::from_str(body).map_err(|e| ProtocolError::Decode(e.to_string()))?;
    wire.into_snapshot()
}

pub fn encode_snapshot(snapshot: &GraphSnapshot) -> Result<String, String> {
    facet_json::to_string(&WireSnapshot::from(snapshot))
        .map_err(|e| format!("encode snapshot: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeId;

    #[test]
    fn decodes_full_body() {
        let body = r#"{
            "timestamp": 1700000000000,
            "nodes": [
                {"id": "api", "service_name": "api-gateway", "health_status": 1,
                 "amplification_score": 2.5, "downstream_failures": 3},
                {"id": "db", "service_name": "postgres-primary", "health_status": 2,
                 "amplification_score": 0.0, "downstream_failures": 0}
            ],
            "edges": [
                {"source": "api", "target": "db", "causal_confidence": 0.8, "is_active": true}
            ]
        }"#;

        let snapshot = decode_snapshot(body).expect("valid body");
        assert_eq!(snapshot.timestamp(), 1_700_000_000_000);
        assert_eq!(snapshot.nodes().len(), 2);
        let api = snapshot.node("api").expect("api node");
        assert_eq!(api.service_name, "api-gateway");
        assert_eq!(api.health_status, HealthStatus::Degraded);
        assert_eq!(api.downstream_failures, 3);
        assert_eq!(
            snapshot.node("db").map(|node| node.health_status),
            Some(HealthStatus::Down)
        );
        let edge = snapshot.edge(&EdgeId::new("api", "db")).expect("edge");
        assert!(edge.is_active);
        assert_eq!(edge.causal_confidence, 0.8);
    }

    #[test]
    fn omitted_zero_values_default() {
        let body = r#"{"timestamp": 5, "nodes": [{"id": "a", "service_name": "a"}], "edges": null}"#;
        let snapshot = decode_snapshot(body).expect("valid body");
        let node = snapshot.node("a").expect("node a");
        assert_eq!(node.health_status, HealthStatus::Healthy);
        assert_eq!(node.amplification_score, 0.0);
        assert!(snapshot.edges().is_empty());

        let empty = decode_snapshot("{}").expect("empty object is an empty graph");
        assert_eq!(empty.timestamp(), 0);
        assert!(empty.nodes().is_empty());
    }

    #[test]
    fn edge_to_unknown_node_is_protocol_error() {
        let body = r#"{"timestamp": 1, "nodes": [{"id": "a"}],
            "edges": [{"source": "a", "target": "b", "causal_confidence": 0.5}]}"#;
        let err = decode_snapshot(body).expect_err("dangling edge");
        assert!(matches!(err, ProtocolError::UnknownEndpoint { ref missing, .. } if missing == "b"));
    }

    #[test]
    fn unknown_health_code_is_protocol_error() {
        let body = r#"{"nodes": [{"id": "a", "health_status": 7}]}"#;
        assert_eq!(
            decode_snapshot(body).expect_err("bad health"),
            ProtocolError::InvalidHealthStatus {
                node: "a".to_string(),
                code: 7,
            }
        );
    }

    #[test]
    fn malformed_json_is_protocol_error() {
        assert!(matches!(
            decode_snapshot("{\"nodes\": [").expect_err("truncated"),
            ProtocolError::Decode(_)
        ));
        assert!(matches!(
            decode_snapshot(r#"{"nodes": [{"id": "a", "downstream_failures": -4}]}"#)
                .expect_err("negative count"),
            ProtocolError::Decode(_)
        ));
    }

    #[test]
    fn encoded_snapshot_decodes_to_same_graph() {
        let mut node = Node::healthy("checkout");
        node.health_status = HealthStatus::Down;
        node.amplification_score = 4.0;
        let snapshot = GraphSnapshot::new(
            9,
            vec![node, Node::healthy("payments")],
            vec![Edge {
                source: "checkout".to_string(),
                target: "payments".to_string(),
                causal_confidence: 0.25,
                is_active: true,
            }],
        )
        .expect("valid snapshot");

        let body = encode_snapshot(&snapshot).expect("encode");
        let decoded = decode_snapshot(&body).expect("decode");
        assert_eq!(decoded.timestamp(), 9);
        assert_eq!(decoded.nodes(), snapshot.nodes());
        assert_eq!(decoded.edges(), snapshot.edges());
    }
}
