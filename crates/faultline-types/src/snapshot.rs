use std::collections::{HashMap, HashSet};
use std::fmt;

use facet::Facet;

use crate::ProtocolError;

/// Health of a service as reported by the backend.
///
/// On the wire this is the integer code `0`, `1` or `2`.
#[derive(Facet, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Healthy),
            1 => Some(Self::Degraded),
            2 => Some(Self::Down),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Down => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Degraded => "DEGRADED",
            Self::Down => "DOWN",
        }
    }
}

/// A service in the dependency graph.
#[derive(Facet, Clone, Debug, PartialEq)]
pub struct Node {
    /// Stable identity of the logical service across snapshots.
    pub id: String,

    /// Display name.
    pub service_name: String,

    pub health_status: HealthStatus,

    /// How much a failure of this service amplifies downstream impact.
    pub amplification_score: f64,

    /// Number of downstream failures attributed to this service.
    pub downstream_failures: u64,
}

impl Node {
    /// A healthy node whose display name is its id.
    pub fn healthy(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            service_name: id.clone(),
            id,
            health_status: HealthStatus::Healthy,
            amplification_score: 0.0,
            downstream_failures: 0,
        }
    }
}

/// A directed causal dependency between two services.
#[derive(Facet, Clone, Debug, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,

    /// Backend-estimated probability that failures propagate along this edge.
    pub causal_confidence: f64,

    /// Whether the dependency is currently propagating failure.
    pub is_active: bool,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            causal_confidence: 0.0,
            is_active: false,
        }
    }

    pub fn id(&self) -> EdgeId {
        EdgeId::new(self.source.as_str(), self.target.as_str())
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Identity of an edge: its `(source, target)` pair.
#[derive(Facet, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId {
    pub source: String,
    pub target: String,
}

impl EdgeId {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.source == edge.source && self.target == edge.target
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source, self.target)
    }
}

/// The complete graph at one instant. Replaced wholesale on refresh, never patched.
#[derive(Clone, Debug)]
pub struct GraphSnapshot {
    timestamp: i64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    edge_ids: HashSet<EdgeId>,
}

impl GraphSnapshot {
    /// Validates and builds a snapshot.
    pub fn new(timestamp: i64, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ProtocolError> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(ProtocolError::EmptyNodeId { index });
            }
            if !node.amplification_score.is_finite() || node.amplification_score < 0.0 {
                return Err(ProtocolError::InvalidAmplification {
                    node: node.id.clone(),
                    value: node.amplification_score,
                });
            }
            if node_index.insert(node.id.clone(), index).is_some() {
                return Err(ProtocolError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::with_capacity(edges.len());
        for edge in &edges {
            if !(0.0..=1.0).contains(&edge.causal_confidence) {
                return Err(ProtocolError::InvalidConfidence {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    value: edge.causal_confidence,
                });
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_index.contains_key(endpoint) {
                    return Err(ProtocolError::UnknownEndpoint {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            edge_ids.insert(edge.id());
        }

        Ok(Self {
            timestamp,
            nodes,
            edges,
            node_index,
            edge_ids,
        })
    }

    /// Milliseconds since the Unix epoch this snapshot describes.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge_ids.contains(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        if !self.contains_edge(id) {
            return None;
        }
        self.edges.iter().find(|edge| id.matches(edge))
    }
}
