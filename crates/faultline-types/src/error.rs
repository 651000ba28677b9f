use std::error::Error;
use std::fmt;

/// A response that does not describe a well-formed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The body was not valid JSON for the snapshot shape.
    Decode(String),
    EmptyNodeId {
        index: usize,
    },
    DuplicateNode(String),
    InvalidHealthStatus {
        node: String,
        code: u8,
    },
    InvalidAmplification {
        node: String,
        value: f64,
    },
    InvalidConfidence {
        source: String,
        target: String,
        value: f64,
    },
    /// An edge names a node id that is absent from the snapshot.
    UnknownEndpoint {
        source: String,
        target: String,
        missing: String,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(message) => write!(f, "malformed snapshot body: {message}"),
            Self::EmptyNodeId { index } => write!(f, "node #{index} has an empty id"),
            Self::DuplicateNode(id) => write!(f, "node id {id:?} appears more than once"),
            Self::InvalidHealthStatus { node, code } => {
                write!(f, "node {node:?} has unknown health_status {code}")
            }
            Self::InvalidAmplification { node, value } => write!(
                f,
                "node {node:?} has amplification_score {value}, expected a finite value >= 0"
            ),
            Self::InvalidConfidence {
                source,
                target,
                value,
            } => write!(
                f,
                "edge {source:?} -> {target:?} has causal_confidence {value}, expected [0, 1]"
            ),
            Self::UnknownEndpoint {
                source,
                target,
                missing,
            } => write!(
                f,
                "edge {source:?} -> {target:?} references unknown node {missing:?}"
            ),
        }
    }
}

impl Error for ProtocolError {}
