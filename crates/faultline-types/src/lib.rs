//! Snapshot types shared by every faultline crate.
//!
//! A [`GraphSnapshot`] is the complete state of the service dependency graph
//! at one instant. Snapshots are only ever built through
//! [`GraphSnapshot::new`] (or [`decode_snapshot`]), so holding one means its
//! invariants were checked: node ids are unique and every edge endpoint names
//! a node of the same snapshot.

mod error;
mod snapshot;
mod time;
mod wire;

pub use error::ProtocolError;
pub use snapshot::{Edge, EdgeId, GraphSnapshot, HealthStatus, Node};
pub use time::now_ms;
pub use wire::{WireEdge, WireNode, WireSnapshot, decode_snapshot, encode_snapshot};
