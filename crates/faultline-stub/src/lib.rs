//! A stand-in for the graph backend.
//!
//! Serves `GET /api/graph?timestamp=<ms>` from a simulated service topology
//! whose health follows a fixed cycle, so the same timestamp always yields
//! the same graph. Faults can be queued through [`StubState::inject`] to
//! exercise client error handling.

mod http;
mod state;
pub mod topology;

pub use http::{router, serve, spawn_ephemeral};
pub use state::{Fault, StubState};
