use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// A way to answer one request wrongly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `500 Internal Server Error` with a plain-text body.
    ServerError,
    /// `200` with a body that is not JSON.
    MalformedBody,
    /// `200` with a well-formed body whose last edge names an unknown node.
    DanglingEdge,
}

/// Shared between handlers and whoever drives the stub (tests, the binary).
#[derive(Clone, Default)]
pub struct StubState {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    faults: VecDeque<Fault>,
    requested: Vec<i64>,
}

impl StubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `fault` for the next graph request that has no fault queued
    /// before it. Each fault is used once.
    pub fn inject(&self, fault: Fault) {
        self.inner.lock().faults.push_back(fault);
    }

    /// Timestamps of every graph request so far, after defaulting.
    pub fn requested(&self) -> Vec<i64> {
        self.inner.lock().requested.clone()
    }

    pub(crate) fn record(&self, ts: i64) -> Option<Fault> {
        let mut inner = self.inner.lock();
        inner.requested.push(ts);
        inner.faults.pop_front()
    }
}
