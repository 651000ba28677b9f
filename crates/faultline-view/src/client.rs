//! Fetching snapshots from the graph backend.

use std::time::Duration;

use async_trait::async_trait;
use faultline_types::{GraphSnapshot, decode_snapshot};
use tracing::debug;

use crate::error::FetchError;

/// Which instant a fetch asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchHint {
    /// Whatever the server considers "now". `advisory_ms` is the client's
    /// notion of now and is only a suggestion.
    Live { advisory_ms: i64 },
    /// The snapshot at exactly this instant (or the closest sample).
    Exact(i64),
}

impl FetchHint {
    /// The value sent as the `timestamp` query parameter.
    pub fn timestamp(self) -> i64 {
        match self {
            Self::Live { advisory_ms } => advisory_ms,
            Self::Exact(ts) => ts,
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

/// Anything that can produce graph snapshots. No retries happen at this layer.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, hint: FetchHint) -> Result<GraphSnapshot, FetchError>;
}

/// `GET {base_url}/api/graph?timestamp=<ms>` over blocking ureq, moved off
/// the event loop with `spawn_blocking` when used as a [`SnapshotSource`].
#[derive(Clone)]
pub struct HttpSnapshotClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSnapshotClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn graph_url(&self, hint: FetchHint) -> String {
        format!(
            "{}/api/graph?timestamp={}",
            self.base_url.trim_end_matches('/'),
            hint.timestamp()
        )
    }

    /// The undecoded response body.
    pub fn fetch_raw_blocking(&self, hint: FetchHint) -> Result<String, FetchError> {
        let url = self.graph_url(hint);
        debug!(%url, ?hint, "fetching graph snapshot");
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(FetchError::Network(format!("GET {url}: HTTP {code}")));
            }
            Err(ureq::Error::Transport(error)) => {
                return Err(FetchError::Network(format!("GET {url}: {error}")));
            }
        };
        response
            .into_string()
            .map_err(|e| FetchError::Network(format!("read GET response body: {e}")))
    }

    pub fn fetch_blocking(&self, hint: FetchHint) -> Result<GraphSnapshot, FetchError> {
        let body = self.fetch_raw_blocking(hint)?;
        let snapshot = decode_snapshot(&body)?;
        if let FetchHint::Exact(requested) = hint
            && snapshot.timestamp() != requested
        {
            debug!(
                requested,
                served = snapshot.timestamp(),
                "backend snapped historical request to nearby sample"
            );
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotClient {
    async fn fetch(&self, hint: FetchHint) -> Result<GraphSnapshot, FetchError> {
        let client = self.clone();
        match tokio::task::spawn_blocking(move || client.fetch_blocking(hint)).await {
            Ok(result) => result,
            Err(error) => Err(FetchError::Network(format!(
                "fetch worker join error: {error}"
            ))),
        }
    }
}
