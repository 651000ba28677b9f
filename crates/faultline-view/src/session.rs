//! The graph currently on screen and how new snapshots replace it.
//!
//! Fetches are tagged with a [`FetchTicket`]. Only the most recently issued
//! ticket may change what is displayed; anything older that completes later
//! is discarded, whether it succeeded or failed. While a fetch is in flight
//! the previous graph stays visible.

use faultline_layout::{LayoutError, LayoutSpacing, PositionedGraph, layout_with};
use faultline_types::GraphSnapshot;
use tracing::{debug, info, warn};

use crate::client::FetchHint;
use crate::error::{FetchError, RefreshError};
use crate::selection::{ResolvedSelection, SelectionCoordinator, SelectionEvent, SelectionState};
use crate::temporal::TemporalState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    hint: FetchHint,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    /// No fetch has completed yet.
    Connecting,
    Online,
    /// The latest completed refresh failed; the previous graph is retained.
    Offline(RefreshError),
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Online => "System Online",
            Self::Offline(_) => "Offline",
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued in the meantime.
    Stale,
    Failed,
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewModel<'a> {
    pub graph: &'a PositionedGraph,
    /// Timestamp of the snapshot on screen, if any.
    pub snapshot_timestamp: Option<i64>,
    pub temporal: TemporalState,
    pub selection: ResolvedSelection<'a>,
    pub status: &'a ConnectionStatus,
    pub refreshing: bool,
}

pub struct ViewSession {
    spacing: LayoutSpacing,
    snapshot: Option<GraphSnapshot>,
    graph: PositionedGraph,
    selection: SelectionCoordinator,
    status: ConnectionStatus,
    last_seq: u64,
    in_flight: Option<FetchTicket>,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new(LayoutSpacing::default())
    }
}

impl ViewSession {
    pub fn new(spacing: LayoutSpacing) -> Self {
        Self {
            spacing,
            snapshot: None,
            graph: PositionedGraph::empty(),
            selection: SelectionCoordinator::new(),
            status: ConnectionStatus::Connecting,
            last_seq: 0,
            in_flight: None,
        }
    }

    /// Issues a new ticket, superseding any fetch still in flight.
    pub fn begin_fetch(&mut self, hint: FetchHint) -> FetchTicket {
        self.last_seq += 1;
        let ticket = FetchTicket {
            seq: self.last_seq,
            hint,
        };
        if let Some(previous) = self.in_flight.replace(ticket) {
            debug!(superseded = previous.seq, seq = ticket.seq, "fetch superseded");
        }
        debug!(seq = ticket.seq, ?hint, "fetch issued");
        ticket
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<GraphSnapshot, FetchError>,
    ) -> FetchOutcome {
        if self.in_flight.map(|active| active.seq) != Some(ticket.seq) {
            debug!(
                seq = ticket.seq,
                hint = ?ticket.hint,
                latest = self.last_seq,
                "discarding stale response"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(snapshot) => match self.apply_snapshot(snapshot) {
                Ok(()) => FetchOutcome::Applied,
                Err(_) => FetchOutcome::Failed,
            },
            Err(error) => {
                warn!(seq = ticket.seq, hint = ?ticket.hint, %error, "fetch failed, keeping previous graph");
                self.status = ConnectionStatus::Offline(RefreshError::Fetch(error));
                FetchOutcome::Failed
            }
        }
    }

    /// Lays out `snapshot` and replaces the displayed graph wholesale.
    pub fn apply_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), LayoutError> {
        let graph = match layout_with(snapshot.nodes(), snapshot.edges(), &self.spacing) {
            Ok(graph) => graph,
            Err(error) => {
                warn!(%error, "layout failed, keeping previous graph");
                self.status = ConnectionStatus::Offline(RefreshError::Layout(error.clone()));
                return Err(error);
            }
        };
        self.selection.revalidate(&snapshot);
        info!(
            timestamp = snapshot.timestamp(),
            nodes = snapshot.nodes().len(),
            edges = snapshot.edges().len(),
            "snapshot applied"
        );
        self.graph = graph;
        self.snapshot = Some(snapshot);
        self.status = ConnectionStatus::Online;
        Ok(())
    }

    pub fn select(&mut self, event: &SelectionEvent) -> bool {
        let mut changed = self.selection.on_selection_change(event);
        if let Some(snapshot) = &self.snapshot {
            changed |= self.selection.revalidate(snapshot);
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selection.clear()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn snapshot(&self) -> Option<&GraphSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn graph(&self) -> &PositionedGraph {
        &self.graph
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn view(&self, temporal: TemporalState) -> ViewModel<'_> {
        ViewModel {
            graph: &self.graph,
            snapshot_timestamp: self.snapshot.as_ref().map(GraphSnapshot::timestamp),
            temporal,
            selection: self.selection.resolve(&self.graph),
            status: &self.status,
            refreshing: self.is_refreshing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_types::{Edge, EdgeId, Node, ProtocolError, decode_snapshot};

    fn snapshot(ts: i64, ids: &[&str], pairs: &[(&str, &str)]) -> GraphSnapshot {
        GraphSnapshot::new(
            ts,
            ids.iter().map(|id| Node::healthy(*id)).collect(),
            pairs.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
        )
        .expect("valid snapshot")
    }

    #[test]
    fn starts_connecting_with_empty_graph() {
        let session = ViewSession::default();
        assert_eq!(session.status(), &ConnectionStatus::Connecting);
        assert!(session.graph().nodes.is_empty());
        assert!(session.snapshot().is_none());
        assert!(!session.is_refreshing());
    }

    #[test]
    fn applied_fetch_replaces_graph_and_goes_online() {
        let mut session = ViewSession::default();
        let ticket = session.begin_fetch(FetchHint::Exact(10));
        assert!(session.is_refreshing());

        let outcome = session.complete_fetch(ticket, Ok(snapshot(10, &["a", "b"], &[("a", "b")])));
        assert_eq!(outcome, FetchOutcome::Applied);
        assert!(session.status().is_online());
        assert!(!session.is_refreshing());
        assert_eq!(session.graph().nodes.len(), 2);
        assert_eq!(session.snapshot().map(GraphSnapshot::timestamp), Some(10));
    }

    #[test]
    fn older_response_arriving_late_is_discarded() {
        let mut session = ViewSession::default();
        let first = session.begin_fetch(FetchHint::Exact(6_000));
        let second = session.begin_fetch(FetchHint::Exact(11_000));

        assert_eq!(
            session.complete_fetch(second, Ok(snapshot(11_000, &["b"], &[]))),
            FetchOutcome::Applied
        );
        assert_eq!(
            session.complete_fetch(first, Ok(snapshot(6_000, &["a"], &[]))),
            FetchOutcome::Stale
        );
        assert_eq!(session.snapshot().map(GraphSnapshot::timestamp), Some(11_000));
        assert!(session.graph().node("b").is_some());
    }

    #[test]
    fn superseded_response_is_discarded_even_if_first_to_arrive() {
        let mut session = ViewSession::default();
        let first = session.begin_fetch(FetchHint::Exact(1));
        let second = session.begin_fetch(FetchHint::Exact(2));

        assert_eq!(
            session.complete_fetch(first, Err(FetchError::Network("boom".into()))),
            FetchOutcome::Stale
        );
        assert_eq!(session.status(), &ConnectionStatus::Connecting);
        assert!(session.is_refreshing());
        assert_eq!(session.in_flight().map(|t| t.seq()), Some(second.seq()));
    }

    #[test]
    fn failure_keeps_previous_graph_until_next_success() {
        let mut session = ViewSession::default();
        let ticket = session.begin_fetch(FetchHint::Live { advisory_ms: 0 });
        session.complete_fetch(ticket, Ok(snapshot(1, &["a", "b"], &[("a", "b")])));
        let before = session.graph().clone();

        let ticket = session.begin_fetch(FetchHint::Live { advisory_ms: 0 });
        let dangling = decode_snapshot(
            r#"{"timestamp": 2, "nodes": [{"id": "a"}], "edges": [{"source": "a", "target": "z"}]}"#,
        )
        .map_err(FetchError::from);
        assert!(matches!(dangling, Err(FetchError::Protocol(ProtocolError::UnknownEndpoint { .. }))));
        assert_eq!(session.complete_fetch(ticket, dangling), FetchOutcome::Failed);

        assert_eq!(session.graph(), &before);
        assert_eq!(session.snapshot().map(GraphSnapshot::timestamp), Some(1));
        assert_eq!(session.status().label(), "Offline");

        let ticket = session.begin_fetch(FetchHint::Live { advisory_ms: 0 });
        session.complete_fetch(ticket, Ok(snapshot(3, &["a"], &[])));
        assert!(session.status().is_online());
    }

    #[test]
    fn selection_is_cleared_when_its_id_disappears() {
        let mut session = ViewSession::default();
        session
            .apply_snapshot(snapshot(1, &["a", "b"], &[("a", "b")]))
            .expect("layout");
        session.select(&SelectionEvent {
            nodes: vec!["b".to_string()],
            edges: vec![EdgeId::new("a", "b")],
        });

        session.apply_snapshot(snapshot(2, &["a"], &[])).expect("layout");
        assert!(session.selection().is_empty());
    }

    #[test]
    fn selecting_unknown_id_resolves_to_nothing() {
        let mut session = ViewSession::default();
        session.apply_snapshot(snapshot(1, &["a"], &[])).expect("layout");
        session.select(&SelectionEvent::node("ghost"));
        assert!(session.selection().is_empty());

        let state = TemporalState {
            mode: crate::temporal::Mode::Paused,
            cursor: 1,
            window_start: 0,
            window_end: 1,
        };
        let view = session.view(state);
        assert!(view.selection.node.is_none());
        assert_eq!(view.snapshot_timestamp, Some(1));
    }
}
