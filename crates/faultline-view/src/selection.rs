use faultline_layout::{PositionedEdge, PositionedGraph, PositionedNode};
use faultline_types::{EdgeId, GraphSnapshot};
use tracing::debug;

/// At most one node and one edge, selected independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_node: Option<String>,
    pub selected_edge: Option<EdgeId>,
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        self.selected_node.is_none() && self.selected_edge.is_none()
    }
}

/// Level-triggered report of what the surface currently considers selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionEvent {
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeId>,
}

impl SelectionEvent {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            nodes: vec![id.into()],
            edges: Vec::new(),
        }
    }

    pub fn edge(id: EdgeId) -> Self {
        Self {
            nodes: Vec::new(),
            edges: vec![id],
        }
    }
}

/// Selection resolved against the graph on screen, for the detail panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedSelection<'a> {
    pub node: Option<&'a PositionedNode>,
    pub edge: Option<&'a PositionedEdge>,
}

#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    state: SelectionState,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// First node and first edge of the event win; an empty set clears that
    /// half of the selection. Returns whether the selection changed.
    pub fn on_selection_change(&mut self, event: &SelectionEvent) -> bool {
        let next = SelectionState {
            selected_node: event.nodes.first().cloned(),
            selected_edge: event.edges.first().cloned(),
        };
        self.replace(next)
    }

    pub fn clear(&mut self) -> bool {
        self.replace(SelectionState::default())
    }

    /// Drops selected ids that `snapshot` no longer contains.
    pub fn revalidate(&mut self, snapshot: &GraphSnapshot) -> bool {
        let mut next = self.state.clone();
        if let Some(id) = &next.selected_node
            && !snapshot.contains_node(id)
        {
            debug!(node = %id, "selected node vanished");
            next.selected_node = None;
        }
        if let Some(id) = &next.selected_edge
            && !snapshot.contains_edge(id)
        {
            debug!(edge = %id, "selected edge vanished");
            next.selected_edge = None;
        }
        self.replace(next)
    }

    pub fn resolve<'a>(&self, graph: &'a PositionedGraph) -> ResolvedSelection<'a> {
        ResolvedSelection {
            node: self
                .state
                .selected_node
                .as_deref()
                .and_then(|id| graph.node(id)),
            edge: self
                .state
                .selected_edge
                .as_ref()
                .and_then(|id| graph.edge(id)),
        }
    }

    fn replace(&mut self, next: SelectionState) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }
}
