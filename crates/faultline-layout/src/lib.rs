//! Layered left-to-right layout for service dependency graphs.
//!
//! [`layout`] is a pure function of its input: the same nodes and edges in the
//! same order always produce the same positions. It is not stable under edits,
//! though. Adding or removing one node may reflow the whole diagram.
//!
//! Pipeline:
//!   1. Split the graph into weakly connected components.
//!   2. Classify cycle-closing edges as back edges (DFS in input order).
//!   3. Rank nodes by longest path from sources over the remaining DAG.
//!   4. Order each rank with median sweeps to reduce crossings.
//!   5. Place ranks along x and slots along y with a fixed node footprint,
//!      stacking components vertically.
//!   6. Derive straight edge routes from node handles; self-loops get a
//!      node-local loop.

use std::error::Error;
use std::fmt;

use facet::Facet;
use faultline_types::{Edge, EdgeId, Node};

mod graph;
mod order;

use graph::LayoutGraph;
use order::Neighbors;

/// Spacing parameters in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSpacing {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between consecutive ranks.
    pub rank_gap: f64,
    /// Vertical gap between nodes sharing a rank.
    pub node_gap: f64,
    /// Vertical gap between stacked components.
    pub component_gap: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            node_height: 80.0,
            rank_gap: 100.0,
            node_gap: 40.0,
            component_gap: 80.0,
        }
    }
}

#[derive(Facet, Debug, Clone, Copy, PartialEq)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle; `(x, y)` is the top-left corner.
#[derive(Facet, Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> LayoutPoint {
        LayoutPoint {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// True when the interiors intersect; touching edges do not count.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(Facet, Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub node: Node,
    /// Layer along the flow axis; 0 for sources.
    pub rank: usize,
    /// Slot within the rank, top to bottom.
    pub order: usize,
    /// Index of the connected component this node belongs to.
    pub component: usize,
    pub rect: LayoutRect,
}

impl PositionedNode {
    /// Where outgoing edges leave the node (middle of the right side).
    pub fn source_handle(&self) -> LayoutPoint {
        LayoutPoint {
            x: self.rect.right(),
            y: self.rect.center().y,
        }
    }

    /// Where incoming edges enter the node (middle of the left side).
    pub fn target_handle(&self) -> LayoutPoint {
        LayoutPoint {
            x: self.rect.x,
            y: self.rect.center().y,
        }
    }
}

#[derive(Facet, Debug, Clone, PartialEq)]
#[repr(u8)]
#[facet(rename_all = "snake_case")]
pub enum EdgeRoute {
    Straight { from: LayoutPoint, to: LayoutPoint },
    SelfLoop { points: Vec<LayoutPoint> },
}

#[derive(Facet, Debug, Clone, PartialEq)]
pub struct PositionedEdge {
    pub edge: Edge,
    pub route: EdgeRoute,
    /// The edge closes a cycle and runs against the flow direction.
    pub back_edge: bool,
}

#[derive(Facet, Debug, Clone, PartialEq)]
pub struct PositionedGraph {
    /// One entry per input node, in input order.
    pub nodes: Vec<PositionedNode>,
    /// One entry per input edge, in input order.
    pub edges: Vec<PositionedEdge>,
    /// Union of all node rects.
    pub bounds: LayoutRect,
    /// Crossings between adjacent ranks in the chosen ordering.
    pub crossings: usize,
}

impl PositionedGraph {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            bounds: LayoutRect::ZERO,
            crossings: 0,
        }
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|positioned| positioned.node.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&PositionedEdge> {
        self.edges.iter().find(|positioned| id.matches(&positioned.edge))
    }

    pub fn component_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|positioned| positioned.component + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Input the layout engine refuses. Checked snapshots never produce these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    DuplicateNode(String),
    UnknownEndpoint {
        source: String,
        target: String,
        missing: String,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode(id) => write!(f, "layout input repeats node id {id:?}"),
            Self::UnknownEndpoint {
                source,
                target,
                missing,
            } => write!(
                f,
                "layout input edge {source:?} -> {target:?} references unknown node {missing:?}"
            ),
        }
    }
}

impl Error for LayoutError {}

/// Lays out with [`LayoutSpacing::default`].
pub fn layout(nodes: &[Node], edges: &[Edge]) -> Result<PositionedGraph, LayoutError> {
    layout_with(nodes, edges, &LayoutSpacing::default())
}

pub fn layout_with(
    nodes: &[Node],
    edges: &[Edge],
    spacing: &LayoutSpacing,
) -> Result<PositionedGraph, LayoutError> {
    let graph = LayoutGraph::build(nodes, edges)?;
    if graph.n == 0 {
        return Ok(PositionedGraph::empty());
    }

    let back = graph.back_edges();
    let ranks = graph.ranks(&back);
    let neighbors = Neighbors::build(&graph, &ranks);

    let pitch_x = spacing.node_width + spacing.rank_gap;
    let pitch_y = spacing.node_height + spacing.node_gap;

    let mut pos = vec![0usize; graph.n];
    let mut component_of = vec![0usize; graph.n];
    let mut rects = vec![LayoutRect::ZERO; graph.n];
    let mut crossings = 0;
    let mut top = 0.0;

    for (component, members) in graph.components().into_iter().enumerate() {
        let depth = members.iter().map(|&v| ranks[v]).max().unwrap_or(0) + 1;
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for &v in &members {
            buckets[ranks[v]].push(v);
            component_of[v] = component;
        }

        crossings += order::reduce_crossings(&mut buckets, &ranks, &neighbors, &mut pos);

        let widest = buckets.iter().map(Vec::len).max().unwrap_or(1);
        for (rank, bucket) in buckets.iter().enumerate() {
            // Shorter ranks are centered against the widest one.
            let offset = (widest - bucket.len()) as f64 * pitch_y / 2.0;
            for (slot, &v) in bucket.iter().enumerate() {
                rects[v] = LayoutRect {
                    x: rank as f64 * pitch_x,
                    y: top + offset + slot as f64 * pitch_y,
                    width: spacing.node_width,
                    height: spacing.node_height,
                };
            }
        }
        top += widest as f64 * pitch_y - spacing.node_gap + spacing.component_gap;
    }

    let positioned_nodes: Vec<PositionedNode> = nodes
        .iter()
        .enumerate()
        .map(|(v, node)| PositionedNode {
            node: node.clone(),
            rank: ranks[v],
            order: pos[v],
            component: component_of[v],
            rect: rects[v],
        })
        .collect();

    let positioned_edges = edges
        .iter()
        .enumerate()
        .map(|(edge_idx, edge)| {
            let (src, dst) = graph.endpoints[edge_idx];
            let route = if src == dst {
                self_loop_route(&rects[src])
            } else {
                EdgeRoute::Straight {
                    from: positioned_nodes[src].source_handle(),
                    to: positioned_nodes[dst].target_handle(),
                }
            };
            PositionedEdge {
                edge: edge.clone(),
                route,
                back_edge: back[edge_idx],
            }
        })
        .collect();

    let bounds = rects
        .iter()
        .skip(1)
        .fold(rects[0], |acc, rect| acc.union(rect));

    Ok(PositionedGraph {
        nodes: positioned_nodes,
        edges: positioned_edges,
        bounds,
        crossings,
    })
}

/// Loop leaving the right side and re-entering from the top.
fn self_loop_route(rect: &LayoutRect) -> EdgeRoute {
    let reach = rect.height * 0.3;
    let start = LayoutPoint {
        x: rect.right(),
        y: rect.y + rect.height * 0.25,
    };
    let center_x = rect.center().x;
    EdgeRoute::SelfLoop {
        points: vec![
            start,
            LayoutPoint {
                x: rect.right() + reach,
                y: start.y,
            },
            LayoutPoint {
                x: rect.right() + reach,
                y: rect.y - reach,
            },
            LayoutPoint {
                x: center_x,
                y: rect.y - reach,
            },
            LayoutPoint {
                x: center_x,
                y: rect.y,
            },
        ],
    }
}
