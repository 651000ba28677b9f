//! Index-based view of a node/edge list: components, back edges and ranks.

use std::collections::{HashMap, VecDeque};

use faultline_types::{Edge, Node};

use crate::LayoutError;

/// Adjacency over node indices. Self-loops are recorded but never enter the
/// adjacency lists, so they cannot influence components, ranks or ordering.
pub(crate) struct LayoutGraph {
    pub(crate) n: usize,
    /// `(source, target)` per input edge, in input order.
    pub(crate) endpoints: Vec<(usize, usize)>,
    /// Outgoing input-edge indices per node, in input order.
    out_edges: Vec<Vec<usize>>,
}

impl LayoutGraph {
    pub(crate) fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self, LayoutError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(LayoutError::DuplicateNode(node.id.clone()));
            }
        }

        let mut endpoints = Vec::with_capacity(edges.len());
        let mut out_edges = vec![Vec::new(); nodes.len()];
        for (edge_idx, edge) in edges.iter().enumerate() {
            let resolve = |id: &str| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| LayoutError::UnknownEndpoint {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: id.to_string(),
                    })
            };
            let src = resolve(&edge.source)?;
            let dst = resolve(&edge.target)?;
            endpoints.push((src, dst));
            if src != dst {
                out_edges[src].push(edge_idx);
            }
        }

        Ok(Self {
            n: nodes.len(),
            endpoints,
            out_edges,
        })
    }

    pub(crate) fn is_self_loop(&self, edge_idx: usize) -> bool {
        let (src, dst) = self.endpoints[edge_idx];
        src == dst
    }

    /// Weakly connected components, each listing its nodes in input order.
    /// Components are ordered by their first node.
    pub(crate) fn components(&self) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..self.n).collect();

        fn find(parent: &mut [usize], mut v: usize) -> usize {
            while parent[v] != v {
                parent[v] = parent[parent[v]];
                v = parent[v];
            }
            v
        }

        for &(src, dst) in &self.endpoints {
            let a = find(&mut parent, src);
            let b = find(&mut parent, dst);
            if a != b {
                // Lower index becomes the root so component order follows input order.
                let (root, child) = if a < b { (a, b) } else { (b, a) };
                parent[child] = root;
            }
        }

        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Vec<usize>> = Vec::new();
        for v in 0..self.n {
            let root = find(&mut parent, v);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(v);
        }
        components
    }

    /// Marks edges that close a cycle during a depth-first walk in input order.
    ///
    /// Removing the marked edges leaves a DAG, which is what rank assignment
    /// runs on.
    pub(crate) fn back_edges(&self) -> Vec<bool> {
        const UNVISITED: u8 = 0;
        const ON_STACK: u8 = 1;
        const DONE: u8 = 2;

        let mut back = vec![false; self.endpoints.len()];
        let mut state = vec![UNVISITED; self.n];
        // (node, position in its out_edges list)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.n {
            if state[root] != UNVISITED {
                continue;
            }
            state[root] = ON_STACK;
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let u = top.0;
                if top.1 == self.out_edges[u].len() {
                    state[u] = DONE;
                    stack.pop();
                    continue;
                }
                let edge_idx = self.out_edges[u][top.1];
                top.1 += 1;
                let v = self.endpoints[edge_idx].1;
                match state[v] {
                    UNVISITED => {
                        state[v] = ON_STACK;
                        stack.push((v, 0));
                    }
                    ON_STACK => back[edge_idx] = true,
                    _ => {}
                }
            }
        }
        back
    }

    /// Longest-path layering over the forward edges.
    ///
    /// Sources get rank 0; every other node gets 1 + the maximum rank of its
    /// forward predecessors.
    pub(crate) fn ranks(&self, back: &[bool]) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.n];
        for (edge_idx, &(_, dst)) in self.endpoints.iter().enumerate() {
            if self.is_forward(edge_idx, back) {
                in_degree[dst] += 1;
            }
        }

        let mut ranks = vec![0usize; self.n];
        let mut queue: VecDeque<usize> = (0..self.n).filter(|&v| in_degree[v] == 0).collect();
        while let Some(u) = queue.pop_front() {
            for &edge_idx in &self.out_edges[u] {
                if back[edge_idx] {
                    continue;
                }
                let v = self.endpoints[edge_idx].1;
                ranks[v] = ranks[v].max(ranks[u] + 1);
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }
        ranks
    }

    fn is_forward(&self, edge_idx: usize, back: &[bool]) -> bool {
        !back[edge_idx] && !self.is_self_loop(edge_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(ids: &[&str], pairs: &[(&str, &str)]) -> LayoutGraph {
        let nodes: Vec<Node> = ids.iter().map(|id| Node::healthy(*id)).collect();
        let edges: Vec<Edge> = pairs.iter().map(|(s, t)| Edge::new(*s, *t)).collect();
        LayoutGraph::build(&nodes, &edges).expect("well-formed graph")
    }

    #[test]
    fn cycle_closing_edge_is_back_edge() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(g.back_edges(), vec![false, false, true]);
        assert_eq!(g.ranks(&g.back_edges()), vec![0, 1, 2]);
    }

    #[test]
    fn longest_path_wins_over_shortcut() {
        let g = graph(&["a", "b", "c"], &[("a", "c"), ("a", "b"), ("b", "c")]);
        let back = g.back_edges();
        assert!(back.iter().all(|b| !b));
        assert_eq!(g.ranks(&back), vec![0, 1, 2]);
    }

    #[test]
    fn self_loop_is_not_a_back_edge_and_not_a_link() {
        let g = graph(&["a", "b"], &[("a", "a")]);
        assert_eq!(g.back_edges(), vec![false]);
        assert_eq!(g.components(), vec![vec![0], vec![1]]);
        assert_eq!(g.ranks(&g.back_edges()), vec![0, 0]);
    }

    #[test]
    fn components_follow_input_order() {
        let g = graph(&["x", "a", "y", "b"], &[("b", "a"), ("y", "x")]);
        assert_eq!(g.components(), vec![vec![0, 2], vec![1, 3]]);
    }
}
