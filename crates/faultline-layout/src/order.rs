//! Crossing reduction within ranks (median heuristic).

use crate::graph::LayoutGraph;

/// Alternating down/up sweeps attempted before settling on the best ordering.
const MAX_SWEEPS: usize = 8;

/// Neighbors of each node in lower and higher ranks, over all non-loop edges.
pub(crate) struct Neighbors {
    upper: Vec<Vec<usize>>,
    lower: Vec<Vec<usize>>,
}

impl Neighbors {
    pub(crate) fn build(graph: &LayoutGraph, ranks: &[usize]) -> Self {
        let mut upper = vec![Vec::new(); graph.n];
        let mut lower = vec![Vec::new(); graph.n];
        for &(src, dst) in &graph.endpoints {
            let (top, bottom) = match ranks[src].cmp(&ranks[dst]) {
                std::cmp::Ordering::Less => (src, dst),
                std::cmp::Ordering::Greater => (dst, src),
                std::cmp::Ordering::Equal => continue,
            };
            lower[top].push(bottom);
            upper[bottom].push(top);
        }
        Self { upper, lower }
    }
}

/// Reorders `buckets` (one component, indexed by rank) in place and returns
/// the crossing count of the ordering kept.
///
/// `pos` maps a node index to its slot within its rank and is kept in sync.
pub(crate) fn reduce_crossings(
    buckets: &mut [Vec<usize>],
    ranks: &[usize],
    neighbors: &Neighbors,
    pos: &mut [usize],
) -> usize {
    sync_positions(buckets, pos);
    let mut best = buckets.to_vec();
    let mut best_crossings = count_crossings(buckets, ranks, neighbors, pos);

    for _ in 0..MAX_SWEEPS {
        if best_crossings == 0 {
            break;
        }
        for r in 1..buckets.len() {
            reorder_rank(buckets, r, ranks, &neighbors.upper, pos);
        }
        for r in (0..buckets.len().saturating_sub(1)).rev() {
            reorder_rank(buckets, r, ranks, &neighbors.lower, pos);
        }
        let crossings = count_crossings(buckets, ranks, neighbors, pos);
        if crossings < best_crossings {
            best = buckets.to_vec();
            best_crossings = crossings;
        }
    }

    for (bucket, kept) in buckets.iter_mut().zip(best) {
        *bucket = kept;
    }
    sync_positions(buckets, pos);
    best_crossings
}

fn sync_positions(buckets: &[Vec<usize>], pos: &mut [usize]) {
    for bucket in buckets {
        for (slot, &v) in bucket.iter().enumerate() {
            pos[v] = slot;
        }
    }
}

/// Slot position scaled into (0, 1) so ranks of different sizes compare.
fn normalized(slot: usize, len: usize) -> f64 {
    (slot as f64 + 0.5) / len as f64
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn reorder_rank(
    buckets: &mut [Vec<usize>],
    r: usize,
    ranks: &[usize],
    adjacent: &[Vec<usize>],
    pos: &mut [usize],
) {
    let len = buckets[r].len();
    let mut keyed: Vec<(f64, usize, usize)> = buckets[r]
        .iter()
        .map(|&v| {
            let mut values: Vec<f64> = adjacent[v]
                .iter()
                .map(|&w| normalized(pos[w], buckets[ranks[w]].len()))
                .collect();
            // Nodes without neighbors on that side hold their place.
            let key = median(&mut values).unwrap_or_else(|| normalized(pos[v], len));
            (key, pos[v], v)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    buckets[r] = keyed.into_iter().map(|(_, _, v)| v).collect();
    for (slot, &v) in buckets[r].iter().enumerate() {
        pos[v] = slot;
    }
}

/// Crossings between edges joining adjacent ranks.
pub(crate) fn count_crossings(
    buckets: &[Vec<usize>],
    ranks: &[usize],
    neighbors: &Neighbors,
    pos: &[usize],
) -> usize {
    let mut total = 0;
    for r in 0..buckets.len().saturating_sub(1) {
        let segments: Vec<(usize, usize)> = buckets[r]
            .iter()
            .flat_map(|&v| {
                neighbors.lower[v]
                    .iter()
                    .filter(move |&&w| ranks[w] == r + 1)
                    .map(move |&w| (pos[v], pos[w]))
            })
            .collect();
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}
