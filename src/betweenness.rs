use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;

use log::{debug, trace};
use rayon::prelude::*;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::timeout::CancelToken;
use crate::types::{Edge, VInt};

/// Unnormalised edge-betweenness, one entry per current edge.
pub type BetweennessMap = BTreeMap<Edge, f64>;

/// Graph relabelled to dense indices, neighbors paired with their edge key.
struct IndexedGraph {
    ids: Vec<VInt>,
    adj: Vec<Vec<(usize, Edge)>>,
}

impl IndexedGraph {
    fn build(graph: &Graph) -> Result<IndexedGraph> {
        let ids: Vec<VInt> = graph.vertices().to_vec();
        let index: HashMap<VInt, usize> = ids.iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect();

        let directed = graph.directedness().is_directed();
        let mut adj = Vec::with_capacity(ids.len());
        for vertex_id in &ids {
            let mut list = Vec::new();
            for edge in graph.adjacency(*vertex_id)? {
                let neighbor = if directed {
                    edge.to
                } else {
                    edge.other(*vertex_id).unwrap_or(*vertex_id)
                };
                let neighbor_index = *index.get(&neighbor)
                    .ok_or(GraphError::UnknownVertex(neighbor))?;
                list.push((neighbor_index, *edge));
            }
            adj.push(list);
        }
        Ok(IndexedGraph { ids, adj })
    }

    /// One BFS from `source` plus the dependency cascade.
    ///
    /// Returns `(edge, value)` contributions in the order they were produced,
    /// deepest vertices first.
    fn single_source(&self, source: usize) -> Vec<(Edge, f64)> {
        let n = self.ids.len();
        let mut depth: Vec<i64> = vec![-1; n];
        let mut shortest_path_count: Vec<f64> = vec![0.0; n];
        let mut predecessors: Vec<Vec<(usize, Edge)>> = vec![Vec::new(); n];
        // Vertices in BFS order; popping yields decreasing depth.
        let mut vertex_stack: Vec<usize> = Vec::with_capacity(n);

        shortest_path_count[source] = 1.0;
        depth[source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            vertex_stack.push(v);
            for &(w, edge) in &self.adj[v] {
                if depth[w] < 0 {
                    queue.push_back(w);
                    depth[w] = depth[v] + 1;
                }
                if depth[w] == depth[v] + 1 {
                    shortest_path_count[w] += shortest_path_count[v];
                    predecessors[w].push((v, edge));
                }
            }
        }

        let mut delta: Vec<f64> = vec![0.0; n];
        let mut contributions = Vec::new();
        while let Some(w) = vertex_stack.pop() {
            for &(pred, edge) in &predecessors[w] {
                let value = shortest_path_count[pred]
                    * (delta[w] / shortest_path_count[w] + 1.0);
                delta[pred] += value;
                contributions.push((edge, value));
            }
        }
        contributions
    }
}

/// Brandes-style edge-betweenness over every source vertex.
///
/// After each BFS the vertices are unwound deepest first and every
/// predecessor edge `(w, pred)` receives
/// `count[pred] * (delta[w] / count[w] + 1)`, which is also added to
/// `delta[pred]`. With unique shortest paths this is exactly the number of
/// source/target pairs routed over the edge; a bridge between halves of
/// sizes `a` and `b` scores `2ab` in an undirected graph.
///
/// Scores are recomputed from scratch on every call.
#[derive(Debug, Clone, Default)]
pub struct EdgeBetweenness {
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl EdgeBetweenness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the per-source passes on the rayon pool.
    ///
    /// Contributions are still summed in source order, so the result is
    /// bit-identical to a sequential run.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check `token` before every per-source pass.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn checkpoint(&self) -> Result<()> {
        match &self.cancel {
            Some(token) => token.checkpoint(),
            None => Ok(()),
        }
    }

    pub fn compute(&self, graph: &Graph) -> Result<BetweennessMap> {
        let start = Instant::now();
        let indexed = IndexedGraph::build(graph)?;

        // Reset every current edge to zero.
        let mut scores: BetweennessMap = graph.edges().map(|e| (*e, 0.0)).collect();

        if self.parallel {
            let per_source: Vec<Vec<(Edge, f64)>> = (0..indexed.ids.len())
                .into_par_iter()
                .map(|source| {
                    self.checkpoint()?;
                    Ok(indexed.single_source(source))
                })
                .collect::<Result<Vec<_>>>()?;
            for contributions in per_source {
                accumulate(&mut scores, contributions);
            }
        } else {
            for source in 0..indexed.ids.len() {
                self.checkpoint()?;
                let contributions = indexed.single_source(source);
                trace!("Source {} contributed {} updates", indexed.ids[source], contributions.len());
                accumulate(&mut scores, contributions);
            }
        }

        debug!("Edge betweenness over {} vertices and {} edges took {:?}",
               graph.num_vertices(), graph.num_edges(), start.elapsed());
        Ok(scores)
    }
}

fn accumulate(scores: &mut BetweennessMap, contributions: Vec<(Edge, f64)>) {
    for (edge, value) in contributions {
        *scores.entry(edge).or_insert(0.0) += value;
    }
}

/// The highest score and every edge that reaches it exactly.
///
/// `None` for an empty map.
pub fn edges_with_max_score(scores: &BetweennessMap) -> Option<(f64, Vec<Edge>)> {
    let max_score = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if scores.is_empty() {
        return None;
    }
    let edges = scores.iter()
        .filter(|(_, score)| **score == max_score)
        .map(|(edge, _)| *edge)
        .collect();
    Some((max_score, edges))
}

/// The `k` highest scoring edges, ties kept in edge order.
pub fn top_edges(scores: &BetweennessMap, k: usize) -> Vec<(Edge, f64)> {
    let mut ranked: Vec<(Edge, f64)> = scores.iter().map(|(e, s)| (*e, *s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}
