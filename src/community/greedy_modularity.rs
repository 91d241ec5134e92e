use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;

use crate::community::{CommID, Partition};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::timeout::CancelToken;
use crate::traversal::{undirected_adjacency, undirected_neighbors, UndirectedAdjacency};
use crate::types::VInt;

/// One agglomerative merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeStep {
    /// 1-based step index; the partition holds `V - step` communities.
    pub step: usize,
    /// Leaders of the two merged communities, lesser first.
    pub merged: (CommID, CommID),
    pub delta_q: f64,
    /// Running sum of the selected `delta_q` values.
    pub modularity: f64,
    pub partition: Partition,
}

/// A partition reported because the next best merge lowers modularity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalOptimum {
    /// The step whose merge was non-improving.
    pub step: usize,
    pub modularity: f64,
    pub partition: Partition,
}

/// Every partition the greedy loop went through.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeTrace {
    pub initial: Partition,
    pub steps: Vec<MergeStep>,
    pub local_optima: Vec<LocalOptimum>,
}

impl MergeTrace {
    /// The reported local optimum with the highest modularity; the earliest wins ties.
    pub fn best(&self) -> Option<&LocalOptimum> {
        let mut best: Option<&LocalOptimum> = None;
        for optimum in &self.local_optima {
            match best {
                Some(current) if optimum.modularity <= current.modularity => {}
                _ => best = Some(optimum),
            }
        }
        best
    }

    /// Partition after `step` merges; `0` is the all-singleton start.
    pub fn partition_at(&self, step: usize) -> Option<&Partition> {
        if step == 0 {
            Some(&self.initial)
        } else {
            self.steps.get(step - 1).map(|s| &s.partition)
        }
    }
}

/// Degrees and undirected adjacency looked up once per run.
struct ModularityContext {
    adjacency: UndirectedAdjacency,
    two_m: f64,
}

impl ModularityContext {
    /// `two_m` is the sum of undirected degrees, so reciprocal arcs of a
    /// directed graph count as one connection.
    fn new(graph: &Graph) -> ModularityContext {
        let adjacency = undirected_adjacency(graph);
        let two_m = adjacency.values().map(|neighbors| neighbors.len()).sum::<usize>() as f64;
        ModularityContext { adjacency, two_m }
    }

    fn degree(&self, vertex_id: VInt) -> Result<f64> {
        Ok(undirected_neighbors(&self.adjacency, vertex_id)?.len() as f64)
    }

    /// `2 * (e_IJ - a_I * a_J)`, zero when the graph has no edges.
    fn delta_q(&self, comm_i: &BTreeSet<VInt>, comm_j: &BTreeSet<VInt>) -> Result<f64> {
        if self.two_m == 0.0 {
            for v in comm_i.iter().chain(comm_j.iter()) {
                undirected_neighbors(&self.adjacency, *v)?;
            }
            return Ok(0.0);
        }

        // e_IJ, each linked pair {i, j} counted once.
        let mut linked: HashSet<(VInt, VInt)> = HashSet::new();
        for i in comm_i {
            for j in undirected_neighbors(&self.adjacency, *i)? {
                if comm_j.contains(j) {
                    linked.insert(if i <= j { (*i, *j) } else { (*j, *i) });
                }
            }
        }
        let e_ij = linked.len() as f64 / self.two_m;

        // a_I and a_J, total degree over 2m.
        let mut a_i = 0.0;
        for i in comm_i {
            a_i += self.degree(*i)?;
        }
        a_i /= self.two_m;
        let mut a_j = 0.0;
        for j in comm_j {
            a_j += self.degree(*j)?;
        }
        a_j /= self.two_m;

        Ok(2.0 * (e_ij - a_i * a_j))
    }
}

/// Modularity change from joining two arbitrary member lists.
pub fn delta_q(graph: &Graph, comm_i: &[VInt], comm_j: &[VInt]) -> Result<f64> {
    let context = ModularityContext::new(graph);
    let comm_i: BTreeSet<VInt> = comm_i.iter().copied().collect();
    let comm_j: BTreeSet<VInt> = comm_j.iter().copied().collect();
    context.delta_q(&comm_i, &comm_j)
}

/// Newman modularity `Q = sum_c (L_c / m - (d_c / 2m)^2)` of a partition.
pub fn partition_modularity(graph: &Graph, partition: &Partition) -> Result<f64> {
    let context = ModularityContext::new(graph);
    if context.two_m == 0.0 {
        return Ok(0.0);
    }
    let mut q = 0.0;
    for members in partition.communities().values() {
        let mut internal = 0usize;
        let mut degree_sum = 0.0;
        for v in members {
            let neighbors = undirected_neighbors(&context.adjacency, *v)?;
            degree_sum += neighbors.len() as f64;
            internal += neighbors.iter().filter(|w| members.contains(*w)).count();
        }
        // Every internal edge was seen from both ends.
        let internal_edges = internal as f64 / 2.0;
        q += internal_edges / (context.two_m / 2.0) - (degree_sum / context.two_m).powi(2);
    }
    Ok(q)
}

/// Greedy agglomerative modularity optimisation.
///
/// Starting from singletons, each step evaluates every pair of current
/// communities in ascending leader order and merges the pair with the
/// strictly largest `delta_q`; the first pair seen wins ties. The run always
/// goes down to a single community. Whenever the selected merge has a
/// negative `delta_q`, the partition before it is recorded as a local
/// optimum and the loop carries on.
#[derive(Debug, Clone, Default)]
pub struct GreedyModularity {
    cancel: Option<CancelToken>,
}

impl GreedyModularity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `token` between merge steps.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn run(&self, graph: &Graph) -> Result<MergeTrace> {
        let start = Instant::now();
        let context = ModularityContext::new(graph);
        let initial = Partition::singletons(graph.vertices());
        let mut trace = MergeTrace {
            initial: initial.clone(),
            ..Default::default()
        };

        // When all vertices are apart, modularity counts as zero.
        let mut modularity = 0.0f64;
        let mut current = initial;
        let num_steps = graph.num_vertices().saturating_sub(1);

        for step in 1..=num_steps {
            if let Some(token) = &self.cancel {
                token.checkpoint()?;
            }

            // Best pair over all leader pairs, first seen wins ties.
            let mut best: Option<(CommID, CommID, f64)> = None;
            let leaders = current.leaders();
            for (first, second) in leaders.iter().tuple_combinations() {
                let (comm_i, comm_j) = match (current.members(*first), current.members(*second)) {
                    (Some(i), Some(j)) => (i, j),
                    _ => return Err(GraphError::UnknownVertex(*first)),
                };
                let gain = context.delta_q(comm_i, comm_j)?;
                match best {
                    Some((_, _, best_gain)) if gain <= best_gain => {}
                    _ => best = Some((*first, *second, gain)),
                }
            }
            let (first, second, gain) = match best {
                Some(found) => found,
                None => break,
            };

            let previous = current.clone();
            current.merge(first, second)?;
            modularity += gain;

            if gain < 0.0 {
                let reported = modularity - gain;
                info!("Local modularity maximum {:.6} with {} communities before step {}",
                      reported, previous.len(), step);
                trace.local_optima.push(LocalOptimum {
                    step,
                    modularity: reported,
                    partition: previous,
                });
            }
            debug!("Step {}: merged {} and {} with dQ {:.6}, Q {:.6}",
                   step, first, second, gain, modularity);

            trace.steps.push(MergeStep {
                step,
                merged: (first, second),
                delta_q: gain,
                modularity,
                partition: current.clone(),
            });
        }

        info!("Greedy modularity finished {} merges in {:?}", trace.steps.len(), start.elapsed());
        Ok(trace)
    }
}

#[cfg(test)]
mod test_greedy_modularity {
    use crate::community::greedy_modularity::{delta_q, partition_modularity, GreedyModularity};
    use crate::community::Partition;
    use crate::error::GraphError;
    use crate::graph::Graph;
    use crate::timeout::CancelToken;
    use crate::types::Directedness;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_two_disjoint_edges() {
        let g = Graph::from_edges(Directedness::Undirected, vec![(0, 1), (2, 3)]);
        let trace = GreedyModularity::new().run(&g).unwrap();
        assert_eq!(trace.steps.len(), 3);

        // Both within-pair merges come first.
        assert_eq!(trace.steps[0].merged, (0, 1));
        assert!((trace.steps[0].delta_q - 0.375).abs() < EPS);
        assert_eq!(trace.steps[1].merged, (2, 3));
        assert!((trace.steps[1].delta_q - 0.375).abs() < EPS);

        // Any cross-pair merge at step 1 gains less.
        let cross = delta_q(&g, &[0], &[2]).unwrap();
        assert!((cross + 0.125).abs() < EPS);
        assert!(cross <= trace.steps[0].delta_q);

        // The final merge lowers modularity, so the two pairs are reported.
        assert_eq!(trace.local_optima.len(), 1);
        let optimum = &trace.local_optima[0];
        assert_eq!(optimum.step, 3);
        assert!((optimum.modularity - 0.75).abs() < EPS);
        assert_eq!(optimum.partition, Partition::from_groups(vec![vec![0, 1], vec![2, 3]]));
        // The loop carried on past the report.
        assert_eq!(trace.steps[2].partition.len(), 1);
        assert!((trace.steps[2].modularity - 0.25).abs() < EPS);
    }

    #[test]
    fn test_two_triangles() {
        let g = Graph::from_edges(Directedness::Undirected, vec![
            (0, 1), (1, 2), (2, 0),
            (3, 4), (4, 5), (5, 3),
            (2, 3),
        ]);
        let trace = GreedyModularity::new().run(&g).unwrap();
        assert_eq!(trace.steps.len(), 5);
        assert_eq!(trace.steps[0].merged, (0, 1));

        let best = trace.best().unwrap();
        assert_eq!(best.step, 5);
        assert_eq!(best.partition, Partition::from_groups(vec![vec![0, 1, 2], vec![3, 4, 5]]));

        // The running sum is the gain over the singleton partition.
        let q_best = partition_modularity(&g, &best.partition).unwrap();
        let q_start = partition_modularity(&g, &trace.initial).unwrap();
        assert!((best.modularity - (q_best - q_start)).abs() < 1e-9);

        for (i, step) in trace.steps.iter().enumerate() {
            assert!(step.partition.covers(g.vertices()));
            assert_eq!(step.partition.len(), g.num_vertices() - i - 1);
        }
        assert_eq!(trace.partition_at(0), Some(&trace.initial));
    }

    #[test]
    fn test_delta_q_overlap_and_unknown() {
        let g = Graph::from_edges(Directedness::Undirected, vec![(0, 1), (1, 2)]);
        // Shared members do not count a pair twice.
        let overlapping = delta_q(&g, &[0, 1], &[1, 0]).unwrap();
        let expected = 2.0 * (1.0 / 4.0 - (3.0 / 4.0) * (3.0 / 4.0));
        assert!((overlapping - expected).abs() < EPS);

        assert_eq!(delta_q(&g, &[0], &[8]).unwrap_err(), GraphError::UnknownVertex(8));
    }

    #[test]
    fn test_edgeless_and_tiny_graphs() {
        let mut g = Graph::undirected();
        for v in 0..3 {
            g.add_vertex(v).unwrap();
        }
        let trace = GreedyModularity::new().run(&g).unwrap();
        assert_eq!(trace.steps.len(), 2);
        assert!(trace.local_optima.is_empty());
        assert_eq!(trace.steps[0].merged, (0, 1));
        assert_eq!(trace.steps[0].delta_q, 0.0);

        let single = Graph::from_edges(Directedness::Undirected, vec![(5, 5)]);
        assert!(GreedyModularity::new().run(&single).unwrap().steps.is_empty());
        assert!(GreedyModularity::new().run(&Graph::undirected()).unwrap().best().is_none());
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let g = Graph::from_edges(Directedness::Undirected, vec![(0, 1), (2, 3)]);
        let result = GreedyModularity::new().with_cancel(token).run(&g);
        assert_eq!(result.unwrap_err(), GraphError::Cancelled);
    }

    #[test]
    fn test_directed_input_counts_connections_once() {
        let directed = Graph::from_edges(Directedness::Directed, vec![(0, 1), (1, 0)]);
        let undirected = Graph::from_edges(Directedness::Undirected, vec![(0, 1)]);
        let whole = Partition::from_groups(vec![vec![0, 1]]);
        assert_eq!(partition_modularity(&directed, &whole).unwrap(), 0.0);
        assert_eq!(delta_q(&directed, &[0], &[1]).unwrap(), 0.5);
        assert_eq!(GreedyModularity::new().run(&directed).unwrap(),
                   GreedyModularity::new().run(&undirected).unwrap());

        // Two one-way triangles joined by a reciprocal bridge.
        let directed = Graph::from_edges(Directedness::Directed, vec![
            (0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3), (3, 2),
        ]);
        let undirected = Graph::from_edges(Directedness::Undirected, vec![
            (0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3),
        ]);
        let whole = Partition::from_groups(vec![vec![0, 1, 2, 3, 4, 5]]);
        assert!(partition_modularity(&directed, &whole).unwrap().abs() < 1e-12);
        let trace = GreedyModularity::new().run(&directed).unwrap();
        assert_eq!(trace, GreedyModularity::new().run(&undirected).unwrap());
        assert_eq!(trace.best().unwrap().partition,
                   Partition::from_groups(vec![vec![0, 1, 2], vec![3, 4, 5]]));
    }
}
