use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::error::{GraphError, Result};
use crate::types::{Directedness, Edge, VInt};

/// Neighbor sets of every vertex, the hand-off format for printers and tests.
pub type Snapshot = BTreeMap<VInt, BTreeSet<VInt>>;

/// Mutable vertex/edge container.
///
/// Undirected edges are kept once in `edge_set` and appear in the adjacency
/// list of both endpoints (once for a self-loop). Directed edges appear only
/// in the list of their tail. Adjacency lists never hold duplicates.
#[derive(Debug, Clone)]
pub struct Graph {
    directedness: Directedness,
    order: Vec<VInt>, // Vertices in insertion order.
    adj_map: BTreeMap<VInt, Vec<Edge>>, // Incident edges, in insertion order.
    edge_set: BTreeSet<Edge>, // Canonical edges.
}

impl Graph {
    pub fn new(directedness: Directedness) -> Graph {
        // Create a new empty graph.
        Graph {
            directedness,
            order: Vec::new(),
            adj_map: BTreeMap::new(),
            edge_set: BTreeSet::new(),
        }
    }

    pub fn undirected() -> Graph {
        Graph::new(Directedness::Undirected)
    }

    pub fn directed() -> Graph {
        Graph::new(Directedness::Directed)
    }

    /// Build a graph from an edge iterator, registering endpoints in first-seen order.
    pub fn from_edges<I>(directedness: Directedness, edges: I) -> Graph
    where
        I: IntoIterator<Item = (VInt, VInt)>,
    {
        let mut graph = Graph::new(directedness);
        for (from, to) in edges {
            graph.ensure_vertex(from);
            graph.ensure_vertex(to);
            // Both endpoints exist now.
            let _ = graph.add_edge(from, to);
        }
        graph
    }

    pub fn directedness(&self) -> Directedness {
        self.directedness
    }

    pub fn num_vertices(&self) -> usize {
        self.order.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_set.len()
    }

    pub fn contains_vertex(&self, vertex_id: VInt) -> bool {
        self.adj_map.contains_key(&vertex_id)
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> &[VInt] {
        &self.order
    }

    /// Stored edges in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_set.iter()
    }

    pub fn add_vertex(&mut self, vertex_id: VInt) -> Result<()> {
        if self.adj_map.contains_key(&vertex_id) {
            return Err(GraphError::DuplicateVertex(vertex_id));
        }
        self.adj_map.insert(vertex_id, Vec::new());
        self.order.push(vertex_id);
        Ok(())
    }

    /// Add the vertex unless it is already present. Returns whether it was new.
    pub fn ensure_vertex(&mut self, vertex_id: VInt) -> bool {
        self.add_vertex(vertex_id).is_ok()
    }

    /// Insert an edge. Returns `false` when the edge was already stored.
    pub fn add_edge(&mut self, from: VInt, to: VInt) -> Result<bool> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;

        let edge = Edge::new(from, to).canonical(self.directedness);
        if !self.edge_set.insert(edge) {
            return Ok(false);
        }

        // The tail always records the edge.
        self.adj_list_mut(from).push(edge);
        // The head records it too when the graph is undirected.
        if !self.directedness.is_directed() && from != to {
            self.adj_list_mut(to).push(edge);
        }
        Ok(true)
    }

    /// Remove a stored edge from the edge set and the adjacency of its endpoints.
    pub fn remove_edge(&mut self, edge: Edge) -> Result<()> {
        let key = edge.canonical(self.directedness);
        if !self.edge_set.remove(&key) {
            return Err(GraphError::InvalidEdgeRemoval(edge));
        }
        self.adj_list_mut(key.from).retain(|e| *e != key);
        if !self.directedness.is_directed() {
            self.adj_list_mut(key.to).retain(|e| *e != key);
        }
        trace!("Removed edge {}, {} edges left", key, self.edge_set.len());
        Ok(())
    }

    /// Whether `(i, j)` is stored; either orientation counts when undirected.
    pub fn is_edge(&self, i: VInt, j: VInt) -> bool {
        self.edge_set.contains(&Edge::new(i, j).canonical(self.directedness))
    }

    /// Incident edges of a vertex in insertion order.
    pub fn adjacency(&self, vertex_id: VInt) -> Result<&[Edge]> {
        self.adj_map
            .get(&vertex_id)
            .map(|list| list.as_slice())
            .ok_or(GraphError::UnknownVertex(vertex_id))
    }

    /// The other endpoint of every incident edge, in adjacency order.
    ///
    /// For directed graphs these are the successors.
    pub fn successors(&self, vertex_id: VInt) -> Result<impl Iterator<Item = VInt> + '_> {
        let directed = self.directedness.is_directed();
        let list = self.adjacency(vertex_id)?;
        Ok(list.iter().map(move |e| {
            if directed {
                e.to
            } else {
                e.other(vertex_id).unwrap_or(vertex_id)
            }
        }))
    }

    pub fn neighbors(&self, vertex_id: VInt) -> Result<BTreeSet<VInt>> {
        Ok(self.successors(vertex_id)?.collect())
    }

    pub fn degree(&self, vertex_id: VInt) -> Result<usize> {
        Ok(self.adjacency(vertex_id)?.len())
    }

    /// Neighbor set of every vertex.
    pub fn export_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for vertex_id in &self.order {
            let neighbors = self.successors(*vertex_id)
                .map(|it| it.collect())
                .unwrap_or_default();
            snapshot.insert(*vertex_id, neighbors);
        }
        snapshot
    }

    /// A copy with every edge flipped. Undirected graphs are copied as they are.
    pub fn reverse(&self) -> Graph {
        let mut reversed = Graph::new(self.directedness);
        for vertex_id in &self.order {
            reversed.ensure_vertex(*vertex_id);
        }
        for vertex_id in &self.order {
            for edge in &self.adj_map[vertex_id] {
                if self.directedness.is_directed() {
                    let _ = reversed.add_edge(edge.to, edge.from);
                } else {
                    let _ = reversed.add_edge(edge.from, edge.to);
                }
            }
        }
        reversed
    }

    /// The subgraph on `vertices`, keeping every edge with both endpoints inside.
    pub fn induced_subgraph(&self, vertices: &[VInt]) -> Result<Graph> {
        let mut sub_graph = Graph::new(self.directedness);
        for vertex_id in vertices {
            self.check_vertex(*vertex_id)?;
            sub_graph.ensure_vertex(*vertex_id);
        }
        for vertex_id in vertices {
            for edge in &self.adj_map[vertex_id] {
                if sub_graph.contains_vertex(edge.from) && sub_graph.contains_vertex(edge.to) {
                    sub_graph.add_edge(edge.from, edge.to)?;
                }
            }
        }
        Ok(sub_graph)
    }

    fn check_vertex(&self, vertex_id: VInt) -> Result<()> {
        if self.adj_map.contains_key(&vertex_id) {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(vertex_id))
        }
    }

    fn adj_list_mut(&mut self, vertex_id: VInt) -> &mut Vec<Edge> {
        // Callers validated the vertex before mutating.
        self.adj_map.entry(vertex_id).or_default()
    }
}

#[cfg(test)]
mod test_graph {
    use std::collections::BTreeSet;

    use crate::error::GraphError;
    use crate::graph::Graph;
    use crate::types::{Directedness, Edge};

    #[test]
    fn test_add_vertex_and_edge() {
        let mut g = Graph::undirected();
        g.add_vertex(1).unwrap();
        g.add_vertex(2).unwrap();
        g.add_vertex(3).unwrap();
        assert_eq!(g.add_vertex(2), Err(GraphError::DuplicateVertex(2)));

        assert!(g.add_edge(1, 2).unwrap());
        assert!(g.add_edge(3, 2).unwrap());
        // The same unordered pair is stored once.
        assert!(!g.add_edge(2, 1).unwrap());
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.degree(2).unwrap(), 2);

        assert_eq!(g.add_edge(1, 7), Err(GraphError::UnknownVertex(7)));
        assert_eq!(g.neighbors(9), Err(GraphError::UnknownVertex(9)));
    }

    #[test]
    fn test_is_edge_directedness() {
        let undirected = Graph::from_edges(Directedness::Undirected, vec![(1, 2)]);
        assert!(undirected.is_edge(1, 2));
        assert!(undirected.is_edge(2, 1));

        let directed = Graph::from_edges(Directedness::Directed, vec![(1, 2)]);
        assert!(directed.is_edge(1, 2));
        assert!(!directed.is_edge(2, 1));
        assert_eq!(directed.neighbors(1).unwrap(), BTreeSet::from([2]));
        assert!(directed.neighbors(2).unwrap().is_empty());
    }

    #[test]
    fn test_remove_edge() {
        let mut g = Graph::from_edges(Directedness::Undirected, vec![(1, 2), (2, 3), (3, 1)]);
        g.remove_edge(Edge::new(3, 2)).unwrap();
        assert_eq!(g.num_edges(), 2);
        assert!(!g.is_edge(2, 3));
        assert_eq!(g.neighbors(2).unwrap(), BTreeSet::from([1]));
        assert_eq!(g.neighbors(3).unwrap(), BTreeSet::from([1]));

        assert_eq!(g.remove_edge(Edge::new(2, 3)),
                   Err(GraphError::InvalidEdgeRemoval(Edge::new(2, 3))));
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn test_snapshot_symmetry() {
        let g = Graph::from_edges(Directedness::Undirected,
                                  vec![(0, 1), (1, 2), (2, 0), (2, 3), (4, 4)]);
        let snapshot = g.export_snapshot();
        assert_eq!(snapshot.len(), g.num_vertices());
        for (v, neighbors) in &snapshot {
            for w in neighbors {
                assert!(snapshot[w].contains(v));
            }
        }
        // Nothing mutated in between, so the snapshots agree.
        assert_eq!(snapshot, g.export_snapshot());
        // Self-loops are stored once.
        assert_eq!(snapshot[&4], BTreeSet::from([4]));
        assert_eq!(g.degree(4).unwrap(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let edge_list = vec![(5, 6), (6, 7), (5, 7), (8, 5)];
        let g = Graph::from_edges(Directedness::Undirected, edge_list.clone());
        let snapshot = g.export_snapshot();

        let mut exported = BTreeSet::new();
        for (v, neighbors) in &snapshot {
            for w in neighbors {
                exported.insert(if v <= w { (*v, *w) } else { (*w, *v) });
            }
        }
        let expected: BTreeSet<_> = edge_list.into_iter()
            .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
            .collect();
        assert_eq!(exported, expected);
        assert_eq!(g.vertices(), &[5, 6, 7, 8]);
    }

    #[test]
    fn test_reverse() {
        let g = Graph::from_edges(Directedness::Directed, vec![(1, 2), (2, 3)]);
        let r = g.reverse();
        assert!(r.is_edge(2, 1));
        assert!(r.is_edge(3, 2));
        assert!(!r.is_edge(1, 2));
        assert_eq!(r.num_edges(), 2);
        assert_eq!(r.vertices(), g.vertices());
    }

    #[test]
    fn test_induced_subgraph() {
        let g = Graph::from_edges(Directedness::Undirected, vec![(1, 2), (2, 3), (3, 4), (1, 3)]);
        let sub = g.induced_subgraph(&[1, 2, 3]).unwrap();
        assert_eq!(sub.num_vertices(), 3);
        assert_eq!(sub.num_edges(), 3);
        assert!(!sub.contains_vertex(4));
        assert_eq!(g.induced_subgraph(&[1, 9]).unwrap_err(), GraphError::UnknownVertex(9));
    }
}
