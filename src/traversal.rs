use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::types::VInt;

/// Adjacency where every edge is walkable from both endpoints.
pub type UndirectedAdjacency = BTreeMap<VInt, Vec<VInt>>;

/// Vertices found by one DFS tree, in discovery and finishing order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DfsTree {
    pub pre_order: Vec<VInt>,
    pub post_order: Vec<VInt>,
}

/// Iterative DFS from `root`, skipping everything already in `visited`.
///
/// Frames keep their own neighbor iterator, so the visiting order is the
/// one a recursive DFS over `adjacent` would produce.
pub fn dfs_from<F, I>(root: VInt, visited: &mut HashSet<VInt>, mut adjacent: F) -> Result<DfsTree>
where
    F: FnMut(VInt) -> Result<I>,
    I: Iterator<Item = VInt>,
{
    let mut tree = DfsTree::default();
    if !visited.insert(root) {
        return Ok(tree);
    }
    tree.pre_order.push(root);
    let mut stack: Vec<(VInt, I)> = vec![(root, adjacent(root)?)];

    loop {
        let next = match stack.last_mut() {
            None => break,
            Some((_, neighbors)) => neighbors.next(),
        };
        match next {
            Some(neighbor) => {
                if visited.insert(neighbor) {
                    tree.pre_order.push(neighbor);
                    let neighbors = adjacent(neighbor)?;
                    stack.push((neighbor, neighbors));
                }
            }
            None => {
                // All neighbors are done, the vertex finishes.
                if let Some((vertex, _)) = stack.pop() {
                    tree.post_order.push(vertex);
                }
            }
        }
    }
    Ok(tree)
}

/// Hop distance from `source` to every vertex it reaches.
pub fn bfs_distances(graph: &Graph, source: VInt) -> Result<HashMap<VInt, usize>> {
    let mut distances = HashMap::new();
    let mut queue = VecDeque::new();

    graph.adjacency(source)?;
    distances.insert(source, 0usize);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let current_distance = distances[&current];
        for neighbor in graph.successors(current)? {
            if !distances.contains_key(&neighbor) {
                distances.insert(neighbor, current_distance + 1);
                queue.push_back(neighbor);
            }
        }
    }
    Ok(distances)
}

/// Vertices reachable from `source` along edge directions, in DFS pre-order.
pub fn reachable_from(graph: &Graph, source: VInt) -> Result<Vec<VInt>> {
    let mut visited = HashSet::new();
    let tree = dfs_from(source, &mut visited, |v| graph.successors(v))?;
    Ok(tree.pre_order)
}

/// DFS forest over `roots` (in the given order); returns the finishing sequence.
pub fn dfs_postorder(graph: &Graph, roots: &[VInt]) -> Result<Vec<VInt>> {
    let mut visited = HashSet::new();
    let mut finished = Vec::with_capacity(graph.num_vertices());
    for root in roots {
        if visited.contains(root) {
            continue;
        }
        let tree = dfs_from(*root, &mut visited, |v| graph.successors(v))?;
        finished.extend(tree.post_order);
    }
    Ok(finished)
}

/// Successors followed by predecessors of every vertex, without duplicates.
///
/// Equals the plain adjacency for undirected graphs.
pub fn undirected_adjacency(graph: &Graph) -> UndirectedAdjacency {
    let mut adjacency: UndirectedAdjacency = graph.vertices()
        .iter()
        .map(|v| (*v, Vec::new()))
        .collect();
    let mut seen: HashSet<(VInt, VInt)> = HashSet::new();
    let mut link = |adjacency: &mut UndirectedAdjacency, u: VInt, w: VInt| {
        if seen.insert((u, w)) {
            adjacency.entry(u).or_default().push(w);
        }
    };

    for vertex_id in graph.vertices() {
        for neighbor in graph.successors(*vertex_id).into_iter().flatten() {
            link(&mut adjacency, *vertex_id, neighbor);
        }
    }
    if graph.directedness().is_directed() {
        // Walk every edge backwards as well.
        for vertex_id in graph.vertices() {
            for neighbor in graph.successors(*vertex_id).into_iter().flatten() {
                link(&mut adjacency, neighbor, *vertex_id);
            }
        }
    }
    adjacency
}

/// Neighbors of one vertex ignoring edge direction.
pub fn undirected_neighbors(adjacency: &UndirectedAdjacency, vertex_id: VInt) -> Result<&[VInt]> {
    adjacency.get(&vertex_id)
        .map(|list| list.as_slice())
        .ok_or(GraphError::UnknownVertex(vertex_id))
}

/// Weakly connected components, each in DFS pre-order, rooted in vertex insertion order.
pub fn connected_components(graph: &Graph) -> Result<Vec<Vec<VInt>>> {
    let adjacency = undirected_adjacency(graph);
    let mut visited = HashSet::new();
    let mut components = Vec::new();

    for vertex_id in graph.vertices() {
        if visited.contains(vertex_id) {
            continue;
        }
        let tree = dfs_from(*vertex_id, &mut visited, |v| {
            Ok(undirected_neighbors(&adjacency, v)?.iter().copied())
        })?;
        components.push(tree.pre_order);
    }
    Ok(components)
}
