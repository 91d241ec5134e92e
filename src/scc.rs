use std::collections::HashSet;

use log::{debug, info};

use crate::error::Result;
use crate::graph::Graph;
use crate::traversal::{dfs_from, dfs_postorder};

/// Kosaraju's two-pass SCC search.
///
/// The first pass runs DFS from every vertex in insertion order and records
/// the finishing sequence. The second pass pops that sequence and runs DFS
/// on the reversed graph; every such tree is one component. Components come
/// back in pop order, each as the induced subgraph of its members. On an
/// undirected graph this yields the connected components.
pub fn strongly_connected_components(graph: &Graph) -> Result<Vec<Graph>> {
    // Pass 1, finishing order on the original graph.
    let finished = dfs_postorder(graph, graph.vertices())?;

    // Pass 2, DFS on the reverse graph in reverse finishing order.
    let reverse_graph = graph.reverse();
    let mut visited = HashSet::new();
    let mut components = Vec::new();
    for root in finished.iter().rev() {
        if visited.contains(root) {
            continue;
        }
        let tree = dfs_from(*root, &mut visited, |v| reverse_graph.successors(v))?;
        debug!("Component rooted at {} with {} vertices", root, tree.pre_order.len());
        components.push(graph.induced_subgraph(&tree.pre_order)?);
    }

    info!("Found {} strongly connected components among {} vertices",
          components.len(), graph.num_vertices());
    Ok(components)
}
