use std::collections::BTreeSet;

use log::debug;

use crate::error::Result;
use crate::graph::Graph;
use crate::types::VInt;

/// The induced subgraph on `center` and its direct neighbors.
///
/// For directed graphs the neighbors are the successors of `center`, and
/// only neighbor-to-neighbor edges that exist in the source are copied. A
/// self-loop on `center` is not part of the result.
pub fn egonet(graph: &Graph, center: VInt) -> Result<Graph> {
    let mut ego_graph = Graph::new(graph.directedness());
    ego_graph.add_vertex(center)?;

    // Step 1. The center, every neighbor and the spokes.
    let mut neighbors = BTreeSet::new();
    for neighbor in graph.successors(center)? {
        if neighbor == center {
            continue;
        }
        neighbors.insert(neighbor);
        ego_graph.ensure_vertex(neighbor);
        ego_graph.add_edge(center, neighbor)?;
    }

    // Step 2. Edges among the neighbors; spokes were added above.
    for neighbor in ego_graph.vertices().to_vec() {
        if neighbor == center {
            continue;
        }
        for other in graph.successors(neighbor)? {
            if neighbors.contains(&other) {
                ego_graph.add_edge(neighbor, other)?;
            }
        }
    }

    debug!("Egonet of {}: {} vertices, {} edges",
           center, ego_graph.num_vertices(), ego_graph.num_edges());
    Ok(ego_graph)
}

/// Fraction of neighbor pairs that are linked, in `[0, 1]`.
///
/// Spokes and self-loops are not links. Zero for fewer than two neighbors.
pub fn egonet_density(ego_graph: &Graph, center: VInt) -> f64 {
    let k = ego_graph.num_vertices().saturating_sub(1);
    if k < 2 {
        return 0.0;
    }
    let links = ego_graph.edges()
        .filter(|edge| !edge.is_self_loop() && !edge.is_tail_or_head(center))
        .count() as f64;
    let possible = if ego_graph.directedness().is_directed() {
        (k * (k - 1)) as f64
    } else {
        (k * (k - 1) / 2) as f64
    };
    links / possible
}
