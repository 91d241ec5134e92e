use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::config::READ_BUFFER_SIZE;
use crate::graph::Graph;
use crate::types::{Directedness, VInt};

/// Split one edge list line into its two vertex ids.
///
/// `None` for blank lines and `#` / `%` comments.
fn parse_line(line: &str, line_no: usize) -> Result<Option<(VInt, VInt)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
        return Ok(None);
    }
    let tokens: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != 2 {
        bail!("Line {}: expected two vertex ids, found {:?}", line_no, line);
    }
    let from = tokens[0].parse::<VInt>()
        .with_context(|| format!("Line {}: invalid vertex id {:?}", line_no, tokens[0]))?;
    let to = tokens[1].parse::<VInt>()
        .with_context(|| format!("Line {}: invalid vertex id {:?}", line_no, tokens[1]))?;
    Ok(Some((from, to)))
}

/// Build a graph from an edge list, one `from to` pair per line.
///
/// Ids may be separated by whitespace and/or a comma. Every vertex is added
/// before the first edge that mentions it.
pub fn parse_edge_list<R: BufRead>(reader: R, directedness: Directedness) -> Result<Graph> {
    let mut graph = Graph::new(directedness);
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if let Some((from, to)) = parse_line(&line, line_no)? {
            graph.ensure_vertex(from);
            graph.ensure_vertex(to);
            graph.add_edge(from, to)
                .with_context(|| format!("Line {}: cannot add edge", line_no))?;
        }
    }
    Ok(graph)
}

/// Load an edge list file.
pub fn load_edge_list(path: impl AsRef<Path>, directedness: Directedness) -> Result<Graph> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open graph file {}", path.display()))?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let graph = parse_edge_list(reader, directedness)
        .with_context(|| format!("Failed to load graph file {}", path.display()))?;
    info!("Loaded {}: {} vertices, {} edges ({:?})",
          path.display(), graph.num_vertices(), graph.num_edges(), directedness);
    Ok(graph)
}
