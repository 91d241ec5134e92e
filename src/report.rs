use std::io::Write;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;

use crate::betweenness::{top_edges, BetweennessMap};
use crate::community::girvan_newman::DivisiveStep;
use crate::community::greedy_modularity::MergeTrace;
use crate::community::Partition;
use crate::graph::{Graph, Snapshot};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_partition<W: Write>(out: &mut W, partition: &Partition) -> Result<()> {
    for members in partition.communities().values() {
        writeln!(out, "  {}", members.iter().join(" "))?;
    }
    Ok(())
}

/// One line per vertex: `v: n1 n2 ...`.
pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, snapshot),
        OutputFormat::Text => {
            for (vertex, neighbors) in snapshot {
                if neighbors.is_empty() {
                    writeln!(out, "{}:", vertex)?;
                } else {
                    writeln!(out, "{}: {}", vertex, neighbors.iter().join(" "))?;
                }
            }
            Ok(())
        }
    }
}

pub fn write_components<W: Write>(out: &mut W, components: &[Graph], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value: Vec<_> = components
                .iter()
                .map(|c| json!({
                    "vertices": c.vertices(),
                    "edges": c.edges().map(|e| [e.from, e.to]).collect::<Vec<_>>(),
                }))
                .collect();
            write_json(out, &value)
        }
        OutputFormat::Text => {
            for (index, component) in components.iter().enumerate() {
                writeln!(out, "Component {} ({} vertices, {} edges): {}",
                         index + 1, component.num_vertices(), component.num_edges(),
                         component.vertices().iter().sorted().join(" "))?;
            }
            Ok(())
        }
    }
}

/// Scores from highest to lowest, cut to `top` entries when given.
pub fn write_betweenness<W: Write>(
    out: &mut W,
    scores: &BetweennessMap,
    top: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let ranked = top_edges(scores, top.unwrap_or(scores.len()));
    match format {
        OutputFormat::Json => {
            let value: Vec<_> = ranked
                .iter()
                .map(|(edge, score)| json!({ "edge": [edge.from, edge.to], "betweenness": score }))
                .collect();
            write_json(out, &value)
        }
        OutputFormat::Text => {
            for (edge, score) in ranked {
                writeln!(out, "{}\t{}", edge, score)?;
            }
            Ok(())
        }
    }
}

/// Text form prints the communities left after each removal.
pub fn write_divisive_steps<W: Write>(out: &mut W, steps: &[DivisiveStep], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, steps),
        OutputFormat::Text => {
            for step in steps {
                writeln!(out, "Step {}: removed {} at betweenness {}, {} communities",
                         step.step, step.removed.iter().join(" "), step.max_betweenness,
                         step.partition.len())?;
                write_partition(out, &step.partition)?;
            }
            Ok(())
        }
    }
}

/// Text form prints every local optimum followed by the best one.
pub fn write_merge_trace<W: Write>(out: &mut W, trace: &MergeTrace, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, trace),
        OutputFormat::Text => {
            for optimum in &trace.local_optima {
                writeln!(out, "Local optimum before step {}: modularity {:.6}, {} communities",
                         optimum.step, optimum.modularity, optimum.partition.len())?;
                write_partition(out, &optimum.partition)?;
            }
            if let Some(last) = trace.steps.last() {
                writeln!(out, "Finished after {} merges, modularity {:.6}", last.step, last.modularity)?;
            }
            if let Some(best) = trace.best() {
                writeln!(out, "Best: modularity {:.6} before step {}", best.modularity, best.step)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod test_report {
    use crate::betweenness::EdgeBetweenness;
    use crate::community::girvan_newman::GirvanNewman;
    use crate::community::greedy_modularity::GreedyModularity;
    use crate::graph::Graph;
    use crate::report::*;
    use crate::scc::strongly_connected_components;
    use crate::types::Directedness;

    fn render<F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_snapshot_text_and_json() {
        let mut g = Graph::from_edges(Directedness::Undirected, vec![(0, 1), (1, 2)]);
        g.add_vertex(9).unwrap();
        let snapshot = g.export_snapshot();

        let text = render(|out| write_snapshot(out, &snapshot, OutputFormat::Text));
        assert_eq!(text, "0: 1\n1: 0 2\n2: 1\n9:\n");

        let value: serde_json::Value =
            serde_json::from_str(&render(|out| write_snapshot(out, &snapshot, OutputFormat::Json))).unwrap();
        assert_eq!(value["1"], serde_json::json!([0, 2]));
        assert_eq!(value["9"], serde_json::json!([]));
    }

    #[test]
    fn test_components_text() {
        let g = Graph::from_edges(Directedness::Directed, vec![(1, 2), (2, 1), (2, 3)]);
        let components = strongly_connected_components(&g).unwrap();
        let text = render(|out| write_components(out, &components, OutputFormat::Text));
        assert!(text.contains("(2 vertices, 2 edges): 1 2"));
        assert!(text.contains("(1 vertices, 0 edges): 3"));
    }

    #[test]
    fn test_betweenness_top() {
        let g = Graph::from_edges(Directedness::Undirected, vec![(0, 1), (1, 2), (2, 3)]);
        let scores = EdgeBetweenness::new().compute(&g).unwrap();
        let text = render(|out| write_betweenness(out, &scores, Some(1), OutputFormat::Text));
        assert_eq!(text, "(1, 2)\t8\n");

        let json = render(|out| write_betweenness(out, &scores, None, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[0]["edge"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_community_reports() {
        let edges = vec![(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)];

        let mut g = Graph::from_edges(Directedness::Undirected, edges.clone());
        let steps = GirvanNewman::new().run(&mut g).unwrap();
        let text = render(|out| write_divisive_steps(out, &steps, OutputFormat::Text));
        assert!(text.starts_with("Step 1: removed (2, 3) at betweenness 18, 2 communities\n  0 1 2\n  3 4 5\n"));

        let g = Graph::from_edges(Directedness::Undirected, edges);
        let trace = GreedyModularity::new().run(&g).unwrap();
        let text = render(|out| write_merge_trace(out, &trace, OutputFormat::Text));
        assert!(text.contains("Finished after 5 merges"));
        assert!(text.contains("Best: modularity"));

        let json = render(|out| write_merge_trace(out, &trace, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"].as_array().unwrap().len(), 5);
    }
}
