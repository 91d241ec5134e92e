use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::betweenness::{edges_with_max_score, EdgeBetweenness};
use crate::community::Partition;
use crate::error::Result;
use crate::graph::Graph;
use crate::timeout::CancelToken;
use crate::traversal::connected_components;
use crate::types::Edge;

/// Whether the divisive loop still has edges to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisiveState {
    Active,
    Done,
}

/// One level of the dendrogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisiveStep {
    /// 1-based step index.
    pub step: usize,
    pub max_betweenness: f64,
    /// Every edge that shared the maximum score, in canonical order.
    pub removed: Vec<Edge>,
    /// Connected components after the removal.
    pub partition: Partition,
}

/// Girvan-Newman divisive community detection.
///
/// Every step recomputes edge-betweenness on the current graph and removes
/// *all* edges tied at the maximum score at once, then reports the connected
/// components. Removing ties together makes the dendrogram coarser than the
/// single-edge variant: symmetric structures split in one step.
#[derive(Debug, Clone, Default)]
pub struct GirvanNewman {
    betweenness: EdgeBetweenness,
    cancel: Option<CancelToken>,
}

impl GirvanNewman {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.betweenness = self.betweenness.with_parallel(parallel);
        self
    }

    /// Check `token` between steps and between per-source passes.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.betweenness = self.betweenness.with_cancel(token.clone());
        self.cancel = Some(token);
        self
    }

    pub fn state(graph: &Graph) -> DivisiveState {
        if graph.num_edges() > 0 {
            DivisiveState::Active
        } else {
            DivisiveState::Done
        }
    }

    /// Run one removal step; `None` once no edges remain.
    ///
    /// The graph is only mutated after the scores are complete, so a
    /// cancelled step removes nothing.
    pub fn step(&self, graph: &mut Graph, step: usize) -> Result<Option<DivisiveStep>> {
        if Self::state(graph) == DivisiveState::Done {
            return Ok(None);
        }
        if let Some(token) = &self.cancel {
            token.checkpoint()?;
        }

        // Step 1. Scores on the current graph.
        let scores = self.betweenness.compute(graph)?;
        // Step 2. Every edge at the maximum.
        let (max_betweenness, removed) = match edges_with_max_score(&scores) {
            Some(found) => found,
            None => return Ok(None),
        };
        // Step 3. Commit the removal.
        for edge in &removed {
            graph.remove_edge(*edge)?;
        }
        // Step 4. Components of what is left.
        let partition = Partition::from_groups(connected_components(graph)?);

        debug!("Step {}: removed {} edges at betweenness {}, {} communities",
               step, removed.len(), max_betweenness, partition.len());
        Ok(Some(DivisiveStep { step, max_betweenness, removed, partition }))
    }

    /// Remove edges until none are left, handing every step to `on_step`.
    pub fn run_with<F>(&self, graph: &mut Graph, mut on_step: F) -> Result<usize>
    where
        F: FnMut(&DivisiveStep),
    {
        let start = Instant::now();
        let mut step = 0usize;
        while let Some(result) = self.step(graph, step + 1)? {
            step += 1;
            on_step(&result);
        }
        info!("Girvan-Newman finished after {} steps in {:?}", step, start.elapsed());
        Ok(step)
    }

    /// Remove edges until none are left and collect every step.
    pub fn run(&self, graph: &mut Graph) -> Result<Vec<DivisiveStep>> {
        let mut steps = Vec::new();
        self.run_with(graph, |step| steps.push(step.clone()))?;
        Ok(steps)
    }
}
