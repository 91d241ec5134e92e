pub mod betweenness;
pub mod community;
pub mod config;
pub mod egonet;
pub mod error;
pub mod graph;
pub mod loader;
pub mod logger;
pub mod report;
pub mod scc;
pub mod timeout;
pub mod traversal;
pub mod types;

pub use betweenness::{BetweennessMap, EdgeBetweenness};
pub use community::girvan_newman::{DivisiveStep, GirvanNewman};
pub use community::greedy_modularity::{GreedyModularity, MergeTrace};
pub use community::Partition;
pub use config::AnalysisConfig;
pub use error::{GraphError, Result};
pub use graph::{Graph, Snapshot};
pub use timeout::{run_with_timeout, CancelToken, Timed};
pub use types::{Directedness, Edge, VInt};
