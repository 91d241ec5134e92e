use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use social_graph::betweenness::{BetweennessMap, EdgeBetweenness};
use social_graph::community::girvan_newman::{DivisiveStep, GirvanNewman};
use social_graph::community::greedy_modularity::{GreedyModularity, MergeTrace};
use social_graph::config::{AnalysisConfig, DEFAULT_LOG_DIR};
use social_graph::egonet::{egonet, egonet_density};
use social_graph::graph::{Graph, Snapshot};
use social_graph::loader::load_edge_list;
use social_graph::logger::init_logger;
use social_graph::report::{self, OutputFormat};
use social_graph::scc::strongly_connected_components;
use social_graph::timeout::{run_with_timeout, CancelToken, Timed};
use social_graph::types::VInt;

#[derive(Parser)]
#[command(name = "social_graph")]
#[command(about = "Social network analysis over edge list files")]
struct Cli {
    /// Edge list file, one `from to` pair per line
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Read the edge list as a directed graph
    #[arg(long, global = true)]
    directed: bool,

    /// YAML analysis config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Cancel the analysis after this many seconds
    #[arg(long, global = true)]
    timeout_sec: Option<u64>,

    /// Compute betweenness sources on the rayon pool
    #[arg(long, global = true)]
    parallel: bool,

    /// Write logs to this directory instead of stderr (`logs` when no value is given)
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = DEFAULT_LOG_DIR)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Print the adjacency snapshot
    Export,

    /// Print the ego network of a vertex
    Egonet {
        /// Center vertex
        #[arg(long)]
        center: VInt,
    },

    /// Print the strongly connected components
    Scc,

    /// Print edge-betweenness scores, highest first
    Betweenness {
        /// Only print the top N edges
        #[arg(long)]
        top: Option<usize>,
    },

    /// Run Girvan-Newman divisive community detection
    GirvanNewman,

    /// Run greedy modularity agglomeration
    GreedyModularity,
}

enum Analysis {
    Snapshot(Snapshot),
    Egonet { center: VInt, ego: Graph },
    Components(Vec<Graph>),
    Betweenness(BetweennessMap),
    Divisive(Vec<DivisiveStep>),
    Merges(MergeTrace),
}

fn analyze(
    command: Commands,
    mut graph: Graph,
    parallel: bool,
    token: CancelToken,
) -> social_graph::Result<Analysis> {
    let analysis = match command {
        Commands::Export => Analysis::Snapshot(graph.export_snapshot()),
        Commands::Egonet { center } => Analysis::Egonet { center, ego: egonet(&graph, center)? },
        Commands::Scc => Analysis::Components(strongly_connected_components(&graph)?),
        Commands::Betweenness { .. } => Analysis::Betweenness(
            EdgeBetweenness::new().with_parallel(parallel).with_cancel(token).compute(&graph)?,
        ),
        Commands::GirvanNewman => Analysis::Divisive(
            GirvanNewman::new().with_parallel(parallel).with_cancel(token).run(&mut graph)?,
        ),
        Commands::GreedyModularity => Analysis::Merges(
            GreedyModularity::new().with_cancel(token).run(&graph)?,
        ),
    };
    Ok(analysis)
}

fn write_analysis<W: Write>(out: &mut W, command: Commands, analysis: &Analysis, format: OutputFormat) -> Result<()> {
    match analysis {
        Analysis::Snapshot(snapshot) => report::write_snapshot(out, snapshot, format),
        Analysis::Egonet { center, ego } => {
            info!("Egonet of {}: {} vertices, density {:.4}",
                  center, ego.num_vertices(), egonet_density(ego, *center));
            report::write_snapshot(out, &ego.export_snapshot(), format)
        }
        Analysis::Components(components) => report::write_components(out, components, format),
        Analysis::Betweenness(scores) => {
            let top = match command {
                Commands::Betweenness { top } => top,
                _ => None,
            };
            report::write_betweenness(out, scores, top, format)
        }
        Analysis::Divisive(steps) => report::write_divisive_steps(out, steps, format),
        Analysis::Merges(trace) => report::write_merge_trace(out, trace, format),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config file first, flags on top.
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    config.directed |= cli.directed;
    config.parallel |= cli.parallel;
    if cli.timeout_sec.is_some() {
        config.timeout_sec = cli.timeout_sec;
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir.clone();
    }
    init_logger(config.log_dir.as_deref())?;

    let input = cli.input.as_ref().context("Missing --input edge list")?;
    let start = Instant::now();
    let graph = load_edge_list(input, config.directedness())?;
    info!("Load time: {:?}", start.elapsed());

    let command = cli.command;
    let parallel = config.parallel;
    let start = Instant::now();
    let analysis = match config.timeout_sec {
        Some(timeout_sec) => {
            match run_with_timeout(move |token| analyze(command, graph, parallel, token), timeout_sec).await? {
                Timed::Completed(analysis, elapsed) => {
                    info!("Analysis time: {:?}", elapsed);
                    analysis
                }
                Timed::TimedOut(elapsed) => bail!("Analysis cancelled after {:?} (timeout {}s)", elapsed, timeout_sec),
            }
        }
        None => {
            let analysis = analyze(command, graph, parallel, CancelToken::new())?;
            info!("Analysis time: {:?}", start.elapsed());
            analysis
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_analysis(&mut out, command, &analysis, cli.format)?;
    out.flush()?;
    Ok(())
}
