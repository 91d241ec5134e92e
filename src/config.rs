use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::Directedness;

/// Buffer used when reading edge list files.
pub(crate) const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Log directory used by the binary when none is configured.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "social_graph.log";

/// Analysis settings, loadable from a YAML file.
///
/// ```yaml
/// directed: false
/// parallel: true
/// timeout_sec: 600
/// log_dir: logs
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Treat every input line as an ordered pair.
    pub directed: bool,
    /// Spread per-source betweenness passes over the rayon pool.
    pub parallel: bool,
    /// Cancel the analysis after this many seconds.
    pub timeout_sec: Option<u64>,
    /// Write logs under this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid analysis config")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn directedness(&self) -> Directedness {
        Directedness::from_flag(self.directed)
    }
}
