use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};

use crate::config::DEFAULT_LOG_FILE;

/// Set up `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Records go to `<log_dir>/social_graph.log` when a directory is given and
/// to stderr otherwise. Calling it twice keeps the first logger.
pub fn init_logger(log_dir: Option<&Path>) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{:<5}] {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(dir) = log_dir {
        // Create a new dir.
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(DEFAULT_LOG_FILE))
            .context("Failed to open log file")?;
        // Put it
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    let _ = builder.try_init();
    Ok(())
}
