//! evalgridd - Benchmark orchestration daemon
//!
//! Serves the benchmark API over HTTP: submit matrix runs, poll status,
//! cancel jobs, and fetch comparative tuning suggestions.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use evalgrid_core::{init_tracing, FsRunHistory};
use evalgrid_orchestrator::{HarnessConfig, JobScheduler, MemoryJobStore};

mod handlers;
mod server;

use server::ApiServer;

#[derive(Parser)]
#[command(name = "evalgridd")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark orchestration daemon", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8787)]
    port: u16,

    /// Directory of harness result files (run history)
    #[arg(long, default_value = "results")]
    history_dir: PathBuf,

    /// Harness executable to invoke for each run
    #[arg(long, default_value = "eval-harness")]
    harness: String,

    /// Directory for transient per-run configuration files
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let history = Arc::new(FsRunHistory::new(&cli.history_dir));
    let harness = HarnessConfig {
        binary: cli.harness,
        scratch_dir: cli
            .scratch_dir
            .unwrap_or_else(std::env::temp_dir),
    };
    let scheduler = Arc::new(JobScheduler::new(
        Arc::new(MemoryJobStore::new()),
        history.clone(),
        harness,
    ));

    let server = ApiServer::new(cli.port, scheduler, history);
    server.start().await
}
