//! evalgrid - Operator CLI for the benchmark daemon
//!
//! ## Commands
//!
//! - `run`: submit a configuration file (single or matrix), optionally
//!   watching it to completion
//! - `status`: print the status snapshot for a job
//! - `cancel`: cancel a running job
//! - `suggestions`: fetch comparative tuning suggestions

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::Level;

use evalgrid_core::init_tracing;

#[derive(Parser)]
#[command(name = "evalgrid")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark orchestration CLI", long_about = None)]
struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8787")]
    server: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a benchmark configuration file
    Run {
        /// Path to the request JSON (single target or matrix)
        #[arg(short, long)]
        config: PathBuf,

        /// Poll the job until it reaches a terminal state
        #[arg(long)]
        watch: bool,
    },

    /// Show the status of a job
    Status {
        /// Job id as returned by `run`
        job_id: String,
    },

    /// Cancel a running job
    Cancel {
        /// Job id as returned by `run`
        job_id: String,
    },

    /// Fetch tuning suggestions mined from recent runs
    Suggestions,
}

const WATCH_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    let client = reqwest::Client::new();
    let base = cli.server.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Run { config, watch } => run(&client, &base, &config, watch).await,
        Commands::Status { job_id } => status(&client, &base, &job_id).await,
        Commands::Cancel { job_id } => cancel(&client, &base, &job_id).await,
        Commands::Suggestions => suggestions(&client, &base).await,
    }
}

/// Decode a response, turning non-2xx statuses into the daemon's
/// `{error}` message when one is present.
async fn decode(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("daemon returned a non-JSON response ({status})"))?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("unknown error");
        bail!("daemon rejected the request ({status}): {message}");
    }
    Ok(body)
}

fn print_pretty(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn fetch_status(client: &reqwest::Client, base: &str, job_id: &str) -> Result<Value> {
    let response = client
        .get(format!("{base}/benchmark/run/{job_id}/status"))
        .send()
        .await
        .context("failed to reach the daemon")?;
    decode(response).await
}

async fn run(client: &reqwest::Client, base: &str, config: &PathBuf, watch: bool) -> Result<()> {
    let raw = std::fs::read_to_string(config)
        .with_context(|| format!("failed to read {}", config.display()))?;
    let request: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", config.display()))?;

    let response = client
        .post(format!("{base}/benchmark/run"))
        .json(&request)
        .send()
        .await
        .context("failed to reach the daemon")?;
    let submitted = decode(response).await?;
    print_pretty(&submitted)?;

    if !watch {
        return Ok(());
    }
    let job_id = submitted
        .get("jobId")
        .and_then(|id| id.as_str())
        .context("daemon response carried no job id")?
        .to_string();

    loop {
        tokio::time::sleep(WATCH_INTERVAL).await;
        let current = fetch_status(client, base, &job_id).await?;
        let state = current.get("state").and_then(|s| s.as_str()).unwrap_or("");
        eprintln!(
            "[{}] runs {}/{}, suites {}/{}",
            state,
            current.get("completedRuns").and_then(Value::as_u64).unwrap_or(0),
            current.get("totalRuns").and_then(Value::as_u64).unwrap_or(0),
            current.get("completedSuites").and_then(Value::as_u64).unwrap_or(0),
            current.get("totalSuites").and_then(Value::as_u64).unwrap_or(0),
        );
        if state == "completed" || state == "failed" {
            print_pretty(&current)?;
            if state == "failed" {
                let message = current
                    .get("error")
                    .and_then(|e| e.as_str())
                    .unwrap_or("job failed");
                bail!("{message}");
            }
            return Ok(());
        }
    }
}

async fn status(client: &reqwest::Client, base: &str, job_id: &str) -> Result<()> {
    let status = fetch_status(client, base, job_id).await?;
    print_pretty(&status)
}

async fn cancel(client: &reqwest::Client, base: &str, job_id: &str) -> Result<()> {
    let response = client
        .post(format!("{base}/benchmark/run/{job_id}/cancel"))
        .send()
        .await
        .context("failed to reach the daemon")?;
    let body = decode(response).await?;
    print_pretty(&body)
}

async fn suggestions(client: &reqwest::Client, base: &str) -> Result<()> {
    let response = client
        .get(format!("{base}/benchmark/suggestions"))
        .send()
        .await
        .context("failed to reach the daemon")?;
    let body = decode(response).await?;
    print_pretty(&body)
}
