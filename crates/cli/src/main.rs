//! Dray CLI - enqueue jobs and run processors against a local queue

use anyhow::Result;
use clap::{Parser, Subcommand};
use dray::{Backend, Job, JobStatus, ProcessorError, ProcessorFn};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DB_PATH: &str = "~/.dray/db";

#[derive(Parser)]
#[command(name = "dray")]
#[command(about = "Dray job queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory of the queue
    #[arg(long, env = "DRAY_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue a new job
    Enqueue {
        /// Job name, used by processors for routing
        name: String,

        /// Payload handed to the processor verbatim
        #[arg(long, default_value = "")]
        data: String,
    },

    /// Show how many jobs sit under each status
    Status,

    /// Run a logging processor until Ctrl-C
    Work,
}

fn init_logging() {
    let log_format = std::env::var("DRAY_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("dray=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn log_job(job: &Job) -> Result<(), ProcessorError> {
    info!(job_id = job.id, name = %job.name, bytes = job.data.len(), "Processing job");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let db_path = shellexpand::tilde(&cli.db_path).into_owned();

    let backend = Backend::new(db_path);
    backend.start()?;

    match cli.command {
        Commands::Enqueue { name, data } => {
            let id = backend.enqueue_job(&name, data.into_bytes())?;
            info!(job_id = id, name = %name, "Job enqueued");
        }
        Commands::Status => {
            for status in [
                JobStatus::Pending,
                JobStatus::InProgress,
                JobStatus::Complete,
                JobStatus::Failed,
            ] {
                println!("{:>12}: {}", status.as_str(), backend.count(status)?);
            }
        }
        Commands::Work => {
            backend.register_processor(Arc::new(ProcessorFn(log_job)));
            info!("Processor registered, waiting for jobs (Ctrl-C to stop)");
            tokio::signal::ctrl_c().await?;
        }
    }

    // stop gracefully
    backend.stop()?;
    Ok(())
}
