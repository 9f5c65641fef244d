use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use taskmill::api::{self, ApiState};
use taskmill::config::EngineConfig;
use taskmill::scheduler::job::Algorithm;
use taskmill::scheduler::SchedulerEngine;
use taskmill::shutdown::install_shutdown_handler;
use taskmill::store::{JobStore, JsonFileStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "taskmill")]
#[command(version)]
#[command(about = "A job scheduling engine with selectable scheduling policies")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a taskmill server
    Server(ServerArgs),

    /// Job management commands
    Job {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: JobCommands,
    },

    /// Scheduler control commands
    Scheduler {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: SchedulerCommands,
    },
}

#[derive(clap::Args, Debug)]
struct ServerArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Number of concurrent worker slots
    #[arg(long, default_value_t = 3)]
    workers: usize,

    /// Round Robin quantum in milliseconds
    #[arg(long, default_value_t = 10_000)]
    quantum_ms: u64,

    /// Initial scheduling policy (fifo, round_robin, sjf, priority)
    #[arg(long, default_value = "fifo", value_parser = Algorithm::from_str)]
    algorithm: Algorithm,

    /// Persist job records to this JSON file
    #[arg(long)]
    state_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ClientArgs {
    /// Server address
    #[arg(short = 'a', long, default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(clap::Subcommand, Debug)]
enum JobCommands {
    /// Submit a new job
    Submit {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Priority (higher = more urgent; Priority policy only)
        #[arg(short, long, default_value_t = 0)]
        priority: i32,

        /// Total work required, in milliseconds
        #[arg(short, long)]
        execution_ms: u64,

        /// Policy tag recorded on the job
        #[arg(long, default_value = "fifo", value_parser = Algorithm::from_str)]
        algorithm: Algorithm,
    },
    /// Get a job by id
    Status {
        job_id: String,
    },
    /// List jobs, optionally filtered by status
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Request cooperative cancellation of a job
    Cancel {
        job_id: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum SchedulerCommands {
    /// Show scheduler status
    Status,
    /// Resume dispatching
    Start,
    /// Pause dispatching (in-flight slices finish)
    Stop,
    /// Switch the active scheduling policy
    Switch {
        #[arg(value_parser = Algorithm::from_str)]
        algorithm: Algorithm,
    },
}

/// Job fields the client renders; mirrors the server's job response.
#[derive(Debug, Deserialize)]
struct JobView {
    id: String,
    name: String,
    priority: i32,
    execution_time_ms: u64,
    remaining_time_ms: u64,
    algorithm: String,
    status: String,
    created_at: DateTime<Utc>,
    result: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchedulerStatusView {
    is_running: bool,
    current_algorithm: String,
    workers: usize,
    pending_jobs: usize,
    active_jobs: usize,
    completed_jobs: usize,
    failed_jobs: usize,
    cancelled_jobs: usize,
}

// =============================================================================
// Server
// =============================================================================

async fn run_server(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn JobStore> = match &args.state_file {
        Some(path) => Arc::new(JsonFileStore::open(path.clone()).await?),
        None => Arc::new(MemoryStore::new()),
    };

    let config = EngineConfig::default()
        .with_workers(args.workers)
        .with_quantum(Duration::from_millis(args.quantum_ms))
        .with_algorithm(args.algorithm);

    tracing::info!(
        listen = %args.listen,
        workers = config.workers,
        quantum_ms = args.quantum_ms,
        algorithm = %config.algorithm,
        state_file = ?args.state_file,
        "Starting taskmill server"
    );

    let shutdown = install_shutdown_handler();

    let engine = SchedulerEngine::new(config, store);
    let dispatcher = engine.spawn_dispatcher()?;

    let state = ApiState {
        engine: engine.clone(),
    };
    api::serve(args.listen, state, shutdown.clone()).await?;

    // Let the dispatcher and any in-flight slices wind down.
    engine.shutdown();
    let _ = dispatcher.await;
    tracing::info!("Server stopped");
    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

async fn api_error(response: reqwest::Response) -> Box<dyn std::error::Error> {
    let status = response.status();
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    format!("{} ({})", detail, status).into()
}

fn print_job_table(job: &JobView) {
    println!("Job ID:     {}", job.id);
    println!("Name:       {}", job.name);
    println!("Status:     {}", job.status);
    println!("Algorithm:  {}", job.algorithm);
    println!("Priority:   {}", job.priority);
    println!(
        "Work:       {} ms total, {} ms remaining",
        job.execution_time_ms, job.remaining_time_ms
    );
    println!("Created:    {}", job.created_at);
    if let Some(ref result) = job.result {
        println!("Result:     {}", result);
    }
    if let Some(ref error) = job.error {
        println!("Error:      {}", error);
    }
}

async fn handle_job_submit(
    client: &reqwest::Client,
    args: &ClientArgs,
    spec: serde_json::Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/jobs", args.addr))
        .json(&spec)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    match args.output {
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let job: JobView = response.json().await?;
            println!("Job submitted successfully!");
            print_job_table(&job);
        }
    }
    Ok(())
}

async fn handle_job_status(
    client: &reqwest::Client,
    args: &ClientArgs,
    job_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .get(format!("{}/jobs/{}", args.addr, job_id))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    match args.output {
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let job: JobView = response.json().await?;
            print_job_table(&job);
        }
    }
    Ok(())
}

async fn handle_job_list(
    client: &reqwest::Client,
    args: &ClientArgs,
    status: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = client.get(format!("{}/jobs", args.addr));
    if let Some(ref status) = status {
        request = request.query(&[("status", status)]);
    }
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    match args.output {
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let jobs: Vec<JobView> = response.json().await?;
            if jobs.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }
            println!(
                "{:<38} {:<12} {:<12} {:<10} {:<10} NAME",
                "JOB ID", "STATUS", "ALGORITHM", "PRIORITY", "REMAINING"
            );
            println!("{}", "-".repeat(96));
            for job in &jobs {
                println!(
                    "{:<38} {:<12} {:<12} {:<10} {:<10} {}",
                    job.id,
                    job.status,
                    job.algorithm,
                    job.priority,
                    format!("{}ms", job.remaining_time_ms),
                    job.name
                );
            }
            println!();
            println!("{} jobs", jobs.len());
        }
    }
    Ok(())
}

async fn handle_job_cancel(
    client: &reqwest::Client,
    args: &ClientArgs,
    job_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/jobs/{}/cancel", args.addr, job_id))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    match args.output {
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let job: JobView = response.json().await?;
            if job.status == "cancelled" {
                println!("Job cancelled.");
            } else {
                println!("Cancellation requested; the job finishes its current slice first.");
            }
            print_job_table(&job);
        }
    }
    Ok(())
}

async fn handle_scheduler_status(
    client: &reqwest::Client,
    args: &ClientArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .get(format!("{}/scheduler/status", args.addr))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    match args.output {
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let status: SchedulerStatusView = response.json().await?;
            println!("Scheduler Status");
            println!("{}", "=".repeat(32));
            println!(
                "State:     {}",
                if status.is_running { "running" } else { "stopped" }
            );
            println!("Policy:    {}", status.current_algorithm);
            println!("Workers:   {}", status.workers);
            println!();
            println!("Pending:   {}", status.pending_jobs);
            println!("Active:    {}", status.active_jobs);
            println!("Completed: {}", status.completed_jobs);
            println!("Failed:    {}", status.failed_jobs);
            println!("Cancelled: {}", status.cancelled_jobs);
        }
    }
    Ok(())
}

async fn handle_scheduler_toggle(
    client: &reqwest::Client,
    args: &ClientArgs,
    action: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/scheduler/{}", args.addr, action))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body: serde_json::Value = response.json().await?;
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
        OutputFormat::Table => println!(
            "{}",
            body.get("message").and_then(|m| m.as_str()).unwrap_or("ok")
        ),
    }
    Ok(())
}

async fn handle_scheduler_switch(
    client: &reqwest::Client,
    args: &ClientArgs,
    algorithm: Algorithm,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/scheduler/algorithm", args.addr))
        .json(&serde_json::json!({ "algorithm": algorithm }))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body: serde_json::Value = response.json().await?;
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
        OutputFormat::Table => println!(
            "{}",
            body.get("message").and_then(|m| m.as_str()).unwrap_or("ok")
        ),
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Server(server_args) => {
            run_server(server_args).await?;
        }
        Commands::Job { client, command } => {
            let http = reqwest::Client::new();
            match command {
                JobCommands::Submit {
                    name,
                    description,
                    priority,
                    execution_ms,
                    algorithm,
                } => {
                    let spec = serde_json::json!({
                        "name": name,
                        "description": description,
                        "priority": priority,
                        "execution_time_ms": execution_ms,
                        "algorithm": algorithm,
                    });
                    handle_job_submit(&http, &client, spec).await?;
                }
                JobCommands::Status { job_id } => {
                    handle_job_status(&http, &client, &job_id).await?;
                }
                JobCommands::List { status } => {
                    handle_job_list(&http, &client, status).await?;
                }
                JobCommands::Cancel { job_id } => {
                    handle_job_cancel(&http, &client, &job_id).await?;
                }
            }
        }
        Commands::Scheduler { client, command } => {
            let http = reqwest::Client::new();
            match command {
                SchedulerCommands::Status => {
                    handle_scheduler_status(&http, &client).await?;
                }
                SchedulerCommands::Start => {
                    handle_scheduler_toggle(&http, &client, "start").await?;
                }
                SchedulerCommands::Stop => {
                    handle_scheduler_toggle(&http, &client, "stop").await?;
                }
                SchedulerCommands::Switch { algorithm } => {
                    handle_scheduler_switch(&http, &client, algorithm).await?;
                }
            }
        }
    }

    Ok(())
}
