use clap::Parser;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "submit-job")]
#[command(about = "Minimal client for a running taskmill server")]
struct Args {
    /// Server address
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Display name for the job
    #[arg(long, default_value = "demo-job")]
    name: String,

    /// Total work in milliseconds
    #[arg(long, default_value_t = 5_000)]
    execution_ms: u64,

    /// Scheduling policy tag (fifo, round_robin, sjf, priority)
    #[arg(long, default_value = "fifo")]
    algorithm: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/jobs", args.addr))
        .json(&json!({
            "name": args.name,
            "execution_time_ms": args.execution_ms,
            "algorithm": args.algorithm,
        }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        eprintln!("Submission failed ({}): {}", status, body);
        std::process::exit(1);
    }

    println!("Job submitted:");
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
