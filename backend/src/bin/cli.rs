//! Operator CLI: trigger a mapping run and print its outcome. Thin wrapper
//! around the same `AppState` the HTTP server uses.

use clap::{Parser, Subcommand};

use ues_engine::config::Config;
use ues_engine::AppState;

#[derive(Parser)]
#[command(name = "ues-cli", about = "Unified Entity Store operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the five-stage resolution pipeline once and print the result.
    Run {
        /// Reuse a specific run id instead of generating a fresh one.
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Print the aggregate quality report for a previously completed run.
    Report {
        #[arg(long)]
        run_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let state = AppState::init(config).await?;

    match cli.command {
        Command::Run { run_id } => {
            let outcome = state.run_pipeline(run_id).await?;
            println!("run_id: {}", outcome.run_id);
            println!("quality gate: {}", outcome.quality_gate.status.as_str());
            if !outcome.quality_gate.failed_gates.is_empty() {
                println!("failed gates: {}", outcome.quality_gate.failed_gates.join(", "));
                std::process::exit(1);
            }
        }
        Command::Report { run_id } => {
            let report = ues_engine::qa::report::build_quality_report(&state.pools.ues, &run_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
