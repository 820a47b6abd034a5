mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::exec::CliExit;
use orch_core::FAILURE_EXIT_CODE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "orchestrator",
    about = "Two-phase build/review orchestrator: ticket → run pack → builder → reviewer → verdict",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory that holds one run directory per ticket (default: ./audit/runs)
    #[arg(long, global = true, env = "ORCH_RUNS_ROOT")]
    runs_root: Option<PathBuf>,

    /// Optional YAML config with builder/reviewer settings
    #[arg(long, global = true, env = "ORCH_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the run pack for a ticket and exit
    Run {
        /// Path to the ticket markdown file
        ticket: PathBuf,
    },

    /// Run the full protocol: build, regenerate the packet, review, record the verdict
    ///
    /// Exit codes: 0 approved, 1 blocked, 2 escalate, 3 failure.
    Exec {
        /// Path to the ticket markdown file
        ticket: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Exec { .. } => tracing::Level::INFO,
        Commands::Run { .. } => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = root::resolve(cli.runs_root.as_deref(), cli.config.as_deref()).and_then(
        |settings| match &cli.command {
            Commands::Run { ticket } => cmd::run::run(&settings, ticket, cli.json),
            Commands::Exec { ticket } => cmd::exec::run(&settings, ticket, cli.json),
        },
    );

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let code = e
            .downcast_ref::<CliExit>()
            .map(CliExit::exit_code)
            .unwrap_or(FAILURE_EXIT_CODE);
        std::process::exit(code);
    }
}
