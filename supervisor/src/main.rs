//! Main entry point for the supervisor binary
//!
//! Each invocation performs one lifecycle operation against the backend and
//! exits; there is no resident process.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use shared::{ComponentId, component_debug, logging};
use supervisor::{ConfigArgs, RealSupervisor, StartOutcome, SupervisorError, SupervisorResult};

/// Supervises the local backend process for the quiz demo
#[derive(Parser)]
#[command(name = "supervisor")]
#[command(about = "Start, stop and inspect the local backend, and open the frontend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Start the backend, then open the frontend (default)
    Run,
    /// Start the backend and wait for its health route
    Start,
    /// Stop the backend (best effort, never fails on signal errors)
    Stop,
    /// Report whether the backend is running
    Status {
        /// Print the observed state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the frontend entry file in the default viewer
    Open,
    /// Follow the backend log until interrupted
    Tail {
        /// Lines of existing output to show first
        #[arg(short = 'n', long, default_value_t = 10)]
        lines: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    ComponentId::init_supervisor();
    logging::init_tracing_with_level(Some(&cli.log_level));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::log_error(ComponentId::current(), "Supervisor command", &e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> SupervisorResult<()> {
    let config = cli.config.into_config()?;
    let command = cli.command.unwrap_or(Commands::Run);
    component_debug!(ComponentId::current(), "Command: {:?}, endpoint: {}", command, config.endpoint);

    let supervisor = RealSupervisor::from_config(config);

    match command {
        Commands::Run => {
            start(&supervisor).await?;
            open(&supervisor)
        }
        Commands::Start => start(&supervisor).await,
        Commands::Stop => {
            let outcome = supervisor.stop().await?;
            println!("{outcome}");
            Ok(())
        }
        Commands::Status { json } => {
            let report = supervisor.status().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary);
            }
            Ok(())
        }
        Commands::Open => open(&supervisor),
        Commands::Tail { lines } => {
            let mut stdout = tokio::io::stdout();
            let interrupted = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    // Without a handler, follow until the process is killed
                    logging::log_swallowed(ComponentId::current(), "Installing Ctrl+C handler", &e);
                    std::future::pending::<()>().await;
                }
            };
            supervisor.tail_log(&mut stdout, lines, interrupted).await?;
            logging::log_shutdown(ComponentId::current(), "log follow interrupted");
            Ok(())
        }
    }
}

async fn start(supervisor: &RealSupervisor) -> SupervisorResult<()> {
    let outcome = supervisor.start().await?;
    if outcome.is_warning() {
        eprintln!("warning: {outcome}");
        if let StartOutcome::TimedOut { .. } | StartOutcome::ExitedEarly { .. } = outcome {
            eprintln!("         log: {}", supervisor.config().log_file().display());
        }
    } else {
        println!("{outcome}");
    }
    Ok(())
}

fn open(supervisor: &RealSupervisor) -> SupervisorResult<()> {
    match supervisor.open_frontend() {
        Ok(path) => {
            println!("opened {}", path.display());
            Ok(())
        }
        Err(e @ SupervisorError::FrontendNotFound { .. }) => Err(e),
        Err(e) => {
            eprintln!("could not launch a viewer; open {} manually", supervisor.config().frontend_entry.display());
            Err(e)
        }
    }
}
