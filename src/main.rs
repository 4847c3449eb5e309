//! Contributors - GitHub organization contributor aggregation
//!
//! Main entry point for the contributors CLI.

use contributors::config::{validate_params_result, LoadingParams};
use contributors::integrations::MockSource;
use contributors::orchestrator::{LoadingState, LoadingStatus, Orchestrator, RunOutcome};
use contributors::strategy::StrategyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Contributors - aggregate contributors across an organization's repositories
#[derive(Parser, Debug)]
#[command(name = "contributors")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to stored parameters (default: ~/.config/contributors/params.yaml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load contributors of an organization
    Load {
        /// Organization to load (defaults to the stored one)
        #[arg(short, long)]
        org: Option<String>,

        /// GitHub username
        #[arg(short, long, env = "GITHUB_USER")]
        username: Option<String>,

        /// GitHub password or personal access token
        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        password: Option<String>,

        /// Fetch strategy (sequential, concurrent, channel, progress)
        #[arg(short, long)]
        strategy: Option<StrategyKind>,

        /// Remember these parameters for the next run
        #[arg(long)]
        save: bool,

        /// Use built-in sample data instead of GitHub
        #[arg(long)]
        mock: bool,

        /// Number of contributors to print per update
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,

        /// Print the final contributors as JSON instead of progress updates
        #[arg(long)]
        json: bool,
    },

    /// Manage stored parameters
    #[command(subcommand)]
    Params(ParamsCommands),

    /// List available fetch strategies
    Strategies,
}

#[derive(Subcommand, Debug)]
enum ParamsCommands {
    /// Show stored parameters (password masked)
    Show,

    /// Forget stored parameters
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = contributors::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> contributors::Result<()> {
    let params_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(LoadingParams::default_path);

    match cli.command {
        Commands::Load {
            org,
            username,
            password,
            strategy,
            save,
            mock,
            top,
            json,
        } => {
            let mut params = load_stored(cli.config.as_deref())?;
            if let Some(org) = org {
                params.org = org;
            }
            if let Some(username) = username {
                params.username = username;
            }
            if let Some(password) = password {
                params.password = password;
            }
            if let Some(strategy) = strategy {
                params.strategy = strategy;
            }

            validate_params_result(&params)?;
            if save {
                params.store(&params_path)?;
            }

            handle_load(&params, mock, top, json).await
        }
        Commands::Params(ParamsCommands::Show) => {
            let params = load_stored(cli.config.as_deref())?;
            println!("Parameters ({}):", params_path.display());
            println!("  org:           {}", params.org);
            println!("  username:      {}", params.username);
            println!(
                "  password:      {}",
                if params.password.is_empty() { "" } else { "********" }
            );
            println!("  strategy:      {}", params.strategy);
            println!("  api_url:       {}", params.fetch.api_url);
            println!("  max_in_flight: {}", params.fetch.max_in_flight);
            Ok(())
        }
        Commands::Params(ParamsCommands::Clear) => {
            LoadingParams::remove(&params_path)?;
            println!("✓ Removed stored parameters");
            Ok(())
        }
        Commands::Strategies => {
            for kind in StrategyKind::ALL {
                println!("  {:<12} {}", kind.name(), kind.description());
            }
            Ok(())
        }
    }
}

/// Stored parameters from `--config`, or the default location
fn load_stored(config: Option<&str>) -> contributors::Result<LoadingParams> {
    match config {
        Some(path) => LoadingParams::load_or_default(path),
        None => LoadingParams::load_default(),
    }
}

async fn handle_load(
    params: &LoadingParams,
    mock: bool,
    top: usize,
    json: bool,
) -> contributors::Result<()> {
    let orchestrator = if mock {
        Orchestrator::with_source(Arc::new(MockSource::sample()), params.fetch.clone())
    } else {
        Orchestrator::github(params.fetch.clone())
    };

    let mut updates = orchestrator.subscribe();
    let handle = orchestrator.start(params.request()?, params.strategy)?;

    if !json {
        println!(
            "Loading contributors of '{}' using the {} strategy (Ctrl-C to cancel)",
            params.org, params.strategy
        );
    }

    let mut interrupted = false;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !json {
                    print_state(&state, top);
                }
                if state.status.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                break;
            }
        }
    }

    let outcome = if interrupted {
        orchestrator.cancel(handle).await
    } else {
        handle.wait().await
    };

    match outcome {
        RunOutcome::Completed(users) if json => {
            println!("{}", users.to_json()?);
            Ok(())
        }
        RunOutcome::Completed(users) => {
            println!();
            println!(
                "✓ {} contributors, {} contributions in total",
                users.len(),
                users.total_contributions()
            );
            Ok(())
        }
        RunOutcome::Canceled => {
            println!("Loading canceled");
            Ok(())
        }
        RunOutcome::Failed(message) => Err(contributors::ContributorsError::Other(message)),
    }
}

fn print_state(state: &LoadingState, top: usize) {
    println!();
    println!("{}", state.status_text());
    if matches!(state.status, LoadingStatus::Failed(_)) {
        return;
    }
    for (rank, user) in state.users.users().iter().take(top).enumerate() {
        println!("  {:>3}. {:<30} {:>6}", rank + 1, user.login, user.contributions);
    }
    if state.users.len() > top {
        println!("       ... and {} more", state.users.len() - top);
    }
}
