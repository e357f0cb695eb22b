//! Tessera CLI - sign in and call the API from a terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use tracing::debug;

/// Tessera CLI - manage a signed-in session against the Tessera API.
#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera CLI for signing in and calling the API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// API base URL; overrides the config file
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    SignIn {
        /// Account email; prompted for when omitted
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out and forget the stored credentials
    SignOut,

    /// Show the current session
    Status,

    /// GET a path with the stored credentials
    Get {
        /// Path relative to the API base URL, e.g. /reports/42
        path: String,
    },

    /// Check whether the signed-in user meets a requirement
    Can {
        /// Required permission; repeat for several (all must be held)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,

        /// Accepted role; repeat for several (any one suffices)
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let overrides = commands::Overrides {
        log_level: cli.log_level,
        api_url: cli.api_url,
    };

    let result = match commands::Runtime::load(overrides) {
        Ok(runtime) => {
            debug!(api_url = %runtime.config().api_base_url, "CLI runtime ready");
            match cli.command {
                Commands::SignIn { email } => {
                    commands::sign_in(&runtime, email.as_deref(), &cli.format).await
                }
                Commands::SignOut => commands::sign_out(&runtime, &cli.format).await,
                Commands::Status => commands::status(&runtime, &cli.format).await,
                Commands::Get { path } => commands::get(&runtime, &path, &cli.format).await,
                Commands::Can { permissions, roles } => {
                    commands::can(&runtime, permissions, roles, &cli.format).await
                }
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}
