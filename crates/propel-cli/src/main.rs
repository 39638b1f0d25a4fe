//! Propel CLI
//!
//! `pcli` talks to the Propel agent hosting service:
//! - Authentication (login, logout) and the OpenAI passthrough
//! - Keys, seats and variables
//! - Agent lifecycle, including the deploy and ensure-deleted workflows
//! - Multi-agent service deployment

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use propel_cli::commands::{self, AgentOptions, ServiceDeployArgs};
use propel_cli::output::print_error;
use propel_cli::session::{ConnectionArgs, Session};
use propel_core::types::VarType;

#[derive(Parser)]
#[command(name = "pcli")]
#[command(author, version, about = "Command-line client for the Propel agent service")]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and forget the session token
    Logout,

    /// Call an OpenAI endpoint through the service
    Call {
        /// Endpoint path
        path: String,
        /// JSON payload, `-` to read it from stdin
        payload: Option<String>,
    },

    /// Manage API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Check seat allocation
    Seats {
        #[command(subcommand)]
        action: SeatsAction,
    },

    /// Manage agents
    Agents {
        #[command(subcommand)]
        action: AgentsAction,
    },

    /// Manage variables
    Variables {
        #[command(subcommand)]
        action: VariablesAction,
    },

    /// Deploy services
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// List keys
    List,
    /// Create a key
    Create,
}

#[derive(Subcommand)]
enum SeatsAction {
    /// Fail unless a seat is available
    Ensure,
}

#[derive(Subcommand)]
enum AgentsAction {
    /// List agents
    List {
        /// Render a table instead of JSON
        #[arg(long)]
        table: bool,
    },

    /// Create an agent
    Create {
        #[arg(long)]
        key: u64,
        #[arg(long)]
        name: Option<String>,
        /// Comma separated variable names
        #[arg(long)]
        variables: Option<String>,
        #[command(flatten)]
        options: AgentOptions,
    },

    /// Show one agent
    Get { name_or_id: String },

    /// Wait until an agent reaches a state
    Wait {
        name_or_id: String,
        state: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
        /// Seconds between polls
        #[arg(long, default_value_t = 10)]
        period: u64,
    },

    /// Trigger a restart
    Restart { name_or_id: String },

    /// Trigger a stop
    Stop { name_or_id: String },

    /// Trigger deletion
    Delete { name_or_id: String },

    /// Stop and delete an agent, succeeding if it is already gone
    EnsureDeleted {
        name_or_id: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Attach variables to an agent
    VariablesAdd {
        name_or_id: String,
        /// Comma separated variable names
        variables: Option<String>,
    },

    /// Detach variables from an agent
    VariablesRemove {
        name_or_id: String,
        /// Comma separated variable names
        variables: Option<String>,
    },

    /// Replace an agent and bring it to STARTED
    Deploy {
        #[arg(long)]
        key: u64,
        #[arg(long)]
        name: String,
        /// Comma separated variable names
        #[arg(long)]
        variables: Option<String>,
        #[command(flatten)]
        options: AgentOptions,
        /// Timeout in seconds for every wait
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
}

#[derive(Subcommand)]
enum VariablesAction {
    /// List variables
    List,
    /// Create a variable
    Create {
        name: String,
        key: String,
        value: String,
        #[arg(default_value_t = VarType::Str)]
        var_type: VarType,
    },
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Deploy one agent per key with variables from the environment
    Deploy(ServiceDeployArgs),
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::new(cli.config, &cli.connection)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::login_command(&session, username, password).await?;
        }

        Commands::Logout => commands::logout_command(&session).await?,

        Commands::Call { path, payload } => {
            commands::call_command(&session, &path, payload.as_deref()).await?;
        }

        Commands::Keys { action } => match action {
            KeysAction::List => commands::keys_list(&session).await?,
            KeysAction::Create => commands::keys_create(&session).await?,
        },

        Commands::Seats { action } => match action {
            SeatsAction::Ensure => commands::seats_ensure(&session).await?,
        },

        Commands::Agents { action } => match action {
            AgentsAction::List { table } => commands::agents_list(&session, table).await?,
            AgentsAction::Create {
                key,
                name,
                variables,
                options,
            } => {
                commands::agents_create(&session, key, name, variables.as_deref(), &options)
                    .await?;
            }
            AgentsAction::Get { name_or_id } => commands::agents_get(&session, &name_or_id).await?,
            AgentsAction::Wait {
                name_or_id,
                state,
                timeout,
                period,
            } => {
                commands::agents_wait(
                    &session,
                    &name_or_id,
                    &state,
                    Duration::from_secs(timeout),
                    Duration::from_secs(period),
                )
                .await?;
            }
            AgentsAction::Restart { name_or_id } => {
                commands::agents_restart(&session, &name_or_id).await?
            }
            AgentsAction::Stop { name_or_id } => commands::agents_stop(&session, &name_or_id).await?,
            AgentsAction::Delete { name_or_id } => {
                commands::agents_delete(&session, &name_or_id).await?
            }
            AgentsAction::EnsureDeleted {
                name_or_id,
                timeout,
            } => {
                commands::agents_ensure_deleted(&session, &name_or_id, Duration::from_secs(timeout))
                    .await?;
            }
            AgentsAction::VariablesAdd {
                name_or_id,
                variables,
            } => {
                commands::agents_variables_add(&session, &name_or_id, variables.as_deref()).await?;
            }
            AgentsAction::VariablesRemove {
                name_or_id,
                variables,
            } => {
                commands::agents_variables_remove(&session, &name_or_id, variables.as_deref())
                    .await?;
            }
            AgentsAction::Deploy {
                key,
                name,
                variables,
                options,
                timeout,
            } => {
                commands::agents_deploy(
                    &session,
                    key,
                    &name,
                    variables.as_deref(),
                    &options,
                    Duration::from_secs(timeout),
                )
                .await?;
            }
        },

        Commands::Variables { action } => match action {
            VariablesAction::List => commands::variables_list(&session).await?,
            VariablesAction::Create {
                name,
                key,
                value,
                var_type,
            } => commands::variables_create(&session, &name, &key, &value, var_type).await?,
        },

        Commands::Service { action } => match action {
            ServiceAction::Deploy(args) => commands::service_deploy_command(&session, args).await?,
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&session)?,
            ConfigAction::Path => commands::config_path(&session),
        },
    }

    Ok(())
}
