pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "leafctl")]
#[command(about = "leafctl - operator command-line interface for the leafpos API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Server URL (overrides the stored session and LEAFCTL_SERVER)"
    )]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server info and health checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Authentication and credential marker management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Product catalog operations")]
    Products {
        #[command(subcommand)]
        cmd: commands::products::ProductCommands,
    },

    #[command(about = "Member registry operations")]
    Members {
        #[command(subcommand)]
        cmd: commands::members::MemberCommands,
    },

    #[command(about = "PoS terminal session log")]
    Sessions {
        #[command(subcommand)]
        cmd: commands::sessions::SessionCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Per-invocation settings shared by every command handler.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub server: Option<String>,
    pub output: OutputFormat,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext {
        server: cli.server.clone(),
        output: OutputFormat::from_cli(&cli),
    };

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, ctx).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, ctx).await,
        Commands::Products { cmd } => commands::products::handle(cmd, ctx).await,
        Commands::Members { cmd } => commands::members::handle(cmd, ctx).await,
        Commands::Sessions { cmd } => commands::sessions::handle(cmd, ctx).await,
    }
}
