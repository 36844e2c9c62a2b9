pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "planboard")]
#[command(about = "Planboard CLI - Command-line interface for the Planboard API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Document store maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Mint a development session token")]
    Token {
        #[arg(long, help = "User id placed in the token subject")]
        user_id: String,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Email address")]
        email: String,
    },

    #[command(about = "CLI configuration (server URL and token)")]
    Config {
        #[command(subcommand)]
        cmd: commands::config::ConfigCommands,
    },

    #[command(about = "Workspace operations")]
    Workspaces {
        #[command(subcommand)]
        cmd: commands::workspaces::WorkspaceCommands,
    },

    #[command(about = "Project operations")]
    Projects {
        #[command(subcommand)]
        cmd: commands::projects::ProjectCommands,
    },

    #[command(about = "Task operations")]
    Tasks {
        #[command(subcommand)]
        cmd: commands::tasks::TaskCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::Token { user_id, name, email } => {
            commands::token::handle(&user_id, &name, &email, output_format)
        }
        Commands::Config { cmd } => commands::config::handle(cmd, output_format).await,
        Commands::Workspaces { cmd } => commands::workspaces::handle(cmd, output_format).await,
        Commands::Projects { cmd } => commands::projects::handle(cmd, output_format).await,
        Commands::Tasks { cmd } => commands::tasks::handle(cmd, output_format).await,
    }
}
