use clap::Subcommand;

use crate::cli::config::load_cli_config;
use crate::cli::utils::{column, output_rows};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum WorkspaceCommands {
    #[command(about = "List workspaces you belong to")]
    List,
}

pub async fn handle(cmd: WorkspaceCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_cli_config()?.client()?;

    match cmd {
        WorkspaceCommands::List => {
            let workspaces = client.list_workspaces().await?;
            output_rows(&output_format, &workspaces.documents, "No workspaces", |w| {
                format!("{}  {}  invite:{}", column(&w.id, 32), column(&w.name, 24), w.invite_code)
            })
        }
    }
}
