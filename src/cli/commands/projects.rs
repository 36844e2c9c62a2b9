use clap::Subcommand;

use crate::cli::config::load_cli_config;
use crate::cli::utils::{column, output_rows};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ProjectCommands {
    #[command(about = "List projects of a workspace")]
    List {
        #[arg(help = "Workspace id")]
        workspace_id: String,
    },
}

pub async fn handle(cmd: ProjectCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_cli_config()?.client()?;

    match cmd {
        ProjectCommands::List { workspace_id } => {
            let projects = client.list_projects(&workspace_id).await?;
            output_rows(&output_format, &projects.documents, "No projects", |p| {
                format!("{}  {}", column(&p.id, 32), p.name)
            })
        }
    }
}
