use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::store::PgDocumentStore;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create the collection tables if they do not exist")]
    Migrate,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Migrate => {
            let config = config::config();
            let store = PgDocumentStore::connect(&config.database, config.filter.max_limit).await?;
            store.apply_schema().await?;
            store.close().await;

            output_success(
                &output_format,
                "Schema applied",
                Some(json!({ "tables": ["workspaces", "members", "projects", "tasks"] })),
            )
        }
    }
}
