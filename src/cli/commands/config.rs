use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_cli_config, save_cli_config};
use crate::cli::{utils::output_success, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Set the API server URL and optionally the session token")]
    SetServer {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
        #[arg(long, help = "Bearer token for API calls")]
        token: Option<String>,
    },

    #[command(about = "Show the configured server and check its health")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::SetServer { url, token } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL {}: {}", url, e))?;

            let mut config = load_cli_config()?;
            config.server_url = Some(url.trim_end_matches('/').to_string());
            if token.is_some() {
                config.token = token;
            }
            config.updated_at = Some(Utc::now());
            save_cli_config(&config)?;

            output_success(&output_format, &format!("Server set to {}", url), None)
        }
        ConfigCommands::Show => {
            let config = load_cli_config()?;
            let status = match config.client() {
                Ok(client) => match client.health().await {
                    Ok(_) => "up",
                    Err(_) => "down",
                },
                Err(_) => "unconfigured",
            };

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "CLI configuration",
                    Some(json!({
                        "server_url": config.server_url,
                        "has_token": config.token.is_some(),
                        "status": status,
                    })),
                ),
                OutputFormat::Text => {
                    println!("Server: {}", config.server_url.as_deref().unwrap_or("(none)"));
                    println!("Token: {}", if config.token.is_some() { "set" } else { "not set" });
                    println!("Status: {}", status);
                    Ok(())
                }
            }
        }
    }
}
