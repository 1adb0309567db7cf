use clap::Subcommand;
use serde_json::Value;

use crate::cli::config::resolve_server;
use crate::cli::utils::read_envelope;
use crate::cli::{CliContext, OutputFormat};

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health from the /health endpoint")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, ctx: CliContext) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;
    let client = reqwest::Client::new();

    match cmd {
        ServerCommands::Health => {
            let response = client
                .get(format!("{}/health", server))
                .timeout(std::time::Duration::from_secs(5))
                .send()
                .await?;
            let status = response.status();
            let body: Value = response.json().await?;

            match ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
                OutputFormat::Text => {
                    let database = body["data"]["status"].as_str().unwrap_or("unknown");
                    if status.is_success() {
                        println!("✓ {} is healthy ({})", server, database);
                    } else {
                        println!("✗ {} is degraded ({})", server, database);
                    }
                }
            }
            Ok(())
        }
        ServerCommands::Info => {
            let response = client.get(format!("{}/", server)).send().await?;
            let data = read_envelope(response).await?;

            match ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
                OutputFormat::Text => {
                    println!(
                        "{} {}",
                        data["name"].as_str().unwrap_or("unknown"),
                        data["version"].as_str().unwrap_or("")
                    );
                    if let Some(description) = data["description"].as_str() {
                        println!("{}", description);
                    }
                    if let Some(endpoints) = data["endpoints"].as_object() {
                        println!();
                        for (group, route) in endpoints {
                            println!("{:<14} {}", group, route.as_str().unwrap_or("-"));
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
