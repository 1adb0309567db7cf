use clap::Subcommand;
use serde_json::Value;

use crate::cli::config::resolve_server;
use crate::cli::utils::{cell, output_empty_collection, read_envelope};
use crate::cli::{CliContext, OutputFormat};

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "List recent PoS terminal sessions, newest first")]
    List {
        #[arg(long, help = "Only sessions for this user id")]
        user_id: Option<String>,

        #[arg(long, help = "Maximum number of sessions to return")]
        limit: Option<u32>,
    },
}

pub async fn handle(cmd: SessionCommands, ctx: CliContext) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;
    let client = reqwest::Client::new();

    match cmd {
        SessionCommands::List { user_id, limit } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(user_id) = user_id {
                query.push(("user_id", user_id));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }

            // Session logs are host-scoped; no markers needed.
            let response = client
                .get(format!("{}/api/sessions", server))
                .query(&query)
                .send()
                .await?;
            let sessions = read_envelope(response).await?;
            let sessions = sessions.as_array().cloned().unwrap_or_default();

            if sessions.is_empty() {
                return output_empty_collection(&ctx.output, "sessions", "No sessions logged");
            }

            match ctx.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&Value::Array(sessions))?)
                }
                OutputFormat::Text => {
                    println!(
                        "{:<36} {:<12} {:<22} {}",
                        "ID", "TERMINAL", "STARTED", "ENDED"
                    );
                    println!("{}", "-".repeat(95));

                    for session in &sessions {
                        let ended = match &session["ended_at"] {
                            Value::Null => "open".to_string(),
                            other => other.as_str().unwrap_or("-").to_string(),
                        };
                        println!(
                            "{:<36} {:<12} {:<22} {}",
                            cell(session, "id"),
                            cell(session, "terminal"),
                            cell(session, "started_at"),
                            ended,
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
