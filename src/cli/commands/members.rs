use clap::Subcommand;
use serde_json::Value;

use crate::cli::config::resolve_server;
use crate::cli::utils::{cell, output_empty_collection, read_envelope, with_markers};
use crate::cli::{CliContext, OutputFormat};

#[derive(Subcommand)]
pub enum MemberCommands {
    #[command(about = "List members, optionally filtered")]
    List {
        #[arg(long, help = "Filter by membership number")]
        membership_no: Option<String>,

        #[arg(long, help = "Filter by NFC badge UID")]
        nfc_uid: Option<String>,
    },

    #[command(about = "Show one member")]
    Get {
        #[arg(help = "Member id")]
        id: String,
    },
}

pub async fn handle(cmd: MemberCommands, ctx: CliContext) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;
    let client = reqwest::Client::new();

    match cmd {
        MemberCommands::List {
            membership_no,
            nfc_uid,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(membership_no) = membership_no {
                query.push(("membership_no", membership_no));
            }
            if let Some(nfc_uid) = nfc_uid {
                query.push(("nfc_uid", nfc_uid));
            }

            let request = client.get(format!("{}/api/members", server)).query(&query);
            let members = read_envelope(with_markers(request)?.send().await?).await?;
            let members = members.as_array().cloned().unwrap_or_default();

            if members.is_empty() {
                return output_empty_collection(&ctx.output, "members", "No members found");
            }

            match ctx.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&Value::Array(members))?)
                }
                OutputFormat::Text => {
                    println!(
                        "{:<25} {:<30} {:<12} {:<14} {}",
                        "NAME", "EMAIL", "MEMBERSHIP", "NFC", "JOINED"
                    );
                    println!("{}", "-".repeat(100));

                    for member in &members {
                        println!(
                            "{:<25} {:<30} {:<12} {:<14} {}",
                            cell(member, "name"),
                            cell(member, "email"),
                            cell(member, "membership_no"),
                            cell(member, "nfc_uid"),
                            cell(member, "joined_at"),
                        );
                    }
                }
            }
            Ok(())
        }
        MemberCommands::Get { id } => {
            let request = client.get(format!("{}/api/members/{}", server, id));
            let member = read_envelope(with_markers(request)?.send().await?).await?;
            println!("{}", serde_json::to_string_pretty(&member)?);
            Ok(())
        }
    }
}
