use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{clear_session, load_session, resolve_server, save_session, CliSession};
use crate::cli::utils::{output_success, read_envelope};
use crate::cli::{CliContext, OutputFormat};
use crate::markers::{MARKER_ACCESS_KEY, MARKER_ENDPOINT_URL};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login and store the issued credential markers locally")]
    Login {
        #[arg(help = "Username")]
        username: Option<String>,

        #[arg(long, help = "Password (or set LEAFCTL_PASSWORD)")]
        password: Option<String>,

        #[arg(long, help = "Login with an NFC badge UID instead of a password")]
        nfc: Option<String>,
    },

    #[command(about = "Logout and discard the stored markers")]
    Logout,

    #[command(about = "Show the current login session")]
    Status,
}

pub async fn handle(cmd: AuthCommands, ctx: CliContext) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login {
            username,
            password,
            nfc,
        } => login(username, password, nfc, ctx).await,
        AuthCommands::Logout => logout(ctx).await,
        AuthCommands::Status => status(ctx),
    }
}

async fn login(
    username: Option<String>,
    password: Option<String>,
    nfc: Option<String>,
    ctx: CliContext,
) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;

    let body = match (&nfc, &username) {
        (Some(nfc_uid), _) => json!({ "nfc_uid": nfc_uid }),
        (None, Some(username)) => {
            let password = password
                .or_else(|| std::env::var("LEAFCTL_PASSWORD").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("password required: pass --password or set LEAFCTL_PASSWORD")
                })?;
            json!({ "username": username, "password": password })
        }
        (None, None) => {
            return Err(anyhow::anyhow!("provide a username or --nfc <UID>"));
        }
    };

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/auth/login", server))
        .json(&body)
        .send()
        .await?;

    // Markers ride on Set-Cookie; grab them before the body is consumed.
    let endpoint_url = marker_from_headers(response.headers(), MARKER_ENDPOINT_URL);
    let access_key = marker_from_headers(response.headers(), MARKER_ACCESS_KEY);

    let data = read_envelope(response).await?;

    let (Some(endpoint_url), Some(access_key)) = (endpoint_url, access_key) else {
        return Err(anyhow::anyhow!(
            "login succeeded but the server issued no credential markers"
        ));
    };

    let session = CliSession {
        server_url: server,
        endpoint_url,
        access_key,
        username: data["user"]["username"].as_str().unwrap_or("").to_string(),
        shop: data["shop"].as_str().unwrap_or("").to_string(),
        logged_in_at: Utc::now(),
    };
    save_session(&session)?;

    output_success(
        &ctx.output,
        &format!("Logged in as {} ({})", session.username, session.shop),
        Some(json!({
            "user": data["user"],
            "shop": session.shop,
            "server": session.server_url,
        })),
    )
}

async fn logout(ctx: CliContext) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;

    // Best effort: the local session is discarded even when the server is
    // unreachable.
    let client = reqwest::Client::new();
    let server_result = client.post(format!("{}/auth/logout", server)).send().await;

    clear_session()?;

    if let Err(e) = server_result {
        eprintln!("Warning: server logout failed ({}); local session cleared", e);
    }

    output_success(&ctx.output, "Logged out", None)
}

fn status(ctx: CliContext) -> anyhow::Result<()> {
    match load_session()? {
        Some(session) => match ctx.output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "logged_in": true,
                        "username": session.username,
                        "shop": session.shop,
                        "server": session.server_url,
                        "logged_in_at": session.logged_in_at,
                    }))?
                );
                Ok(())
            }
            OutputFormat::Text => {
                println!("Logged in as {} ({})", session.username, session.shop);
                println!("Server: {}", session.server_url);
                println!(
                    "Since:  {}",
                    session.logged_in_at.format("%Y-%m-%d %H:%M UTC")
                );
                Ok(())
            }
        },
        None => match ctx.output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "logged_in": false }))?
                );
                Ok(())
            }
            OutputFormat::Text => {
                println!("Not logged in");
                Ok(())
            }
        },
    }
}

/// Pull a named marker's value out of the response's Set-Cookie headers.
fn marker_from_headers(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|header| header.split(';').next())
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(&prefix))
        .and_then(|raw| urlencoding::decode(raw).ok())
        .map(|decoded| decoded.into_owned())
}
