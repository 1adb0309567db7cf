use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::markers::{MARKER_ACCESS_KEY, MARKER_ENDPOINT_URL};

/// Stored result of `leafctl auth login`: which server we authenticated
/// against, the credential markers it issued, and who logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliSession {
    pub server_url: String,
    pub endpoint_url: String,
    pub access_key: String,
    pub username: String,
    pub shop: String,
    pub logged_in_at: DateTime<Utc>,
}

impl CliSession {
    /// Cookie header value carrying both markers, percent-encoded the same
    /// way the server issues them.
    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            MARKER_ENDPOINT_URL,
            urlencoding::encode(&self.endpoint_url),
            MARKER_ACCESS_KEY,
            urlencoding::encode(&self.access_key),
        )
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("LEAFCTL_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("leafpos").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session() -> anyhow::Result<Option<CliSession>> {
    let session_file = get_config_dir()?.join("session.json");

    if !session_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(session_file)?;
    let session: CliSession = serde_json::from_str(&content)?;
    Ok(Some(session))
}

pub fn save_session(session: &CliSession) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");

    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");

    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}

/// Server picked by precedence: the --server flag, then the stored session,
/// then LEAFCTL_SERVER, then the development default.
pub fn resolve_server(flag: Option<&str>) -> anyhow::Result<String> {
    if let Some(url) = flag {
        return Ok(trim_trailing_slash(url));
    }
    if let Some(session) = load_session()? {
        return Ok(session.server_url);
    }
    if let Ok(url) = std::env::var("LEAFCTL_SERVER") {
        return Ok(trim_trailing_slash(&url));
    }
    Ok("http://localhost:3000".to_string())
}

fn trim_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
