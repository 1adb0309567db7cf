use serde_json::{json, Value};

use crate::cli::config::load_session;
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(fields), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                fields.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Unwrap the server's response envelope, turning error envelopes into
/// errors carrying the server's message.
pub async fn read_envelope(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|_| anyhow::anyhow!("server returned a non-JSON response ({})", status))?;

    if body.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    } else {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        Err(anyhow::anyhow!("{} ({})", message, status))
    }
}

/// Attach the stored credential markers, when a session exists, so the
/// server resolves the request against the logged-in shop's database.
pub fn with_markers(request: reqwest::RequestBuilder) -> anyhow::Result<reqwest::RequestBuilder> {
    match load_session()? {
        Some(session) => Ok(request.header(reqwest::header::COOKIE, session.cookie_header())),
        None => Ok(request),
    }
}

/// Field accessor for table output: string columns render "-" when absent.
pub fn cell(row: &Value, field: &str) -> String {
    match &row[field] {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
