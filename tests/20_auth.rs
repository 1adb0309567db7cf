mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_without_a_method_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn login_with_username_but_no_password_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "username": "alice" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn login_with_unknown_nfc_uid_sets_no_markers() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "nfc_uid": "00:00:00:00:00:00:00" }))
        .send()
        .await?;

    // Unauthorized against a live host database; backend error when the
    // suite runs without one. Either way: error envelope, no markers.
    assert!(
        res.status() == StatusCode::UNAUTHORIZED
            || res.status() == StatusCode::INTERNAL_SERVER_ERROR,
        "expected UNAUTHORIZED or INTERNAL_SERVER_ERROR, got {}",
        res.status()
    );

    let unauthorized = res.status() == StatusCode::UNAUTHORIZED;
    assert!(
        res.headers().get_all(reqwest::header::SET_COOKIE).iter().count() == 0,
        "failed login must not issue credential markers"
    );

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    if unauthorized {
        assert_eq!(body["error"], "Invalid NFC UID.");
    }

    Ok(())
}

#[tokio::test]
async fn logout_clears_both_markers() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/logout", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    let cookies: Vec<String> = res
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect();

    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("endpointURL=") && c.contains("Max-Age=0")),
        "endpointURL marker not cleared: {:?}",
        cookies
    );
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("accessKey=") && c.contains("Max-Age=0")),
        "accessKey marker not cleared: {:?}",
        cookies
    );

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);

    Ok(())
}
