// POST /auth/login and /auth/logout (host-scoped)

use axum::{
    http::{header::SET_COOKIE, HeaderName},
    response::AppendHeaders,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::config::config;
use crate::error::ApiError;
use crate::markers;
use crate::middleware::response::ApiResponse;
use crate::models::{Shop, User, UserPublic};
use crate::tenant;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub nfc_uid: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

enum LoginMethod<'a> {
    Nfc(&'a str),
    Password { username: &'a str, password: &'a str },
}

/// Decide which authentication path a login body selects. NFC wins when
/// both are supplied, matching the PoS terminals which always send the
/// badge field first.
fn login_method(payload: &LoginRequest) -> Result<LoginMethod<'_>, ApiError> {
    if let Some(nfc_uid) = payload.nfc_uid.as_deref() {
        if !nfc_uid.is_empty() {
            return Ok(LoginMethod::Nfc(nfc_uid));
        }
    }
    match (payload.username.as_deref(), payload.password.as_deref()) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok(LoginMethod::Password { username, password })
        }
        _ => Err(ApiError::validation(
            "Provide nfc_uid, or username and password",
        )),
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

type MarkerHeaders = AppendHeaders<[(HeaderName, String); 2]>;

/// POST /auth/login - authenticate a staff user and issue credential markers
///
/// Body carries either `{ nfc_uid }` or `{ username, password }`. On
/// success the shop's tenant database credentials are fetched from the
/// host registry and written as marker cookies alongside the sanitized
/// user payload.
pub async fn login(
    Json(payload): Json<LoginRequest>,
) -> Result<(MarkerHeaders, ApiResponse<Value>), ApiError> {
    let method = login_method(&payload)?;
    let pool = tenant::host_pool().await?;

    let user = match method {
        LoginMethod::Nfc(nfc_uid) => {
            // One generic message for any miss; UIDs are not enumerable.
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE nfc_uid = $1")
                .bind(nfc_uid)
                .fetch_optional(&pool)
                .await?
                .ok_or_else(|| ApiError::unauthorized("Invalid NFC UID."))?
        }
        LoginMethod::Password { username, password } => {
            let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&pool)
                .await?;
            // Same message for unknown user and wrong password.
            match user {
                Some(user) if user.password_hash == sha256_hex(password) => user,
                _ => return Err(ApiError::unauthorized("Invalid credentials.")),
            }
        }
    };

    let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1 AND active")
        .bind(user.shop_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Shop is not active."))?;

    let credentials = tenant::issue_credentials(&pool, shop.id).await?;
    let [endpoint_marker, key_marker] =
        markers::issue_markers(&credentials, config().security.secure_markers);

    tracing::info!("User {} logged in to shop {}", user.username, shop.name);

    let user: UserPublic = user.into();
    Ok((
        AppendHeaders([(SET_COOKIE, endpoint_marker), (SET_COOKIE, key_marker)]),
        ApiResponse::success(json!({
            "user": user,
            "shop": shop.name,
        })),
    ))
}

/// POST /auth/logout - clear both credential markers
pub async fn logout() -> (MarkerHeaders, ApiResponse<Value>) {
    let [endpoint_marker, key_marker] = markers::clear_markers(config().security.secure_markers);
    (
        AppendHeaders([(SET_COOKIE, endpoint_marker), (SET_COOKIE, key_marker)]),
        ApiResponse::success(json!({ "logged_out": true })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        nfc_uid: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> LoginRequest {
        LoginRequest {
            nfc_uid: nfc_uid.map(String::from),
            username: username.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn nfc_uid_selects_nfc_login() {
        let payload = request(Some("04:a2:b3"), None, None);
        assert!(matches!(
            login_method(&payload),
            Ok(LoginMethod::Nfc("04:a2:b3"))
        ));
    }

    #[test]
    fn nfc_uid_wins_over_password_fields() {
        let payload = request(Some("04:a2:b3"), Some("alice"), Some("pw"));
        assert!(matches!(login_method(&payload), Ok(LoginMethod::Nfc(_))));
    }

    #[test]
    fn username_and_password_select_password_login() {
        let payload = request(None, Some("alice"), Some("pw"));
        assert!(matches!(
            login_method(&payload),
            Ok(LoginMethod::Password {
                username: "alice",
                password: "pw"
            })
        ));
    }

    #[test]
    fn empty_body_is_a_validation_error() {
        assert!(login_method(&request(None, None, None)).is_err());
        assert!(login_method(&request(Some(""), None, None)).is_err());
        assert!(login_method(&request(None, Some("alice"), None)).is_err());
        assert!(login_method(&request(None, Some("alice"), Some(""))).is_err());
        assert!(login_method(&request(None, None, Some("pw"))).is_err());
    }

    #[test]
    fn sha256_hex_matches_known_digests() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
