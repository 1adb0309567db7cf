// Tenant-scoped data client resolution
//
// Each shop runs against its own Postgres database. Requests carry the shop's
// connection credentials as marker cookies; this module turns those markers
// into a pooled client, falling back to the shared host database when the
// markers are absent or unusable.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{config, HostConfig};
use crate::markers::MarkerSet;

/// Errors from client resolution
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Shop not found: {0}")]
    ShopNotFound(Uuid),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection credentials for one shop database.
///
/// The endpoint URL names the server, user and database; the access key is
/// the password and stays out of the URL so it can be issued and revoked as
/// its own marker.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantCredentials {
    endpoint_url: String,
    access_key: String,
}

impl TenantCredentials {
    pub fn new(endpoint_url: String, access_key: String) -> Self {
        Self {
            endpoint_url,
            access_key,
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Cache key covering both fields, so a rotated access key gets a new
    /// pool instead of reusing one built with the old password.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.endpoint_url.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.access_key.as_bytes());
        let digest = hasher.finalize();
        digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Endpoint description safe for log lines: host, port and database
    /// without the user part.
    pub fn redacted_endpoint(&self) -> String {
        match url::Url::parse(&self.endpoint_url) {
            Ok(parsed) => {
                let host = parsed.host_str().unwrap_or("unknown");
                match parsed.port() {
                    Some(port) => format!("{}:{}{}", host, port, parsed.path()),
                    None => format!("{}{}", host, parsed.path()),
                }
            }
            Err(_) => "<unparseable endpoint>".to_string(),
        }
    }
}

// Credentials must never appear in logs, so no derived Debug here.
impl std::fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("endpoint_url", &self.redacted_endpoint())
            .field("access_key", &"***")
            .finish()
    }
}

/// How a request's client was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientScope {
    /// Credentials came from the request's markers.
    Tenant { endpoint: String },
    /// No usable markers; the shared host database serves the request.
    HostFallback,
}

impl ClientScope {
    pub fn is_host_fallback(&self) -> bool {
        matches!(self, ClientScope::HostFallback)
    }
}

/// A resolved data client: a connection pool plus the scope it was
/// resolved under.
///
/// Debug stays derivable: the pool renders as counters and the scope only
/// ever carries the redacted endpoint.
#[derive(Clone, Debug)]
pub struct ResolvedClient {
    pool: PgPool,
    scope: ClientScope,
}

impl ResolvedClient {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn scope(&self) -> &ClientScope {
        &self.scope
    }
}

/// Centralized connection pool cache keyed by credential fingerprint
pub struct ClientResolver {
    pools: Arc<RwLock<HashMap<String, PgPool>>>,
}

impl ClientResolver {
    fn instance() -> &'static ClientResolver {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<ClientResolver> = OnceLock::new();
        INSTANCE.get_or_init(|| ClientResolver {
            pools: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Create a new ClientResolver instance (for callers that need an
    /// isolated cache)
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a request's client against explicit host settings.
    ///
    /// Markers that parse get a tenant-scoped client. Markers whose endpoint
    /// URL does not parse are treated the same as absent markers: the host
    /// client serves the request. Only a missing or invalid host
    /// configuration is an error.
    pub async fn resolve_with(
        &self,
        markers: &MarkerSet,
        host: &HostConfig,
    ) -> Result<ResolvedClient, ResolverError> {
        if let Some(credentials) = markers.credentials() {
            match self.pool_for(&credentials).await {
                Ok(pool) => {
                    return Ok(ResolvedClient {
                        pool,
                        scope: ClientScope::Tenant {
                            endpoint: credentials.redacted_endpoint(),
                        },
                    });
                }
                Err(ResolverError::InvalidEndpoint(detail)) => {
                    warn!(
                        "Tenant endpoint marker failed to parse ({}); falling back to host client",
                        detail
                    );
                }
                Err(other) => return Err(other),
            }
        }

        let host_credentials = host_credentials(host)?;
        let pool = self.pool_for(&host_credentials).await?;
        Ok(ResolvedClient {
            pool,
            scope: ClientScope::HostFallback,
        })
    }

    /// Get existing pool or create a new one lazily
    async fn pool_for(&self, credentials: &TenantCredentials) -> Result<PgPool, ResolverError> {
        let key = credentials.fingerprint();

        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(&key) {
                return Ok(pool.clone());
            }
        }

        // Construction is offline; the pool connects on first acquire.
        let pool = build_pool(credentials)?;

        // Store in cache
        {
            let mut pools = self.pools.write().await;
            pools.insert(key, pool.clone());
        }

        info!(
            "Created database pool for {}",
            credentials.redacted_endpoint()
        );
        Ok(pool)
    }

    /// Number of pools currently cached
    pub async fn cached_pools(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Close and remove all pools (e.g., on shutdown)
    pub async fn close_all() {
        let resolver = Self::instance();
        let mut pools = resolver.pools.write().await;
        for (key, pool) in pools.drain() {
            pool.close().await;
            info!("Closed database pool {}", key);
        }
    }
}

/// Resolve the data client for a request using the process host settings.
pub async fn resolve(markers: &MarkerSet) -> Result<ResolvedClient, ResolverError> {
    ClientResolver::instance()
        .resolve_with(markers, &config().host)
        .await
}

/// Get the shared host database pool
pub async fn host_pool() -> Result<PgPool, ResolverError> {
    let credentials = host_credentials(&config().host)?;
    ClientResolver::instance().pool_for(&credentials).await
}

/// Build the host pool at startup so unusable host settings fail before
/// the server binds.
pub async fn init_host_pool() -> Result<(), ResolverError> {
    host_pool().await?;
    Ok(())
}

/// Pings the host pool to ensure connectivity
pub async fn health_check() -> Result<(), ResolverError> {
    let pool = host_pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(())
}

/// Look up an active shop's tenant database credentials in the host
/// registry.
pub async fn issue_credentials(
    pool: &PgPool,
    shop_id: Uuid,
) -> Result<TenantCredentials, ResolverError> {
    let row = sqlx::query_as::<_, ShopCredentialsRow>(
        "SELECT endpoint_url, access_key FROM shops WHERE id = $1 AND active",
    )
    .bind(shop_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ResolverError::ShopNotFound(shop_id))?;

    Ok(TenantCredentials::new(row.endpoint_url, row.access_key))
}

#[derive(sqlx::FromRow)]
struct ShopCredentialsRow {
    endpoint_url: String,
    access_key: String,
}

fn host_credentials(host: &HostConfig) -> Result<TenantCredentials, ResolverError> {
    let endpoint_url = host
        .endpoint_url
        .clone()
        .ok_or(ResolverError::ConfigMissing("HOST_ENDPOINT_URL"))?;
    let access_key = host
        .access_key
        .clone()
        .ok_or(ResolverError::ConfigMissing("HOST_ACCESS_KEY"))?;
    Ok(TenantCredentials::new(endpoint_url, access_key))
}

fn build_pool(credentials: &TenantCredentials) -> Result<PgPool, ResolverError> {
    let options = connect_options(credentials)?;
    let database = &config().database;
    Ok(PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.acquire_timeout_secs))
        .connect_lazy_with(options))
}

fn connect_options(credentials: &TenantCredentials) -> Result<PgConnectOptions, ResolverError> {
    let options = PgConnectOptions::from_str(credentials.endpoint_url())
        .map_err(|e| ResolverError::InvalidEndpoint(e.to_string()))?;
    Ok(options.password(credentials.access_key()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(url: &str, key: &str) -> TenantCredentials {
        TenantCredentials::new(url.to_string(), key.to_string())
    }

    fn markers(url: &str, key: &str) -> MarkerSet {
        MarkerSet {
            endpoint_url: Some(url.to_string()),
            access_key: Some(key.to_string()),
        }
    }

    fn host_config(url: &str, key: &str) -> HostConfig {
        HostConfig {
            endpoint_url: Some(url.to_string()),
            access_key: Some(key.to_string()),
        }
    }

    const HOST_URL: &str = "postgres://pos@host-db.internal:5432/leafpos_host";
    const SHOP_URL: &str = "postgres://shop_a@tenant-db.internal:5432/shop_a";

    #[test]
    fn fingerprint_covers_both_fields() {
        let a = credentials(SHOP_URL, "key-1");
        let same = credentials(SHOP_URL, "key-1");
        let rotated = credentials(SHOP_URL, "key-2");
        let moved = credentials(HOST_URL, "key-1");

        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), rotated.fingerprint());
        assert_ne!(a.fingerprint(), moved.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
        assert!(a.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_redacts_credentials() {
        let creds = credentials(SHOP_URL, "secret-key");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret-key"));
        assert!(!rendered.contains("shop_a@"));
    }

    #[test]
    fn redacted_endpoint_drops_user() {
        let creds = credentials(SHOP_URL, "k");
        assert_eq!(creds.redacted_endpoint(), "tenant-db.internal:5432/shop_a");
    }

    #[test]
    fn connect_options_carry_url_parts_and_key() {
        let creds = credentials(SHOP_URL, "k123");
        let options = connect_options(&creds).unwrap();
        assert_eq!(options.get_host(), "tenant-db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "shop_a");
        assert_eq!(options.get_database(), Some("shop_a"));
    }

    #[test]
    fn connect_options_default_port_when_endpoint_omits_it() {
        let creds = credentials("postgres://shop_a@tenant-db.internal/shop_a", "k");
        let options = connect_options(&creds).unwrap();
        assert_eq!(options.get_port(), 5432);
    }

    #[tokio::test]
    async fn resolves_tenant_scope_from_markers() {
        let resolver = ClientResolver::new();
        let resolved = resolver
            .resolve_with(&markers(SHOP_URL, "k"), &host_config(HOST_URL, "hk"))
            .await
            .unwrap();

        assert_eq!(
            resolved.scope(),
            &ClientScope::Tenant {
                endpoint: "tenant-db.internal:5432/shop_a".to_string()
            }
        );
        assert_eq!(resolver.cached_pools().await, 1);
    }

    #[tokio::test]
    async fn resolved_client_debug_stays_redacted() {
        let resolver = ClientResolver::new();
        let resolved = resolver
            .resolve_with(&markers(SHOP_URL, "secret-key"), &host_config(HOST_URL, "hk"))
            .await
            .unwrap();

        let rendered = format!("{:?}", resolved);
        assert!(rendered.contains("scope"));
        assert!(rendered.contains("tenant-db.internal"));
        assert!(!rendered.contains("secret-key"));
        assert!(!rendered.contains("shop_a@"));
    }

    #[tokio::test]
    async fn reuses_cached_pool_for_same_credentials() {
        let resolver = ClientResolver::new();
        let host = host_config(HOST_URL, "hk");
        resolver.resolve_with(&markers(SHOP_URL, "k"), &host).await.unwrap();
        resolver.resolve_with(&markers(SHOP_URL, "k"), &host).await.unwrap();
        assert_eq!(resolver.cached_pools().await, 1);
    }

    #[tokio::test]
    async fn distinct_credentials_get_distinct_pools() {
        let resolver = ClientResolver::new();
        let host = host_config(HOST_URL, "hk");
        resolver.resolve_with(&markers(SHOP_URL, "k"), &host).await.unwrap();
        resolver
            .resolve_with(
                &markers("postgres://shop_b@tenant-db.internal:5432/shop_b", "k"),
                &host,
            )
            .await
            .unwrap();
        assert_eq!(resolver.cached_pools().await, 2);
    }

    #[tokio::test]
    async fn rotated_access_key_gets_fresh_pool() {
        let resolver = ClientResolver::new();
        let host = host_config(HOST_URL, "hk");
        resolver.resolve_with(&markers(SHOP_URL, "old"), &host).await.unwrap();
        resolver.resolve_with(&markers(SHOP_URL, "new"), &host).await.unwrap();
        assert_eq!(resolver.cached_pools().await, 2);
    }

    #[tokio::test]
    async fn absent_markers_fall_back_to_host() {
        let resolver = ClientResolver::new();
        let resolved = resolver
            .resolve_with(&MarkerSet::default(), &host_config(HOST_URL, "hk"))
            .await
            .unwrap();
        assert!(resolved.scope().is_host_fallback());
    }

    #[tokio::test]
    async fn partial_markers_fall_back_to_host() {
        let resolver = ClientResolver::new();
        let partial = MarkerSet {
            endpoint_url: Some(SHOP_URL.to_string()),
            access_key: None,
        };
        let resolved = resolver
            .resolve_with(&partial, &host_config(HOST_URL, "hk"))
            .await
            .unwrap();
        assert!(resolved.scope().is_host_fallback());
    }

    #[tokio::test]
    async fn malformed_endpoint_marker_falls_back_to_host() {
        let resolver = ClientResolver::new();
        let resolved = resolver
            .resolve_with(&markers("not a url", "k"), &host_config(HOST_URL, "hk"))
            .await
            .unwrap();
        assert!(resolved.scope().is_host_fallback());
        // Only the host pool should have been cached.
        assert_eq!(resolver.cached_pools().await, 1);
    }

    #[tokio::test]
    async fn missing_host_endpoint_is_config_error() {
        let resolver = ClientResolver::new();
        let host = HostConfig {
            endpoint_url: None,
            access_key: Some("hk".to_string()),
        };
        let err = resolver
            .resolve_with(&MarkerSet::default(), &host)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::ConfigMissing("HOST_ENDPOINT_URL")
        ));
    }

    #[tokio::test]
    async fn missing_host_access_key_is_config_error() {
        let resolver = ClientResolver::new();
        let host = HostConfig {
            endpoint_url: Some(HOST_URL.to_string()),
            access_key: None,
        };
        let err = resolver
            .resolve_with(&MarkerSet::default(), &host)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::ConfigMissing("HOST_ACCESS_KEY")));
    }

    #[tokio::test]
    async fn malformed_host_endpoint_is_config_error() {
        let resolver = ClientResolver::new();
        let err = resolver
            .resolve_with(&MarkerSet::default(), &host_config("nonsense", "hk"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::InvalidEndpoint(_)));
    }
}
