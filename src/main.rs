use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use leafpos_api::handlers::{auth, invoices, kiosk, members, products, sessions, transactions};
use leafpos_api::is_development;
use leafpos_api::middleware::resolve_client_middleware;
use leafpos_api::tenant;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up HOST_ENDPOINT_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = leafpos_api::config::config();
    tracing::info!("Starting leafpos API in {:?} mode", config.environment);

    // Host settings must be present and parseable before any traffic is
    // served; connectivity itself may still be on its way up.
    if let Err(e) = tenant::init_host_pool().await {
        tracing::error!("Host database configuration is unusable: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = tenant::health_check().await {
        tracing::warn!("Host database not reachable yet: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("LEAFPOS_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("leafpos API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    tenant::ClientResolver::close_all().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Host-scoped: talk to the host database, never consult markers
        .merge(auth_routes())
        .merge(session_routes())
        // Tenant-scoped: behind the resolver middleware
        .merge(tenant_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
}

fn session_routes() -> Router {
    Router::new()
        .route("/api/sessions", get(sessions::list).post(sessions::create))
        .route("/api/sessions/:id/end", put(sessions::end))
}

fn tenant_routes() -> Router {
    Router::new()
        .route(
            "/api/products",
            get(products::list)
                .post(products::create)
                .put(products::update_bulk),
        )
        .route(
            "/api/products/:id",
            get(products::get).delete(products::delete),
        )
        .route(
            "/api/members",
            get(members::list)
                .post(members::create)
                .put(members::update_bulk),
        )
        .route("/api/members/:id", get(members::get).delete(members::delete))
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/api/transactions/:id", get(transactions::get))
        .route(
            "/api/invoices",
            get(invoices::list)
                .post(invoices::create)
                .put(invoices::update_bulk),
        )
        .route(
            "/api/invoices/:id",
            get(invoices::get).delete(invoices::delete),
        )
        .route(
            "/api/kiosk/orders",
            get(kiosk::list).post(kiosk::create).put(kiosk::update_bulk),
        )
        .route(
            "/api/kiosk/orders/:id",
            get(kiosk::get).delete(kiosk::delete),
        )
        .route("/api/kiosk/orders/:id/status", put(kiosk::update_status))
        .route("/api/kiosk/orders/:id/complete", post(kiosk::complete))
        .layer(from_fn(resolve_client_middleware))
}

fn cors_layer() -> CorsLayer {
    let config = leafpos_api::config::config();
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if is_development!() {
        return CorsLayer::permissive();
    }

    // Markers are cookies, so browsers need credentialed CORS; that rules
    // out wildcard origins.
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "leafpos API",
            "version": version,
            "description": "Point-of-sale and kiosk backend with per-shop tenant databases",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/login, /auth/logout (host-scoped)",
                "sessions": "/api/sessions[/:id/end] (host-scoped)",
                "products": "/api/products[/:id] (tenant-scoped)",
                "members": "/api/members[/:id] (tenant-scoped)",
                "transactions": "/api/transactions[/:id] (tenant-scoped)",
                "invoices": "/api/invoices[/:id] (tenant-scoped)",
                "kiosk": "/api/kiosk/orders[/:id] (tenant-scoped)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match tenant::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
