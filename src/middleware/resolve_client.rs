use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::markers::MarkerSet;
use crate::tenant::{self, ClientScope};

/// Middleware that resolves the data client for tenant-scoped routes.
///
/// Requests carrying usable credential markers get a client scoped to their
/// shop database. Requests without them are served by the host client; the
/// scope tag on the injected [`tenant::ResolvedClient`] lets handlers and
/// logs tell the two apart.
pub async fn resolve_client_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let markers = MarkerSet::from_headers(request.headers());
    let resolved = tenant::resolve(&markers).await?;

    match resolved.scope() {
        ClientScope::Tenant { endpoint } => {
            debug!("Resolved tenant client for {}", endpoint);
        }
        ClientScope::HostFallback => {
            warn!(
                "No usable credential markers on {}; serving with host client",
                request.uri().path()
            );
        }
    }

    request.extensions_mut().insert(resolved);
    Ok(next.run(request).await)
}
