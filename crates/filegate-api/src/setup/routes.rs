//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES};
use crate::handlers::{admin, audit, auth, files, health};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use filegate_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Build the application router.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let protected = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    let body_limit = usize::try_from(config.max_upload_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let app = public_routes()
        .merge(protected)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(body_limit, "Routes configured");
    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(&format!("{}/auth/login", API_PREFIX), post(auth::login))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/auth/me", API_PREFIX), get(auth::me))
        .route(
            &format!("{}/files", API_PREFIX),
            post(files::upload_file).get(files::list_files),
        )
        .route(
            &format!("{}/files/{{id}}/download", API_PREFIX),
            get(files::download_file),
        )
        .route(
            &format!("{}/files/{{id}}", API_PREFIX),
            delete(files::delete_file),
        )
        .route(
            &format!("{}/audit", API_PREFIX),
            get(audit::list_audit_entries),
        )
        .route(
            &format!("{}/admin/tenants", API_PREFIX),
            get(admin::list_tenants),
        )
        .route(
            &format!("{}/admin/tenants/{{id}}/files", API_PREFIX),
            get(admin::tenant_files),
        )
}
