//! Application route configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use futures::future::join_all;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::account_routes;
use super::middleware::session_layer;
use super::openapi::ApiDoc;
use super::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const CORS_MAX_AGE: Duration = Duration::from_secs(300);

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(account_routes(state.clone()))
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(cors_layer(state.allowed_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the frontend origin; no origin means same-origin only.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE);

    match origin.map(|o| o.trim_end_matches('/').parse::<HeaderValue>()) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Ignoring unparseable CORS origin");
            cors
        }
        None => cors,
    }
}

/// Root endpoint
async fn root() -> &'static str {
    "Inquiro API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: BTreeMap<&'static str, ServiceStatus>,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint pinging every registered dependency
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = state.probes.iter().map(|probe| async move {
        let result = match tokio::time::timeout(PROBE_TIMEOUT, probe.ping()).await {
            Ok(result) => result,
            Err(_) => Err(format!("no answer within {}s", PROBE_TIMEOUT.as_secs())),
        };
        (probe.name(), result)
    });

    let services: BTreeMap<_, _> = join_all(checks)
        .await
        .into_iter()
        .map(|(name, result)| {
            let status = match result {
                Ok(()) => ServiceStatus {
                    status: "healthy",
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(service = name, error = %e, "Health probe failed");
                    ServiceStatus {
                        status: "unhealthy",
                        error: Some(e),
                    }
                }
            };
            (name, status)
        })
        .collect();

    let all_healthy = services.values().all(|s| s.status == "healthy");

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if all_healthy { "healthy" } else { "degraded" },
            services,
        }),
    )
}
