use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Builds the full router over `state`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes().route_layer(from_fn_with_state(state.clone(), require_auth)));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.api.cors_origins)),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
}

fn protected_routes() -> Router<AppState> {
    use handlers::protected::{auth, chat, contracts};

    Router::new()
        .route("/auth/me", get(auth::me))
        // Collection and record operations
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route(
            "/contracts/:id",
            get(contracts::get).put(contracts::update).delete(contracts::delete),
        )
        // Assistant conversation
        .route("/chat", get(chat::history).post(chat::send).delete(chat::clear))
}

/// Credentialed CORS for the configured front-end origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

async fn root() -> Json<serde_json::Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "status": "success",
        "data": {
            "name": "FarmBazaar API",
            "version": version,
            "description": "Contract-farming marketplace backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/v1/auth/signup, /api/v1/auth/login, /api/v1/auth/logout (public)",
                "me": "/api/v1/auth/me (protected)",
                "contracts": "/api/v1/contracts[/:id] (protected)",
                "chat": "/api/v1/chat (protected)",
                "uploads": "/uploads/:file (public)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.contracts.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "assistant": state.chat.is_configured(),
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
