//! # Server Setup
//!
//! Tracing initialization, application state, route registration and the HTTP
//! server loop with graceful shutdown.

// region: --- Imports
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use lib_ai::UpstreamClient;
use lib_core::{create_pool, AppError, Config, DbPool, MIGRATOR};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};
use utoipa_swagger_ui::SwaggerUi;

use crate::doc::{api_docs, OPENAPI_JSON_PATH, SWAGGER_PATH};
use crate::handlers;
use crate::middleware::mw_req_stamp::request_id;
use crate::middleware::{log_requests, rate_limit, stamp_req, RateLimiter};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream_api_url, config.upstream_api_key.clone())?;
        Ok(Self { db, config, upstream })
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for UpstreamClient {
    fn from_ref(state: &AppState) -> Self {
        state.upstream.clone()
    }
}
// endregion: --- AppState

// region: --- Server Setup
/// Install the global tracing subscriber. The level comes from `LOG_LEVEL`
/// (trace, debug, info, warn, error; default info).
pub fn init_tracing() -> anyhow::Result<()> {
    let log_level = lib_utils::get_env_or("LOG_LEVEL", "info").to_lowercase();

    let level = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => log_level.as_str(),
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {}", e))?;

    info!(" Log level: {}", level);
    Ok(())
}

/// Connect the database, run migrations and serve until SIGINT/SIGTERM.
///
/// # Errors
///
/// This function will return an error if:
/// - The database directory cannot be created
/// - Database connection or migrations fail
/// - The upstream client cannot be built
/// - Server binding fails
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!(" CHAT BACKEND STARTING ({})", config.environment);
    info!("Database URL: {}", config.database_url);

    ensure_sqlite_dir(&config.database_url)?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database_url).await?;

    info!(" Running database migrations...");
    MIGRATOR.run(&pool).await?;
    info!(" Migrations complete");

    let bind_addr = config.bind_addr();
    let state = AppState::new(pool.clone(), config)?;
    info!(" Upstream AI endpoint: {}", state.upstream.endpoint());
    let docs_enabled = !state.config.is_production();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!(" SERVER READY: http://{}", bind_addr);
    log_server_info(docs_enabled);

    // ConnectInfo gives the rate limiter the peer address
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!(" Server stopped");
    Ok(())
}

/// Create the parent directory of a file-backed SQLite URL.
fn ensure_sqlite_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created database directory: {:?}", parent);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, starting graceful shutdown"),
        _ = terminate => info!("SIGTERM received, starting graceful shutdown"),
    }
}

/// Headers set on every response unless the handler already set them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
];

/// Create the main application router with all routes
pub fn create_router(state: AppState) -> Router {
    let limits = &state.config.rate_limits;
    let general_limiter = Arc::new(RateLimiter::new(limits.general.clone()));
    let auth_limiter = Arc::new(RateLimiter::new(limits.auth.clone()));
    let chat_limiter = Arc::new(RateLimiter::new(limits.chat.clone()));
    let cors = cors_layer(&state.config.cors_allowed_origins);

    info!("[ROUTE SETUP] Registering HTTP routes...");

    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(auth_limiter, rate_limit));

    let chat_send_routes = Router::new()
        .route("/api/chat/message", post(handlers::chat::send_message))
        .route("/api/chat/message/stream", post(handlers::chat::send_message_stream))
        .route_layer(from_fn_with_state(chat_limiter, rate_limit));

    let mut routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route(
            "/api/conversations",
            post(handlers::conversations::create_conversation).get(handlers::conversations::list_conversations),
        )
        .route(
            "/api/conversations/{id}",
            get(handlers::conversations::get_conversation)
                .put(handlers::conversations::update_conversation)
                .delete(handlers::conversations::delete_conversation),
        )
        .route("/api/chat/message/{id}", delete(handlers::chat::delete_message))
        .merge(auth_routes)
        .merge(chat_send_routes);

    // Served without auth, so only outside production
    if !state.config.is_production() {
        info!("[ROUTE SETUP] Swagger UI at {}", SWAGGER_PATH);
        routes = routes.merge(SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_JSON_PATH, api_docs()));
    }

    let router = routes
        .fallback(route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(general_limiter, rate_limit))
        .layer(from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        // Outside the trace layer so its span and the logs see the request id
        .layer(from_fn(stamp_req));

    SECURITY_HEADERS
        .iter()
        .fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

async fn route_not_found() -> AppError {
    info!("[404 HANDLER] Unmatched route - returning 404");
    AppError::NotFound("Route not found".to_string())
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("[PANIC] Handler panicked; returning 500");
    AppError::Internal("handler panicked".to_string()).into_response()
}

/// Log server information
fn log_server_info(docs_enabled: bool) {
    info!(" AUTH:");
    info!("   • POST   /api/auth/register");
    info!("   • POST   /api/auth/login");
    info!("   • GET    /api/auth/profile");
    info!(" CONVERSATIONS:");
    info!("   • POST   /api/conversations");
    info!("   • GET    /api/conversations?page=1&limit=20");
    info!("   • GET    /api/conversations/{{id}}");
    info!("   • PUT    /api/conversations/{{id}}");
    info!("   • DELETE /api/conversations/{{id}}");
    info!(" CHAT:");
    info!("   • POST   /api/chat/message");
    info!("   • POST   /api/chat/message/stream (text/event-stream)");
    info!("   • DELETE /api/chat/message/{{id}}");
    info!(" HEALTH:");
    info!("   • GET    /health");
    if docs_enabled {
        info!(" DOCS:");
        info!("   • GET    {}/", SWAGGER_PATH);
        info!("   • GET    {}", OPENAPI_JSON_PATH);
    }
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{body_json, setup_test_db, test_config};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lib_core::dto::ErrorResponse;
    use lib_core::RateLimitRule;
    use std::time::Duration;
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn app_in(environment: &str) -> Router {
        let mut config = test_config("http://unused");
        config.environment = environment.to_string();
        create_router(AppState::new(setup_test_db().await, config).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_environment() {
        let app = create_router(AppState::new(setup_test_db().await, test_config("http://unused")).unwrap());

        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(response.headers()["referrer-policy"], "no-referrer");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["environment"], "test");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = create_router(AppState::new(setup_test_db().await, test_config("http://unused")).unwrap());

        let response = app.oneshot(get("/api/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        let body: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.error, "Route not found");
        assert_eq!(body.code.as_deref(), Some("NotFound"));
        assert_eq!(body.details, None);
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let response = handle_panic(Box::new("secret detail"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.code.as_deref(), Some("Internal"));
    }

    #[tokio::test]
    async fn test_openapi_document_served_outside_production() {
        let app = app_in("development").await;

        let response = app.clone().oneshot(get(OPENAPI_JSON_PATH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert_eq!(doc["info"]["title"], "chat-backend");
        assert!(doc["paths"]["/api/chat/message/stream"]["post"].is_object());
        assert_eq!(doc["components"]["securitySchemes"]["bearer_auth"]["type"], "http");

        let ui = app.oneshot(get("/api-docs/")).await.unwrap();
        assert_eq!(ui.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_docs_hidden_in_production() {
        let app = app_in("production").await;

        for uri in [OPENAPI_JSON_PATH, "/api-docs/"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_general_limiter_returns_429() {
        let mut config = test_config("http://unused");
        config.rate_limits.general = RateLimitRule::new(2, Duration::from_secs(60), "Too many requests");
        let app = create_router(AppState::new(setup_test_db().await, config).unwrap());

        for _ in 0..2 {
            let ok = app.clone().oneshot(get("/health")).await.unwrap();
            assert_eq!(ok.status(), StatusCode::OK);
        }

        let limited = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers()["ratelimit-remaining"], "0");
        assert_eq!(body_json(limited).await["error"], "Too many requests");
    }

    #[test]
    fn test_ensure_sqlite_dir_ignores_memory() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://x").is_ok());
    }
}
