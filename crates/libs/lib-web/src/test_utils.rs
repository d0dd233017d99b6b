//! Shared helpers for handler and router tests.

use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use lib_auth::encode_jwt;
use lib_core::model::store::{UserForCreate, UserRepository};
use lib_core::{Config, DbPool, RateLimitConfig, RateLimitRule, MIGRATOR};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use crate::server::{create_router, AppState};

pub const TEST_SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long!";

/// Fresh in-memory database with migrations applied.
pub async fn setup_test_db() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create test database");

    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}

/// Config pointing at `upstream_url`, with quotas high enough not to interfere.
pub fn test_config(upstream_url: &str) -> Config {
    let roomy = |msg: &str| RateLimitRule::new(10_000, Duration::from_secs(60), msg);
    Config {
        bind_host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration_hours: 24,
        upstream_api_key: "test-upstream-key".to_string(),
        upstream_api_url: upstream_url.to_string(),
        environment: "test".to_string(),
        context_window: 20,
        cors_allowed_origins: Vec::new(),
        rate_limits: RateLimitConfig {
            general: roomy("general"),
            auth: roomy("auth"),
            chat: roomy("chat"),
        },
    }
}

/// Full application router over `pool`.
pub fn test_app(pool: DbPool, config: Config) -> Router {
    create_router(AppState::new(pool, config).expect("Failed to build app state"))
}

/// Insert a user directly and return `(user_id, bearer token)`.
pub async fn create_user(pool: &DbPool, email: &str) -> (String, String) {
    let user = UserRepository::create(
        pool,
        UserForCreate::new(email.to_string(), "not-a-real-hash".to_string(), None),
    )
    .await
    .unwrap();
    let token = encode_jwt(&user.id, &user.email, TEST_SECRET, 1).unwrap();
    (user.id, token)
}

/// Build a JSON request, with a bearer token when given.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request through a clone of `app`, returning status and JSON body.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap()
}

/// Decode an SSE body into the JSON payloads of its `data:` lines.
pub async fn sse_events(response: Response) -> Vec<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec())
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

// region: --- Fake upstream provider

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Provider that answers one-shot calls with `reply` and streaming calls with `frames`.
pub async fn fake_provider(reply: &'static str, frames: &'static str) -> String {
    let router = Router::new().route(
        "/chat",
        post(move |Json(body): Json<Value>| async move {
            if body["stream"] == Value::Bool(true) {
                ([("content-type", "text/event-stream")], frames).into_response()
            } else {
                Json(serde_json::json!({ "content": reply })).into_response()
            }
        }),
    );
    spawn_upstream(router).await
}

/// Provider that echoes the number of messages it received, for history checks.
pub async fn counting_provider() -> String {
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            let count = body["messages"].as_array().map(|m| m.len()).unwrap_or(0);
            let last = body["messages"]
                .as_array()
                .and_then(|m| m.last())
                .and_then(|m| m["content"].as_str())
                .unwrap_or_default()
                .to_string();
            Json(serde_json::json!({ "content": format!("{}:{}", count, last) }))
        }),
    );
    spawn_upstream(router).await
}

/// Provider that fails every call with `status` and a JSON `error`.
pub async fn failing_provider(status: StatusCode, error: &'static str) -> String {
    let router = Router::new().route(
        "/chat",
        post(move || async move { (status, Json(serde_json::json!({ "error": error }))) }),
    );
    spawn_upstream(router).await
}

/// Provider whose stream sends one frame and then aborts the connection.
pub async fn broken_stream_provider() -> String {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            let chunks = futures_util::stream::iter(vec![
                Ok::<_, std::io::Error>("data: {\"content\":\"Hel\"}\n".to_string()),
                Err(std::io::Error::other("connection reset")),
            ]);
            ([("content-type", "text/event-stream")], Body::from_stream(chunks))
        }),
    );
    spawn_upstream(router).await
}

/// Provider that deletes every conversation in `pool` before streaming `frames`, so
/// the reply has nowhere to be stored.
pub async fn conversation_wiping_provider(pool: DbPool, frames: &'static str) -> String {
    let router = Router::new().route(
        "/chat",
        post(move || {
            let pool = pool.clone();
            async move {
                sqlx::query("DELETE FROM conversations").execute(&pool).await.unwrap();
                ([("content-type", "text/event-stream")], frames)
            }
        }),
    );
    spawn_upstream(router).await
}

/// Provider that sends one frame, pauses for `pause`, then finishes the reply.
pub async fn slow_provider(pause: Duration) -> String {
    let router = Router::new().route(
        "/chat",
        post(move || async move {
            let chunks = async_stream::stream! {
                yield Ok::<_, std::io::Error>("data: {\"content\":\"Hel\"}\n\n".to_string());
                tokio::time::sleep(pause).await;
                yield Ok("data: {\"content\":\"lo\"}\n\ndata: [DONE]\n\n".to_string());
            };
            ([("content-type", "text/event-stream")], Body::from_stream(chunks))
        }),
    );
    spawn_upstream(router).await
}

/// Base URL where nothing listens.
pub async fn unreachable_provider() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// endregion: --- Fake upstream provider
