//! # API Docs
//!
//! OpenAPI document assembled from the per-area handler docs, served by Swagger UI
//! at `/api-docs` outside production.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{auth, chat, conversations, health};

pub const SWAGGER_PATH: &str = "/api-docs";
pub const OPENAPI_JSON_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "chat-backend",
        description = "Authenticated AI chat API with conversation history and SSE streaming",
        version = "1.0.0"
    ),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "conversations", description = "Conversation CRUD"),
        (name = "chat", description = "Messages and AI replies"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(auth::AuthApi::openapi());
    root.merge(conversations::ConversationsApi::openapi());
    root.merge(chat::ChatApi::openapi());
    SecurityAddon.modify(&mut root);
    root
}
