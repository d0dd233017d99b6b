//! # Chat Handlers
//!
//! Sending messages to the AI provider, one-shot or streamed back as SSE.
//!
//! ## Endpoints
//!
//! - `POST /api/chat/message` - Send a message, wait for the full reply
//! - `POST /api/chat/message/stream` - Send a message, receive the reply as SSE events
//! - `DELETE /api/chat/message/{id}` - Delete a single message
//!
//! Both send endpoints persist the user message before the provider is called, so it
//! survives a failed reply. The provider sees the trailing `context_window` messages of
//! the conversation, oldest first, ending with the new one.

mod relay;

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::Stream;
use lib_ai::{ChatMessage, Role, UpstreamClient};
use lib_core::dto::{
    parse_id, ErrorResponse, MessageInfo, MessageResponse, SendMessageRequest, SendMessageResponse,
    StreamEvent, StreamMessage,
};
use lib_core::model::store::{ConversationRepository, Message, MessageRepository, MessageRole};
use lib_core::{AppError, Config, DbPool};
use tracing::{debug, error, info, instrument};
use utoipa::OpenApi;

use crate::middleware::{CurrentUser, ValidatedJson};

use relay::relay;

#[derive(OpenApi)]
#[openapi(
    paths(send_message, send_message_stream, delete_message),
    components(schemas(SendMessageRequest, SendMessageResponse, StreamEvent, StreamMessage))
)]
pub struct ChatApi;

/// The persisted user message plus the history to send upstream.
struct Turn {
    user_message: Message,
    history: Vec<ChatMessage>,
}

#[utoipa::path(
    post,
    path = "/api/chat/message",
    tag = "chat",
    security(("bearer_auth" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "User message and assistant reply", body = SendMessageResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
        (status = 502, description = "AI provider failed", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, conversation_id = %req.conversation_id))]
pub async fn send_message(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    State(upstream): State<UpstreamClient>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let turn = prepare_turn(&pool, &config, &user, &req).await?;

    let reply = upstream.complete(&turn.history).await.map_err(|e| {
        error!("[CHAT] Upstream call failed: {}", e);
        AppError::Upstream(e.to_string())
    })?;

    let assistant_message = MessageRepository::create(
        &pool,
        &turn.user_message.conversation_id,
        MessageRole::Assistant,
        &reply,
    )
    .await?;

    info!("[CHAT] Reply {} stored", assistant_message.id);

    Ok(Json(SendMessageResponse {
        user_message: MessageInfo::from(&turn.user_message),
        assistant_message: MessageInfo::from(&assistant_message),
    }))
}

/// Streams the reply as SSE. Failures after this returns arrive as an `error` event.
#[utoipa::path(
    post,
    path = "/api/chat/message/stream",
    tag = "chat",
    security(("bearer_auth" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "One `StreamEvent` per SSE data line", content_type = "text/event-stream", body = StreamEvent),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, conversation_id = %req.conversation_id))]
pub async fn send_message_stream(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    State(upstream): State<UpstreamClient>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let turn = prepare_turn(&pool, &config, &user, &req).await?;

    info!("[CHAT] Opening stream for message {}", turn.user_message.id);

    let events = relay(pool, upstream, turn.user_message, turn.history);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    delete,
    path = "/api/chat/message/{id}",
    tag = "chat",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, message_id = %id))]
pub async fn delete_message(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "message")?.to_string();

    let message = MessageRepository::find_for_user(&pool, &id, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

    MessageRepository::delete(&pool, &message.id).await?;

    info!("[CHAT] Deleted message {}", message.id);
    Ok(Json(MessageResponse::new("Message deleted successfully")))
}

async fn prepare_turn(
    pool: &DbPool,
    config: &Config,
    user: &CurrentUser,
    req: &SendMessageRequest,
) -> Result<Turn, AppError> {
    let conversation = ConversationRepository::find_for_user(pool, &req.conversation_id, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    let user_message =
        MessageRepository::create(pool, &conversation.id, MessageRole::User, &req.message).await?;

    let window = i64::try_from(config.context_window).unwrap_or(i64::MAX);
    let recent = MessageRepository::recent_for_conversation(pool, &conversation.id, window).await?;
    debug!("[CHAT] Sending {} messages of history", recent.len());

    Ok(Turn {
        user_message,
        history: recent.iter().map(to_chat_message).collect(),
    })
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = match message.role {
        MessageRole::User => Role::User,
        MessageRole::Assistant => Role::Assistant,
        MessageRole::System => Role::System,
    };
    ChatMessage::new(role, message.content.clone())
}
