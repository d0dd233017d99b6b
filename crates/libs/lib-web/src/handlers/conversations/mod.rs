//! # Conversation Handlers
//!
//! CRUD over the authenticated user's conversations.
//!
//! ## Endpoints
//!
//! - `POST /api/conversations` - Create a conversation (201)
//! - `GET /api/conversations?page=&limit=` - List, most recently active first
//! - `GET /api/conversations/{id}` - Conversation with its full message history
//! - `PUT /api/conversations/{id}` - Rename
//! - `DELETE /api/conversations/{id}` - Delete along with its messages
//!
//! A conversation owned by someone else is reported exactly like a missing one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lib_core::dto::{
    parse_id, ConversationDetailResponse, ConversationInfo, ConversationListResponse,
    ConversationResponse, ConversationUpdatedInfo, CreateConversationRequest, ErrorResponse,
    ListConversationsQuery, MessageInfo, MessageResponse, Pagination, UpdateConversationRequest,
};
use lib_core::model::store::{
    ConversationRepository, MessageRepository, MessageRole, DEFAULT_CONVERSATION_TITLE,
};
use lib_core::{AppError, DbPool};
use tracing::{debug, info, instrument};
use utoipa::OpenApi;

use crate::middleware::{CurrentUser, ValidatedJson};

#[derive(OpenApi)]
#[openapi(
    paths(
        create_conversation,
        list_conversations,
        get_conversation,
        update_conversation,
        delete_conversation
    ),
    components(schemas(
        CreateConversationRequest,
        UpdateConversationRequest,
        ConversationInfo,
        ConversationUpdatedInfo,
        ConversationListResponse,
        ConversationDetailResponse,
        Pagination,
        MessageInfo,
        MessageRole,
        MessageResponse
    ))
)]
pub struct ConversationsApi;

fn not_found() -> AppError {
    AppError::NotFound("Conversation not found".to_string())
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "conversations",
    security(("bearer_auth" = [])),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse<ConversationInfo>),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_conversation(
    State(pool): State<DbPool>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationResponse<ConversationInfo>>), AppError> {
    let title = req.title.as_deref().unwrap_or(DEFAULT_CONVERSATION_TITLE);
    let conversation = ConversationRepository::create(&pool, &user.id, title).await?;

    info!("[CONVERSATION] Created {}", conversation.id);

    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse {
            message: "Conversation created successfully".to_string(),
            conversation: ConversationInfo::from(&conversation),
        }),
    ))
}

/// Lists one page of conversations. Unparseable `page`/`limit` fall back to defaults.
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "conversations",
    security(("bearer_auth" = [])),
    params(ListConversationsQuery),
    responses(
        (status = 200, description = "One page of conversations", body = ConversationListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_conversations(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Query(query): Query<ListConversationsQuery>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let (page, limit) = (query.page(), query.limit());
    debug!("[CONVERSATION] Listing page {} (limit {})", page, limit);

    let page = ConversationRepository::list_for_user(&pool, &user.id, page, limit).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{id}",
    tag = "conversations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation with its messages", body = ConversationDetailResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, conversation_id = %id))]
pub async fn get_conversation(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ConversationDetailResponse>, AppError> {
    let id = parse_id(&id, "conversation")?.to_string();

    let conversation = ConversationRepository::find_for_user(&pool, &id, &user.id)
        .await?
        .ok_or_else(not_found)?;
    let messages = MessageRepository::list_for_conversation(&pool, &conversation.id).await?;

    Ok(Json(ConversationDetailResponse {
        conversation: ConversationInfo::from(&conversation),
        messages: messages.iter().map(MessageInfo::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/conversations/{id}",
    tag = "conversations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Conversation id")),
    request_body = UpdateConversationRequest,
    responses(
        (status = 200, description = "Conversation renamed", body = ConversationResponse<ConversationUpdatedInfo>),
        (status = 400, description = "Malformed id or invalid title", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, conversation_id = %id))]
pub async fn update_conversation(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateConversationRequest>,
) -> Result<Json<ConversationResponse<ConversationUpdatedInfo>>, AppError> {
    let id = parse_id(&id, "conversation")?.to_string();

    let conversation = ConversationRepository::update_title(&pool, &id, &user.id, &req.title)
        .await?
        .ok_or_else(not_found)?;

    info!("[CONVERSATION] Renamed {}", conversation.id);

    Ok(Json(ConversationResponse {
        message: "Conversation updated successfully".to_string(),
        conversation: ConversationUpdatedInfo::from(&conversation),
    }))
}

/// Deletes the conversation and every message in it, atomically.
#[utoipa::path(
    delete,
    path = "/api/conversations/{id}",
    tag = "conversations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id, conversation_id = %id))]
pub async fn delete_conversation(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "conversation")?.to_string();

    if !ConversationRepository::delete_for_user(&pool, &id, &user.id).await? {
        return Err(not_found());
    }

    info!("[CONVERSATION] Deleted {}", id);
    Ok(Json(MessageResponse::new("Conversation deleted successfully")))
}
