//! # Conversation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use lib_utils::validate_length;

use super::chat::MessageInfo;
use super::{invalid, Validate};
use crate::error::Result;
use crate::model::store::{Conversation, Page};

pub const MAX_TITLE_LEN: usize = 200;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

impl Validate for CreateConversationRequest {
    fn validate(self) -> Result<Self> {
        let title = match self.title {
            Some(title) => Some(validate_title(&title)?),
            None => None,
        };
        Ok(Self { title })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UpdateConversationRequest {
    pub title: String,
}

impl Validate for UpdateConversationRequest {
    fn validate(self) -> Result<Self> {
        Ok(Self {
            title: validate_title(&self.title)?,
        })
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    validate_length(title, 1, MAX_TITLE_LEN, "Title").map_err(invalid)?;
    Ok(title.to_string())
}

/// Raw `?page=&limit=` query. Kept as strings so bad values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListConversationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListConversationsQuery {
    /// Positive page number, default 1.
    pub fn page(&self) -> i64 {
        positive_or(self.page.as_deref(), DEFAULT_PAGE)
    }

    /// Positive page size, default 20, capped at [`MAX_LIMIT`].
    pub fn limit(&self) -> i64 {
        positive_or(self.limit.as_deref(), DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInfo {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationInfo {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.clone(),
            title: c.title.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Trimmed view returned after a rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUpdatedInfo {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationUpdatedInfo {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.clone(),
            title: c.title.clone(),
            updated_at: c.updated_at,
        }
    }
}

/// Create response, and update response with [`ConversationUpdatedInfo`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConversationResponse<T> {
    pub message: String,
    pub conversation: T,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationInfo>,
    pub pagination: Pagination,
}

impl From<Page<Conversation>> for ConversationListResponse {
    fn from(page: Page<Conversation>) -> Self {
        let pagination = Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        };
        Self {
            conversations: page.items.iter().map(ConversationInfo::from).collect(),
            pagination,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationInfo,
    pub messages: Vec<MessageInfo>,
}

/// Plain acknowledgement, e.g. `{"message":"Conversation deleted successfully"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> ListConversationsQuery {
        ListConversationsQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_pagination_defaults_and_fallbacks() {
        assert_eq!(query(None, None).page(), 1);
        assert_eq!(query(None, None).limit(), 20);
        assert_eq!(query(Some("0"), Some("-5")).page(), 1);
        assert_eq!(query(Some("abc"), Some("abc")).limit(), 20);
        assert_eq!(query(Some("3"), Some("7")).page(), 3);
        assert_eq!(query(None, Some("1000")).limit(), MAX_LIMIT);
    }

    #[test]
    fn test_title_is_trimmed_and_bounded() {
        let req = UpdateConversationRequest { title: "  Trip plans ".to_string() }
            .validate()
            .unwrap();
        assert_eq!(req.title, "Trip plans");

        let too_long = UpdateConversationRequest { title: "x".repeat(MAX_TITLE_LEN + 1) };
        assert!(too_long.validate().is_err());

        let empty = CreateConversationRequest { title: Some("  ".to_string()) };
        assert!(empty.validate().is_err());

        let absent = CreateConversationRequest { title: None }.validate().unwrap();
        assert!(absent.title.is_none());
    }
}
