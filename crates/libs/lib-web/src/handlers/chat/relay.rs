//! SSE relay from the provider's fragment stream to the client.
//!
//! Event order is `user_message`, zero or more `chunk`, then exactly one of `done` or
//! `error`. The assistant message is stored only on `done`, with the concatenated chunk
//! text as its content.
//!
//! Each fragment is forwarded before the next one is read. When the client goes away
//! the response body is dropped, which drops this stream and the provider connection.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures_util::{Stream, StreamExt};
use lib_ai::{ChatMessage, UpstreamClient};
use lib_core::dto::{StreamEvent, StreamMessage};
use lib_core::model::store::{Message, MessageRepository, MessageRole};
use lib_core::DbPool;
use tracing::{error, info, warn};

pub fn relay(
    pool: DbPool,
    upstream: UpstreamClient,
    user_message: Message,
    history: Vec<ChatMessage>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    async_stream::stream! {
        yield Ok(event(&StreamEvent::UserMessage {
            message: StreamMessage::from(&user_message),
        }));

        let mut fragments = match upstream.stream(&history).await {
            Ok(fragments) => fragments,
            Err(e) => {
                error!("[RELAY] Could not open upstream stream: {}", e);
                yield Ok(failed(&e));
                return;
            }
        };

        let mut full = String::new();
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    full.push_str(&text);
                    yield Ok(event(&StreamEvent::Chunk { content: text }));
                }
                Err(e) => {
                    warn!("[RELAY] Upstream failed after {} bytes: {}", full.len(), e);
                    yield Ok(failed(&e));
                    return;
                }
            }
        }

        if full.is_empty() {
            warn!("[RELAY] Upstream finished without content");
            yield Ok(failed(&"empty response"));
            return;
        }

        match MessageRepository::create(
            &pool,
            &user_message.conversation_id,
            MessageRole::Assistant,
            &full,
        )
        .await
        {
            Ok(saved) => {
                info!("[RELAY] Reply {} stored", saved.id);
                yield Ok(event(&StreamEvent::Done {
                    message: StreamMessage::from(&saved),
                }));
            }
            Err(e) => {
                error!("[RELAY] Failed to store reply: {}", e);
                yield Ok(event(&StreamEvent::Error {
                    error: "Failed to save response".to_string(),
                }));
            }
        }
    }
}

fn failed(cause: &dyn std::fmt::Display) -> Event {
    event(&StreamEvent::Error {
        error: format!("Streaming failed: {}", cause),
    })
}

fn event(payload: &StreamEvent) -> Event {
    Event::default().json_data(payload).unwrap_or_else(|e| {
        error!("[RELAY] Could not encode event: {}", e);
        Event::default().data(r#"{"type":"error","error":"Internal server error"}"#)
    })
}
