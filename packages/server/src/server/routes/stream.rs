//! SSE streaming endpoint.
//!
//! GET /api/streams/:topic?token=JWT
//!
//! `issue:{id}` topics are public. `user:{id}` topics carry a user's new
//! notifications and are only served to that user.
//!
//! EventSource can't send custom headers, so the JWT may be passed as
//! `?token=`; a bearer header (already verified by the auth middleware) works
//! too.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path, Query},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::common::CivicError;
use crate::kernel::{HubMessage, Topic};
use crate::server::app::AppState;
use crate::server::auth::AccessPolicy;
use crate::server::error::ApiResult;
use crate::server::middleware::{authenticate, AuthUser};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamQuery {
    /// JWT token for authentication
    token: Option<String>,
}

pub async fn stream_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(topic): Path<String>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let topic: Topic = topic.parse()?;

    if let Topic::User(topic_user) = topic {
        let user = match (user, query.token) {
            (Some(Extension(user)), _) => Some(user),
            (None, Some(token)) => Some(
                authenticate(&token, &state.jwt_service)
                    .ok_or_else(|| CivicError::Permission("invalid token".into()))?,
            ),
            (None, None) => None,
        };
        AccessPolicy::check_user_topic(user.as_ref(), topic_user)?;
    }

    debug!(topic = %topic, "SSE subscriber connected");
    let subscription = state.deps.stream_hub.subscribe(&topic).await;

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = subscription.into_stream().filter_map(|message| async move {
        match message {
            HubMessage::Event(value) => {
                let event_name = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("message")
                    .to_string();
                Event::default()
                    .event(event_name)
                    .json_data(&value)
                    .ok()
                    .map(Ok)
            }
            HubMessage::Lagged(n) => Event::default()
                .event("lagged")
                .json_data(serde_json::json!({ "missed": n }))
                .ok()
                .map(Ok),
        }
    });

    Ok(Sse::new(connected.chain(events)).keep_alive(KeepAlive::default()))
}
