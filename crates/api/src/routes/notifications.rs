//! Notification routes and the live feed.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tally_core::notification::{DEFAULT_LIST_LIMIT, Notification};
use tally_shared::AppError;
use tally_shared::types::{NotificationId, UserId};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

/// Largest page a client may ask for.
const MAX_LIST_LIMIT: u64 = 200;

/// Notification routes that need a verified caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
}

/// The live feed. Browsers cannot set headers on a WebSocket handshake, so
/// the token travels in the query string and is checked here.
pub fn feed_routes() -> Router<AppState> {
    Router::new().route("/notifications/ws", get(feed))
}

/// Query parameters for listing notifications.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Maximum number of notifications.
    pub limit: Option<u64>,
}

/// Query parameters for the live feed.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Access token.
    pub token: String,
}

/// GET /notifications?limit= - Newest first.
async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let user_id = user.actor().user_id;
    Ok(Json(state.services.notifier.list(user_id, limit).await?))
}

/// GET /notifications/unread-count
async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let count = state
        .services
        .notifier
        .unread_count(user.actor().user_id)
        .await?;
    Ok(Json(json!({ "count": count })))
}

/// POST /notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<impl IntoResponse> {
    let found = state
        .services
        .notifier
        .mark_read(user.actor().user_id, id)
        .await?;
    if !found {
        return Err(ApiError(AppError::NotFound(format!(
            "notification {id} not found"
        ))));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .services
        .notifier
        .mark_all_read(user.actor().user_id)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

/// GET /notifications/ws?token= - Pushes the caller's notifications as
/// JSON text frames.
async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<impl IntoResponse> {
    let claims = state.jwt_service.validate_access_token(&query.token)?;
    let claims = state.services.auth.current_claims(&claims).await?;
    let user_id = UserId::from_uuid(claims.user_id());
    let receiver = state.services.notifier.subscribe();
    info!(user_id = %user_id, "notification feed opened");
    Ok(ws.on_upgrade(move |socket| forward(socket, receiver, user_id)))
}

async fn forward(
    socket: WebSocket,
    mut receiver: broadcast::Receiver<Notification>,
    user_id: UserId,
) {
    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(notification) if notification.user_id == user_id => {
                    let text = match serde_json::to_string(&notification) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "failed to encode notification");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(user_id = %user_id, "notification feed closed");
}
