use axum::{debug_handler, extract::{Path, State}, response::IntoResponse, Json};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::Claim,
    relay::{events::ServerEvent, Relay},
    AppError, AppResult,
};

use super::msg;

/// Up to 500 messages, oldest first. The claim's room is the only room the
/// caller can read, whatever the path says.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn list(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Claim(claims): Claim,
) -> AppResult<impl IntoResponse> {
    if claims.room_id != room_id {
        return Err(AppError::Forbidden("claim does not grant this room".to_owned()));
    }

    let msgs = msg::list_msgs(&db_pool, &claims.room_id).await?;
    Ok(Json(msgs))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn clear(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(relay): State<Relay>,
    Claim(claims): Claim,
) -> AppResult<impl IntoResponse> {
    if claims.room_id != room_id {
        return Err(AppError::Forbidden("claim does not grant this room".to_owned()));
    }

    let removed = msg::clear_msgs(&db_pool, &claims.room_id).await?;
    relay.room_send(&claims.room_id, None, false, &ServerEvent::ChatCleared);

    tracing::debug!(room_id = %claims.room_id, removed, "chat cleared");
    Ok(Json(json!({ "success": true })))
}
