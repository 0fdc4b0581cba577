use axum::{debug_handler, extract::State, response::IntoResponse, Json};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::Claim,
    relay::{events::ServerEvent, Relay},
    rooms::directory,
    AppResult,
};

use super::registry;

/// Tears the pairing down: room, history, and residual code rows. Live
/// sockets are not force-closed; they learn about it from the `unpaired`
/// broadcast and the claims themselves stay verifiable.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn unpair(
    State(db_pool): State<SqlitePool>,
    State(relay): State<Relay>,
    Claim(claims): Claim,
) -> AppResult<impl IntoResponse> {
    directory::destroy_room(&db_pool, &claims.room_id).await?;
    registry::purge_room_codes(&db_pool, &claims.room_id).await?;

    relay.room_send(&claims.room_id, None, false, &ServerEvent::Unpaired);

    tracing::info!(room_id = %claims.room_id, "room unpaired");
    Ok(Json(json!({ "success": true })))
}
