use axum::{debug_handler, extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    claims::ClaimIssuer,
    relay::{events::ServerEvent, Relay},
    rooms::directory,
    AppResult,
};

use super::registry;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnterBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    device_id: String,
}

/// Consumes the code, creates the room, and mints one claim per member. The
/// generator never calls this endpoint; its claim is pushed over the
/// device-scoped channel it registered at connect time.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn enter(
    State(db_pool): State<SqlitePool>,
    State(issuer): State<ClaimIssuer>,
    State(relay): State<Relay>,
    Json(EnterBody { code, device_id }): Json<EnterBody>,
) -> AppResult<impl IntoResponse> {
    let consumed = registry::consume(&db_pool, &code, &device_id).await?;

    directory::create_room(&db_pool, &consumed.room_id, &consumed.peer_device_id, &device_id)
        .await?;

    let generator_token = issuer.issue(&consumed.peer_device_id, &consumed.room_id)?;
    let enterer_token = issuer.issue(&device_id, &consumed.room_id)?;

    relay.device_send(
        &consumed.peer_device_id,
        &ServerEvent::Paired {
            room_id: consumed.room_id.clone(),
            token: generator_token,
        },
    );

    tracing::info!(room_id = %consumed.room_id, "devices paired");

    Ok(Json(json!({
        "roomId": consumed.room_id,
        "token": enterer_token,
    })))
}
