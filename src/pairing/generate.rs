use axum::{debug_handler, extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::AppResult;

use super::registry;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateBody {
    #[serde(default)]
    device_id: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn generate(
    State(db_pool): State<SqlitePool>,
    Json(GenerateBody { device_id }): Json<GenerateBody>,
) -> AppResult<impl IntoResponse> {
    let generated = registry::generate(&db_pool, &device_id).await?;

    Ok(Json(json!({
        "code": generated.code,
        "expiresAt": generated.expires_at,
        "roomId": generated.room_id,
    })))
}
