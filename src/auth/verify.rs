use axum::{debug_handler, response::IntoResponse, Json};
use serde_json::json;

use super::bearer::Claim;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn verify(Claim(claims): Claim) -> impl IntoResponse {
    Json(json!({
        "valid": true,
        "roomId": claims.room_id,
        "deviceId": claims.device_id,
    }))
}
