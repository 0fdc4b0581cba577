use axum::{
    debug_handler,
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{auth::Claim, AppError, AppResult, AppState};

const MAX_VOICE_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(upload).layer(DefaultBodyLimit::max(MAX_VOICE_BYTES)),
    )
}

/// Accepts one multipart `file` field (voice note, ≤10MB enforced by the body
/// limit on the route) and stores it under the upload directory. The returned
/// URL is served statically.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn upload(
    State(upload_dir): State<UploadDir>,
    Claim(_claims): Claim,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let ext = field
            .file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_owned())
            .filter(|ext| ext.chars().all(char::is_alphanumeric))
            .unwrap_or_else(|| "webm".to_owned());
        let data = field.bytes().await?;

        let file_name = format!("{}.{ext}", Uuid::now_v7().simple());
        tokio::fs::create_dir_all(&upload_dir.0).await?;
        tokio::fs::write(format!("{}/{file_name}", upload_dir.0), &data).await?;

        tracing::debug!(file_name, bytes = data.len(), "voice note stored");
        return Ok(Json(json!({ "url": format!("/uploads/{file_name}") })));
    }

    Err(AppError::Validation("no file uploaded".to_owned()))
}

/// Where voice notes land on disk; cloned out of app state by the handler.
#[derive(Clone)]
pub struct UploadDir(pub String);
