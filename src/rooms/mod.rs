pub mod directory;
pub mod msg;

mod history;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

/// History surface, nested under /api/messages.
pub fn router() -> Router<AppState> {
    Router::new().route("/{room_id}", get(history::list).delete(history::clear))
}

/// The persistent duplex endpoint, mounted at /ws.
pub fn ws_router() -> Router<AppState> {
    Router::new().route("/", get(ws::chat_ws))
}
