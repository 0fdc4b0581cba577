pub mod code;
pub mod registry;

mod enter;
mod generate;
mod unpair;

use axum::{routing::post, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate::generate))
        .route("/enter", post(enter::enter))
        .route("/unpair", post(unpair::unpair))
}
