mod bearer;
mod verify;

use axum::{routing::post, Router};

use crate::AppState;

pub use bearer::Claim;

pub fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify::verify))
}
