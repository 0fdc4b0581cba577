pub mod appresult;
pub mod auth;
pub mod claims;
pub mod config;
pub mod db;
pub mod pairing;
pub mod relay;
pub mod rooms;
pub mod session;
pub mod voice;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub issuer: claims::ClaimIssuer,
    pub relay: relay::Relay,
    pub upload_dir: voice::UploadDir,
}
