use std::time::Duration;

use axum::{debug_handler, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{cors::CorsLayer, services::ServeDir};
use whisperpair::{auth, config::Config, db, pairing, relay::Relay, rooms, voice, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("whisperpair=info")),
        )
        .init();

    let config = Config::from_env().unwrap();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    // Lazy expiry at consume time stays authoritative; this just keeps
    // abandoned codes from accumulating forever.
    let reaper_pool = db_pool.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            match pairing::registry::sweep_expired(&reaper_pool).await {
                Ok(0) => {}
                Ok(swept) => tracing::debug!(swept, "expired pairing codes removed"),
                Err(err) => tracing::warn!("pairing code sweep failed: {err}"),
            }
        }
    });

    let app_state = AppState {
        db_pool,
        issuer: whisperpair::claims::ClaimIssuer::new(&config.claim_secret),
        relay: Relay::default(),
        upload_dir: voice::UploadDir(config.upload_dir.clone()),
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/pairing", pairing::router())
        .nest("/api/auth", auth::router())
        .nest("/api/messages", rooms::router())
        .nest("/api/voice", voice::router())
        .nest("/ws", rooms::ws_router())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    tracing::info!(addr = %config.bind_addr, "whisperpair listening");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "time": db::now_ms() }))
}
