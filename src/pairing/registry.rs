use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

use super::code::{draw_code, draw_room_id, CODE_TTL_MS};

#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub code: String,
    pub room_id: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct Consumed {
    pub room_id: String,
    /// The device that generated the code.
    pub peer_device_id: String,
}

/// Creates a fresh PENDING code for the device, superseding any earlier one
/// it still had open (at most one live code per device).
pub async fn generate(db_pool: &SqlitePool, device_id: &str) -> AppResult<GeneratedCode> {
    if device_id.is_empty() {
        return Err(AppError::Validation("deviceId is required".to_owned()));
    }

    sqlx::query("DELETE FROM pairing_codes WHERE device_id=? AND paired=0")
        .bind(device_id)
        .execute(db_pool)
        .await?;

    let generated = GeneratedCode {
        code: draw_code(),
        room_id: draw_room_id(),
        expires_at: db::now_ms() + CODE_TTL_MS,
    };

    // A collision with another live code trips the partial unique index and
    // surfaces as Conflict; the caller retries with a new draw.
    sqlx::query(
        "INSERT INTO pairing_codes (id,code,device_id,room_id,paired,created_at,expires_at) \
         VALUES (?,?,?,?,0,?,?)",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(&generated.code)
    .bind(device_id)
    .bind(&generated.room_id)
    .bind(db::now_ms())
    .bind(generated.expires_at)
    .execute(db_pool)
    .await?;

    tracing::debug!(device_id, code = %generated.code, "pairing code generated");
    Ok(generated)
}

/// The single state-changing transaction in the system. Exactly one of two
/// racing consumers can flip the row out of PENDING; the loser observes the
/// row already transitioned and gets NotFound.
pub async fn consume(db_pool: &SqlitePool, code: &str, device_id: &str) -> AppResult<Consumed> {
    if code.is_empty() || device_id.is_empty() {
        return Err(AppError::Validation("code and deviceId are required".to_owned()));
    }

    let row: Option<(String, String, String, i64)> = sqlx::query_as(
        "SELECT id,device_id,room_id,expires_at FROM pairing_codes WHERE code=? AND paired=0",
    )
    .bind(code)
    .fetch_optional(db_pool)
    .await?;

    let Some((id, generator, room_id, expires_at)) = row else {
        return Err(AppError::NotFound("code not found or already used".to_owned()));
    };

    // Self-pairing loses regardless of expiry state.
    if generator == device_id {
        return Err(AppError::SelfPairing);
    }

    if db::now_ms() > expires_at {
        // Lazy expiry: detection deletes the row, so the next attempt on the
        // same code reports NotFound rather than Expired.
        sqlx::query("DELETE FROM pairing_codes WHERE id=?")
            .bind(&id)
            .execute(db_pool)
            .await?;
        return Err(AppError::Expired("code expired".to_owned()));
    }

    let result = sqlx::query("UPDATE pairing_codes SET paired=1 WHERE id=? AND paired=0")
        .bind(&id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("code not found or already used".to_owned()));
    }

    tracing::debug!(device_id, peer = %generator, room_id = %room_id, "pairing code consumed");
    Ok(Consumed { room_id, peer_device_id: generator })
}

/// Deletes every code row tied to a room, consumed or not. Runs at unpair.
pub async fn purge_room_codes(db_pool: &SqlitePool, room_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM pairing_codes WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Background sweep for abandoned PENDING rows. Observable consume semantics
/// are unchanged; this only bounds storage growth.
pub async fn sweep_expired(db_pool: &SqlitePool) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM pairing_codes WHERE paired=0 AND expires_at < ?")
        .bind(db::now_ms())
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected())
}
