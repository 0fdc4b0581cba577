use sqlx::SqlitePool;

use crate::{db, AppError, AppResult};

/// Durable record of which two devices share a room. Membership is immutable
/// once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub room_id: String,
    pub device_a: String,
    pub device_b: String,
}

pub async fn create_room(
    db_pool: &SqlitePool,
    room_id: &str,
    device_a: &str,
    device_b: &str,
) -> AppResult<()> {
    if device_a == device_b {
        return Err(AppError::Validation("room members must be distinct".to_owned()));
    }

    sqlx::query("INSERT INTO rooms (room_id,device_a,device_b,created_at) VALUES (?,?,?,?)")
        .bind(room_id)
        .bind(device_a)
        .bind(device_b)
        .bind(db::now_ms())
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn find_room(db_pool: &SqlitePool, room_id: &str) -> AppResult<Option<Room>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT device_a,device_b FROM rooms WHERE room_id=?")
            .bind(room_id)
            .fetch_optional(db_pool)
            .await?;

    Ok(row.map(|(device_a, device_b)| Room {
        room_id: room_id.to_owned(),
        device_a,
        device_b,
    }))
}

/// Deletes the room and cascades to its message history. A missing room is a
/// no-op so unpair stays idempotent.
pub async fn destroy_room(db_pool: &SqlitePool, room_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM messages WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    sqlx::query("DELETE FROM rooms WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}
