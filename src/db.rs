use sqlx::SqlitePool;

use crate::AppResult;

// pairing_codes: code is unique only among PENDING rows; consumed rows stay
// behind for audit until the reaper or an unpair sweeps them.
// messages: append-only except the read flag.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pairing_codes (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL,
    device_id TEXT NOT NULL,
    room_id TEXT NOT NULL,
    paired INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_codes_live ON pairing_codes(code) WHERE paired = 0;
CREATE INDEX IF NOT EXISTS idx_codes_device ON pairing_codes(device_id);

CREATE TABLE IF NOT EXISTS rooms (
    room_id TEXT PRIMARY KEY,
    device_a TEXT NOT NULL,
    device_b TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    room_id TEXT NOT NULL,
    sender_id TEXT NOT NULL,
    content TEXT NOT NULL,
    kind TEXT NOT NULL,
    voice_url TEXT,
    voice_duration REAL,
    reply_to_id TEXT,
    reply_to_content TEXT,
    reply_to_sender TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_room ON messages(room_id, timestamp);
"#;

pub async fn init(db_pool: &SqlitePool) -> AppResult<()> {
    for stmt in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(stmt).execute(db_pool).await?;
    }
    Ok(())
}

/// Unix milliseconds, the timestamp unit everywhere in the service.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
