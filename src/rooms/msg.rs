use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppResult};

/// History reads are capped hard, oldest first. Not paginated.
pub const HISTORY_CAP: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Voice,
}

impl MessageKind {
    fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Voice => "voice",
        }
    }

    fn parse(s: &str) -> MessageKind {
        match s {
            "voice" => MessageKind::Voice,
            _ => MessageKind::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyTo {
    pub message_id: String,
    pub content: String,
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub content: String,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyTo>,
    pub read: bool,
    pub timestamp: i64,
}

pub struct NewMessage {
    pub content: String,
    pub kind: MessageKind,
    pub reply_to: Option<ReplyTo>,
    pub voice_url: Option<String>,
    pub voice_duration: Option<f64>,
}

/// Persists one message with a server-assigned id and timestamp and returns
/// the full record the room will see.
pub async fn push_msg(
    db_pool: &SqlitePool,
    room_id: &str,
    sender_id: &str,
    new: NewMessage,
) -> AppResult<Message> {
    let msg = Message {
        id: Uuid::now_v7().to_string(),
        room_id: room_id.to_owned(),
        sender_id: sender_id.to_owned(),
        content: new.content,
        kind: new.kind,
        voice_url: new.voice_url,
        voice_duration: new.voice_duration,
        reply_to: new.reply_to,
        read: false,
        timestamp: db::now_ms(),
    };

    sqlx::query(
        "INSERT INTO messages \
         (id,room_id,sender_id,content,kind,voice_url,voice_duration,\
          reply_to_id,reply_to_content,reply_to_sender,read,timestamp) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(&msg.id)
    .bind(&msg.room_id)
    .bind(&msg.sender_id)
    .bind(&msg.content)
    .bind(msg.kind.as_str())
    .bind(&msg.voice_url)
    .bind(msg.voice_duration)
    .bind(msg.reply_to.as_ref().map(|r| r.message_id.as_str()))
    .bind(msg.reply_to.as_ref().map(|r| r.content.as_str()))
    .bind(msg.reply_to.as_ref().map(|r| r.sender_id.as_str()))
    .bind(msg.read)
    .bind(msg.timestamp)
    .execute(db_pool)
    .await?;

    Ok(msg)
}

type MessageRow = (
    String,         // id
    String,         // sender_id
    String,         // content
    String,         // kind
    Option<String>, // voice_url
    Option<f64>,    // voice_duration
    Option<String>, // reply_to_id
    Option<String>, // reply_to_content
    Option<String>, // reply_to_sender
    bool,           // read
    i64,            // timestamp
);

pub async fn list_msgs(db_pool: &SqlitePool, room_id: &str) -> AppResult<Vec<Message>> {
    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT id,sender_id,content,kind,voice_url,voice_duration,\
                reply_to_id,reply_to_content,reply_to_sender,read,timestamp \
         FROM messages WHERE room_id=? ORDER BY timestamp ASC, id ASC LIMIT ?",
    )
    .bind(room_id)
    .bind(HISTORY_CAP)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, sender_id, content, kind, voice_url, voice_duration, rid, rcontent, rsender, read, timestamp)| {
            Message {
                id,
                room_id: room_id.to_owned(),
                sender_id,
                content,
                kind: MessageKind::parse(&kind),
                voice_url,
                voice_duration,
                reply_to: rid.map(|message_id| ReplyTo {
                    message_id,
                    content: rcontent.unwrap_or_default(),
                    sender_id: rsender.unwrap_or_default(),
                }),
                read,
                timestamp,
            }
        })
        .collect())
}

/// Flips the read flag to true. Idempotent; the flag is never reversed.
pub async fn mark_read(db_pool: &SqlitePool, room_id: &str, message_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE messages SET read=1 WHERE id=? AND room_id=?")
        .bind(message_id)
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn clear_msgs(db_pool: &SqlitePool, room_id: &str) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM messages WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init(&db_pool).await.unwrap();
        db_pool
    }

    fn text(content: &str) -> NewMessage {
        NewMessage {
            content: content.to_owned(),
            kind: MessageKind::Text,
            reply_to: None,
            voice_url: None,
            voice_duration: None,
        }
    }

    #[tokio::test]
    async fn push_assigns_id_and_timestamp_and_unread() {
        let db_pool = pool().await;
        let msg = push_msg(&db_pool, "r-1", "dev-a", text("hi")).await.unwrap();

        assert!(!msg.id.is_empty());
        assert!(!msg.read);
        assert!(msg.timestamp > 0);

        let listed = list_msgs(&db_pool, "r-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "hi");
        assert_eq!(listed[0].sender_id, "dev-a");
    }

    #[tokio::test]
    async fn list_is_oldest_first_and_timestamps_never_regress() {
        let db_pool = pool().await;
        for i in 0..5 {
            push_msg(&db_pool, "r-1", "dev-a", text(&format!("m{i}")))
                .await
                .unwrap();
        }

        let listed = list_msgs(&db_pool, "r-1").await.unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[0].content, "m0");
        assert_eq!(listed[4].content, "m4");
        for pair in listed.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn rooms_do_not_leak_into_each_other() {
        let db_pool = pool().await;
        push_msg(&db_pool, "r-1", "dev-a", text("one")).await.unwrap();
        push_msg(&db_pool, "r-2", "dev-c", text("two")).await.unwrap();

        let listed = list_msgs(&db_pool, "r-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|m| m.room_id == "r-1"));
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let db_pool = pool().await;
        let msg = push_msg(&db_pool, "r-1", "dev-a", text("hi")).await.unwrap();

        mark_read(&db_pool, "r-1", &msg.id).await.unwrap();
        mark_read(&db_pool, "r-1", &msg.id).await.unwrap();

        let listed = list_msgs(&db_pool, "r-1").await.unwrap();
        assert!(listed[0].read);
    }

    #[tokio::test]
    async fn reply_context_round_trips() {
        let db_pool = pool().await;
        let first = push_msg(&db_pool, "r-1", "dev-a", text("original")).await.unwrap();

        let reply = NewMessage {
            reply_to: Some(ReplyTo {
                message_id: first.id.clone(),
                content: first.content.clone(),
                sender_id: first.sender_id.clone(),
            }),
            ..text("reply")
        };
        push_msg(&db_pool, "r-1", "dev-b", reply).await.unwrap();

        let listed = list_msgs(&db_pool, "r-1").await.unwrap();
        let got = listed[1].reply_to.as_ref().unwrap();
        assert_eq!(got.message_id, first.id);
        assert_eq!(got.content, "original");
    }

    #[tokio::test]
    async fn clear_empties_the_room() {
        let db_pool = pool().await;
        push_msg(&db_pool, "r-1", "dev-a", text("hi")).await.unwrap();
        push_msg(&db_pool, "r-1", "dev-b", text("yo")).await.unwrap();

        assert_eq!(clear_msgs(&db_pool, "r-1").await.unwrap(), 2);
        assert!(list_msgs(&db_pool, "r-1").await.unwrap().is_empty());
    }
}
