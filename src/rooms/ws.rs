use axum::{
    debug_handler,
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    claims::ClaimIssuer,
    relay::{
        events::{ClientEvent, ServerEvent},
        Relay,
    },
    session::Session,
};

use super::msg::{self, NewMessage};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(issuer): State<ClaimIssuer>,
    State(relay): State<Relay>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |socket| handle_socket(socket, db_pool, issuer, relay).await)
}

/// One task per connection. The connection starts unregistered, may join the
/// device-scoped channel (registerDevice), and becomes in-room once joinRoom
/// presents a claim that verifies. Everything after that is authorized by the
/// session table alone; the claim is not re-verified per event.
async fn handle_socket(socket: WebSocket, db_pool: SqlitePool, issuer: ClaimIssuer, relay: Relay) {
    let conn_id = Uuid::now_v7();
    let (mut sink, mut stream) = socket.split();

    // Single outbound queue per connection; subscription tasks feed it so the
    // socket sink has exactly one writer.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        while let Some(json) = out_rx.recv().await {
            if sink.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut registered_device: Option<String> = None;
    let mut device_task: Option<JoinHandle<()>> = None;
    let mut room_task: Option<JoinHandle<()>> = None;

    while let Some(Ok(frame)) = stream.next().await {
        let Ok(event) = serde_json::from_slice::<ClientEvent>(&frame.into_data()) else {
            continue;
        };

        match event {
            ClientEvent::RegisterDevice { device_id } => {
                if let Some(task) = device_task.take() {
                    task.abort();
                }
                let mut rx = relay.subscribe_device(&device_id);
                let tx = out_tx.clone();
                device_task = Some(tokio::spawn(async move {
                    while let Ok(json) = rx.recv().await {
                        if tx.send(json).await.is_err() {
                            break;
                        }
                    }
                }));
                registered_device = Some(device_id);
            }

            ClientEvent::JoinRoom { room_id, claim } => {
                let claims = match issuer.verify(&claim) {
                    Ok(claims) if claims.room_id == room_id => claims,
                    _ => {
                        // auth failures go to the caller only, never the room
                        let _ = out_tx
                            .send(ServerEvent::Error { reason: "invalid claim".to_owned() }.to_json())
                            .await;
                        continue;
                    }
                };

                if let Some(task) = room_task.take() {
                    task.abort();
                }
                let mut rx = relay.subscribe_room(&room_id);
                let tx = out_tx.clone();
                room_task = Some(tokio::spawn(async move {
                    while let Ok(envelope) = rx.recv().await {
                        if envelope.wants(conn_id) && tx.send(envelope.json).await.is_err() {
                            break;
                        }
                    }
                }));

                relay.bind(
                    conn_id,
                    Session {
                        device_id: claims.device_id.clone(),
                        room_id: room_id.clone(),
                    },
                );
                relay.room_send(
                    &room_id,
                    Some(conn_id),
                    false,
                    &ServerEvent::PeerOnline { device_id: claims.device_id },
                );
            }

            ClientEvent::SendMessage { content, kind, reply_to, voice_url, voice_duration } => {
                // no session, no reply channel worth speaking to: drop silently
                let Some(session) = relay.lookup(conn_id) else {
                    continue;
                };

                let new = NewMessage { content, kind, reply_to, voice_url, voice_duration };
                match msg::push_msg(&db_pool, &session.room_id, &session.device_id, new).await {
                    Ok(stored) => {
                        let _ = out_tx
                            .send(
                                ServerEvent::Ack {
                                    success: true,
                                    message_id: Some(stored.id.clone()),
                                }
                                .to_json(),
                            )
                            .await;
                        // the one broadcast that echoes to its sender: the
                        // server-confirmed record replaces the optimistic copy
                        relay.room_send(
                            &session.room_id,
                            Some(conn_id),
                            true,
                            &ServerEvent::NewMessage(stored),
                        );
                    }
                    Err(err) => {
                        tracing::warn!(room_id = %session.room_id, "message persist failed: {err}");
                        let _ = out_tx
                            .send(ServerEvent::Ack { success: false, message_id: None }.to_json())
                            .await;
                    }
                }
            }

            ClientEvent::MessageRead { message_id } => {
                let Some(session) = relay.lookup(conn_id) else {
                    continue;
                };
                if let Err(err) = msg::mark_read(&db_pool, &session.room_id, &message_id).await {
                    tracing::warn!(room_id = %session.room_id, "mark read failed: {err}");
                    continue;
                }
                relay.room_send(
                    &session.room_id,
                    Some(conn_id),
                    false,
                    &ServerEvent::MessageRead { message_id },
                );
            }

            ClientEvent::CallOffer { offer } => {
                if let Some(session) = relay.lookup(conn_id) {
                    relay.room_send(
                        &session.room_id,
                        Some(conn_id),
                        false,
                        &ServerEvent::CallOffer { offer, from_device: session.device_id },
                    );
                }
            }
            ClientEvent::CallAnswer { answer } => {
                if let Some(session) = relay.lookup(conn_id) {
                    relay.room_send(
                        &session.room_id,
                        Some(conn_id),
                        false,
                        &ServerEvent::CallAnswer { answer },
                    );
                }
            }
            ClientEvent::IceCandidate { candidate } => {
                if let Some(session) = relay.lookup(conn_id) {
                    relay.room_send(
                        &session.room_id,
                        Some(conn_id),
                        false,
                        &ServerEvent::IceCandidate { candidate },
                    );
                }
            }
            ClientEvent::CallEnd => {
                if let Some(session) = relay.lookup(conn_id) {
                    relay.room_send(&session.room_id, Some(conn_id), false, &ServerEvent::CallEnded);
                }
            }
        }
    }

    // Disconnect: unbind first so no further broadcast targets this
    // connection, then tell the rest of the room.
    if let Some(task) = device_task.take() {
        task.abort();
    }
    if let Some(task) = room_task.take() {
        task.abort();
    }
    if let Some(session) = relay.unbind(conn_id) {
        relay.room_send(
            &session.room_id,
            Some(conn_id),
            false,
            &ServerEvent::PeerOffline { device_id: session.device_id.clone() },
        );
        relay.collect_idle(
            &session.room_id,
            registered_device.as_deref().unwrap_or(&session.device_id),
        );
    } else if let Some(device_id) = registered_device {
        relay.collect_idle("", &device_id);
    }
}
