use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use axum::Extension;
use futures_util::{SinkExt, StreamExt};
use stratboard_shared::MAX_PAYLOAD_BYTES;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::relay::{broadcast_except, decode_incoming, record, RelayError};
use crate::rooms::{join_room, leave_room, new_room_id, normalize_room_id, Joined};
use crate::state::AppState;

#[derive(Clone)]
pub struct IndexFile(pub PathBuf);

pub async fn root_handler() -> impl IntoResponse {
    Redirect::to(&format!("/r/{}", new_room_id()))
}

pub async fn room_handler(
    Path(room_id): Path<String>,
    Extension(IndexFile(index_file)): Extension<IndexFile>,
) -> impl IntoResponse {
    if normalize_room_id(&room_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read_to_string(&index_file).await {
        Ok(contents) => Html(contents).into_response(),
        Err(error) => {
            tracing::error!(path = %index_file.display(), %error, "index.html unavailable");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn ws_handler(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(room_id) = normalize_room_id(&room_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    ws.max_message_size(MAX_PAYLOAD_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, room_id: String) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<str>>();
    let connection_id = Uuid::new_v4();

    let Joined {
        room,
        replayed,
        peers,
    } = join_room(&state, &room_id, connection_id, tx).await;
    tracing::info!(
        room = %room_id,
        conn = %connection_id,
        peers,
        replayed,
        "peer connected"
    );

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if socket_sender
                .send(Message::Text(payload.to_string()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => {
                let accepted = match decode_incoming(&text) {
                    Ok(incoming) => record(&mut *room.write().await, incoming),
                    Err(error) => Err(error),
                };
                match accepted {
                    Ok(payload) => broadcast_except(&room, connection_id, payload).await,
                    Err(RelayError::Stale { id }) => {
                        tracing::debug!(room = %room_id, %id, "dropping stale snapshot");
                    }
                    Err(error) => {
                        tracing::warn!(
                            room = %room_id,
                            conn = %connection_id,
                            bytes = text.len(),
                            %error,
                            "dropping snapshot"
                        );
                    }
                }
            }
            Message::Binary(data) => {
                tracing::warn!(conn = %connection_id, bytes = data.len(), "ignoring binary frame");
            }
            Message::Close(frame) => {
                if let Some(frame) = frame {
                    tracing::debug!(
                        conn = %connection_id,
                        code = frame.code,
                        reason = %frame.reason,
                        "close frame"
                    );
                }
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let peers = leave_room(&state, &room_id, &room, connection_id).await;
    tracing::info!(
        room = %room_id,
        conn = %connection_id,
        peers,
        "peer disconnected"
    );
}
