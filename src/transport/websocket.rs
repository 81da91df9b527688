use crate::codec::{decode_client_message, encode_server_message, ClientMessage};
use crate::transport::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let send_deadline = state.config.outbound_send_deadline;

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let json = match encode_server_message(&message) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(%err, "failed to encode outbound message");
                    continue;
                }
            };

            let send = sink.send(Message::Text(json));
            match tokio::time::timeout(send_deadline, send).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => break,
            }
        }
    });

    let mut session_id: Option<String> = None;
    let max_message_bytes = state.config.max_message_bytes;

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        match decode_client_message(&text, max_message_bytes) {
            Ok(ClientMessage::Register(payload)) if session_id.is_none() => {
                match state.router.register_session(
                    payload.user_id.clone(),
                    payload.device_name.clone(),
                    outbound_tx.clone(),
                ) {
                    Ok(id) => {
                        tracing::debug!(session_id = %id, "session established");
                        session_id = Some(id);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "rejecting register on duplicate session id");
                        break;
                    }
                }
            }
            Ok(message) => match &session_id {
                Some(id) => state.router.dispatch(id, message),
                None => tracing::debug!("message received before registration, dropping"),
            },
            Err(err) => {
                crate::metrics::record_codec_rejection();
                tracing::debug!(%err, "dropping malformed or oversize envelope");
            }
        }
    }

    if let Some(id) = session_id {
        state.router.handle_disconnect(&id);
    }
    writer.abort();
}
