//! Message codec: marshals and unmarshals the tagged `{ type, data }`
//! envelope that travels over the duplex channel.
//!
//! The codec is deliberately dumb about `data` — it never inspects chunk
//! bytes, just validates the outer shape and the size ceiling before handing
//! a typed [`ClientMessage`] to the router.

mod envelope;
mod error;

pub use envelope::*;
pub use error::{CodecError, CodecResult};

/// Decode a raw inbound frame into a typed client message.
///
/// Oversize or malformed frames are a soft failure: the caller logs and
/// drops the message rather than tearing down the session. The codec
/// validates that a `file-chunk`'s body is well-formed base64 but never
/// decodes it into an owned buffer — the string passes through unchanged
/// all the way to the receiver.
pub fn decode_client_message(raw: &str, max_message_bytes: usize) -> CodecResult<ClientMessage> {
    if raw.len() > max_message_bytes {
        return Err(CodecError::TooLarge {
            limit: max_message_bytes,
            actual: raw.len(),
        });
    }

    let message: ClientMessage = serde_json::from_str(raw).map_err(CodecError::from)?;

    if let ClientMessage::FileChunk(payload) = &message {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&payload.chunk)
            .map_err(|_| CodecError::InvalidChunkEncoding)?;
    }

    Ok(message)
}

/// Encode a server message for the wire. Encoding never fails in practice
/// (all server payload types are plain-old-data), but we propagate the
/// `serde_json::Error` instead of unwrapping to keep the boundary honest.
pub fn encode_server_message(message: &ServerMessage) -> CodecResult<String> {
    serde_json::to_string(message).map_err(CodecError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_register() {
        let raw = r#"{"type":"register","data":{"userId":"a1b2c3","deviceName":"Windows PC"}}"#;
        let msg = decode_client_message(raw, 4096).unwrap();
        match msg {
            ClientMessage::Register(p) => {
                assert_eq!(p.user_id.as_deref(), Some("a1b2c3"));
                assert_eq!(p.device_name.as_deref(), Some("Windows PC"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_file_chunk_with_base64_passthrough() {
        let raw = r#"{"type":"file-chunk","data":{"toUserId":"d4e5f6","fileId":"F1","chunkIndex":0,"chunk":"AAECAw==","totalChunks":2,"chunkSize":64}}"#;
        let msg = decode_client_message(raw, 4096).unwrap();
        match msg {
            ClientMessage::FileChunk(p) => {
                assert_eq!(p.chunk, "AAECAw==");
                assert_eq!(p.chunk_index, 0);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let raw = r#"{"type":"not-a-real-type","data":{}}"#;
        assert!(decode_client_message(raw, 4096).is_err());
    }

    #[test]
    fn rejects_oversize_payload() {
        let raw = r#"{"type":"ping","data":{"timestamp":1}}"#;
        let err = decode_client_message(raw, 4).unwrap_err();
        assert!(matches!(err, CodecError::TooLarge { .. }));
    }

    #[test]
    fn rejects_non_base64_chunk_body() {
        let raw = r#"{"type":"file-chunk","data":{"toUserId":"d4e5f6","fileId":"F1","chunkIndex":0,"chunk":"not base64!!","totalChunks":2,"chunkSize":64}}"#;
        let err = decode_client_message(raw, 4096).unwrap_err();
        assert!(matches!(err, CodecError::InvalidChunkEncoding));
    }

    #[test]
    fn encodes_devices_as_bare_array() {
        let msg = ServerMessage::Devices(vec![RosterEntryPayload {
            id: "a1b2c3".into(),
            name: "PC-a1b2c3".into(),
        }]);
        let json = encode_server_message(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"devices","data":[{"id":"a1b2c3","name":"PC-a1b2c3"}]}"#
        );
    }

    #[test]
    fn round_trips_sync_status() {
        let msg = ServerMessage::SyncStatus(SyncStatusPayload {
            sender_id: "a1b2c3".into(),
            receiver_id: "d4e5f6".into(),
            file_id: "F1".into(),
            sender_progress: 50.0,
            receiver_progress: 50.0,
            sync_lag: 0.0,
            duplicates_rejected: 0,
            last_chunk_time: 1_700_000_000,
        });
        let json = encode_server_message(&msg).unwrap();
        assert!(json.contains("\"type\":\"sync-status\""));
    }
}
