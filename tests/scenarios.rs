//! End-to-end scenarios replaying the canonical message sequences against
//! two in-process sessions wired directly to a shared Router. No socket is
//! needed: the outbound "send handle" is just the receiving end of the
//! session's own channel.
//!
//! Roster broadcasts are eventually consistent and interleave with other
//! traffic (two broadcasts per arrival, per the settle-delay design), so
//! non-roster assertions read through `next_business_message`, which skips
//! past any `devices` frames instead of asserting exact interleaving.

use core_relay::codec::*;
use core_relay::router::Router;
use core_relay::session::SessionRegistry;
use core_relay::transfer::TransferTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const SETTLE: Duration = Duration::from_millis(20);

fn new_router() -> (Arc<Router>, Arc<SessionRegistry>) {
    let sessions = SessionRegistry::new(SETTLE);
    let transfers = Arc::new(TransferTable::new());
    let router = Router::new(sessions.clone(), transfers, Duration::from_millis(50));
    (router, sessions)
}

async fn connect(router: &Arc<Router>, id: &str, device_name: &str) -> UnboundedReceiver<ServerMessage> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let assigned = router
        .register_session(Some(id.to_string()), Some(device_name.to_string()), tx)
        .unwrap();
    assert_eq!(assigned, id);
    assert!(matches!(rx.recv().await.unwrap(), ServerMessage::Registered(_)));
    rx
}

/// Read the next message that isn't a roster broadcast.
async fn next_business_message(rx: &mut UnboundedReceiver<ServerMessage>) -> ServerMessage {
    loop {
        match rx.recv().await.unwrap() {
            ServerMessage::Devices(_) => continue,
            other => return other,
        }
    }
}

fn file_info() -> FileInfo {
    FileInfo {
        name: "a.bin".into(),
        size: 128,
        mime_type: None,
        total_chunks: 2,
        chunk_size: 64,
    }
}

#[tokio::test]
async fn scenario_a_happy_path() {
    let (router, _sessions) = new_router();
    let mut s1 = connect(&router, "a1b2c3", "Windows PC").await;
    let mut s2 = connect(&router, "d4e5f6", "iPhone").await;

    // Let roster broadcasts settle, then check the converged roster each
    // side eventually observes includes both peers (and themselves).
    tokio::time::sleep(SETTLE * 2).await;
    let mut last_s1_roster = None;
    while let Ok(msg) = tokio::time::timeout(Duration::from_millis(5), s1.recv()).await {
        if let ServerMessage::Devices(roster) = msg.unwrap() {
            last_s1_roster = Some(roster);
        }
    }
    let roster = last_s1_roster.expect("s1 should have observed a roster broadcast");
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().any(|r| r.name == "PC-a1b2c3"));
    assert!(roster.iter().any(|r| r.name == "iPhone-d4e5f6"));

    while let Ok(msg) = tokio::time::timeout(Duration::from_millis(5), s2.recv()).await {
        msg.unwrap();
    }

    router.dispatch(
        "a1b2c3",
        ClientMessage::TransferRequest(TransferRequestPayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            file_info: file_info(),
        }),
    );
    match next_business_message(&mut s2).await {
        ServerMessage::TransferRequest(p) => {
            assert_eq!(p.from, "a1b2c3");
            assert_eq!(p.file_id, "F1");
        }
        other => panic!("unexpected: {other:?}"),
    }

    router.dispatch(
        "d4e5f6",
        ClientMessage::TransferResponse(TransferResponsePayload {
            to_user_id: "a1b2c3".into(),
            file_id: "F1".into(),
            accepted: true,
            reason: None,
        }),
    );
    assert!(matches!(
        next_business_message(&mut s1).await,
        ServerMessage::TransferAccepted(_)
    ));

    for (index, expected_progress) in [(0u32, 50.0f32), (1, 100.0)] {
        router.dispatch(
            "a1b2c3",
            ClientMessage::FileChunk(FileChunkPayload {
                to_user_id: "d4e5f6".into(),
                file_id: "F1".into(),
                chunk_index: index,
                chunk: "AAECAw==".into(),
                total_chunks: 2,
                chunk_size: 64,
            }),
        );

        match next_business_message(&mut s2).await {
            ServerMessage::FileChunk(p) => {
                assert_eq!(p.chunk_index, index);
                assert_eq!(p.progress, expected_progress);
            }
            other => panic!("unexpected: {other:?}"),
        }
        match next_business_message(&mut s1).await {
            ServerMessage::ChunkAck(p) => {
                assert_eq!(p.status, ChunkAckStatus::Received);
                assert_eq!(p.receiver_progress, Some(expected_progress));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(next_business_message(&mut s1).await, ServerMessage::SyncStatus(_)));
        assert!(matches!(next_business_message(&mut s2).await, ServerMessage::SyncStatus(_)));
    }

    router.dispatch(
        "a1b2c3",
        ClientMessage::TransferComplete(TransferCompletePayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            file_name: Some("a.bin".into()),
        }),
    );
    match next_business_message(&mut s2).await {
        ServerMessage::TransferComplete(p) => {
            assert_eq!(p.from, "a1b2c3");
            assert_eq!(p.file_id, "F1");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn scenario_b_duplicate_chunk() {
    let (router, _sessions) = new_router();
    let mut s1 = connect(&router, "a1b2c3", "Windows PC").await;
    let mut s2 = connect(&router, "d4e5f6", "iPhone").await;

    router.dispatch(
        "a1b2c3",
        ClientMessage::TransferRequest(TransferRequestPayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            file_info: file_info(),
        }),
    );
    assert!(matches!(
        next_business_message(&mut s2).await,
        ServerMessage::TransferRequest(_)
    ));
    router.dispatch(
        "d4e5f6",
        ClientMessage::TransferResponse(TransferResponsePayload {
            to_user_id: "a1b2c3".into(),
            file_id: "F1".into(),
            accepted: true,
            reason: None,
        }),
    );
    assert!(matches!(
        next_business_message(&mut s1).await,
        ServerMessage::TransferAccepted(_)
    ));

    let chunk_zero = ClientMessage::FileChunk(FileChunkPayload {
        to_user_id: "d4e5f6".into(),
        file_id: "F1".into(),
        chunk_index: 0,
        chunk: "AAECAw==".into(),
        total_chunks: 2,
        chunk_size: 64,
    });

    router.dispatch("a1b2c3", chunk_zero.clone());
    assert!(matches!(
        next_business_message(&mut s2).await,
        ServerMessage::FileChunk(_)
    ));
    match next_business_message(&mut s1).await {
        ServerMessage::ChunkAck(p) => assert_eq!(p.status, ChunkAckStatus::Received),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(next_business_message(&mut s1).await, ServerMessage::SyncStatus(_)));
    assert!(matches!(next_business_message(&mut s2).await, ServerMessage::SyncStatus(_)));

    router.dispatch("a1b2c3", chunk_zero);
    match next_business_message(&mut s1).await {
        ServerMessage::ChunkAck(p) => assert_eq!(p.status, ChunkAckStatus::Duplicate),
        other => panic!("unexpected: {other:?}"),
    }
    match next_business_message(&mut s1).await {
        ServerMessage::SyncStatus(p) => assert_eq!(p.duplicates_rejected, 1),
        other => panic!("unexpected: {other:?}"),
    }

    // S2 sees only the one forwarded chunk — the duplicate is never relayed,
    // it only produces a sync-status on the receiver side.
    match tokio::time::timeout(Duration::from_millis(100), next_business_message(&mut s2)).await {
        Ok(ServerMessage::SyncStatus(_)) => {}
        other => panic!("expected only a sync-status on the receiver side, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_receiver_disconnect_mid_transfer() {
    let (router, sessions) = new_router();
    let mut s1 = connect(&router, "a1b2c3", "Windows PC").await;
    let s2 = connect(&router, "d4e5f6", "iPhone").await;

    router.dispatch(
        "a1b2c3",
        ClientMessage::TransferRequest(TransferRequestPayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            file_info: file_info(),
        }),
    );
    router.dispatch(
        "d4e5f6",
        ClientMessage::TransferResponse(TransferResponsePayload {
            to_user_id: "a1b2c3".into(),
            file_id: "F1".into(),
            accepted: true,
            reason: None,
        }),
    );
    assert!(matches!(
        next_business_message(&mut s1).await,
        ServerMessage::TransferAccepted(_)
    ));

    router.dispatch(
        "a1b2c3",
        ClientMessage::FileChunk(FileChunkPayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            chunk_index: 0,
            chunk: "AAECAw==".into(),
            total_chunks: 2,
            chunk_size: 64,
        }),
    );
    assert!(matches!(next_business_message(&mut s1).await, ServerMessage::ChunkAck(_)));
    assert!(matches!(next_business_message(&mut s1).await, ServerMessage::SyncStatus(_)));

    // S2's channel closes; the disconnect cascade tears down the in-flight
    // transfer and notifies the surviving sender immediately.
    drop(s2);
    router.handle_disconnect("d4e5f6");
    assert!(sessions.get("d4e5f6").is_none());
    match next_business_message(&mut s1).await {
        ServerMessage::TransferError(p) => assert_eq!(p.error, "Target user disconnected"),
        other => panic!("unexpected: {other:?}"),
    }

    // The transfer no longer exists, so a further chunk for it is dropped
    // silently rather than producing a second error.
    router.dispatch(
        "a1b2c3",
        ClientMessage::FileChunk(FileChunkPayload {
            to_user_id: "d4e5f6".into(),
            file_id: "F1".into(),
            chunk_index: 1,
            chunk: "AAECAw==".into(),
            total_chunks: 2,
            chunk_size: 64,
        }),
    );
    match tokio::time::timeout(Duration::from_millis(50), next_business_message(&mut s1)).await {
        Err(_) => {}
        Ok(other) => panic!("expected no further message, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_d_unknown_target() {
    let (router, _sessions) = new_router();
    let mut s1 = connect(&router, "a1b2c3", "Windows PC").await;

    router.dispatch(
        "a1b2c3",
        ClientMessage::TransferRequest(TransferRequestPayload {
            to_user_id: "ZZZZZZ".into(),
            file_id: "F2".into(),
            file_info: file_info(),
        }),
    );

    match next_business_message(&mut s1).await {
        ServerMessage::TransferError(p) => {
            assert_eq!(p.error, "Target user not found");
            assert_eq!(p.file_id.as_deref(), Some("F2"));
        }
        other => panic!("unexpected: {other:?}"),
    }

    match tokio::time::timeout(Duration::from_millis(50), s1.recv()).await {
        Err(_) => {}
        Ok(other) => panic!("expected no further message, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_e_idle_eviction() {
    let (router, sessions) = new_router();
    let mut s1 = connect(&router, "s1", "Mac").await;
    let (tx3, _s3) = tokio::sync::mpsc::unbounded_channel();
    router.register_session(Some("s3".into()), Some("Linux PC".into()), tx3).unwrap();

    // S3 exchanges no further messages for the liveness window; S1 pings
    // partway through and so stays fresh.
    tokio::time::sleep(Duration::from_millis(30)).await;
    router.dispatch("s1", ClientMessage::Ping(PingPayload { timestamp: 1 }));
    assert!(matches!(
        next_business_message(&mut s1).await,
        ServerMessage::Pong(_)
    ));

    for session_id in sessions.stale_sessions(Duration::from_millis(15)) {
        router.handle_disconnect(&session_id);
    }

    assert!(sessions.get("s3").is_none());
    assert!(sessions.get("s1").is_some());

    // Roster broadcast to the survivor no longer lists S3.
    tokio::time::sleep(SETTLE).await;
    let mut last_roster = None;
    while let Ok(msg) = tokio::time::timeout(Duration::from_millis(5), s1.recv()).await {
        if let ServerMessage::Devices(roster) = msg.unwrap() {
            last_roster = Some(roster);
        }
    }
    let roster = last_roster.expect("s1 should observe the post-eviction roster");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, "s1");
}
