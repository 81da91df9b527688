//! Router: dispatches decoded client messages against the Session Registry
//! and Transfer Table, and owns the composition of "disconnect cancels
//! outstanding transfers" that neither store performs on its own.

pub mod error;

use crate::codec::*;
use crate::metrics;
use crate::session::SessionRegistry;
use crate::transfer::{ChunkOutcome, FileDescriptor, TransferId, TransferTable};
use error::RouterFault;
use std::sync::Arc;
use std::time::Duration;

pub struct Router {
    sessions: Arc<SessionRegistry>,
    transfers: Arc<TransferTable>,
    completion_grace_period: Duration,
}

impl Router {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        transfers: Arc<TransferTable>,
        completion_grace_period: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            transfers,
            completion_grace_period,
        })
    }

    /// Handle a `register` message arriving with no prior session on this
    /// connection. Returns the assigned session-id on success.
    pub fn register_session(
        &self,
        requested_id: Option<String>,
        device_name: Option<String>,
        outbound: tokio::sync::mpsc::UnboundedSender<ServerMessage>,
    ) -> crate::session::SessionResult<String> {
        let id = requested_id.unwrap_or_else(new_session_id);

        // Enqueued ahead of `register`'s own roster broadcast so the client
        // always sees `registered` before the first `devices` roster.
        let _ = outbound.send(ServerMessage::Registered(RegisteredPayload { user_id: id.clone() }));

        self.sessions.register(
            id.clone(),
            device_name.unwrap_or_else(|| "device".to_string()),
            outbound,
        )?;
        metrics::record_session_registered();
        Ok(id)
    }

    /// Dispatch any message on an already-established session.
    pub fn dispatch(&self, session_id: &str, message: ClientMessage) {
        self.sessions.touch(session_id);
        match message {
            ClientMessage::Register(p) => self.handle_redeclare(session_id, p),
            ClientMessage::Ping(p) => self.handle_ping(session_id, p),
            ClientMessage::TransferRequest(p) => self.handle_transfer_request(session_id, p),
            ClientMessage::TransferResponse(p) => self.handle_transfer_response(session_id, p),
            ClientMessage::FileChunk(p) => self.handle_file_chunk(session_id, p),
            ClientMessage::ChunkAck(p) => self.handle_chunk_ack(session_id, p),
            ClientMessage::TransferComplete(p) => self.handle_transfer_complete(session_id, p),
            ClientMessage::CancelTransfer(p) => self.handle_cancel_transfer(session_id, p),
            ClientMessage::ResumeTransfer(p) => self.handle_resume_transfer(session_id, p),
        }
    }

    fn handle_redeclare(&self, session_id: &str, payload: RegisterPayload) {
        if let Some(name) = payload.device_name {
            if self.sessions.update_device_name(session_id, name).is_err() {
                tracing::warn!(session_id, "register redeclare on unknown session");
            }
        }
    }

    fn handle_ping(&self, session_id: &str, payload: PingPayload) {
        self.sessions.send(
            session_id,
            ServerMessage::Pong(PongPayload { timestamp: payload.timestamp }),
        );
    }

    fn handle_transfer_request(&self, sender: &str, payload: TransferRequestPayload) {
        if !self.sessions_has(&payload.to_user_id) {
            self.sessions.send(
                sender,
                transfer_error(RouterFault::TargetNotFound, Some(payload.file_id)),
            );
            return;
        }

        if payload.file_info.total_chunks == 0 {
            self.sessions.send(
                sender,
                transfer_error(RouterFault::InvalidDescriptor, Some(payload.file_id)),
            );
            return;
        }

        let id = TransferId::new(sender, payload.to_user_id.clone(), payload.file_id.clone());
        let descriptor = FileDescriptor {
            name: payload.file_info.name.clone(),
            size: payload.file_info.size,
            mime_type: payload.file_info.mime_type.clone(),
            total_chunks: payload.file_info.total_chunks,
            chunk_size: payload.file_info.chunk_size,
        };

        if self.transfers.create_pending(id, descriptor).is_err() {
            tracing::debug!(sender, to = %payload.to_user_id, "duplicate transfer-request ignored");
            return;
        }
        metrics::record_transfer_created();

        self.sessions.send(
            &payload.to_user_id,
            ServerMessage::TransferRequest(RelayedTransferRequestPayload {
                from: sender.to_string(),
                file_id: payload.file_id,
                file_info: payload.file_info,
            }),
        );
    }

    fn handle_transfer_response(&self, receiver: &str, payload: TransferResponsePayload) {
        let id = TransferId::new(payload.to_user_id.clone(), receiver, payload.file_id.clone());

        if payload.accepted {
            if self.transfers.accept(&id).is_err() {
                tracing::debug!(receiver, "transfer-response for unknown transfer");
                return;
            }
            self.sessions.send(
                &payload.to_user_id,
                ServerMessage::TransferAccepted(TransferAcceptedPayload {
                    from_user_id: receiver.to_string(),
                    file_id: payload.file_id,
                }),
            );
        } else {
            if self.transfers.remove(&id).is_none() {
                tracing::debug!(receiver, "transfer-response reject for unknown transfer");
                return;
            }
            metrics::record_transfer_cancelled();
            self.sessions.send(
                &payload.to_user_id,
                ServerMessage::TransferRejected(TransferRejectedPayload {
                    from_user_id: receiver.to_string(),
                    file_id: payload.file_id,
                    reason: payload.reason,
                }),
            );
        }
    }

    fn handle_file_chunk(&self, sender: &str, payload: FileChunkPayload) {
        let id = TransferId::new(sender, payload.to_user_id.clone(), payload.file_id.clone());

        let outcome = match self.transfers.record_chunk(&id, payload.chunk_index) {
            Ok(outcome) => outcome,
            Err(crate::transfer::TransferError::NotFound) => {
                tracing::debug!(sender, "file-chunk for unknown transfer, dropping");
                return;
            }
            Err(crate::transfer::TransferError::ChunkIndexOutOfRange { index, total }) => {
                tracing::warn!(sender, index, total, "chunk index out of range, destroying transfer");
                metrics::record_transfer_failed();
                self.sessions.send(
                    sender,
                    transfer_error(RouterFault::InvalidDescriptor, Some(payload.file_id)),
                );
                return;
            }
            Err(_) => return,
        };

        match outcome {
            ChunkOutcome::Duplicate { received_pct } => {
                metrics::record_chunk_duplicate();
                self.sessions.send(
                    sender,
                    ServerMessage::ChunkAck(RelayedChunkAckPayload {
                        file_id: payload.file_id.clone(),
                        chunk_index: payload.chunk_index,
                        status: ChunkAckStatus::Duplicate,
                        receiver_progress: Some(received_pct),
                    }),
                );
            }
            ChunkOutcome::Forwarded { received_pct, .. } => {
                let delivered = self.sessions.send(
                    &payload.to_user_id,
                    ServerMessage::FileChunk(RelayedFileChunkPayload {
                        from: sender.to_string(),
                        file_id: payload.file_id.clone(),
                        chunk_index: payload.chunk_index,
                        chunk: payload.chunk,
                        total_chunks: payload.total_chunks,
                        progress: received_pct,
                    }),
                );

                if !delivered {
                    self.fail_transfer(&id, sender, RouterFault::TargetDisconnected);
                    return;
                }
                metrics::record_chunk_relayed();

                self.sessions.send(
                    sender,
                    ServerMessage::ChunkAck(RelayedChunkAckPayload {
                        file_id: payload.file_id.clone(),
                        chunk_index: payload.chunk_index,
                        status: ChunkAckStatus::Received,
                        receiver_progress: Some(received_pct),
                    }),
                );
            }
        }

        self.emit_sync_status(&id, sender, &payload.to_user_id, &payload.file_id);
    }

    fn handle_chunk_ack(&self, receiver: &str, payload: ChunkAckPayload) {
        let id = TransferId::new(payload.to_user_id.clone(), receiver, payload.file_id.clone());
        if self
            .transfers
            .record_ack(&id, payload.status, payload.receiver_progress)
            .is_err()
        {
            tracing::debug!(receiver, "chunk-ack for unknown transfer");
        }

        self.sessions.send(
            &payload.to_user_id,
            ServerMessage::ChunkAck(RelayedChunkAckPayload {
                file_id: payload.file_id,
                chunk_index: payload.chunk_index,
                status: payload.status,
                receiver_progress: Some(payload.receiver_progress),
            }),
        );
    }

    fn handle_transfer_complete(&self, sender: &str, payload: TransferCompletePayload) {
        let id = TransferId::new(sender, payload.to_user_id.clone(), payload.file_id.clone());
        if self.transfers.mark_completed(&id).is_err() {
            tracing::debug!(sender, "transfer-complete for unknown transfer");
            return;
        }

        let delivered = self.sessions.send(
            &payload.to_user_id,
            ServerMessage::TransferComplete(RelayedTransferCompletePayload {
                from: sender.to_string(),
                file_id: payload.file_id,
                file_name: payload.file_name,
            }),
        );

        if !delivered {
            self.fail_transfer(&id, sender, RouterFault::TargetDisconnected);
            return;
        }
        metrics::record_transfer_completed();

        let transfers = self.transfers.clone();
        let grace = self.completion_grace_period;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            transfers.remove(&id);
        });
    }

    /// Resolve to a transfer via the wire `transferId` (`sender:receiver:fileId`,
    /// see [`TransferId::from_wire`]) when present, rejecting one that doesn't
    /// name `from` as a participant; otherwise fall back to the `fileId` plus
    /// caller-identity lookup for callers that only send that much.
    fn handle_cancel_transfer(&self, from: &str, payload: CancelTransferPayload) {
        let via_transfer_id = payload
            .transfer_id
            .as_deref()
            .and_then(TransferId::from_wire)
            .filter(|id| id.sender == from || id.receiver == from);

        let id = match via_transfer_id {
            Some(id) => id,
            None => match payload.file_id.as_deref() {
                Some(file_id) => match self.find_transfer_for(from, file_id) {
                    Some((id, _)) => id,
                    None => return,
                },
                None => {
                    tracing::debug!(from, "cancel-transfer could not be resolved, ignoring");
                    return;
                }
            },
        };

        if self.transfers.remove(&id).is_none() {
            return;
        }
        metrics::record_transfer_cancelled();

        let counterpart = if id.sender == from { &id.receiver } else { &id.sender };
        self.sessions.send(
            counterpart,
            ServerMessage::TransferError(TransferErrorPayload {
                error: "cancelled by peer".to_string(),
                file_id: Some(id.file_id.clone()),
            }),
        );
    }

    /// Forwarded without interpretation; the target client decides how to
    /// honor a resume request. The core never reconstructs transfer state
    /// from it (no cross-restart resume, per the data model's non-goals).
    fn handle_resume_transfer(&self, from: &str, payload: ResumeTransferPayload) {
        self.sessions.send(
            &payload.to_user_id,
            ServerMessage::ResumeTransfer(RelayedResumeTransferPayload {
                from: from.to_string(),
                file_id: payload.file_id,
                from_chunk: payload.from_chunk,
            }),
        );
    }

    /// Cascade-cancel every transfer the disconnecting session participates
    /// in, notify the surviving counterpart, then remove the session and
    /// broadcast the updated roster.
    pub fn handle_disconnect(&self, session_id: &str) {
        for id in self.transfers.transfers_touching(session_id) {
            let counterpart = if id.sender == session_id {
                id.receiver.clone()
            } else {
                id.sender.clone()
            };
            if self.transfers.remove(&id).is_some() {
                metrics::record_transfer_failed();
                self.sessions.send(
                    &counterpart,
                    transfer_error(RouterFault::TargetDisconnected, Some(id.file_id.clone())),
                );
            }
        }

        if self.sessions.unregister(session_id).is_some() {
            metrics::record_session_unregistered();
        }
    }

    /// Periodic sweep: fail transfers with no chunk activity within the
    /// configured idle window.
    pub fn sweep_idle_transfers(&self, idle_timeout: Duration) {
        for id in self.transfers.idle_transfer_ids(idle_timeout) {
            if self.transfers.remove(&id).is_none() {
                continue;
            }
            metrics::record_transfer_failed();
            tracing::info!(sender = %id.sender, receiver = %id.receiver, file_id = %id.file_id, "transfer idle timeout");

            for participant in [&id.sender, &id.receiver] {
                self.sessions.send(
                    participant,
                    transfer_error(RouterFault::TransferIdle, Some(id.file_id.clone())),
                );
            }
        }
    }

    fn fail_transfer(&self, id: &TransferId, survivor: &str, fault: RouterFault) {
        if self.transfers.remove(id).is_some() {
            metrics::record_transfer_failed();
        }
        self.sessions.send(survivor, transfer_error(fault, Some(id.file_id.clone())));
    }

    fn emit_sync_status(&self, id: &TransferId, sender: &str, receiver: &str, file_id: &str) {
        let Some(snapshot) = self.transfers.snapshot(id) else {
            return;
        };
        let message = ServerMessage::SyncStatus(SyncStatusPayload {
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            file_id: file_id.to_string(),
            sender_progress: snapshot.sender_progress,
            receiver_progress: snapshot.receiver_progress,
            sync_lag: snapshot.sync_lag,
            duplicates_rejected: snapshot.duplicates_rejected,
            last_chunk_time: snapshot.last_chunk_time,
        });
        self.sessions.send(sender, message.clone());
        self.sessions.send(receiver, message);
    }

    fn sessions_has(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).is_some()
    }

    /// Look up an in-flight transfer naming `participant` as either side,
    /// for the (transferId-less) `cancel-transfer{fileId}` shape.
    fn find_transfer_for(&self, participant: &str, file_id: &str) -> Option<(TransferId, String)> {
        for id in self.transfers.transfers_touching(participant) {
            if id.file_id != file_id {
                continue;
            }
            let counterpart = if id.sender == participant {
                id.receiver.clone()
            } else {
                id.sender.clone()
            };
            return Some((id, counterpart));
        }
        None
    }
}

fn transfer_error(fault: RouterFault, file_id: Option<String>) -> ServerMessage {
    ServerMessage::TransferError(TransferErrorPayload {
        error: fault.wire_message().to_string(),
        file_id,
    })
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Spawn the periodic idle-transfer sweep alongside the liveness sweep.
pub fn spawn_idle_sweep(
    router: Arc<Router>,
    idle_timeout: Duration,
    sweep_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            router.sweep_idle_transfers(idle_timeout);
        }
    })
}
