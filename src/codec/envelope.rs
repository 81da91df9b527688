//! Tagged `{ type, data }` envelope definitions for the duplex wire format.
//!
//! Binary chunk bodies travel as base64 strings inside `data.chunk`; the
//! codec never decodes them into a separate buffer, it just passes the
//! `String` through so the relay path avoids a copy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub total_chunks: u32,
    pub chunk_size: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkAckStatus {
    Received,
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub user_id: Option<String>,
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PingPayload {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestPayload {
    pub to_user_id: String,
    pub file_id: String,
    pub file_info: FileInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponsePayload {
    pub to_user_id: String,
    pub file_id: String,
    pub accepted: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunkPayload {
    pub to_user_id: String,
    pub file_id: String,
    pub chunk_index: u32,
    pub chunk: String,
    pub total_chunks: u32,
    pub chunk_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAckPayload {
    pub to_user_id: String,
    pub file_id: String,
    pub chunk_index: u32,
    pub status: ChunkAckStatus,
    pub receiver_progress: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCompletePayload {
    pub to_user_id: String,
    pub file_id: String,
    pub file_name: Option<String>,
}

/// Wire shape is `{ transferId, reason? }`. `file_id` is an accepted but
/// undocumented fallback for callers that don't have a `transferId` on hand;
/// see `Router::handle_cancel_transfer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelTransferPayload {
    pub transfer_id: Option<String>,
    pub file_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTransferPayload {
    pub to_user_id: String,
    pub file_id: String,
    pub from_chunk: u32,
}

/// Everything the duplex channel accepts from a connected peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Register(RegisterPayload),
    Ping(PingPayload),
    TransferRequest(TransferRequestPayload),
    TransferResponse(TransferResponsePayload),
    FileChunk(FileChunkPayload),
    ChunkAck(ChunkAckPayload),
    TransferComplete(TransferCompletePayload),
    CancelTransfer(CancelTransferPayload),
    ResumeTransfer(ResumeTransferPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPayload {
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PongPayload {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntryPayload {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedTransferRequestPayload {
    pub from: String,
    pub file_id: String,
    pub file_info: FileInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAcceptedPayload {
    pub from_user_id: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRejectedPayload {
    pub from_user_id: String,
    pub file_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedFileChunkPayload {
    pub from: String,
    pub file_id: String,
    pub chunk_index: u32,
    pub chunk: String,
    pub total_chunks: u32,
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedChunkAckPayload {
    pub file_id: String,
    pub chunk_index: u32,
    pub status: ChunkAckStatus,
    pub receiver_progress: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusPayload {
    pub sender_id: String,
    pub receiver_id: String,
    pub file_id: String,
    pub sender_progress: f32,
    pub receiver_progress: f32,
    pub sync_lag: f32,
    pub duplicates_rejected: u32,
    pub last_chunk_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedTransferCompletePayload {
    pub from: String,
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferErrorPayload {
    pub error: String,
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedResumeTransferPayload {
    pub from: String,
    pub file_id: String,
    pub from_chunk: u32,
}

/// Everything the core may push down a duplex channel to a connected peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    Registered(RegisteredPayload),
    Pong(PongPayload),
    Devices(Vec<RosterEntryPayload>),
    TransferRequest(RelayedTransferRequestPayload),
    TransferAccepted(TransferAcceptedPayload),
    TransferRejected(TransferRejectedPayload),
    FileChunk(RelayedFileChunkPayload),
    ChunkAck(RelayedChunkAckPayload),
    SyncStatus(SyncStatusPayload),
    TransferComplete(RelayedTransferCompletePayload),
    TransferError(TransferErrorPayload),
    ResumeTransfer(RelayedResumeTransferPayload),
}
