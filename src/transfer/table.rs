use crate::codec::ChunkAckStatus;
use crate::transfer::error::{TransferError, TransferResult};
use crate::transfer::types::{ChunkOutcome, FileDescriptor, SyncStatusSnapshot, Transfer, TransferId, TransferState};
use dashmap::DashMap;
use std::time::Duration;

/// The authoritative store of in-flight transfers.
///
/// Every mutation to a [`Transfer`] goes through a method here; the router
/// never reaches into a `Transfer` directly, it only acts on the outcomes
/// these methods return.
#[derive(Default)]
pub struct TransferTable {
    transfers: DashMap<TransferId, Transfer>,
}

impl TransferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pending(&self, id: TransferId, descriptor: FileDescriptor) -> TransferResult<()> {
        if descriptor.total_chunks == 0 {
            return Err(TransferError::InvalidDescriptor);
        }
        if self.transfers.contains_key(&id) {
            return Err(TransferError::AlreadyExists);
        }
        self.transfers.insert(id, Transfer::new(descriptor));
        Ok(())
    }

    pub fn get(&self, id: &TransferId) -> Option<Transfer> {
        self.transfers.get(id).map(|e| e.clone())
    }

    pub fn accept(&self, id: &TransferId) -> TransferResult<()> {
        let mut entry = self.transfers.get_mut(id).ok_or(TransferError::NotFound)?;
        entry.state = TransferState::Active;
        Ok(())
    }

    /// Process an inbound `file-chunk` from the sender. Validates the index
    /// against the descriptor's declared chunk count: an out-of-range index
    /// is an invariant violation and destroys the transfer (the caller is
    /// expected to check for that by calling `get`/`remove` afterward, the
    /// `Err` variant here already implies removal).
    pub fn record_chunk(&self, id: &TransferId, chunk_index: u32) -> TransferResult<ChunkOutcome> {
        let mut entry = self.transfers.get_mut(id).ok_or(TransferError::NotFound)?;
        let total = entry.descriptor.total_chunks;
        if chunk_index >= total {
            drop(entry);
            self.transfers.remove(id);
            return Err(TransferError::ChunkIndexOutOfRange { index: chunk_index, total });
        }

        entry.state = TransferState::Active;
        entry.last_chunk_time = chrono::Utc::now().timestamp_millis();

        if entry.received.contains(&chunk_index) {
            entry.duplicates += 1;
            return Ok(ChunkOutcome::Duplicate { received_pct: entry.received_pct });
        }

        entry.received.insert(chunk_index);
        let received_pct = (entry.received.len() as f32 / total as f32) * 100.0;
        let implied_sent = ((chunk_index + 1) as f32 / total as f32) * 100.0;
        let sent_pct = entry.sent_pct.max(implied_sent).min(100.0);

        entry.received_pct = received_pct;
        entry.sent_pct = sent_pct;

        Ok(ChunkOutcome::Forwarded { received_pct, sent_pct })
    }

    /// Process an application-layer `chunk-ack` routed from receiver back
    /// through the core (distinct from the ack the router synthesizes
    /// itself in response to `record_chunk`). Duplicate counting is owned
    /// entirely by `record_chunk`'s inbound detection; a `duplicate` status
    /// here only updates progress, it never increments the counter again.
    pub fn record_ack(
        &self,
        id: &TransferId,
        status: ChunkAckStatus,
        receiver_progress: f32,
    ) -> TransferResult<SyncStatusSnapshot> {
        let mut entry = self.transfers.get_mut(id).ok_or(TransferError::NotFound)?;
        if status == ChunkAckStatus::Received {
            entry.received_pct = entry.received_pct.max(receiver_progress);
        }
        Ok(SyncStatusSnapshot::from(&*entry))
    }

    pub fn mark_completed(&self, id: &TransferId) -> TransferResult<()> {
        let mut entry = self.transfers.get_mut(id).ok_or(TransferError::NotFound)?;
        entry.state = TransferState::Completed;
        Ok(())
    }

    pub fn remove(&self, id: &TransferId) -> Option<Transfer> {
        self.transfers.remove(id).map(|(_, t)| t)
    }

    pub fn snapshot(&self, id: &TransferId) -> Option<SyncStatusSnapshot> {
        self.transfers.get(id).map(|e| SyncStatusSnapshot::from(&*e))
    }

    /// All transfer-ids in which `session_id` participates, as sender or
    /// receiver. Used to cascade-cancel on disconnect.
    pub fn transfers_touching(&self, session_id: &str) -> Vec<TransferId> {
        self.transfers
            .iter()
            .filter(|e| e.key().sender == session_id || e.key().receiver == session_id)
            .map(|e| e.key().clone())
            .collect()
    }

    /// Active transfers whose `last_chunk_time` predates `idle_timeout`.
    pub fn idle_transfer_ids(&self, idle_timeout: Duration) -> Vec<TransferId> {
        let cutoff = chrono::Utc::now().timestamp_millis() - idle_timeout.as_millis() as i64;
        self.transfers
            .iter()
            .filter(|e| e.value().state == TransferState::Active && e.value().last_chunk_time < cutoff)
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}
