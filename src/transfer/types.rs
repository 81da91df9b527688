use std::collections::HashSet;

/// Identity of a transfer: the (sender, receiver, file) triple the wire
/// protocol uses to address it. Two peers can run multiple concurrent
/// transfers as long as their `file_id`s differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferId {
    pub sender: String,
    pub receiver: String,
    pub file_id: String,
}

impl TransferId {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            file_id: file_id.into(),
        }
    }

    /// Canonical wire representation of a transfer-id: `sender:receiver:fileId`.
    /// The file-id is greedy (takes the remainder) so it may itself contain
    /// colons; session ids cannot, so the first two fields are unambiguous.
    pub fn to_wire(&self) -> String {
        format!("{}:{}:{}", self.sender, self.receiver, self.file_id)
    }

    pub fn from_wire(wire: &str) -> Option<Self> {
        let mut parts = wire.splitn(3, ':');
        let sender = parts.next()?;
        let receiver = parts.next()?;
        let file_id = parts.next()?;
        if sender.is_empty() || receiver.is_empty() || file_id.is_empty() {
            return None;
        }
        Some(Self::new(sender, receiver, file_id))
    }
}

#[cfg(test)]
mod transfer_id_tests {
    use super::*;

    #[test]
    fn wire_round_trips() {
        let id = TransferId::new("a1b2c3", "d4e5f6", "F1");
        assert_eq!(TransferId::from_wire(&id.to_wire()), Some(id));
    }

    #[test]
    fn wire_round_trips_with_colon_in_file_id() {
        let id = TransferId::new("a1b2c3", "d4e5f6", "F1:part2");
        assert_eq!(TransferId::from_wire(&id.to_wire()), Some(id));
    }

    #[test]
    fn rejects_malformed_wire_id() {
        assert_eq!(TransferId::from_wire("missing-parts"), None);
        assert_eq!(TransferId::from_wire("a::"), None);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub total_chunks: u32,
    pub chunk_size: u32,
}

/// Per-transfer mutable state. Exclusively owned and mutated by
/// [`crate::transfer::TransferTable`]; nothing outside the table ever holds
/// a `&mut Transfer`.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub state: TransferState,
    pub descriptor: FileDescriptor,
    pub received: HashSet<u32>,
    pub duplicates: u32,
    pub sent_pct: f32,
    pub received_pct: f32,
    pub last_chunk_time: i64,
    pub created_at: i64,
}

impl Transfer {
    pub fn new(descriptor: FileDescriptor) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            state: TransferState::Pending,
            descriptor,
            received: HashSet::new(),
            duplicates: 0,
            sent_pct: 0.0,
            received_pct: 0.0,
            last_chunk_time: now,
            created_at: now,
        }
    }

    pub fn sync_lag(&self) -> f32 {
        (self.sent_pct - self.received_pct).max(0.0)
    }
}

/// The outcome of feeding one `file-chunk` message into the table, driving
/// what the router must do next.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// First time this index was seen: forward to the receiver and ack
    /// "received" to the sender.
    Forwarded { received_pct: f32, sent_pct: f32 },
    /// Index was already in the received set: ack "duplicate", do not
    /// forward.
    Duplicate { received_pct: f32 },
}

/// A point-in-time snapshot suitable for emitting as `sync-status`.
#[derive(Debug, Clone)]
pub struct SyncStatusSnapshot {
    pub sender_progress: f32,
    pub receiver_progress: f32,
    pub sync_lag: f32,
    pub duplicates_rejected: u32,
    pub last_chunk_time: i64,
}

impl From<&Transfer> for SyncStatusSnapshot {
    fn from(t: &Transfer) -> Self {
        Self {
            sender_progress: t.sent_pct,
            receiver_progress: t.received_pct,
            sync_lag: t.sync_lag(),
            duplicates_rejected: t.duplicates,
            last_chunk_time: t.last_chunk_time,
        }
    }
}
