use crate::codec::ServerMessage;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::mpsc;

/// Device-class prefixes the display-name heuristic recognizes, mapped to
/// their abbreviated roster class, longest/most specific prefix first so
/// "Linux PC" doesn't get shadowed by a shorter one. Both PC variants
/// collapse to the bare "PC" class, matching the worked roster example.
const DEVICE_CLASS_TOKENS: &[(&str, &str)] = &[
    ("Windows PC", "PC"),
    ("Linux PC", "PC"),
    ("Mac", "Mac"),
    ("iPhone", "iPhone"),
    ("iPad", "iPad"),
    ("Android", "Android"),
];

fn classify_device(device_name: &str) -> Option<&'static str> {
    DEVICE_CLASS_TOKENS
        .iter()
        .find(|(prefix, _)| device_name.starts_with(prefix))
        .map(|(_, class)| *class)
}

/// Derive the display name broadcast in the roster: `<class-or-name>-<suffix>`.
pub fn display_name(device_name: &str, session_id: &str) -> String {
    let suffix_len = session_id
        .char_indices()
        .nth(6)
        .map(|(i, _)| i)
        .unwrap_or(session_id.len());
    let suffix = &session_id[..suffix_len];
    match classify_device(device_name) {
        Some(token) => format!("{token}-{suffix}"),
        None => format!("{device_name}-{suffix}"),
    }
}

#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

/// One connected peer's live relationship with the core.
///
/// Owned exclusively by the [`crate::session::SessionRegistry`]; nothing
/// outside the registry holds a long-lived reference to this type, only to
/// its `session_id`.
pub struct Session {
    pub session_id: String,
    pub device_name: parking_lot::RwLock<String>,
    pub connected_at: i64,
    last_heartbeat: AtomicI64,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl Session {
    pub fn new(
        session_id: String,
        device_name: String,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            session_id,
            device_name: parking_lot::RwLock::new(device_name),
            connected_at: now,
            last_heartbeat: AtomicI64::new(now),
            outbound,
        }
    }

    pub fn device_name(&self) -> String {
        self.device_name.read().clone()
    }

    pub fn last_heartbeat(&self) -> i64 {
        self.last_heartbeat.load(Ordering::Relaxed)
    }

    pub fn touch(&self) {
        self.last_heartbeat
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            id: self.session_id.clone(),
            name: display_name(&self.device_name(), &self.session_id),
        }
    }

    /// Push a message onto this session's outbound queue. Returns `false`
    /// if the receiving half has already gone away (the socket task exited).
    pub fn try_send(&self, message: ServerMessage) -> bool {
        self.outbound.send(message).is_ok()
    }
}
