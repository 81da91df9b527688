use crate::codec::{RosterEntryPayload, ServerMessage};
use crate::metrics;
use crate::session::error::{SessionError, SessionResult};
use crate::session::types::Session;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The authoritative set of live peer sessions.
///
/// Exclusively owns [`Session`] values; every other component resolves a
/// session-id through here at the moment it needs to touch one rather than
/// retaining a handle of its own.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
    roster_settle_delay: Duration,
}

impl SessionRegistry {
    pub fn new(roster_settle_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            roster_settle_delay,
        })
    }

    /// Register a newly connected peer. Schedules an immediate roster
    /// broadcast plus a settled one after `roster_settle_delay` to absorb
    /// near-simultaneous arrivals.
    pub fn register(
        self: &Arc<Self>,
        session_id: String,
        device_name: String,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> SessionResult<()> {
        if self.sessions.contains_key(&session_id) {
            return Err(SessionError::DuplicateSession(session_id));
        }

        tracing::info!(session_id = %session_id, device_name = %device_name, "session registered");
        self.sessions.insert(
            session_id.clone(),
            Arc::new(Session::new(session_id, device_name, outbound)),
        );

        self.broadcast_roster();
        let registry = self.clone();
        let delay = self.roster_settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.broadcast_roster();
        });

        Ok(())
    }

    pub fn update_device_name(&self, session_id: &str, new_name: String) -> SessionResult<()> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        *session.device_name.write() = new_name;
        drop(session);
        self.broadcast_roster();
        Ok(())
    }

    /// Remove a session. Returns the removed session, if any, so the caller
    /// (the router) can tear down its outstanding transfers — the registry
    /// itself holds no reference into the transfer table.
    pub fn unregister(&self, session_id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(session_id).map(|(_, s)| s);
        if removed.is_some() {
            tracing::info!(session_id = %session_id, "session unregistered");
            self.broadcast_roster();
        }
        removed
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|e| e.clone())
    }

    pub fn touch(&self, session_id: &str) {
        if let Some(session) = self.sessions.get(session_id) {
            session.touch();
        }
    }

    /// Best-effort delivery to one session. Never blocks: the outbound
    /// channel is unbounded and drained by that session's socket writer
    /// task, which itself enforces the per-send deadline against the
    /// underlying transport.
    pub fn send(&self, session_id: &str, message: ServerMessage) -> bool {
        match self.sessions.get(session_id) {
            Some(session) => session.try_send(message),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    /// Sessions whose last heartbeat is older than `window`, as of now.
    pub fn stale_sessions(&self, window: Duration) -> Vec<String> {
        let cutoff = chrono::Utc::now().timestamp_millis() - window.as_millis() as i64;
        self.sessions
            .iter()
            .filter(|e| e.value().last_heartbeat() < cutoff)
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn broadcast_roster(&self) {
        let roster: Vec<RosterEntryPayload> = self
            .sessions
            .iter()
            .map(|e| {
                let entry = e.value().roster_entry();
                RosterEntryPayload {
                    id: entry.id,
                    name: entry.name,
                }
            })
            .collect();

        tracing::debug!(count = roster.len(), "broadcasting roster");
        for entry in self.sessions.iter() {
            entry.value().try_send(ServerMessage::Devices(roster.clone()));
        }
        metrics::record_roster_broadcast();
    }
}
