//! Live stream session tracking.
//!
//! Every relay registers a session for as long as it streams. The registry
//! only observes: it lists sessions and, on server shutdown, cancels the
//! token every relay listens to so their workers get interrupted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use u7d_common::{Program, RequestIdentity};
use uuid::Uuid;

/// A program being relayed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSession {
    /// Unique session identifier (UUID).
    pub id: String,
    /// Client IP address.
    pub client_ip: String,
    /// Request path segments.
    pub identity: RequestIdentity,
    /// Program the worker is playing.
    pub program_id: String,
    /// Local UDP port the worker sends to.
    pub client_port: u16,
    /// Worker process id.
    pub worker_pid: Option<u32>,
    /// Session start timestamp.
    pub started_at: DateTime<Utc>,
}

/// Thread-safe registry of live stream sessions.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, StreamSession>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new streaming session.
    ///
    /// The session lasts until the returned ticket is dropped.
    pub fn register_session(
        &self,
        client_ip: String,
        identity: &RequestIdentity,
        program: &Program,
        client_port: u16,
        worker_pid: Option<u32>,
    ) -> SessionTicket {
        let session_id = Uuid::new_v4().to_string();

        let session = StreamSession {
            id: session_id.clone(),
            client_ip,
            identity: identity.clone(),
            program_id: program.program_id.clone(),
            client_port,
            worker_pid,
            started_at: Utc::now(),
        };

        self.sessions.insert(session_id.clone(), session);
        tracing::info!(
            session_id = %session_id,
            program_id = %program.program_id,
            client_port = client_port,
            "Registered new stream session"
        );

        SessionTicket {
            id: session_id,
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// List all active sessions.
    pub fn list_active_sessions(&self) -> Vec<StreamSession> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Token cancelled when the server shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every live relay.
    pub fn shutdown(&self) {
        tracing::info!(active = self.len(), "Stopping all stream sessions");
        self.shutdown.cancel();
    }

    /// Get the number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if there are any active sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Keeps a session registered; dropping it ends the session.
pub struct SessionTicket {
    id: String,
    sessions: Arc<DashMap<String, StreamSession>>,
}

impl SessionTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        if let Some((_, session)) = self.sessions.remove(&self.id) {
            tracing::info!(
                session_id = %self.id,
                program_id = %session.program_id,
                duration_secs = (Utc::now() - session.started_at).num_seconds(),
                "Ended stream session"
            );
        }
    }
}
