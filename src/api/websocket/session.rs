//! Session tracking for connected WebSocket clients

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::RwLock;

/// One connected client
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub client_id: String,
    pub peer: Option<SocketAddr>,
    pub connected_at: i64,
}

/// Session manager for tracking connected clients
pub struct SessionManager {
    sessions: RwLock<HashMap<String, ClientSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a new opaque client handle
    pub fn generate_client_id() -> String {
        format!("client_{}", uuid::Uuid::new_v4().simple())
    }

    /// Register a newly connected client
    pub async fn create_session(&self, peer: Option<SocketAddr>) -> ClientSession {
        let session = ClientSession {
            client_id: Self::generate_client_id(),
            peer,
            connected_at: chrono::Utc::now().timestamp(),
        };

        self.sessions
            .write()
            .await
            .insert(session.client_id.clone(), session.clone());
        session
    }

    /// Remove a session
    pub async fn remove_session(&self, client_id: &str) -> Option<ClientSession> {
        self.sessions.write().await.remove(client_id)
    }

    /// Get active session count
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Wait until every session has been removed or `timeout` elapses.
    /// Returns true if all sessions drained.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let poll = async {
            while self.session_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_are_unique() {
        let a = SessionManager::generate_client_id();
        let b = SessionManager::generate_client_id();
        assert!(a.starts_with("client_"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        // Create session
        let session = manager.create_session(Some(peer)).await;
        assert_eq!(session.peer, Some(peer));

        // Count
        assert_eq!(manager.session_count().await, 1);

        // Remove
        assert!(manager.remove_session(&session.client_id).await.is_some());
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_times_out_with_live_sessions() {
        let manager = SessionManager::new();
        manager.create_session(None).await;

        assert!(!manager.drain(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_drain_with_no_sessions() {
        let manager = SessionManager::new();
        assert!(manager.drain(Duration::from_millis(50)).await);
    }
}
