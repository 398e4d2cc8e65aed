use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Server-side session store mapping opaque tokens to user ids.
///
/// Sessions are ephemeral: created on login, destroyed on logout or expiry,
/// gone with the store.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session for the user and returns the new token.
    async fn create(&self, user_id: &str) -> String;

    /// Resolves a token to its user id, `None` if unknown or expired.
    async fn get(&self, token: &str) -> Option<String>;

    /// Drops the session. Unknown tokens are a no-op.
    async fn destroy(&self, token: &str);
}

struct Session {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// In-process session store with explicit expiry.
pub struct MemorySessions {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessions {
    async fn create(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session);
        token
    }

    async fn get(&self, token: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if session.expires_at > Utc::now() => {
                    return Some(session.user_id.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: evict under the write lock.
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        None
    }

    async fn destroy(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
    }
}
