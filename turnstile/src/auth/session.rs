use super::models::{username_key, User};
use chrono::{DateTime, TimeDelta, Utc};
use moka::future::Cache;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Opaque bearer token, 64 hex characters
pub type SessionToken = String;

// moka rejects lifetimes beyond 1000 years; a year is plenty for a login
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A login issued for a freshly registered user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user: User,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub client_ip: Option<String>,
}

impl Session {
    /// Lifetime in whole seconds
    pub fn expires_in(&self) -> u64 {
        (self.expires_at - self.issued_at).num_seconds().max(0) as u64
    }
}

/// Issues sessions and keeps them until their TTL runs out
pub struct SessionStore {
    sessions: Cache<SessionToken, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: Option<u64>) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let mut builder = Cache::builder().time_to_live(ttl);

        if let Some(capacity) = max_sessions {
            builder = builder.max_capacity(capacity);
        }

        Self {
            sessions: builder.build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create and store a session for `user`
    pub async fn issue(&self, user: User, client_ip: Option<String>) -> Session {
        let issued_at = Utc::now();
        let expires_at = TimeDelta::from_std(self.ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let session = Session {
            token: generate_token(),
            user,
            issued_at,
            expires_at,
            client_ip,
        };

        self.sessions
            .insert(session.token.clone(), session.clone())
            .await;
        debug!("Session issued for {}", session.user.username);

        session
    }

    /// Live sessions owned by `username` (case-insensitive)
    pub fn sessions_for(&self, username: &str) -> Vec<Session> {
        let key = username_key(username);
        self.sessions
            .iter()
            .filter(|(_, session)| session.user.username_key() == key)
            .map(|(_, session)| session)
            .collect()
    }
}

fn generate_token() -> SessionToken {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
