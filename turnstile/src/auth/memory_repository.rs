use super::error::AuthError;
use super::models::{email_key, username_key, User};
use super::repository::UserRepository;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-local user store. Contents are lost on shutdown.
#[derive(Default)]
pub struct InMemoryUserRepository {
    // Primary index: id -> user
    users: DashMap<String, User>,
    // Secondary indexes: normalized username / email -> id
    by_username: DashMap<String, String>,
    by_email: DashMap<String, String>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let email = user.email_key();

        // The record goes in first so a claimed username always resolves.
        // The fresh id is not reachable until an index points at it.
        self.users.insert(user.id.clone(), user.clone());

        match self.by_email.entry(email.clone()) {
            Entry::Occupied(_) => {
                self.users.remove(&user.id);
                return Err(AuthError::EmailAlreadyRegistered);
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        match self.by_username.entry(user.username_key()) {
            Entry::Occupied(_) => {
                self.by_email.remove(&email);
                self.users.remove(&user.id);
                return Err(AuthError::UserAlreadyExists);
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let id = match self.by_username.get(&username_key(username)) {
            Some(id) => id.value().clone(),
            None => return Ok(None),
        };

        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.by_username.contains_key(&username_key(username)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.by_email.contains_key(&email_key(email)))
    }
}
