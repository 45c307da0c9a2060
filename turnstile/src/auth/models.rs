use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input accepted by [`super::UserService::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            display_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Index key used for username uniqueness (case-insensitive).
    pub fn username_key(&self) -> String {
        username_key(&self.username)
    }

    /// Index key used for email uniqueness (case-insensitive).
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }
}

impl From<NewUser> for User {
    fn from(new_user: NewUser) -> Self {
        User::new(new_user.username, new_user.email, new_user.display_name)
    }
}

pub fn username_key(username: &str) -> String {
    username.to_lowercase()
}

pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
