use super::error::AuthError;
use super::models::User;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails if the username or email is already taken.
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Check if a username exists
    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;
}
