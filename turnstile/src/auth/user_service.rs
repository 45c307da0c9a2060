use super::error::AuthError;
use super::models::{NewUser, User};
use super::repository::UserRepository;
use std::sync::Arc;
use tracing::info;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Register a new user.
    ///
    /// The existence checks give a precise error early; the repository still
    /// enforces uniqueness atomically, so concurrent registrations of the same
    /// name cannot both succeed.
    pub async fn register(&self, new_user: NewUser) -> Result<User, AuthError> {
        if self.user_repo.username_exists(&new_user.username).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        if self.user_repo.email_exists(&new_user.email).await? {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let user = self.user_repo.create(User::from(new_user)).await?;
        info!("REGISTER: username={}, id={}", user.username, user.id);

        Ok(user)
    }

    /// Get a user by username
    pub async fn get_user(&self, username: &str) -> Result<User, AuthError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory_repository::InMemoryUserRepository;
    use crate::auth::sled_repository::SledUserRepository;
    use tempfile::TempDir;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_user() {
        let user_service = UserService::new(Arc::new(InMemoryUserRepository::new()));

        let user = user_service
            .register(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                display_name: Some("Alice".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));

        let fetched = user_service.get_user("ALICE").await.unwrap();
        assert_eq!(fetched.id, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let user_service = UserService::new(Arc::new(InMemoryUserRepository::new()));

        user_service
            .register(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = user_service
            .register(new_user("alice", "alice2@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();
        let user_service = UserService::new(Arc::new(repo));

        user_service
            .register(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let result = user_service
            .register(new_user("bob", "alice@example.com"))
            .await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyRegistered)));
        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let user_service = UserService::new(Arc::new(InMemoryUserRepository::new()));
        let result = user_service.get_user("nobody").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }
}
