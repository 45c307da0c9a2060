use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username is already taken")]
    UserAlreadyExists,

    #[error("Email is already registered")]
    EmailAlreadyRegistered,

    #[error("User not found")]
    UserNotFound,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AuthError {
    /// Whether the error describes a registration conflict rather than a fault.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AuthError::UserAlreadyExists | AuthError::EmailAlreadyRegistered
        )
    }
}

impl From<sled::Error> for AuthError {
    fn from(err: sled::Error) -> Self {
        AuthError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::SerializationError(err.to_string())
    }
}
