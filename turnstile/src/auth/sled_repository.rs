use super::error::AuthError;
use super::models::{email_key, username_key, User};
use super::repository::UserRepository;
use async_trait::async_trait;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional};
use std::path::Path;

const USERS_TREE: &str = "users";
const USERS_BY_USERNAME_TREE: &str = "users_by_username";
const USERS_BY_EMAIL_TREE: &str = "users_by_email";

#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn users_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_TREE)?)
    }

    fn users_by_username_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_USERNAME_TREE)?)
    }

    fn users_by_email_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_EMAIL_TREE)?)
    }
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let users_tree = self.users_tree()?;
        let username_tree = self.users_by_username_tree()?;
        let email_tree = self.users_by_email_tree()?;

        let user_json = serde_json::to_vec(&user)?;
        let username = user.username_key();
        let email = user.email_key();

        // Both index entries and the record are written together or not at all
        let outcome = (&users_tree, &username_tree, &email_tree).transaction(
            |(users, by_username, by_email)| {
                if by_email.get(email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthError::EmailAlreadyRegistered,
                    ));
                }
                if by_username.get(username.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        AuthError::UserAlreadyExists,
                    ));
                }

                by_email.insert(email.as_bytes(), user.id.as_bytes())?;
                by_username.insert(username.as_bytes(), user.id.as_bytes())?;
                users.insert(user.id.as_bytes(), user_json.as_slice())?;
                Ok(())
            },
        );

        match outcome {
            Ok(()) => Ok(user),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let username_tree = self.users_by_username_tree()?;
        let users_tree = self.users_tree()?;

        // First, get the user ID from username index
        if let Some(user_id) = username_tree.get(username_key(username).as_bytes())? {
            // Then get the user by ID
            if let Some(user_data) = users_tree.get(&user_id)? {
                let user: User = serde_json::from_slice(&user_data)?;
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let username_tree = self.users_by_username_tree()?;
        Ok(username_tree.contains_key(username_key(username).as_bytes())?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let email_tree = self.users_by_email_tree()?;
        Ok(email_tree.contains_key(email_key(email).as_bytes())?)
    }
}
