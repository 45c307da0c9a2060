// Public API
pub mod error;
pub mod memory_repository;
pub mod models;
pub mod repository;
pub mod session;
pub mod sled_repository;
pub mod user_service;

// Re-export commonly used types
pub use error::AuthError;
pub use memory_repository::InMemoryUserRepository;
pub use models::{NewUser, User};
pub use repository::UserRepository;
pub use session::{Session, SessionStore, SessionToken};
pub use sled_repository::SledUserRepository;
pub use user_service::UserService;
