mod requests;
mod responses;

pub use requests::RegisterRequest;
pub use responses::{ErrorResponse, HealthResponse, RegisterResponse, UserResponse};
