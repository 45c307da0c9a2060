use serde::Deserialize;

/// Request body for `POST /users`.
///
/// Every field is optional at the wire level so that missing fields are
/// reported by form validation alongside the other field errors.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}
