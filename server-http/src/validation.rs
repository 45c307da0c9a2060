use crate::api::RegisterRequest;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use turnstile::auth::NewUser;

// Constants for validation ranges
const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 32;
const EMAIL_MAX_CHARS: usize = 254;
const DISPLAY_NAME_MAX_CHARS: usize = 64;

/// Forms that can be validated by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Register,
}

impl Form {
    pub fn name(&self) -> &'static str {
        match self {
            Form::Register => "register",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown form '{0}'")]
pub struct UnknownForm(pub String);

impl FromStr for Form {
    type Err = UnknownForm;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "register" => Ok(Form::Register),
            other => Err(UnknownForm(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All field failures found in one payload
#[derive(Debug, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

/// A registration payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<RegisterForm> for NewUser {
    fn from(form: RegisterForm) -> Self {
        NewUser {
            username: form.username,
            email: form.email,
            display_name: form.display_name,
        }
    }
}

impl RegisterForm {
    /// Validate every field and collect all failures before rejecting
    pub fn from_request(req: RegisterRequest) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let username = Self::required("username", req.username, &mut errors)
            .filter(|u| Self::check_username(u, &mut errors));
        let email = Self::required("email", req.email, &mut errors)
            .filter(|e| Self::check_email(e, &mut errors));
        let display_name_ok = match &req.display_name {
            Some(name) => Self::check_display_name(name, &mut errors),
            None => true,
        };

        match (username, email) {
            (Some(username), Some(email)) if display_name_ok && errors.is_empty() => Ok(Self {
                username,
                email,
                display_name: req.display_name,
            }),
            _ => Err(ValidationError { errors }),
        }
    }

    fn required(
        field: &'static str,
        value: Option<String>,
        errors: &mut Vec<FieldError>,
    ) -> Option<String> {
        match value {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                errors.push(FieldError::new(field, "is required"));
                None
            }
        }
    }

    fn check_username(username: &str, errors: &mut Vec<FieldError>) -> bool {
        let len = username.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            errors.push(FieldError::new(
                "username",
                format!(
                    "must be between {} and {} characters",
                    USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
                ),
            ));
            return false;
        }

        // Only alphanumeric, hyphens, underscores
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(FieldError::new(
                "username",
                "must contain only letters, digits, hyphens, or underscores",
            ));
            return false;
        }

        true
    }

    fn check_email(email: &str, errors: &mut Vec<FieldError>) -> bool {
        if email.chars().count() > EMAIL_MAX_CHARS {
            errors.push(FieldError::new(
                "email",
                format!("must be at most {} characters", EMAIL_MAX_CHARS),
            ));
            return false;
        }

        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if !well_formed {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }

        well_formed
    }

    fn check_display_name(name: &str, errors: &mut Vec<FieldError>) -> bool {
        if name.trim().is_empty() {
            errors.push(FieldError::new("display_name", "must not be blank"));
            return false;
        }

        if name.chars().count() > DISPLAY_NAME_MAX_CHARS {
            errors.push(FieldError::new(
                "display_name",
                format!("must be at most {} characters", DISPLAY_NAME_MAX_CHARS),
            ));
            return false;
        }

        true
    }
}
