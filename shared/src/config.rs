use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    /// Root directory for persistent user storage. `None` keeps users in memory.
    pub data_dir: Option<PathBuf>,
    pub session_ttl_secs: u64,
    pub max_sessions: Option<u64>,
    pub body_limit_bytes: usize,
    pub allowed_origins: Vec<String>,
    /// Base path the users routing unit is nested under.
    pub users_mount: String,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
    const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024;
    const DEFAULT_USERS_MOUNT: &str = "/users";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let users_mount = lookup("TURNSTILE_USERS_MOUNT")
            .and_then(|m| normalize_mount(&m))
            .unwrap_or_else(|| Self::DEFAULT_USERS_MOUNT.to_string());

        Self {
            host: lookup("TURNSTILE_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or(&lookup, "TURNSTILE_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            data_dir: lookup("TURNSTILE_DATA_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            session_ttl_secs: parse_or(
                &lookup,
                "TURNSTILE_SESSION_TTL_SECS",
                Self::DEFAULT_SESSION_TTL_SECS,
            ),
            max_sessions: lookup("TURNSTILE_MAX_SESSIONS").and_then(|v| match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("TURNSTILE_MAX_SESSIONS={} is not a number, sessions are unbounded", v);
                    None
                }
            }),
            body_limit_bytes: parse_or(
                &lookup,
                "TURNSTILE_BODY_LIMIT_BYTES",
                Self::DEFAULT_BODY_LIMIT_BYTES,
            ),
            allowed_origins: lookup("TURNSTILE_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            users_mount,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={} could not be parsed, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Mount points are nested paths: leading slash, no trailing slash.
///
/// Wildcards and captures cannot be nested into, so such values are refused.
fn normalize_mount(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');

    if trimmed
        .chars()
        .any(|c| matches!(c, '*' | '{' | '}' | '?' | '#') || c.is_whitespace())
    {
        warn!(
            "TURNSTILE_USERS_MOUNT={} is not a plain path, using default {}",
            raw,
            Config::DEFAULT_USERS_MOUNT
        );
        return None;
    }

    if trimmed.is_empty() {
        return Some("/".to_string());
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}
