use crate::error::HandlerError;
use axum::extract::{ConnectInfo, Request};
use axum::http::{header, Extensions, HeaderMap, Method, Uri};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

/// Per-request state handed from one handler to the next.
///
/// The body is buffered once up front. Handlers pass values downstream
/// through the typed extension map.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
}

impl RequestContext {
    /// Buffer the request body (up to `body_limit` bytes) and build a context
    pub async fn from_request(request: Request, body_limit: usize) -> Result<Self, HandlerError> {
        let (parts, body) = request.into_parts();

        // Oversized bodies are the only read failure a client can cause
        let body = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|_| HandlerError::PayloadTooLarge { limit: body_limit })?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            extensions: parts.extensions,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the buffered body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        if !self.has_json_content_type() {
            return Err(HandlerError::UnsupportedMediaType);
        }

        if self.body.is_empty() {
            return Err(HandlerError::InvalidBody("request body is empty".to_string()));
        }

        serde_json::from_slice(&self.body).map_err(|e| HandlerError::InvalidBody(e.to_string()))
    }

    fn has_json_content_type(&self) -> bool {
        let Some(content_type) = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
        else {
            return false;
        };

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    }

    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Remove a value placed by an earlier handler
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove::<T>()
    }

    /// Client address: proxy headers first, then the socket peer if known
    pub fn client_ip(&self) -> Option<String> {
        self.headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.headers
                    .get("X-Real-IP")
                    .and_then(|h| h.to_str().ok())
                    .map(|s| s.trim().to_string())
            })
            .or_else(|| {
                self.extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
    }
}
