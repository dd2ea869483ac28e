//! Transport seam between the call-control core and the REST service
//!
//! The core never talks HTTP itself. Applications hand it an implementation
//! of [`Platform`] that owns the connection, the access token and request
//! signing; the core only builds paths and bodies and decodes the JSON that
//! comes back.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Session / CallControl    │  paths from Endpoints, bodies from serde
//! └────────────┬─────────────┘
//!              │ ApiRequest
//! ┌────────────▼─────────────┐
//! │ PlatformClient           │  headers, logging, status → error
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │ dyn Platform (app-owned) │  HTTP, auth, token refresh
//! └──────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoints::Endpoints;
use crate::error::{CallControlError, CallControlResult};

/// HTTP verbs used against the telephony API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A request for the platform to execute
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the server, including any query string
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, headers: Vec::new() }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A decoded response from the platform
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body, `Value::Null` when the response had none
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 response with a JSON body
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`CallControlError::ApiError`]
    pub fn error_for_status(self) -> CallControlResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .body
            .get("message")
            .or_else(|| self.body.get("errorCode"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        Err(CallControlError::api_error(self.status, message))
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> CallControlResult<T> {
        Ok(T::deserialize(&self.body)?)
    }
}

/// Transport used by the core to reach the REST service
///
/// Implementations are expected to handle authentication and token
/// refresh. A transport-level failure should be reported as
/// [`CallControlError::NetworkError`]; a response with any status should be
/// returned as `Ok` and will be classified by the caller.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn send(&self, request: ApiRequest) -> CallControlResult<ApiResponse>;
}

/// Thin request helper shared by the collection manager and every session
pub struct PlatformClient {
    platform: Arc<dyn Platform>,
    endpoints: Endpoints,
    user_agent: Option<String>,
}

impl fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformClient")
            .field("platform", &"<platform>")
            .field("endpoints", &self.endpoints)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl PlatformClient {
    pub fn new(platform: Arc<dyn Platform>, endpoints: Endpoints) -> Self {
        Self { platform, endpoints, user_agent: None }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn get(&self, path: String) -> CallControlResult<ApiResponse> {
        self.execute(ApiRequest::new(HttpMethod::Get, path)).await
    }

    pub async fn post(&self, path: String, body: Option<Value>) -> CallControlResult<ApiResponse> {
        let mut request = ApiRequest::new(HttpMethod::Post, path);
        request.body = body;
        self.execute(request).await
    }

    pub async fn patch(&self, path: String, body: Value) -> CallControlResult<ApiResponse> {
        self.execute(ApiRequest::new(HttpMethod::Patch, path).with_body(body)).await
    }

    pub async fn delete(&self, path: String) -> CallControlResult<ApiResponse> {
        self.execute(ApiRequest::new(HttpMethod::Delete, path)).await
    }

    async fn execute(&self, mut request: ApiRequest) -> CallControlResult<ApiResponse> {
        if let Some(user_agent) = &self.user_agent {
            request.headers.push(("X-User-Agent".to_string(), user_agent.clone()));
        }
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "Sending telephony API request");

        let response = self.platform.send(request).await?;
        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(%method, %path, error = %e, "Telephony API request failed");
                Err(e)
            }
        }
    }
}
