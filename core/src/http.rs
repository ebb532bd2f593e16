//! HTTP transport types and the blocking transport used by `BbbClient`.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe one exchange as plain data. The
//! client builds a signed `HttpRequest`, hands it to a [`Transport`], and
//! parses the returned `HttpResponse`; nothing else touches the network.
//! Tests substitute their own `Transport` to script responses, and callers
//! that already own an HTTP stack can execute `HttpRequest` values themselves
//! and feed the result to `BbbClient::parse_response`.
//!
//! Every API call is a GET whose parameters live in the query string, so a
//! request carries no method or body.

use std::time::Duration;

use crate::error::ApiError;

/// A signed API request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Operation name, e.g. `create` or `hooks/list`.
    pub operation: String,
    /// Fully signed URL including the query string.
    pub url: String,
}

/// An HTTP response described as plain data. The body is kept as raw bytes;
/// UTF-8 decoding happens alongside XML decoding in `BbbClient::parse_response`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Executes a single GET for an `HttpRequest`.
///
/// Implementations must return non-2xx responses as `Ok` data so the client
/// can classify them; `Err` is reserved for failures where no response was
/// received.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Largest response body the default transport reads, 1 GiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1 << 30;

/// Default transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl UreqTransport {
    /// Agent with a global per-request timeout. Status codes are returned as
    /// data rather than `Err`, so 4xx/5xx reach the client's status check.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Wrap an agent configured by the caller. It must have
    /// `http_status_as_error(false)` for HTTP errors to be classified.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Cap on the response body size. Larger bodies fail with
    /// `ApiError::Transport`.
    pub fn max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut response = self
            .agent
            .get(&request.url)
            .call()
            .map_err(|e| ApiError::Transport(format!("{}: {e}", request.operation)))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| {
                ApiError::Transport(format!("{}: reading response body: {e}", request.operation))
            })?;

        Ok(HttpResponse { status, body })
    }
}
