//! Endpoint configuration for `BbbClient`.
//!
//! `ClientConfig` derives serde traits so applications can load it from
//! whatever source they already use (TOML, JSON, environment via a config
//! crate). The client never reads the environment itself.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;
use crate::http::DEFAULT_MAX_BODY_BYTES;

/// Timeout applied to each request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_PREFIX: &str = "api/";

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

/// Base address, shared secret, request timeout and response size cap.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl ClientConfig {
    pub fn new(base_url: &str, secret: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            secret: secret.to_string(),
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Normalize a server address into the API root every operation is appended
/// to: a trailing slash is added, then `api/` unless already present.
///
/// `http://h`, `http://h/`, `http://h/api` and `http://h/api/` all map to
/// `http://h/api/`. Addresses with a query string or fragment are rejected,
/// since the operation path could not be appended to them.
pub fn api_root(base_url: &str) -> Result<String, ApiError> {
    let parsed = Url::parse(base_url)
        .map_err(|e| ApiError::InvalidParameter(format!("base URL {base_url:?}: {e}")))?;
    if parsed.cannot_be_a_base() {
        return Err(ApiError::InvalidParameter(format!(
            "base URL {base_url:?} cannot carry a path"
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ApiError::InvalidParameter(format!(
            "base URL {base_url:?} must not have a query or fragment"
        )));
    }

    let mut root = base_url.to_string();
    if !root.ends_with('/') {
        root.push('/');
    }
    if !root.ends_with(API_PREFIX) {
        root.push_str(API_PREFIX);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_normalization_is_idempotent() {
        for base in ["http://h", "http://h/", "http://h/api", "http://h/api/"] {
            assert_eq!(api_root(base).unwrap(), "http://h/api/", "{base}");
        }
        let once = api_root("https://bbb.example.com/bigbluebutton").unwrap();
        assert_eq!(once, "https://bbb.example.com/bigbluebutton/api/");
        assert_eq!(api_root(&once).unwrap(), once);
    }

    #[test]
    fn api_root_rejects_relative_addresses() {
        let err = api_root("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(api_root("mailto:ops@example.com").is_err());
    }

    #[test]
    fn api_root_rejects_query_and_fragment() {
        for base in ["http://h?x=1", "http://h/api/?", "http://h#top", "http://h/bbb?x=1#f"] {
            let err = api_root(base).unwrap_err();
            assert!(matches!(err, ApiError::InvalidParameter(_)), "{base}");
        }
    }

    #[test]
    fn config_timeout_defaults_to_thirty_seconds() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://h","secret":"s"}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config, ClientConfig::new("http://h", "s"));
    }

    #[test]
    fn config_debug_hides_secret() {
        let rendered = format!("{:?}", ClientConfig::new("http://h", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("http://h"));
    }
}
