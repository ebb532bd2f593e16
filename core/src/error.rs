//! Error types for the BigBlueButton API client.
//!
//! # Design
//! Errors fall into three tiers, exposed through [`ErrorKind`]:
//! - **Input**: a required field is missing or a value cannot be sent. These
//!   are raised before any request leaves the process.
//! - **Transport**: the exchange itself failed. The server was unreachable,
//!   answered with a non-200 status, or sent a body that is not the expected
//!   XML. Status code and raw body are kept for debugging.
//! - **Application**: the server answered with well-formed XML whose
//!   `returncode` is not `SUCCESS` (duplicate meeting ID, bad password, ...).

use std::fmt;

/// Coarse classification of an [`ApiError`], for callers that branch on the
/// failure tier rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Transport,
    Application,
}

/// Errors returned by `BbbClient` and the operation adapters.
#[derive(Debug)]
pub enum ApiError {
    /// A required request field was empty.
    MissingParameter(&'static str),

    /// A value was supplied that cannot be sent (empty operation name,
    /// reserved parameter key, unparseable base URL).
    InvalidParameter(String),

    /// The HTTP exchange failed before a response was received: DNS,
    /// connect, TLS or timeout.
    Transport(String),

    /// The server returned a non-200 status.
    HttpError { status: u16, body: String },

    /// The response body could not be decoded into the expected type.
    DeserializationError { message: String, body: String },

    /// The server reported a failed `returncode` inside a valid response.
    Api {
        return_code: String,
        message_key: String,
        message: String,
    },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) => ErrorKind::Input,
            ApiError::Transport(_)
            | ApiError::HttpError { .. }
            | ApiError::DeserializationError { .. } => ErrorKind::Transport,
            ApiError::Api { .. } => ErrorKind::Application,
        }
    }

    /// The server-provided `messageKey` for application errors.
    pub fn message_key(&self) -> Option<&str> {
        match self {
            ApiError::Api { message_key, .. } => Some(message_key),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingParameter(name) => write!(f, "{name} is required"),
            ApiError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::HttpError { status, body } => {
                write!(f, "unexpected status code: {status}, response: {body}")
            }
            ApiError::DeserializationError { message, body } => {
                write!(f, "parsing response: {message}, response body: {body}")
            }
            ApiError::Api {
                return_code,
                message_key,
                message,
            } => {
                let text = if message.is_empty() { message_key } else { message };
                write!(f, "BigBlueButton error: {text} (code: {return_code}, key: {message_key})")
            }
        }
    }
}

impl std::error::Error for ApiError {}
