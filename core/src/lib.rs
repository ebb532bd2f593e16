//! Blocking client for the BigBlueButton HTTP/XML API.
//!
//! # Overview
//! Every API call is a GET to `<base>/api/<operation>` with the parameters
//! in the query string and a SHA-1 `checksum` computed from the operation,
//! the encoded parameters and the server's shared secret. Responses are XML
//! documents rooted at `<response>` with a `returncode` element.
//!
//! # Design
//! - `BbbClient` is immutable after construction and only holds the API
//!   root, the secret and a `Transport`.
//! - Signing (`signing`) is pure and independent of the network.
//! - Operation adapters (`operations`) are free functions from request values
//!   to `Params`; the client methods wrap them with dispatch and the
//!   `returncode` check.
//! - Errors carry a tier (`ErrorKind`) so callers can tell input mistakes,
//!   transport failures and server-side refusals apart.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operations;
pub mod requests;
pub mod responses;
pub mod signing;

pub use client::{check_return_code, BbbClient, BbbClientBuilder};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_MAX_BODY_BYTES};
pub use requests::{
    CreateHookRequest, CreateMeetingRequest, EndMeetingRequest, GetRecordingsRequest,
    JoinMeetingRequest, PublishRecordingsRequest, UpdateRecordingsRequest,
};
pub use responses::{
    ApiResponse, CreateHookResponse, CreateMeetingResponse, DeleteRecordingsResponse,
    DestroyHookResponse, EndMeetingResponse, GetMeetingInfoResponse, GetMeetingsResponse,
    GetRecordingsResponse, Hook, HooksResponse, IsMeetingRunningResponse, Meeting,
    PlaybackFormat, Preview, PreviewImage, PublishRecordingsResponse, Recording, StatusResponse,
    UpdateRecordingsResponse,
};
pub use signing::{sign, Params};
