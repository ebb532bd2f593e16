//! Signed request dispatch for the BigBlueButton API.
//!
//! # Design
//! `BbbClient` holds the API root, the shared secret and a [`Transport`],
//! none of which change after construction, so one client can be shared
//! across threads. A call goes through three steps that are also exposed on
//! their own:
//! - `build_request` signs an operation and its `Params` into an `HttpRequest`
//! - the transport executes the GET
//! - `parse_response` checks the status and decodes the XML body
//!
//! `dispatch` chains them and leaves the `returncode` alone. The per-operation
//! methods add the adapter in front and `check_return_code` behind, so an
//! application failure surfaces as `ApiError::Api` rather than a response
//! value the caller has to inspect.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::config::{self, ClientConfig, DEFAULT_TIMEOUT};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_MAX_BODY_BYTES};
use crate::operations;
use crate::requests::{
    CreateHookRequest, CreateMeetingRequest, EndMeetingRequest, GetRecordingsRequest,
    JoinMeetingRequest, PublishRecordingsRequest, UpdateRecordingsRequest,
};
use crate::responses::{
    ApiResponse, CreateHookResponse, CreateMeetingResponse, DeleteRecordingsResponse,
    DestroyHookResponse, EndMeetingResponse, GetMeetingInfoResponse, GetMeetingsResponse,
    GetRecordingsResponse, HooksResponse, IsMeetingRunningResponse, PublishRecordingsResponse,
    UpdateRecordingsResponse,
};
use crate::signing::{self, Params, CHECKSUM_KEY};

/// Client for one BigBlueButton server.
#[derive(Clone)]
pub struct BbbClient {
    api_root: String,
    secret: String,
    transport: Arc<dyn Transport>,
}

/// Optional settings for [`BbbClient`]; see [`BbbClient::builder`].
pub struct BbbClientBuilder {
    base_url: String,
    secret: String,
    timeout: Duration,
    max_body_bytes: u64,
    transport: Option<Arc<dyn Transport>>,
}

impl BbbClientBuilder {
    /// Per-request timeout for the default transport. Ignored when a custom
    /// transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Largest response body the default transport accepts. Ignored when a
    /// custom transport is supplied.
    pub fn max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Replace the default `ureq` transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Result<BbbClient, ApiError> {
        let api_root = config::api_root(&self.base_url)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(self.timeout).max_body_bytes(self.max_body_bytes)),
        };
        Ok(BbbClient {
            api_root,
            secret: self.secret,
            transport,
        })
    }
}

impl BbbClient {
    /// Client with the default transport and a 30 second timeout.
    pub fn new(base_url: &str, secret: &str) -> Result<Self, ApiError> {
        Self::builder(base_url, secret).build()
    }

    pub fn builder(base_url: &str, secret: &str) -> BbbClientBuilder {
        BbbClientBuilder {
            base_url: base_url.to_string(),
            secret: secret.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            transport: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::builder(&config.base_url, &config.secret)
            .timeout(config.timeout())
            .max_body_bytes(config.max_body_bytes)
            .build()
    }

    /// Normalized API root, always ending in `api/`.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Sign `operation` with `params` into a GET request. Fails only on an
    /// empty operation name or a caller-supplied `checksum` key.
    pub fn build_request(&self, operation: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        if operation.is_empty() {
            return Err(ApiError::InvalidParameter("operation name is empty".to_string()));
        }
        if params.contains_key(CHECKSUM_KEY) {
            return Err(ApiError::InvalidParameter(format!(
                "{CHECKSUM_KEY:?} is reserved for the request signature"
            )));
        }

        let query = signing::signed_query(operation, params, &self.secret);
        Ok(HttpRequest {
            operation: operation.to_string(),
            url: format!("{}{operation}?{query}", self.api_root),
        })
    }

    /// Decode a 200 response body into `T`. Any other status is an
    /// `HttpError` and the body is not decoded. A body that is not UTF-8 is
    /// malformed like any other undecodable body.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        if response.status != 200 {
            return Err(ApiError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        let body = match String::from_utf8(response.body) {
            Ok(body) => body,
            Err(e) => {
                return Err(ApiError::DeserializationError {
                    message: e.utf8_error().to_string(),
                    body: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                })
            }
        };
        quick_xml::de::from_str(&body).map_err(|e| ApiError::DeserializationError {
            message: e.to_string(),
            body,
        })
    }

    /// Sign, send and decode one call without interpreting `returncode`.
    pub fn dispatch<T: DeserializeOwned>(&self, operation: &str, params: &Params) -> Result<T, ApiError> {
        let request = self.build_request(operation, params)?;
        debug!(operation, url = %request.url, "sending request");

        let response = self.transport.execute(&request)?;
        debug!(
            operation,
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );
        trace!(operation, body = %String::from_utf8_lossy(&response.body), "response body");

        self.parse_response(response)
    }

    fn call<T>(&self, operation: &str, params: &Params) -> Result<T, ApiError>
    where
        T: DeserializeOwned + ApiResponse,
    {
        check_return_code(self.dispatch(operation, params)?)
    }

    // -----------------------------------------------------------------------
    // Meetings
    // -----------------------------------------------------------------------

    pub fn create_meeting(&self, req: &CreateMeetingRequest) -> Result<CreateMeetingResponse, ApiError> {
        let params = operations::create_meeting_params(req)?;
        self.call(operations::CREATE, &params)
    }

    /// Signed URL a browser can follow to enter the meeting. No request is
    /// made.
    pub fn join_url(&self, req: &JoinMeetingRequest) -> Result<String, ApiError> {
        let params = operations::join_meeting_params(req)?;
        Ok(self.build_request(operations::JOIN, &params)?.url)
    }

    pub fn end_meeting(&self, req: &EndMeetingRequest) -> Result<EndMeetingResponse, ApiError> {
        let params = operations::end_meeting_params(req)?;
        self.call(operations::END, &params)
    }

    pub fn get_meeting_info(
        &self,
        meeting_id: &str,
        password: &str,
    ) -> Result<GetMeetingInfoResponse, ApiError> {
        let params = operations::get_meeting_info_params(meeting_id, password)?;
        self.call(operations::GET_MEETING_INFO, &params)
    }

    pub fn get_meetings(&self) -> Result<GetMeetingsResponse, ApiError> {
        self.call(operations::GET_MEETINGS, &Params::new())
    }

    pub fn is_meeting_running(&self, meeting_id: &str) -> Result<bool, ApiError> {
        let params = operations::is_meeting_running_params(meeting_id)?;
        let response: IsMeetingRunningResponse = self.call(operations::IS_MEETING_RUNNING, &params)?;
        Ok(response.running)
    }

    // -----------------------------------------------------------------------
    // Recordings
    // -----------------------------------------------------------------------

    pub fn get_recordings(&self, req: &GetRecordingsRequest) -> Result<GetRecordingsResponse, ApiError> {
        let params = operations::get_recordings_params(req);
        self.call(operations::GET_RECORDINGS, &params)
    }

    pub fn publish_recordings(
        &self,
        req: &PublishRecordingsRequest,
    ) -> Result<PublishRecordingsResponse, ApiError> {
        let params = operations::publish_recordings_params(req)?;
        self.call(operations::PUBLISH_RECORDINGS, &params)
    }

    pub fn delete_recordings(&self, record_id: &str) -> Result<DeleteRecordingsResponse, ApiError> {
        let params = operations::delete_recordings_params(record_id)?;
        self.call(operations::DELETE_RECORDINGS, &params)
    }

    pub fn update_recordings(
        &self,
        req: &UpdateRecordingsRequest,
    ) -> Result<UpdateRecordingsResponse, ApiError> {
        let params = operations::update_recordings_params(req)?;
        self.call(operations::UPDATE_RECORDINGS, &params)
    }

    // -----------------------------------------------------------------------
    // Webhooks
    // -----------------------------------------------------------------------

    pub fn create_hook(&self, req: &CreateHookRequest) -> Result<CreateHookResponse, ApiError> {
        let params = operations::create_hook_params(req)?;
        self.call(operations::HOOKS_CREATE, &params)
    }

    pub fn list_hooks(&self) -> Result<HooksResponse, ApiError> {
        self.call(operations::HOOKS_LIST, &Params::new())
    }

    pub fn list_hooks_for_meeting(&self, meeting_id: &str) -> Result<HooksResponse, ApiError> {
        let params = operations::list_hooks_for_meeting_params(meeting_id)?;
        self.call(operations::HOOKS_LIST, &params)
    }

    pub fn destroy_hook(&self, hook_id: &str) -> Result<DestroyHookResponse, ApiError> {
        let params = operations::destroy_hook_params(hook_id)?;
        self.call(operations::HOOKS_DESTROY, &params)
    }

    pub fn update_hook(
        &self,
        hook_id: &str,
        updates: &BTreeMap<String, String>,
    ) -> Result<CreateHookResponse, ApiError> {
        let params = operations::update_hook_params(hook_id, updates)?;
        self.call(operations::HOOKS_UPDATE, &params)
    }
}

impl fmt::Debug for BbbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BbbClient")
            .field("api_root", &self.api_root)
            .finish_non_exhaustive()
    }
}

/// Turn a decoded response whose `returncode` is not `SUCCESS` into
/// `ApiError::Api`.
pub fn check_return_code<T: ApiResponse>(response: T) -> Result<T, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Api {
        return_code: response.return_code().to_string(),
        message_key: response.message_key().to_string(),
        message: response.message().to_string(),
    })
}
