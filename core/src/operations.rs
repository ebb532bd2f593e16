//! Operation names and the adapters that turn requests into `Params`.
//!
//! Each adapter checks the fields the server requires, substitutes the
//! defaults this client has always sent, and returns the flat mapping the
//! dispatcher signs. None of them touch the network.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::requests::{
    CreateHookRequest, CreateMeetingRequest, EndMeetingRequest, GetRecordingsRequest,
    JoinMeetingRequest, PublishRecordingsRequest, UpdateRecordingsRequest,
};
use crate::signing::Params;

pub const CREATE: &str = "create";
pub const JOIN: &str = "join";
pub const END: &str = "end";
pub const GET_MEETING_INFO: &str = "getMeetingInfo";
pub const GET_MEETINGS: &str = "getMeetings";
pub const IS_MEETING_RUNNING: &str = "isMeetingRunning";
pub const GET_RECORDINGS: &str = "getRecordings";
pub const PUBLISH_RECORDINGS: &str = "publishRecordings";
pub const DELETE_RECORDINGS: &str = "deleteRecordings";
pub const UPDATE_RECORDINGS: &str = "updateRecordings";
pub const HOOKS_CREATE: &str = "hooks/create";
pub const HOOKS_LIST: &str = "hooks/list";
pub const HOOKS_DESTROY: &str = "hooks/destroy";
pub const HOOKS_UPDATE: &str = "hooks/update";

const DEFAULT_ATTENDEE_PW: &str = "ap";
const DEFAULT_MODERATOR_PW: &str = "mp";
const DEFAULT_FULL_NAME: &str = "User";

fn require(name: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::MissingParameter(name));
    }
    Ok(())
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

/// `create`: a missing name becomes `"Meeting <meetingID>"` and missing
/// passwords become `ap`/`mp`. Boolean flags are always sent.
pub fn create_meeting_params(req: &CreateMeetingRequest) -> Result<Params, ApiError> {
    require("meetingID", &req.meeting_id)?;

    let mut params = Params::new();
    if req.name.is_empty() {
        params.set("name", format!("Meeting {}", req.meeting_id));
    } else {
        params.set("name", req.name.as_str());
    }
    params.set("meetingID", req.meeting_id.as_str());
    params.set("attendeePW", or_default(&req.attendee_pw, DEFAULT_ATTENDEE_PW));
    params.set("moderatorPW", or_default(&req.moderator_pw, DEFAULT_MODERATOR_PW));

    params.set_non_empty("welcome", &req.welcome);
    params.set_non_empty("dialNumber", &req.dial_number);
    params.set_non_empty("voiceBridge", &req.voice_bridge);
    params.set_non_empty("webVoice", &req.web_voice);
    params.set_non_empty("logoutURL", &req.logout_url);
    if req.max_participants > 0 {
        params.set("maxParticipants", req.max_participants.to_string());
    }

    params.set_bool("record", req.record);
    params.set_bool("autoStartRecording", req.auto_start_recording);
    params.set_bool("allowStartStopRecording", req.allow_start_stop_recording);
    params.set_bool("webcamsOnlyForModerator", req.webcams_only_for_moderator);
    params.set_bool("muteOnStart", req.mute_on_start);

    params.set_bool("lockSettingsDisableCam", req.lock_settings_disable_cam);
    params.set_bool("lockSettingsDisableMic", req.lock_settings_disable_mic);
    params.set_bool("lockSettingsDisablePrivateChat", req.lock_settings_disable_private_chat);
    params.set_bool("lockSettingsDisablePublicChat", req.lock_settings_disable_public_chat);
    params.set_bool("lockSettingsLockedLayout", req.lock_settings_locked_layout);
    params.set_bool("lockSettingsLockOnJoin", req.lock_settings_lock_on_join);
    params.set_bool(
        "lockSettingsLockOnJoinConfigurable",
        req.lock_settings_lock_on_join_configurable,
    );

    params.set_prefixed("meta_", &req.meta);
    Ok(params)
}

/// `join`: `fullName` defaults to `User`.
pub fn join_meeting_params(req: &JoinMeetingRequest) -> Result<Params, ApiError> {
    require("meetingID", &req.meeting_id)?;
    require("password", &req.password)?;

    let mut params = Params::new();
    params.set("meetingID", req.meeting_id.as_str());
    params.set("password", req.password.as_str());
    params.set("fullName", or_default(&req.full_name, DEFAULT_FULL_NAME));
    params.set_non_empty("userID", &req.user_id);
    params.set_non_empty("createTime", &req.create_time);
    params.set_prefixed("userdata_", &req.user_data);
    Ok(params)
}

pub fn end_meeting_params(req: &EndMeetingRequest) -> Result<Params, ApiError> {
    require("meetingID", &req.meeting_id)?;
    require("password", &req.password)?;

    let mut params = Params::new();
    params.set("meetingID", req.meeting_id.as_str());
    params.set("password", req.password.as_str());
    Ok(params)
}

pub fn get_meeting_info_params(meeting_id: &str, password: &str) -> Result<Params, ApiError> {
    require("meetingID", meeting_id)?;
    require("password", password)?;

    let mut params = Params::new();
    params.set("meetingID", meeting_id);
    params.set("password", password);
    Ok(params)
}

pub fn is_meeting_running_params(meeting_id: &str) -> Result<Params, ApiError> {
    require("meetingID", meeting_id)?;

    let mut params = Params::new();
    params.set("meetingID", meeting_id);
    Ok(params)
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

/// `getRecordings`: only non-empty filters and positive paging values are sent.
pub fn get_recordings_params(req: &GetRecordingsRequest) -> Params {
    let mut params = Params::new();
    params.set_non_empty("meetingID", &req.meeting_id);
    params.set_non_empty("recordID", &req.record_id);
    params.set_non_empty("state", &req.state);
    params.set_non_empty("meta", &req.meta);
    if req.offset > 0 {
        params.set("offset", req.offset.to_string());
    }
    if req.limit > 0 {
        params.set("limit", req.limit.to_string());
    }
    params
}

pub fn publish_recordings_params(req: &PublishRecordingsRequest) -> Result<Params, ApiError> {
    require("recordID", &req.record_id)?;

    let mut params = Params::new();
    params.set("recordID", req.record_id.as_str());
    params.set_bool("publish", req.publish);
    Ok(params)
}

pub fn delete_recordings_params(record_id: &str) -> Result<Params, ApiError> {
    require("recordID", record_id)?;

    let mut params = Params::new();
    params.set("recordID", record_id);
    Ok(params)
}

pub fn update_recordings_params(req: &UpdateRecordingsRequest) -> Result<Params, ApiError> {
    require("recordID", &req.record_id)?;

    let mut params = Params::new();
    params.set("recordID", req.record_id.as_str());
    params.set_prefixed("meta_", &req.meta);
    Ok(params)
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

/// `hooks/create`: no `meetingID` registers a permanent hook; `getRaw` is
/// only sent when set.
pub fn create_hook_params(req: &CreateHookRequest) -> Result<Params, ApiError> {
    require("callbackURL", &req.callback_url)?;

    let mut params = Params::new();
    params.set("callbackURL", req.callback_url.as_str());
    params.set_non_empty("meetingID", &req.meeting_id);
    if req.get_raw {
        params.set("getRaw", "true");
    }
    params.set_prefixed("meta_", &req.meta);
    Ok(params)
}

pub fn list_hooks_for_meeting_params(meeting_id: &str) -> Result<Params, ApiError> {
    require("meetingID", meeting_id)?;

    let mut params = Params::new();
    params.set("meetingID", meeting_id);
    Ok(params)
}

pub fn destroy_hook_params(hook_id: &str) -> Result<Params, ApiError> {
    require("hookID", hook_id)?;

    let mut params = Params::new();
    params.set("hookID", hook_id);
    Ok(params)
}

/// `hooks/update`: caller-supplied pairs are sent verbatim; `hookID` always
/// refers to the hook being updated.
pub fn update_hook_params(
    hook_id: &str,
    updates: &BTreeMap<String, String>,
) -> Result<Params, ApiError> {
    require("hookID", hook_id)?;

    let mut params = Params::new();
    for (key, value) in updates {
        params.set(key.as_str(), value.as_str());
    }
    params.set("hookID", hook_id);
    Ok(params)
}
