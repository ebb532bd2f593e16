//! Request value types for the BigBlueButton API.
//!
//! # Design
//! Plain data with every field defaulted, so callers set only what they need
//! with struct update syntax. Serde derives use the server's parameter names,
//! which lets requests be loaded from JSON fixtures and test vectors.
//! Turning a request into query parameters is the job of `operations`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters for `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub name: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub welcome: String,
    pub dial_number: String,
    pub voice_bridge: String,
    pub web_voice: String,
    #[serde(rename = "logoutURL")]
    pub logout_url: String,
    /// Sent only when greater than zero.
    pub max_participants: u32,
    pub record: bool,
    pub auto_start_recording: bool,
    pub allow_start_stop_recording: bool,
    pub webcams_only_for_moderator: bool,
    pub mute_on_start: bool,
    pub lock_settings_disable_cam: bool,
    pub lock_settings_disable_mic: bool,
    pub lock_settings_disable_private_chat: bool,
    pub lock_settings_disable_public_chat: bool,
    pub lock_settings_locked_layout: bool,
    pub lock_settings_lock_on_join: bool,
    pub lock_settings_lock_on_join_configurable: bool,
    /// Sent as `meta_<key>`.
    pub meta: BTreeMap<String, String>,
}

/// Parameters for the signed `join` URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinMeetingRequest {
    pub full_name: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub password: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub create_time: String,
    /// Sent as `userdata_<key>`.
    pub user_data: BTreeMap<String, String>,
}

/// Parameters for `end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndMeetingRequest {
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub password: String,
}

/// Filters for `getRecordings`. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetRecordingsRequest {
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "recordID")]
    pub record_id: String,
    /// One of `any`, `processing`, `processed`, `published`, `unpublished`,
    /// `deleted`.
    pub state: String,
    pub meta: String,
    pub offset: u32,
    pub limit: u32,
}

/// Parameters for `publishRecordings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishRecordingsRequest {
    #[serde(rename = "recordID")]
    pub record_id: String,
    pub publish: bool,
}

/// Parameters for `updateRecordings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRecordingsRequest {
    #[serde(rename = "recordID")]
    pub record_id: String,
    pub meta: BTreeMap<String, String>,
}

/// Parameters for `hooks/create`. Leaving `meeting_id` empty registers a
/// permanent hook that receives events for every meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateHookRequest {
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "getRaw")]
    pub get_raw: bool,
    pub meta: BTreeMap<String, String>,
}
