//! Response types decoded from the server's XML.
//!
//! # Design
//! Every response is rooted at `<response>` and carries `returncode`, plus
//! `messageKey`/`message` on failure. Structs default every field so a
//! `FAILED` body, which omits the operation-specific elements, still decodes
//! and the return code can be inspected through [`ApiResponse`].
//!
//! Lists arrive wrapped (`<meetings><meeting>..</meeting></meetings>`); the
//! wrapper is stripped during deserialization so callers see a plain `Vec`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// `returncode` value of a successful call.
pub const SUCCESS: &str = "SUCCESS";

/// Status fields shared by every response.
pub trait ApiResponse {
    fn return_code(&self) -> &str;
    fn message_key(&self) -> &str;
    fn message(&self) -> &str;

    fn is_success(&self) -> bool {
        self.return_code() == SUCCESS
    }
}

macro_rules! impl_api_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ApiResponse for $ty {
                fn return_code(&self) -> &str {
                    &self.return_code
                }

                fn message_key(&self) -> &str {
                    &self.message_key
                }

                fn message(&self) -> &str {
                    &self.message
                }
            }
        )*
    };
}

impl_api_response!(
    StatusResponse,
    CreateMeetingResponse,
    EndMeetingResponse,
    GetMeetingInfoResponse,
    GetMeetingsResponse,
    IsMeetingRunningResponse,
    GetRecordingsResponse,
    PublishRecordingsResponse,
    DeleteRecordingsResponse,
    UpdateRecordingsResponse,
    CreateHookResponse,
    HooksResponse,
    DestroyHookResponse,
);

/// Only the status fields; decodes any response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    #[serde(rename = "messageKey")]
    pub message_key: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "internalMeetingID")]
    pub internal_meeting_id: String,
    #[serde(rename = "parentMeetingID")]
    pub parent_meeting_id: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub create_time: String,
    pub voice_bridge: String,
    pub dial_number: String,
    pub create_date: String,
    pub has_user_joined: bool,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndMeetingResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetMeetingInfoResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub meeting_name: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "internalMeetingID")]
    pub internal_meeting_id: String,
    pub create_time: String,
    pub create_date: String,
    pub voice_bridge: String,
    pub dial_number: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub running: bool,
    pub recording: bool,
    pub has_been_forcibly_ended: bool,
    pub start_time: String,
    pub end_time: String,
    pub participant_count: u32,
    pub listener_count: u32,
    pub voice_participant_count: u32,
    pub video_count: u32,
    pub duration: u32,
    pub has_user_joined: bool,
    pub metadata: BTreeMap<String, String>,
    pub moderator_count: u32,
}

/// One entry of `getMeetings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meeting {
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub meeting_name: String,
    pub create_time: i64,
    pub voice_bridge: String,
    pub dial_number: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub has_user_joined: bool,
    pub has_been_forcibly_ended: bool,
    pub running: bool,
    pub participant_count: u32,
    pub listener_count: u32,
    pub voice_participant_count: u32,
    pub video_count: u32,
    pub duration: u32,
    pub create_date: String,
    pub start_time: String,
    pub end_time: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetMeetingsResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    #[serde(deserialize_with = "meeting_list")]
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IsMeetingRunningResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub running: bool,
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

/// `<image alt=".." height=".." width="..">link</image>` inside a preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewImage {
    #[serde(rename = "@alt")]
    pub alt: String,
    #[serde(rename = "@height")]
    pub height: u32,
    #[serde(rename = "@width")]
    pub width: u32,
    #[serde(rename = "$text")]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Preview {
    #[serde(deserialize_with = "image_list")]
    pub images: Vec<PreviewImage>,
}

/// One `<format>` under a recording's `<playback>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub url: String,
    pub length: u32,
    pub processing_time: u64,
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recording {
    #[serde(rename = "recordID")]
    pub record_id: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub name: String,
    pub published: bool,
    pub state: String,
    pub start_time: String,
    pub end_time: String,
    pub participants: u32,
    pub metadata: BTreeMap<String, String>,
    #[serde(deserialize_with = "format_list")]
    pub playback: Vec<PlaybackFormat>,
    pub raw_size: i64,
    pub size: i64,
    pub is_breakout: bool,
    #[serde(rename = "parentMeetingID")]
    pub parent_meeting_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetRecordingsResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    #[serde(deserialize_with = "recording_list")]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishRecordingsResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteRecordingsResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateRecordingsResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub updated: bool,
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateHookResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    #[serde(rename = "hookID")]
    pub hook_id: String,
    pub permanent_hook: bool,
    pub raw_data: bool,
}

/// One entry of `hooks/list`. `meeting_id` is empty for permanent hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hook {
    #[serde(rename = "hookID")]
    pub hook_id: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub permanent_hook: bool,
    pub raw_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HooksResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    #[serde(deserialize_with = "hook_list")]
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DestroyHookResponse {
    #[serde(rename = "returncode")]
    pub return_code: String,
    pub message_key: String,
    pub message: String,
    pub removed: bool,
}

// ---------------------------------------------------------------------------
// List wrappers
// ---------------------------------------------------------------------------

macro_rules! wrapped_list {
    ($fn_name:ident, $wrapper:ident, $item:ty, $element:literal) => {
        #[derive(Deserialize)]
        struct $wrapper {
            #[serde(rename = $element, default)]
            items: Vec<$item>,
        }

        fn $fn_name<'de, D>(deserializer: D) -> Result<Vec<$item>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok($wrapper::deserialize(deserializer)?.items)
        }
    };
}

wrapped_list!(meeting_list, MeetingList, Meeting, "meeting");
wrapped_list!(recording_list, RecordingList, Recording, "recording");
wrapped_list!(format_list, FormatList, PlaybackFormat, "format");
wrapped_list!(image_list, ImageList, PreviewImage, "image");
wrapped_list!(hook_list, HookList, Hook, "hook");
