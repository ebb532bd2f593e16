//! In-memory stand-in for a BigBlueButton server.
//!
//! Implements the `/api/<operation>` surface the client uses: meetings,
//! recordings and webhooks. Requests are checked against the shared secret
//! the same way the real server does it, independently of `bbb-core`, so
//! integration tests catch signing drift between the two. Ending a meeting
//! created with `record=true` produces a published recording.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use quick_xml::escape::escape;
use sha1::{Digest, Sha1};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const PLAYBACK_BASE: &str = "https://mock.invalid/playback/presentation/2.3";

#[derive(Clone, Debug)]
pub struct MeetingRecord {
    pub meeting_id: String,
    pub internal_id: String,
    pub name: String,
    pub attendee_pw: String,
    pub moderator_pw: String,
    pub voice_bridge: String,
    pub dial_number: String,
    pub create_time: i64,
    pub record: bool,
    pub running: bool,
    pub has_user_joined: bool,
    pub participant_count: u32,
    pub moderator_count: u32,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct RecordingRecord {
    pub record_id: String,
    pub meeting_id: String,
    pub internal_meeting_id: String,
    pub name: String,
    pub published: bool,
    pub state: String,
    pub start_time: i64,
    pub end_time: i64,
    pub participants: u32,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct HookRecord {
    pub callback_url: String,
    pub meeting_id: String,
    pub raw_data: bool,
}

#[derive(Default, Debug)]
pub struct Store {
    pub meetings: BTreeMap<String, MeetingRecord>,
    pub recordings: BTreeMap<String, RecordingRecord>,
    pub hooks: BTreeMap<u64, HookRecord>,
    next_hook_id: u64,
}

pub struct AppState {
    secret: String,
    store: RwLock<Store>,
}

pub type SharedState = Arc<AppState>;

type Params = HashMap<String, String>;

pub fn app(secret: &str) -> Router {
    let state: SharedState = Arc::new(AppState {
        secret: secret.to_string(),
        store: RwLock::new(Store::default()),
    });
    Router::new()
        .route("/api", get(version))
        .route("/api/{*operation}", get(api_call))
        .with_state(state)
}

pub async fn run(listener: TcpListener, secret: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(secret).layer(TraceLayer::new_for_http())).await
}

/// Recompute the checksum over the raw query minus its `checksum` pair.
pub fn checksum_matches(operation: &str, raw_query: &str, secret: &str) -> bool {
    let mut provided = None;
    let mut rest = Vec::new();
    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        match pair.strip_prefix("checksum=") {
            Some(value) => provided = Some(value),
            None => rest.push(pair),
        }
    }
    let Some(provided) = provided else {
        return false;
    };

    let mut hasher = Sha1::new();
    hasher.update(operation.as_bytes());
    hasher.update(rest.join("&").as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize()) == provided.to_ascii_lowercase()
}

async fn version() -> Response {
    xml(XmlResponse::success().field("version", "2.0").finish())
}

async fn api_call(
    State(state): State<SharedState>,
    Path(operation): Path<String>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Params>,
) -> Response {
    if !checksum_matches(&operation, raw_query.as_deref().unwrap_or_default(), &state.secret) {
        tracing::warn!(operation = %operation, "checksum mismatch");
        return xml(XmlResponse::failed("checksumError", "Checksums do not match").finish());
    }
    tracing::debug!(operation = %operation, params = params.len(), "api call");

    let mut store = state.store.write().await;
    let body = match operation.as_str() {
        "create" => create(&mut store, &params),
        "join" => join(&mut store, &params),
        "end" => end(&mut store, &params),
        "getMeetingInfo" => get_meeting_info(&store, &params),
        "getMeetings" => get_meetings(&store),
        "isMeetingRunning" => is_meeting_running(&store, &params),
        "getRecordings" => get_recordings(&store, &params),
        "publishRecordings" => publish_recordings(&mut store, &params),
        "deleteRecordings" => delete_recordings(&mut store, &params),
        "updateRecordings" => update_recordings(&mut store, &params),
        "hooks/create" => create_hook(&mut store, &params),
        "hooks/list" => list_hooks(&store, &params),
        "hooks/destroy" => destroy_hook(&mut store, &params),
        "hooks/update" => update_hook(&mut store, &params),
        _ => {
            return (StatusCode::NOT_FOUND, format!("no such API call: {operation}")).into_response()
        }
    };
    xml(body)
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml;charset=utf-8")], body).into_response()
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn param<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

/// Keys that can be written back as XML element names.
fn is_element_name(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Entries under `prefix`, lowercased. Keys that are not valid element names
/// are dropped, since metadata is echoed back as `<key>value</key>`.
fn prefixed(params: &Params, prefix: &str) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|(k, v)| k.strip_prefix(prefix).map(|key| (key.to_lowercase(), v.clone())))
        .filter(|(key, _)| {
            let valid = is_element_name(key);
            if !valid {
                tracing::warn!(key = %key, "dropping metadata key");
            }
            valid
        })
        .collect()
}

// ---------------------------------------------------------------------------
// XML rendering
// ---------------------------------------------------------------------------

struct XmlResponse {
    body: String,
}

impl XmlResponse {
    fn success() -> Self {
        Self::with_code("SUCCESS")
    }

    fn failed(key: &str, message: &str) -> Self {
        Self::with_code("FAILED")
            .field("messageKey", key)
            .field("message", message)
    }

    fn with_code(code: &str) -> Self {
        Self {
            body: String::from("<response>"),
        }
        .field("returncode", code)
    }

    fn field(mut self, name: &str, value: impl Display) -> Self {
        self.body.push_str(&element(name, value));
        self
    }

    fn raw(mut self, fragment: &str) -> Self {
        self.body.push_str(fragment);
        self
    }

    fn finish(mut self) -> String {
        self.body.push_str("</response>");
        self.body
    }
}

fn element(name: &str, value: impl Display) -> String {
    let text = value.to_string();
    format!("<{name}>{}</{name}>", escape(text.as_str()))
}

fn metadata(entries: &BTreeMap<String, String>) -> String {
    let inner: String = entries.iter().map(|(k, v)| element(k, v)).collect();
    format!("<metadata>{inner}</metadata>")
}

fn meeting_fields(m: &MeetingRecord) -> String {
    [
        element("meetingName", &m.name),
        element("meetingID", &m.meeting_id),
        element("internalMeetingID", &m.internal_id),
        element("createTime", m.create_time),
        element("voiceBridge", &m.voice_bridge),
        element("dialNumber", &m.dial_number),
        element("attendeePW", &m.attendee_pw),
        element("moderatorPW", &m.moderator_pw),
        element("running", m.running),
        element("recording", m.record && m.running),
        element("hasBeenForciblyEnded", false),
        element("hasUserJoined", m.has_user_joined),
        element("participantCount", m.participant_count),
        element("listenerCount", 0),
        element("voiceParticipantCount", 0),
        element("videoCount", 0),
        element("moderatorCount", m.moderator_count),
        element("duration", 0),
        metadata(&m.metadata),
    ]
    .concat()
}

fn recording_xml(r: &RecordingRecord) -> String {
    let length_minutes = (r.end_time - r.start_time).max(0) / 60_000;
    [
        "<recording>".to_string(),
        element("recordID", &r.record_id),
        element("meetingID", &r.meeting_id),
        element("internalMeetingID", &r.internal_meeting_id),
        element("name", &r.name),
        element("published", r.published),
        element("state", &r.state),
        element("startTime", r.start_time),
        element("endTime", r.end_time),
        element("participants", r.participants),
        element("isBreakout", false),
        metadata(&r.metadata),
        "<playback><format>".to_string(),
        element("type", "presentation"),
        element("url", format!("{PLAYBACK_BASE}/{}", r.record_id)),
        element("length", length_minutes),
        "</format></playback>".to_string(),
        "</recording>".to_string(),
    ]
    .concat()
}

fn hook_xml(id: u64, hook: &HookRecord) -> String {
    [
        "<hook>".to_string(),
        element("hookID", id),
        element("callbackURL", &hook.callback_url),
        element("meetingID", &hook.meeting_id),
        element("permanentHook", hook.meeting_id.is_empty()),
        element("rawData", hook.raw_data),
        "</hook>".to_string(),
    ]
    .concat()
}

fn not_found_meeting() -> String {
    XmlResponse::failed("notFound", "We could not find a meeting with that meeting ID").finish()
}

fn not_found_recording() -> String {
    XmlResponse::failed("notFound", "We could not find recordings").finish()
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

fn create(store: &mut Store, params: &Params) -> String {
    let meeting_id = param(params, "meetingID");
    if meeting_id.is_empty() {
        return XmlResponse::failed("missingParamMeetingID", "You must specify a meeting ID").finish();
    }
    let name = param(params, "name");
    if name.is_empty() {
        return XmlResponse::failed("missingParamName", "You must specify a name").finish();
    }
    let attendee_pw = param(params, "attendeePW");
    let moderator_pw = param(params, "moderatorPW");

    let mut message_key = None;
    if let Some(existing) = store.meetings.get(meeting_id) {
        if existing.attendee_pw != attendee_pw || existing.moderator_pw != moderator_pw {
            return XmlResponse::failed(
                "idNotUnique",
                "A meeting already exists with that meeting ID. Please use a different meeting ID.",
            )
            .finish();
        }
        message_key = Some("duplicateWarning");
    } else {
        let meeting = MeetingRecord {
            meeting_id: meeting_id.to_string(),
            internal_id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            attendee_pw: attendee_pw.to_string(),
            moderator_pw: moderator_pw.to_string(),
            voice_bridge: param(params, "voiceBridge").to_string(),
            dial_number: param(params, "dialNumber").to_string(),
            create_time: now_millis(),
            record: param(params, "record") == "true",
            running: false,
            has_user_joined: false,
            participant_count: 0,
            moderator_count: 0,
            metadata: prefixed(params, "meta_"),
        };
        store.meetings.insert(meeting.meeting_id.clone(), meeting);
    }

    let m = &store.meetings[meeting_id];
    let mut resp = XmlResponse::success()
        .field("meetingID", &m.meeting_id)
        .field("internalMeetingID", &m.internal_id)
        .field("parentMeetingID", "bbb-none")
        .field("attendeePW", &m.attendee_pw)
        .field("moderatorPW", &m.moderator_pw)
        .field("createTime", m.create_time)
        .field("voiceBridge", &m.voice_bridge)
        .field("dialNumber", &m.dial_number)
        .field("hasUserJoined", m.has_user_joined)
        .field("duration", 0);
    if let Some(key) = message_key {
        resp = resp
            .field("messageKey", key)
            .field("message", "This conference was already in existence and may currently be in progress.");
    }
    resp.finish()
}

fn join(store: &mut Store, params: &Params) -> String {
    let full_name = param(params, "fullName");
    if full_name.is_empty() {
        return XmlResponse::failed("missingParamFullName", "You must specify a name for the attendee").finish();
    }
    let Some(meeting) = store.meetings.get_mut(param(params, "meetingID")) else {
        return XmlResponse::failed(
            "invalidMeetingIdentifier",
            "The meeting ID that you supplied did not match any existing meetings",
        )
        .finish();
    };
    let password = param(params, "password");
    let is_moderator = password == meeting.moderator_pw;
    if !is_moderator && password != meeting.attendee_pw {
        return XmlResponse::failed("invalidPassword", "You either did not supply a password or the password supplied is neither the attendee or moderator password for this conference.").finish();
    }

    meeting.running = true;
    meeting.has_user_joined = true;
    meeting.participant_count += 1;
    if is_moderator {
        meeting.moderator_count += 1;
    }
    let user_id = match param(params, "userID") {
        "" => format!("w_{}", Uuid::new_v4().simple()),
        id => id.to_string(),
    };

    XmlResponse::success()
        .field("messageKey", "successfullyJoined")
        .field("message", "You have joined successfully.")
        .field("meeting_id", &meeting.internal_id)
        .field("user_id", user_id)
        .field("auth_token", Uuid::new_v4().simple())
        .field("session_token", Uuid::new_v4().simple())
        .field("guestStatus", "ALLOW")
        .finish()
}

fn end(store: &mut Store, params: &Params) -> String {
    let meeting_id = param(params, "meetingID");
    let Some(meeting) = store.meetings.get(meeting_id) else {
        return not_found_meeting();
    };
    if param(params, "password") != meeting.moderator_pw {
        return XmlResponse::failed("invalidPassword", "You must supply the moderator password for this call.").finish();
    }

    if let Some(meeting) = store.meetings.remove(meeting_id) {
        if meeting.record {
            let recording = RecordingRecord {
                record_id: meeting.internal_id.clone(),
                meeting_id: meeting.meeting_id.clone(),
                internal_meeting_id: meeting.internal_id.clone(),
                name: meeting.name.clone(),
                published: true,
                state: "published".to_string(),
                start_time: meeting.create_time,
                end_time: now_millis(),
                participants: meeting.participant_count,
                metadata: meeting.metadata.clone(),
            };
            store.recordings.insert(recording.record_id.clone(), recording);
        }
    }

    XmlResponse::success()
        .field("messageKey", "sentEndMeetingRequest")
        .field("message", "A request to end the meeting was sent.  Please wait a few seconds, and then use the getMeetingInfo or isMeetingRunning API calls to verify that it was ended.")
        .finish()
}

fn get_meeting_info(store: &Store, params: &Params) -> String {
    let meeting_id = param(params, "meetingID");
    if meeting_id.is_empty() {
        return XmlResponse::failed("missingParamMeetingID", "You must specify a meeting ID").finish();
    }
    let Some(meeting) = store.meetings.get(meeting_id) else {
        return not_found_meeting();
    };
    XmlResponse::success().raw(&meeting_fields(meeting)).finish()
}

fn get_meetings(store: &Store) -> String {
    let mut resp = XmlResponse::success();
    if store.meetings.is_empty() {
        resp = resp
            .field("messageKey", "noMeetings")
            .field("message", "no meetings were found on this server");
    }
    let meetings: String = store
        .meetings
        .values()
        .map(|m| format!("<meeting>{}</meeting>", meeting_fields(m)))
        .collect();
    resp.raw(&format!("<meetings>{meetings}</meetings>")).finish()
}

fn is_meeting_running(store: &Store, params: &Params) -> String {
    let running = store
        .meetings
        .get(param(params, "meetingID"))
        .is_some_and(|m| m.running);
    XmlResponse::success().field("running", running).finish()
}

// ---------------------------------------------------------------------------
// Recordings
// ---------------------------------------------------------------------------

fn id_list(value: &str) -> Vec<&str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn get_recordings(store: &Store, params: &Params) -> String {
    let meeting_ids = id_list(param(params, "meetingID"));
    let record_ids = id_list(param(params, "recordID"));
    let states = id_list(param(params, "state"));
    let offset: usize = param(params, "offset").parse().unwrap_or(0);
    let limit: usize = param(params, "limit").parse().unwrap_or(usize::MAX);

    let recordings: Vec<&RecordingRecord> = store
        .recordings
        .values()
        .filter(|r| meeting_ids.is_empty() || meeting_ids.contains(&r.meeting_id.as_str()))
        .filter(|r| record_ids.is_empty() || record_ids.contains(&r.record_id.as_str()))
        .filter(|r| states.is_empty() || states.contains(&"any") || states.contains(&r.state.as_str()))
        .skip(offset)
        .take(limit)
        .collect();

    let mut resp = XmlResponse::success();
    if recordings.is_empty() {
        resp = resp
            .field("messageKey", "noRecordings")
            .field("message", "There are no recordings for the meeting(s).");
    }
    let items: String = recordings.into_iter().map(recording_xml).collect();
    resp.raw(&format!("<recordings>{items}</recordings>")).finish()
}

fn publish_recordings(store: &mut Store, params: &Params) -> String {
    let publish = match param(params, "publish") {
        "true" => true,
        "false" => false,
        _ => return XmlResponse::failed("missingParamPublish", "You must specify a publish value true or false.").finish(),
    };
    let ids = id_list(param(params, "recordID"));
    if ids.is_empty() {
        return XmlResponse::failed("missingParamRecordID", "You must specify a recordID.").finish();
    }
    if !ids.iter().all(|id| store.recordings.contains_key(*id)) {
        return not_found_recording();
    }
    for id in ids {
        if let Some(recording) = store.recordings.get_mut(id) {
            recording.published = publish;
            recording.state = if publish { "published" } else { "unpublished" }.to_string();
        }
    }
    XmlResponse::success().field("published", publish).finish()
}

fn delete_recordings(store: &mut Store, params: &Params) -> String {
    let ids = id_list(param(params, "recordID"));
    if ids.is_empty() {
        return XmlResponse::failed("missingParamRecordID", "You must specify a recordID.").finish();
    }
    if !ids.iter().all(|id| store.recordings.contains_key(*id)) {
        return not_found_recording();
    }
    for id in ids {
        store.recordings.remove(id);
    }
    XmlResponse::success().field("deleted", true).finish()
}

fn update_recordings(store: &mut Store, params: &Params) -> String {
    let ids = id_list(param(params, "recordID"));
    if ids.is_empty() {
        return XmlResponse::failed("missingParamRecordID", "You must specify a recordID.").finish();
    }
    if !ids.iter().all(|id| store.recordings.contains_key(*id)) {
        return not_found_recording();
    }
    let meta = prefixed(params, "meta_");
    for id in ids {
        if let Some(recording) = store.recordings.get_mut(id) {
            recording.metadata.extend(meta.clone());
        }
    }
    XmlResponse::success().field("updated", true).finish()
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

fn create_hook(store: &mut Store, params: &Params) -> String {
    let callback_url = param(params, "callbackURL");
    if callback_url.is_empty() {
        return XmlResponse::failed("missingParamCallbackURL", "You must specify a callbackURL.").finish();
    }
    let meeting_id = param(params, "meetingID");

    if let Some((id, hook)) = store
        .hooks
        .iter()
        .find(|(_, h)| h.callback_url == callback_url && h.meeting_id == meeting_id)
    {
        return XmlResponse::success()
            .field("hookID", id)
            .field("permanentHook", hook.meeting_id.is_empty())
            .field("rawData", hook.raw_data)
            .field("messageKey", "duplicateWarning")
            .field("message", "There is already a hook for this callback URL.")
            .finish();
    }

    store.next_hook_id += 1;
    let id = store.next_hook_id;
    let hook = HookRecord {
        callback_url: callback_url.to_string(),
        meeting_id: meeting_id.to_string(),
        raw_data: param(params, "getRaw") == "true",
    };
    let resp = XmlResponse::success()
        .field("hookID", id)
        .field("permanentHook", hook.meeting_id.is_empty())
        .field("rawData", hook.raw_data)
        .finish();
    store.hooks.insert(id, hook);
    resp
}

/// With `meetingID`, lists that meeting's hooks plus the global ones.
fn list_hooks(store: &Store, params: &Params) -> String {
    let meeting_id = param(params, "meetingID");
    let hooks: String = store
        .hooks
        .iter()
        .filter(|(_, h)| meeting_id.is_empty() || h.meeting_id.is_empty() || h.meeting_id == meeting_id)
        .map(|(id, h)| hook_xml(*id, h))
        .collect();
    XmlResponse::success().raw(&format!("<hooks>{hooks}</hooks>")).finish()
}

fn hook_id(params: &Params) -> Option<u64> {
    param(params, "hookID").parse().ok()
}

fn destroy_hook(store: &mut Store, params: &Params) -> String {
    if param(params, "hookID").is_empty() {
        return XmlResponse::failed("missingParamHookID", "You must specify a hookID.").finish();
    }
    match hook_id(params).and_then(|id| store.hooks.remove(&id)) {
        Some(_) => XmlResponse::success().field("removed", true).finish(),
        None => XmlResponse::failed("destroyMissingHook", "The hook informed was not found.").finish(),
    }
}

fn update_hook(store: &mut Store, params: &Params) -> String {
    if param(params, "hookID").is_empty() {
        return XmlResponse::failed("missingParamHookID", "You must specify a hookID.").finish();
    }
    let missing = || XmlResponse::failed("updateMissingHook", "The hook informed was not found.").finish();
    let Some(id) = hook_id(params) else {
        return missing();
    };
    let Some(hook) = store.hooks.get_mut(&id) else {
        return missing();
    };
    if let Some(url) = params.get("callbackURL").filter(|u| !u.is_empty()) {
        hook.callback_url = url.clone();
    }
    if let Some(meeting_id) = params.get("meetingID") {
        hook.meeting_id = meeting_id.clone();
    }
    if let Some(raw) = params.get("getRaw") {
        hook.raw_data = raw == "true";
    }
    XmlResponse::success()
        .field("hookID", id)
        .field("permanentHook", hook.meeting_id.is_empty())
        .field("rawData", hook.raw_data)
        .finish()
}
