//! Full API lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP with the default `ureq` transport. The mock
//! verifies checksums with its own implementation, so a signing mismatch
//! shows up here as a `checksumError` application failure.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use bbb_core::{
    ApiError, BbbClient, ClientConfig, CreateHookRequest, CreateMeetingRequest,
    EndMeetingRequest, ErrorKind, GetRecordingsRequest, HttpRequest, JoinMeetingRequest, Params,
    PublishRecordingsRequest, StatusResponse, Transport, UpdateRecordingsRequest, UreqTransport,
};

const SECRET: &str = "integration-secret";

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, SECRET).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Answer a single request with `body` and status 200, then close.
fn serve_once(body: Vec<u8>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        // The client may hang up early when it enforces a size limit.
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
    });

    format!("http://{addr}")
}

fn large_recordings_body(name_len: usize) -> Vec<u8> {
    format!(
        "<response><returncode>SUCCESS</returncode><recordings><recording>\
         <recordID>big</recordID><name>{}</name></recording></recordings></response>",
        "a".repeat(name_len)
    )
    .into_bytes()
}

fn meta(key: &str, value: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(key.to_string(), value.to_string());
    map
}

#[test]
fn meeting_and_recording_lifecycle() {
    // Step 1: start mock server; trailing slash on the base is normalized.
    let base = start_server();
    let client = BbbClient::new(&format!("{base}/"), SECRET).unwrap();
    assert_eq!(client.api_root(), format!("{base}/api/"));

    // Step 2: no meetings yet.
    let meetings = client.get_meetings().unwrap();
    assert!(meetings.meetings.is_empty());
    assert_eq!(meetings.message_key, "noMeetings");

    // Step 3: create a recorded meeting with default passwords.
    let create = CreateMeetingRequest {
        meeting_id: "bio-101".to_string(),
        record: true,
        meta: meta("origin", "lms"),
        ..Default::default()
    };
    let created = client.create_meeting(&create).unwrap();
    assert_eq!(created.meeting_id, "bio-101");
    assert_eq!(created.attendee_pw, "ap");
    assert_eq!(created.moderator_pw, "mp");
    assert!(!created.internal_meeting_id.is_empty());

    // Step 4: same ID with different passwords is an application error.
    let clash = CreateMeetingRequest {
        meeting_id: "bio-101".to_string(),
        attendee_pw: "other".to_string(),
        ..Default::default()
    };
    let err = client.create_meeting(&clash).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.message_key(), Some("idNotUnique"));

    // Step 5: nobody joined yet.
    assert!(!client.is_meeting_running("bio-101").unwrap());

    // Step 6: follow the signed join URL.
    let join = JoinMeetingRequest {
        full_name: "Ada Lovelace".to_string(),
        meeting_id: "bio-101".to_string(),
        password: "mp".to_string(),
        ..Default::default()
    };
    let url = client.join_url(&join).unwrap();
    let response = UreqTransport::new(Duration::from_secs(5))
        .execute(&HttpRequest {
            operation: "join".to_string(),
            url,
        })
        .unwrap();
    let joined: StatusResponse = client.parse_response(response).unwrap();
    assert_eq!(joined.return_code, "SUCCESS");
    assert_eq!(joined.message_key, "successfullyJoined");

    // Step 7: meeting is running with one moderator.
    assert!(client.is_meeting_running("bio-101").unwrap());
    let info = client.get_meeting_info("bio-101", "mp").unwrap();
    assert_eq!(info.meeting_name, "Meeting bio-101");
    assert!(info.running);
    assert_eq!(info.participant_count, 1);
    assert_eq!(info.moderator_count, 1);
    assert_eq!(info.metadata.get("origin").map(String::as_str), Some("lms"));

    let meetings = client.get_meetings().unwrap();
    assert_eq!(meetings.meetings.len(), 1);
    assert_eq!(meetings.meetings[0].meeting_id, "bio-101");

    // Step 8: ending needs the moderator password.
    let wrong = EndMeetingRequest {
        meeting_id: "bio-101".to_string(),
        password: "ap".to_string(),
    };
    let err = client.end_meeting(&wrong).unwrap_err();
    assert_eq!(err.message_key(), Some("invalidPassword"));

    let ended = client
        .end_meeting(&EndMeetingRequest {
            meeting_id: "bio-101".to_string(),
            password: "mp".to_string(),
        })
        .unwrap();
    assert_eq!(ended.message_key, "sentEndMeetingRequest");
    assert!(!client.is_meeting_running("bio-101").unwrap());

    let err = client.get_meeting_info("bio-101", "mp").unwrap_err();
    assert_eq!(err.message_key(), Some("notFound"));

    // Step 9: the recording shows up.
    let filter = GetRecordingsRequest {
        meeting_id: "bio-101".to_string(),
        ..Default::default()
    };
    let recordings = client.get_recordings(&filter).unwrap();
    assert_eq!(recordings.recordings.len(), 1);
    let recording = recordings.recordings[0].clone();
    assert!(recording.published);
    assert_eq!(recording.state, "published");
    assert_eq!(recording.playback[0].format_type, "presentation");

    // Step 10: unpublish.
    let published = client
        .publish_recordings(&PublishRecordingsRequest {
            record_id: recording.record_id.clone(),
            publish: false,
        })
        .unwrap();
    assert!(!published.published);
    let unpublished = GetRecordingsRequest {
        state: "unpublished".to_string(),
        ..Default::default()
    };
    assert_eq!(client.get_recordings(&unpublished).unwrap().recordings.len(), 1);

    // Step 11: update metadata.
    let updated = client
        .update_recordings(&UpdateRecordingsRequest {
            record_id: recording.record_id.clone(),
            meta: meta("course", "biology"),
        })
        .unwrap();
    assert!(updated.updated);
    let refreshed = client.get_recordings(&filter).unwrap();
    assert_eq!(
        refreshed.recordings[0].metadata.get("course").map(String::as_str),
        Some("biology")
    );

    // Step 12: delete, then it is gone.
    let deleted = client.delete_recordings(&recording.record_id).unwrap();
    assert!(deleted.deleted);
    assert!(client.get_recordings(&filter).unwrap().recordings.is_empty());

    let err = client.delete_recordings(&recording.record_id).unwrap_err();
    assert_eq!(err.message_key(), Some("notFound"));
}

#[test]
fn webhook_lifecycle() {
    let base = start_server();
    let client = BbbClient::new(&base, SECRET).unwrap();

    // Step 1: a global hook and one scoped to a meeting.
    let global = client
        .create_hook(&CreateHookRequest {
            callback_url: "https://example.com/all?src=bbb".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert!(global.permanent_hook);
    let scoped = client
        .create_hook(&CreateHookRequest {
            callback_url: "https://example.com/bio".to_string(),
            meeting_id: "bio-101".to_string(),
            get_raw: true,
            ..Default::default()
        })
        .unwrap();
    assert!(!scoped.permanent_hook);
    assert!(scoped.raw_data);

    // Step 2: list all, then per meeting (global hooks always included).
    let hooks = client.list_hooks().unwrap();
    assert_eq!(hooks.hooks.len(), 2);
    assert_eq!(hooks.hooks[0].callback_url, "https://example.com/all?src=bbb");
    assert_eq!(client.list_hooks_for_meeting("bio-101").unwrap().hooks.len(), 2);
    assert_eq!(client.list_hooks_for_meeting("chem-201").unwrap().hooks.len(), 1);

    // Step 3: move the scoped hook.
    let mut updates = BTreeMap::new();
    updates.insert("callbackURL".to_string(), "https://example.com/bio-v2".to_string());
    let moved = client.update_hook(&scoped.hook_id, &updates).unwrap();
    assert_eq!(moved.hook_id, scoped.hook_id);
    let hooks = client.list_hooks_for_meeting("bio-101").unwrap();
    assert!(hooks.hooks.iter().any(|h| h.callback_url == "https://example.com/bio-v2"));

    // Step 4: destroy, twice.
    assert!(client.destroy_hook(&global.hook_id).unwrap().removed);
    let err = client.destroy_hook(&global.hook_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.message_key(), Some("destroyMissingHook"));
    assert_eq!(client.list_hooks().unwrap().hooks.len(), 1);
}

#[test]
fn wrong_secret_is_rejected_by_server() {
    let base = start_server();
    let client = BbbClient::new(&base, "not-the-secret").unwrap();
    let err = client.get_meetings().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.message_key(), Some("checksumError"));
}

#[test]
fn unknown_operation_is_http_error() {
    let base = start_server();
    let client = BbbClient::new(&base, SECRET).unwrap();
    let err = client
        .dispatch::<StatusResponse>("noSuchCall", &Params::new())
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn closed_port_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BbbClient::builder(&format!("http://{addr}"), SECRET)
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = client.get_meetings().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[test]
fn large_response_body_is_decoded() {
    let name_len = 11 * 1024 * 1024;
    let base = serve_once(large_recordings_body(name_len));
    let client = BbbClient::new(&base, SECRET).unwrap();

    let recordings = client.get_recordings(&GetRecordingsRequest::default()).unwrap();
    assert_eq!(recordings.recordings.len(), 1);
    assert_eq!(recordings.recordings[0].record_id, "big");
    assert_eq!(recordings.recordings[0].name.len(), name_len);
}

#[test]
fn body_over_configured_limit_is_transport_error() {
    let base = serve_once(large_recordings_body(64 * 1024));
    let client = BbbClient::builder(&base, SECRET)
        .max_body_bytes(1024)
        .build()
        .unwrap();

    let err = client.get_recordings(&GetRecordingsRequest::default()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[test]
fn silent_server_hits_builder_timeout() {
    // Accepted by the kernel backlog but never answered.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let client = BbbClient::builder(&format!("http://{addr}"), SECRET)
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let started = Instant::now();
    let err = client.get_meetings().unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert!(err.to_string().contains("getMeetings"), "{err}");
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    drop(listener);
}

#[test]
fn silent_server_hits_configured_timeout() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ClientConfig {
        timeout_secs: 1,
        ..ClientConfig::new(&format!("http://{addr}"), SECRET)
    };
    let client = BbbClient::from_config(&config).unwrap();
    let started = Instant::now();
    let err = client.is_meeting_running("bio-101").unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
    drop(listener);
}
