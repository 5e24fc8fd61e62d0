//! End-to-end exchange behavior against a mock assistant service.

use std::sync::Arc;
use std::time::Duration;

use haven_ai::{
    ChatError, Conversation, ConversationEvent, ConversationOptions, EnvCredential, HavenClient,
    MessageStatus, Role, SendOptions, SendOutcome, SessionRef, StaticCredential,
};
use haven_config::ApiConfig;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn conversation_with(server: &MockServer, options: ConversationOptions) -> Conversation {
    let api = ApiConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let client = HavenClient::new(api).unwrap();
    Conversation::new(client, Arc::new(StaticCredential::new("TEST_TOKEN")), options)
}

fn conversation(server: &MockServer) -> Conversation {
    conversation_with(server, ConversationOptions::default())
}

fn stream_body(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{l}\n\n")).collect()
}

fn stream_response(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/event-stream")
}

async fn request_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn first_reply_adopts_session_and_second_send_carries_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer TEST_TOKEN"))
        .respond_with(stream_response(stream_body(&[
            r#"data: {"text":"Hel"}"#,
            r#"data: {"text":"lo"}"#,
            r#"data: {"done":true,"sessionRef":"S1"}"#,
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[
            r#"data: {"text":"Fine, thanks."}"#,
            r#"data: {"done":true,"sessionRef":"S2"}"#,
        ])))
        .mount(&server)
        .await;

    let conv = conversation(&server);

    let outcome = conv.send("Hi").await.unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Completed { session_ref: Some(ref s), .. } if s.as_str() == "S1"
    ));

    let snap = conv.snapshot();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[0].role, Role::User);
    assert_eq!(snap.messages[0].content, "Hi");
    assert_eq!(snap.messages[1].role, Role::Assistant);
    assert_eq!(snap.messages[1].content, "Hello");
    assert_eq!(snap.messages[1].status, MessageStatus::Complete);
    assert!(!snap.loading);
    assert!(snap.error.is_none());

    conv.send("How are you?").await.unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["sessionRef"], serde_json::Value::Null);
    assert_eq!(bodies[0]["history"], serde_json::json!([]));
    assert_eq!(bodies[1]["prompt"], "How are you?");
    assert_eq!(bodies[1]["sessionRef"], "S1");
    assert_eq!(
        bodies[1]["history"],
        serde_json::json!([
            {"role": "user", "parts": [{"text": "Hi"}]},
            {"role": "model", "parts": [{"text": "Hello"}]},
        ])
    );

    // A later terminal frame never replaces the adopted reference.
    assert_eq!(conv.session_ref(), Some(SessionRef::from("S1")));
    assert_eq!(conv.snapshot().messages.len(), 4);
}

#[tokio::test]
async fn error_status_keeps_user_message_and_sets_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let err = conv.send("Hi").await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 500, .. }));

    let snap = conv.snapshot();
    assert_eq!(snap.messages.len(), 1);
    assert_eq!(snap.messages[0].content, "Hi");
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(err));

    conv.clear_error();
    assert!(conv.error().is_none());
}

#[tokio::test]
async fn blank_prompt_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let conv = conversation(&server);
    assert_eq!(conv.send("   \n ").await.unwrap(), SendOutcome::Ignored);

    let snap = conv.snapshot();
    assert!(snap.messages.is_empty());
    assert!(!snap.loading);
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    let conv = Conversation::new(
        HavenClient::new(api).unwrap(),
        Arc::new(EnvCredential::new("HAVEN_TEST_TOKEN_THAT_IS_NEVER_SET")),
        ConversationOptions::default(),
    );

    let err = conv.send("Hi").await.unwrap_err();
    assert_eq!(err, ChatError::AuthenticationMissing);

    let snap = conv.snapshot();
    assert!(snap.messages.is_empty());
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(ChatError::AuthenticationMissing));
}

#[tokio::test]
async fn stream_without_terminal_frame_fails_reply_and_keeps_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[r#"data: {"text":"partial"}"#])))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let err = conv.send("Hi").await.unwrap_err();
    assert_eq!(err, ChatError::StreamIncomplete);

    let snap = conv.snapshot();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[1].content, "partial");
    assert_eq!(snap.messages[1].status, MessageStatus::Failed);
    assert!(snap.session_ref.is_none());
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(ChatError::StreamIncomplete));
}

#[tokio::test]
async fn unterminated_trailing_terminal_line_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(
            "data: {\"text\":\"Hi\"}\ndata: {\"done\":true,\"sessionRef\":\"S9\"}",
        ))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let err = conv.send("Hello").await.unwrap_err();
    assert_eq!(err, ChatError::StreamIncomplete);
    assert!(conv.session_ref().is_none());
}

#[tokio::test]
async fn noise_lines_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(concat!(
            ": keepalive\n",
            "\n",
            "data: {not json}\n",
            "data: {\"text\":\"ok\"}\r\n",
            "event: ping\n",
            "data: {\"done\":true,\"sessionRef\":\"S1\",\"videos\":[{\"url\":\"https://v.example/1\",\"title\":\"Calm\"}]}\n",
        )))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    conv.send("Hi").await.unwrap();

    let snap = conv.snapshot();
    let reply = &snap.messages[1];
    assert_eq!(reply.content, "ok");
    assert_eq!(reply.status, MessageStatus::Complete);
    assert_eq!(reply.media.len(), 1);
    assert_eq!(reply.media[0].title, "Calm");
}

#[tokio::test]
async fn slow_headers_hit_stall_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            stream_response(stream_body(&[r#"data: {"done":true}"#]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let conv = conversation_with(
        &server,
        ConversationOptions {
            stall_timeout: Duration::from_millis(200),
            ..Default::default()
        },
    );

    let err = conv.send("Hi").await.unwrap_err();
    assert_eq!(err, ChatError::StallTimeout(200));

    let snap = conv.snapshot();
    assert_eq!(snap.messages.len(), 1);
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(err));
}

#[tokio::test]
async fn complex_flag_follows_prompt_shape_unless_overridden() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[r#"data: {"done":true}"#])))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    conv.send("short").await.unwrap();
    conv.send("line one\nline two").await.unwrap();
    conv.send_with("short", SendOptions { complex: Some(true) })
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["isComplex"], false);
    assert_eq!(bodies[1]["isComplex"], true);
    assert_eq!(bodies[2]["isComplex"], true);
}

#[tokio::test]
async fn events_follow_the_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[
            r#"data: {"text":"Hel"}"#,
            r#"data: {"text":"lo"}"#,
            r#"data: {"done":true,"sessionRef":"S1"}"#,
        ])))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let mut rx = conv.subscribe();
    conv.send("Hi").await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let user = haven_ai::MessageId(1);
    let reply = haven_ai::MessageId(2);
    assert_eq!(
        events,
        vec![
            ConversationEvent::MessageAppended {
                id: user,
                role: Role::User
            },
            ConversationEvent::MessageAppended {
                id: reply,
                role: Role::Assistant
            },
            ConversationEvent::Delta {
                id: reply,
                text: "Hel".into()
            },
            ConversationEvent::Delta {
                id: reply,
                text: "lo".into()
            },
            ConversationEvent::MessageCompleted { id: reply },
            ConversationEvent::SessionAdopted(SessionRef::from("S1")),
        ]
    );
}

#[tokio::test]
async fn new_session_clears_everything_and_next_send_starts_fresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[
            r#"data: {"text":"Hello"}"#,
            r#"data: {"done":true,"sessionRef":"S1"}"#,
        ])))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    conv.send("Hi").await.unwrap();
    assert!(conv.session_ref().is_some());

    conv.new_session();
    let snap = conv.snapshot();
    assert!(snap.messages.is_empty());
    assert!(snap.session_ref.is_none());
    assert!(snap.error.is_none());
    assert!(!snap.loading);

    conv.send("Again").await.unwrap();
    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[1]["sessionRef"], serde_json::Value::Null);
    assert_eq!(bodies[1]["history"], serde_json::json!([]));
}

#[tokio::test]
async fn second_operation_while_busy_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            stream_response(stream_body(&[r#"data: {"done":true,"sessionRef":"S1"}"#]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let (sent, loaded) = tokio::join!(conv.send("Hi"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        conv.load_session(&SessionRef::from("S7")).await
    });

    assert!(sent.is_ok());
    assert_eq!(loaded, Err(ChatError::Busy));
    assert!(!conv.is_busy());
}

#[tokio::test]
async fn cancel_aborts_without_raising_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            stream_response(stream_body(&[r#"data: {"done":true}"#]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let (sent, cancelled) = tokio::join!(conv.send("Hi"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        conv.cancel()
    });

    assert!(cancelled);
    assert_eq!(sent, Err(ChatError::Cancelled));

    let snap = conv.snapshot();
    assert_eq!(snap.messages.len(), 1);
    assert!(!snap.loading);
    assert!(snap.error.is_none());
    assert!(!conv.cancel());
}

#[tokio::test]
async fn malformed_media_does_not_cost_the_terminal_frame() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(stream_response(stream_body(&[
            r#"data: {"text":"Hi"}"#,
            r#"data: {"done":true,"sessionRef":"S1","videos":[{"url":"u","title":"t","thumbnail":null},{"title":"no url"}]}"#,
        ])))
        .mount(&server)
        .await;

    let conv = conversation(&server);
    conv.send("Hello").await.unwrap();

    let snap = conv.snapshot();
    let reply = &snap.messages[1];
    assert_eq!(reply.status, MessageStatus::Complete);
    assert_eq!(reply.media.len(), 1);
    assert_eq!(reply.media[0].url, "u");
    assert_eq!(snap.session_ref, Some(SessionRef::from("S1")));
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn new_session_mid_stream_drops_late_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            stream_response(stream_body(&[
                r#"data: {"text":"late"}"#,
                r#"data: {"done":true,"sessionRef":"OLD"}"#,
            ]))
            .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let conv = conversation(&server);
    let (sent, ()) = tokio::join!(conv.send("Hi"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        conv.new_session();
    });

    assert_eq!(sent, Err(ChatError::Cancelled));

    // Let the delayed body arrive; nothing may reach the fresh store.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let snap = conv.snapshot();
    assert!(snap.messages.is_empty());
    assert!(snap.session_ref.is_none());
    assert!(snap.error.is_none());
    assert!(!snap.loading);
    assert!(!conv.is_busy());
}
