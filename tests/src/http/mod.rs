use dwgpt::{ChatRepl, ReplCommand, ReplOutcome};
use dwgpt_core::backend::{BackendDriver, BackendError, BackendKind, ChatBackend, HttpBackend};
use dwgpt_core::protocol::{ChatRequest, Payload};
use dwgpt_core::state::ChatSession;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/chat", server.uri())).unwrap()
}

fn http_session(server: &MockServer) -> ChatSession {
    let driver = BackendDriver::with_kind(BackendKind::Http, &endpoint(server)).unwrap();
    ChatSession::new(driver)
}

#[tokio::test]
async fn posts_message_and_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "message": "Shipments where POL is Nhava Sheva",
            "conversationId": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "conversationId": "conv-1",
            "intent": { "type": "query_shipments" },
            "data": {
                "type": "shipments",
                "count": 1,
                "records": [{ "shipment_no": "ABC123", "pol": "Nhava Sheva" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server)).unwrap();
    let reply = backend
        .send(&ChatRequest::new("Shipments where POL is Nhava Sheva", None))
        .await
        .unwrap();

    assert!(reply.ok);
    assert_eq!(reply.conversation_id.as_deref(), Some("conv-1"));
    assert!(matches!(reply.data, Some(Payload::Shipments(ref set)) if set.records.len() == 1));
}

#[tokio::test]
async fn session_resends_conversation_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "hello", "conversationId": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "conversationId": "conv-7",
            "aiResponse": "Hi! What would you like to know?"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "and tasks?", "conversationId": "conv-7" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": { "type": "tasks", "count": 0, "records": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = http_session(&server);
    let first = session.send("hello").await.unwrap();
    assert_eq!(first.content, "Hi! What would you like to know?");
    let second = session.send("and tasks?").await.unwrap();
    assert_eq!(second.content, "Found 0 task(s). No tasks found.");
    assert_eq!(session.conversation_id().as_deref(), Some("conv-7"));
}

#[tokio::test]
async fn application_error_is_read_from_error_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "ok": false, "error": "bad filter" })),
        )
        .mount(&server)
        .await;

    let session = http_session(&server);
    let reply = session.send("filter by ???").await.unwrap();
    assert_eq!(reply.content, "❌ Failed to process your request. bad filter");
    assert!(session.conversation_id().is_none());
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn unparseable_error_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoint(&server)).unwrap();
    let err = backend
        .send(&ChatRequest::new("hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Status(status) if status.as_u16() == 502));
}

#[tokio::test]
async fn garbage_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let session = http_session(&server);
    let reply = session.send("hello").await.unwrap();
    assert!(reply.content.starts_with("❌ Failed to process your request. malformed response"));
    assert!(!session.is_pending());
}

#[tokio::test]
async fn unreachable_backend_becomes_failure_message() {
    let server = MockServer::start().await;
    let url = endpoint(&server);
    drop(server);

    let session = ChatSession::new(BackendDriver::with_kind(BackendKind::Http, &url).unwrap());
    let reply = session.send("hello").await.unwrap();

    assert!(reply.content.starts_with("❌ Failed to process your request."));
    assert!(!session.is_pending());
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn repl_exports_records_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "aiResponse": "Two shipments are delayed.",
            "data": {
                "type": "shipments",
                "count": 2,
                "records": [
                    { "shipment_no": "ABC123", "status": "Delayed, port congestion" },
                    { "shipment_no": "ABC124", "status": null }
                ]
            }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let repl = ChatRepl::new(http_session(&server), dir.path().to_path_buf());

    let ReplOutcome::Continue(rendered) = repl
        .handle(ReplCommand::Send("delayed shipments".into()))
        .await
    else {
        panic!("send should not quit");
    };
    assert!(rendered.contains("Two shipments are delayed."));
    assert!(rendered.contains("2 record(s)"));

    let ReplOutcome::Continue(saved) = repl.handle(ReplCommand::Export(1)).await else {
        panic!("export should not quit");
    };
    assert!(saved.starts_with("Saved 2 record(s)"));
    let file = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    assert_eq!(
        std::fs::read_to_string(file.path()).unwrap(),
        "shipment_no,status\nABC123,\"Delayed, port congestion\"\nABC124,"
    );
}
