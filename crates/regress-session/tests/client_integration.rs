#![allow(clippy::unwrap_used, clippy::expect_used)]

use regress_core::{parse_tree, FieldValue, RegressError, TransportError};
use regress_session::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const ENGINE_PATH: &str = "/engine/request";

fn endpoint(server: &MockServer) -> String {
    format!("{}{ENGINE_PATH}", server.uri())
}

fn xml(inner: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!("<response>{inner}</response>"))
}

/// Answers each request with a fresh session id: `s0`, `s1`, ...
struct SequentialIdents(AtomicUsize);

impl Respond for SequentialIdents {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        xml(&format!("<ident>s{n}</ident><botanswer>Welcome</botanswer>"))
    }
}

// ---------------------------------------------------------------------------
// 1. request(): wire shape and decoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bare_request_is_a_get_and_decodes_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENGINE_PATH))
        .respond_with(xml("<ident>abc123</ident><entry>hello</entry>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let resp = client.request(None).await.unwrap();

    assert_eq!(resp.len(), 2);
    assert_eq!(resp.get("ident"), Some(&FieldValue::Text("abc123".into())));
    assert_eq!(resp.get("entry"), Some(&FieldValue::Text("hello".into())));
}

#[tokio::test]
async fn params_are_sent_as_form_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENGINE_PATH))
        .and(body_string("entry=reset+my+router&ident=abc"))
        .respond_with(xml("<ident>abc</ident><botanswer>Sure.</botanswer>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let resp = client
        .request(Some(RequestParams::turn("abc", "reset my router")))
        .await
        .unwrap();
    assert_eq!(resp.bot_answer(), Some("Sure."));
}

#[tokio::test]
async fn injected_defaults_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string("disable_integration=true&entry=hi&ident="))
        .respond_with(xml("<ident>new</ident>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string("disable_integration=true"))
        .respond_with(xml("<ident>bare</ident>"))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        SessionClient::with_config(endpoint(&server), ClientConfig::disable_integration()).unwrap();

    let turn = client
        .request(Some(RequestParams::turn("", "hi").with("disable_integration", "false")))
        .await
        .unwrap();
    assert_eq!(turn.ident(), Some("new"));

    // No parameters at all still becomes a POST carrying the default.
    let bare = client.request(None).await.unwrap();
    assert_eq!(bare.ident(), Some("bare"));
}

// ---------------------------------------------------------------------------
// 2. Response modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raw_mode_matches_tree_traversal() {
    let body = "<response><ident>x</ident><connectors><c><id>1</id></c></connectors></response>";
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let raw = client.request_raw(None).await.unwrap();

    let expected: Vec<String> = parse_tree(body)
        .unwrap()
        .iter()
        .map(|e| e.tag.clone())
        .collect();
    let actual: Vec<String> = raw.iter().map(|e| e.tag.clone()).collect();
    assert_eq!(actual, expected);
    assert_eq!(actual, vec!["response", "ident", "connectors", "c", "id"]);

    let reply = client
        .request_with_mode(None, ResponseMode::Raw)
        .await
        .unwrap();
    assert_eq!(reply.into_raw().unwrap(), raw);
}

#[tokio::test]
async fn ignore_mode_does_not_parse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not xml"))
        .expect(2)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    client
        .send(Some(RequestParams::turn("abc", "ping")))
        .await
        .unwrap();
    let reply = client
        .request_with_mode(Some(RequestParams::turn("abc", "ping")), ResponseMode::Ignore)
        .await
        .unwrap();
    assert_eq!(reply, Reply::Ignored);
}

#[tokio::test]
async fn ignore_mode_still_reads_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let err = client
        .request_with_mode(Some(RequestParams::turn("abc", "ping")), ResponseMode::Ignore)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegressError::Transport(TransportError::Status { code: 502, .. })
    ));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<response><ident>"))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let err = client.request(None).await.unwrap_err();
    assert!(matches!(err, RegressError::Parse(_)));
}

// ---------------------------------------------------------------------------
// 3. Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_is_distinguishable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let err = client.request(None).await.unwrap_err();
    let transport = err.as_transport().unwrap();
    assert!(transport.is_not_found());
    assert_eq!(transport.status(), Some(404));
}

#[tokio::test]
async fn server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let err = client.request(None).await.unwrap_err();
    assert_eq!(err.as_transport().and_then(TransportError::status), Some(503));
    assert!(!err.as_transport().unwrap().is_not_found());
}

#[tokio::test]
async fn slow_engine_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml("<ident>late</ident>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_timeout(Duration::from_millis(100));
    let client = SessionClient::with_config(endpoint(&server), config).unwrap();
    let err = client.request(None).await.unwrap_err();
    assert_eq!(
        err.as_transport(),
        Some(&TransportError::Timeout(Duration::from_millis(100)))
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_connection_error() {
    let client = SessionClient::new("http://127.0.0.1:9/engine").unwrap();
    let err = client.request(None).await.unwrap_err();
    assert!(matches!(
        err.as_transport(),
        Some(TransportError::Connection(_))
    ));
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    let err = SessionClient::new("not a url").unwrap_err();
    assert!(matches!(err, RegressError::Config(_)));
}

// ---------------------------------------------------------------------------
// 4. Closing sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn close_session_requires_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string("ident=abc123&sessionclosed=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string("ident=stale&sessionclosed=1"))
        .respond_with(xml("<error>no such session</error>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    assert!(client.close_session("abc123").await.unwrap());
    assert!(!client.close_session("stale").await.unwrap());
}

#[tokio::test]
async fn close_session_ignores_injected_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string("ident=abc&sessionclosed=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        SessionClient::with_config(endpoint(&server), ClientConfig::disable_integration()).unwrap();
    assert!(client.close_session("abc").await.unwrap());
}

#[tokio::test]
async fn close_sessions_attempts_every_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("ident=b&"))
        .respond_with(xml("<error>close failed</error>"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("sessionclosed=1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    assert!(!client.close_sessions(&["a", "b", "c"]).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn close_sessions_detailed_reports_each_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("ident=b&"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let report = client.close_sessions_detailed(&ids).await;

    assert!(!report.all_closed());
    assert_eq!(report.failed(), vec!["b"]);
    assert!(matches!(
        report.outcome("b"),
        Some(CloseOutcome::Failed(TransportError::Status { code: 500, .. }))
    ));
    assert_eq!(report.outcome("c"), Some(&CloseOutcome::Closed));
}

// ---------------------------------------------------------------------------
// 5. Opening and threading sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_sessions_issues_count_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialIdents(AtomicUsize::new(0)))
        .expect(3)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let ids = client.open_sessions(3).await.unwrap();
    assert_eq!(ids, vec!["s0", "s1", "s2"]);
}

#[tokio::test]
async fn open_sessions_aborts_without_ident() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml("<botanswer>Service unavailable</botanswer>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server)).unwrap();
    let err = client.open_sessions(2).await.unwrap_err();
    assert!(matches!(err, RegressError::Session(_)));
}

#[tokio::test]
async fn session_is_threaded_through_turns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml("<ident>sess-1</ident><botanswer>Hi</botanswer>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string("entry=billing&ident=sess-1"))
        .respond_with(xml(
            "<ident>sess-1</ident><botanswer>Billing menu</botanswer>\
             <connectors><connector><text>Pay bill</text></connector></connectors>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string("entry=&faq=1&ident=sess-1"))
        .respond_with(xml("<botanswer>Paid</botanswer>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(endpoint(&server))
        .unwrap()
        .with_project("TWC");
    let session = client.start_session().await.unwrap();
    assert_eq!(session.id, "sess-1");
    assert_eq!(session.turns, 1);

    let session = client.continue_session(&session, "billing").await.unwrap();
    assert_eq!(session.turns, 2);
    assert_eq!(
        session.last_response.connectors().unwrap()[0].get("text"),
        Some("Pay bill")
    );

    let params = RequestParams::new().with("entry", "").with("faq", "1");
    let session = client.send_turn(&session, params).await.unwrap();
    assert_eq!(session.id, "sess-1");
    assert_eq!(session.last_response.bot_answer(), Some("Paid"));
}
