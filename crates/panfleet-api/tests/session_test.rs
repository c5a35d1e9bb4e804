#![allow(clippy::unwrap_used)]
// Integration tests for `Session` using wiremock.

use secrecy::SecretString;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panfleet_api::{ConfigScope, Error, Session, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(body.to_owned())
}

async fn authed_session(server: &MockServer) -> Session {
    Session::with_api_key(
        &server.uri(),
        SecretString::from("TK1".to_owned()),
        TransportConfig::default(),
    )
    .unwrap()
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "keygen"))
        .and(query_param("user", "admin"))
        .and(query_param("password", "paper-clip"))
        .respond_with(xml_response(
            r#"<response status="success"><result><key>TK1</key></result></response>"#,
        ))
        .mount(&server)
        .await;

    let secret = SecretString::from("paper-clip".to_owned());
    let session = Session::authenticate(&server.uri(), "admin", &secret, TransportConfig::default())
        .await
        .unwrap();

    // The issued key is registered for redaction everywhere.
    assert!(!session.redactor().redact("echo TK1 back").contains("TK1"));
}

#[tokio::test]
async fn test_authenticate_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "keygen"))
        .respond_with(xml_response(
            r#"<response status="error" code="403"><result><msg>Invalid credentials</msg></result></response>"#,
        ))
        .mount(&server)
        .await;

    let secret = SecretString::from("wrong".to_owned());
    let result =
        Session::authenticate(&server.uri(), "admin", &secret, TransportConfig::default()).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_success_without_key_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(xml_response(
            r#"<response status="success"><result/></response>"#,
        ))
        .mount(&server)
        .await;

    let secret = SecretString::from("pw".to_owned());
    let result =
        Session::authenticate(&server.uri(), "admin", &secret, TransportConfig::default()).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Operational commands ────────────────────────────────────────────

#[tokio::test]
async fn test_run_operational_attaches_key_and_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "op"))
        .and(query_param("key", "TK1"))
        .and(query_param("target", "0123456789"))
        .and(query_param("cmd", "<show><system><info/></system></show>"))
        .respond_with(xml_response(
            r#"<response status="success"><result><system><hostname>fw-a</hostname></system></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let resp = session
        .run_operational(Some("0123456789"), "<show><system><info/></system></show>")
        .await
        .unwrap();

    assert!(resp.is_success());
    assert_eq!(
        resp.result().and_then(|r| r.descendant_text("hostname")),
        Some("fw-a")
    );
}

#[tokio::test]
async fn test_api_error_status_is_recoverable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "op"))
        .respond_with(xml_response(
            r#"<response status="error"><msg><line>unknown command</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    // Batch operations keep going: a non-success envelope is data,
    // not a transport-level failure.
    let resp = session.run_operational(None, "<show><bogus/></show>").await.unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.message().as_deref(), Some("unknown command"));
}

#[tokio::test]
async fn test_transient_status_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(xml_response(
            r#"<response status="success"><result/></response>"#,
        ))
        .with_priority(2)
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let resp = session.run_operational(None, "<show/>").await.unwrap();
    assert!(resp.is_success());
}

// ── Test commands ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unsupported_command_makes_no_network_call() {
    let server = MockServer::start().await;

    // The grammar rejects before the transport is touched.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let result = session.run_test(Some("001"), "test warp drive").await;

    assert!(matches!(result, Err(Error::UnsupportedCommand(_))));
    server.verify().await;
}

#[tokio::test]
async fn test_run_test_sends_translated_xml() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "test"))
        .and(query_param(
            "cmd",
            "<test><vpn><ike-sa><gateway>branch-gw</gateway></ike-sa></vpn></test>",
        ))
        .and(query_param("target", "001"))
        .respond_with(xml_response(
            r#"<response status="success"><result>ok</result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let resp = session
        .run_test(Some("001"), "test vpn ike-sa gateway branch-gw")
        .await
        .unwrap();
    assert!(resp.is_success());
}

// ── Config fetch ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_running_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "config"))
        .and(query_param("action", "get"))
        .and(query_param("target", "001"))
        .respond_with(xml_response(
            r#"<response status="success"><result><entry name="localhost.localdomain"><network><interface name="eth0"/></network></entry></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let tree = session.fetch_config(ConfigScope::Running, "001").await.unwrap();

    assert_eq!(tree.root.name, "entry");
    assert!(tree.root.descendant("interface").is_some());
}

#[tokio::test]
async fn test_fetch_config_empty_result_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(xml_response(
            r#"<response status="success"><result/></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let result = session.fetch_config(ConfigScope::PushedTemplate, "001").await;
    assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn test_rejected_key_surfaces_key_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(xml_response(
            r#"<response status="error" code="403"><result><msg>Invalid credentials</msg></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let result = session.list_devices(false).await;
    assert!(matches!(result, Err(Error::KeyExpired)));
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_filters_and_sorts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("cmd", "<show><devices><all/></devices></show>"))
        .respond_with(xml_response(
            r#"<response status="success"><result><devices>
                <entry><hostname>fw-b</hostname><serial>002</serial><ip-address>10.0.0.2</ip-address><connected>no</connected></entry>
                <entry><hostname>fw-a</hostname><serial>001</serial><ip-address>10.0.0.1</ip-address><connected>yes</connected></entry>
                <entry><hostname>N/A</hostname><serial>003</serial><ip-address>N/A</ip-address></entry>
            </devices></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let devices = session.list_devices(false).await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].hostname, "fw-a");
    assert!(devices[0].connected);
    assert_eq!(devices[1].hostname, "fw-b");
    assert!(!devices[1].connected);
}

// ── Commit ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_commit_template_returns_job_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "commit"))
        .and(query_param("action", "all"))
        .and(query_param(
            "cmd",
            "<commit-all><template-stack><name>fw-a_stack</name></template-stack></commit-all>",
        ))
        .respond_with(xml_response(
            r#"<response status="success"><result><job>77</job><msg><line>queued</line></msg></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    let job = session.commit_all_template("fw-a").await.unwrap();
    assert_eq!(job, "77");
}

// ── Logout ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_logout_revokes_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("cmd", "<request><delete-api-key/></request>"))
        .respond_with(xml_response(
            r#"<response status="success"><result/></response>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    session.logout().await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_logout_failure_is_reported_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(xml_response(
            r#"<response status="error"><msg><line>no such key</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let session = authed_session(&server).await;
    // The session is consumed either way; the error is informational.
    let result = session.logout().await;
    assert!(matches!(result, Err(Error::Api { .. })));
}
