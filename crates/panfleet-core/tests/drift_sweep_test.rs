#![allow(clippy::unwrap_used)]
// End-to-end drift detection against a stubbed manager: authenticate,
// fetch both config scopes per device, compare, isolate failures.

use std::sync::Arc;

use secrecy::SecretString;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panfleet_api::TransportConfig;
use panfleet_core::{
    Device, DriftKind, FleetConfig, FleetFetcher, Session, drift_sweep,
};

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(body.to_owned())
}

fn device(serial: &str) -> Device {
    Device {
        hostname: format!("fw-{serial}"),
        serial: serial.to_owned(),
        ip_address: "10.0.0.1".to_owned(),
        model: None,
        sw_version: None,
        connected: true,
        device_group: None,
        template: None,
    }
}

const PUSHED_001: &str = r#"<response status="success"><result><config><devices><entry name="localhost.localdomain"><network><rule name="A"><action>allow</action></rule></network></entry></devices></config></result></response>"#;

const RUNNING_001: &str = r#"<response status="success"><result><entry name="localhost.localdomain"><network><rule name="A"><action>allow</action></rule><rule name="B"><action>deny</action></rule></network></entry></result></response>"#;

#[tokio::test]
async fn drift_sweep_detects_local_override_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "keygen"))
        .respond_with(xml_response(
            r#"<response status="success"><result><key>TK1</key></result></response>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "op"))
        .and(query_param(
            "cmd",
            "<show><config><pushed-template/></config></show>",
        ))
        .and(query_param("target", "001"))
        .respond_with(xml_response(PUSHED_001))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "config"))
        .and(query_param("target", "001"))
        .respond_with(xml_response(RUNNING_001))
        .mount(&server)
        .await;

    let secret = SecretString::from("paper-clip".to_owned());
    let session = Session::authenticate(&server.uri(), "admin", &secret, TransportConfig::default())
        .await
        .unwrap();
    let session = Arc::new(session);

    let fetcher = FleetFetcher::new(FleetConfig::default());
    let reports = drift_sweep(&session, &[device("001")], &fetcher).await;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.serial, "001");
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].path, "rule[name=B]");
    assert_eq!(report.findings[0].kind, DriftKind::OverrideAdded);
}

#[tokio::test]
async fn fetch_failure_becomes_unavailable_not_silence() {
    let server = MockServer::start().await;

    // Healthy device.
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("target", "001"))
        .and(query_param("type", "op"))
        .respond_with(xml_response(PUSHED_001))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("target", "001"))
        .and(query_param("type", "config"))
        .respond_with(xml_response(RUNNING_001))
        .mount(&server)
        .await;

    // Broken device: every call errors.
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("target", "002"))
        .respond_with(xml_response(
            r#"<response status="error"><msg><line>device not connected</line></msg></response>"#,
        ))
        .mount(&server)
        .await;

    let session = Arc::new(
        Session::with_api_key(
            &server.uri(),
            SecretString::from("TK1".to_owned()),
            TransportConfig::default(),
        )
        .unwrap(),
    );

    let fetcher = FleetFetcher::new(FleetConfig::default());
    let reports = drift_sweep(&session, &[device("001"), device("002")], &fetcher).await;

    assert_eq!(reports.len(), 2);

    let healthy = reports.iter().find(|r| r.serial == "001").unwrap();
    assert!(healthy.has_drift());
    assert!(!healthy.is_unavailable());

    let broken = reports.iter().find(|r| r.serial == "002").unwrap();
    assert!(broken.is_unavailable());
    assert_eq!(broken.findings.len(), 1);
    assert_eq!(broken.findings[0].kind, DriftKind::Unavailable);
}
