//! Dispatcher against a mock EET endpoint.
//!
//! ## Scenarios
//!
//! | Reply | Test |
//! |-------|------|
//! | 200 + `Potvrzeni` | `submit_confirmed_*` |
//! | 200 + `Chyba` | `submit_rejected_*` |
//! | 500 + HTML | `submit_error_status_*` |
//! | 200 + garbage | `submit_unreadable_*` |
//! | no reply in time | `submit_times_out_*` |
//! | unreachable | `submit_unreachable_*` |
//! | 200 via caller's HTTP client | `caller_supplied_http_client_is_used` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use eet_client::{
    Dispatcher, EetConfig, EetError, Environment, HttpTransport, Transport, TransportError,
    TransportResponse,
};
use eet_core::{ItemizedAmounts, RawReceipt, Regime};
use eet_crypto::RsaKeyStore;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_PEM: &str = include_str!("../../eet-crypto/testdata/signing_key.pem");
const CERT_PEM: &str = include_str!("../../eet-crypto/testdata/certificate.pem");
const CONFIRMATION: &str = include_str!("fixtures/confirmation.xml");
const FAULT: &str = include_str!("fixtures/fault.xml");

const SERVICE_PATH: &str = "/eet/services/EETServiceSOAP/v3";
const MESSAGE_UUID: &str = "b3a09b52-7c87-4014-a496-4c7a53cf9125";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key_store() -> Arc<RsaKeyStore> {
    Arc::new(RsaKeyStore::from_pem(KEY_PEM, CERT_PEM).unwrap())
}

fn receipt() -> RawReceipt {
    RawReceipt {
        message_uuid: Some(MESSAGE_UUID.to_string()),
        first_submission: true,
        tax_id: "CZ00000019".to_string(),
        delegating_tax_id: None,
        establishment_id: 273,
        till_id: "/5546/RO24".to_string(),
        sequence_number: "0/6460/ZQ42".to_string(),
        sale_time: FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2016, 8, 5, 0, 30, 12)
            .unwrap(),
        total_amount: 34113.0,
        amounts: ItemizedAmounts::default(),
        regime: Regime::Regular,
    }
}

fn test_config(mock_server: &MockServer, timeout_secs: u64) -> EetConfig {
    EetConfig {
        environment: Environment::Playground,
        endpoint: format!("{}{SERVICE_PATH}", mock_server.uri()).parse().unwrap(),
        timeout_secs,
        verification_mode: false,
    }
}

async fn test_dispatcher(mock_server: &MockServer) -> Dispatcher {
    init_tracing();
    Dispatcher::new(&test_config(mock_server, 5), key_store()).unwrap()
}

// ── Service replies ──────────────────────────────────────────────────

#[tokio::test]
async fn submit_confirmed_posts_signed_envelope_and_returns_fik() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .and(header("content-type", "application/xml"))
        .and(body_string_contains(r#"<Trzba xmlns="http://fs.mfcr.cz/eet/schema/v3">"#))
        .and(body_string_contains(MESSAGE_UUID))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIRMATION))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let response = dispatcher.submit(&receipt()).await.unwrap();

    assert_eq!(response.message_uuid(), Some(MESSAGE_UUID));
    let confirmation = response.into_result().unwrap();
    assert_eq!(confirmation.fiscal_id, "b3309b52-7c87-4014-a496-4c7a53cf9120-03");

    let requests = mock_server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><soap:Envelope"#));
    assert!(body.contains("<ds:SignatureValue>"));
    assert!(body.contains("2E8ED60D-8A218200-B229A372-35A9F8E8-469613C6"));
}

#[tokio::test]
async fn submit_rejected_returns_fault_in_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(FAULT))
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let response = dispatcher.submit(&receipt()).await.unwrap();

    assert!(response.is_fault());
    let fault = response.into_result().unwrap_err();
    assert_eq!(fault.code, 4);
    assert_eq!(fault.to_string(), "EET fault 4: Neplatny podpis SOAP zpravy");
}

#[tokio::test]
async fn submit_fault_with_error_status_still_parses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string(FAULT))
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let response = dispatcher.submit(&receipt()).await.unwrap();
    assert!(response.is_fault());
}

#[tokio::test]
async fn submit_error_status_with_unreadable_body_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let err = dispatcher.submit(&receipt()).await.unwrap_err();
    match err {
        EetError::Transport(TransportError::Status { status, body, .. }) => {
            assert_eq!(status, 503);
            assert!(body.contains("maintenance"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_unreadable_success_body_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not xml at all"))
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let err = dispatcher.submit(&receipt()).await.unwrap_err();
    assert!(matches!(err, EetError::MalformedResponse(_)));
}

#[tokio::test]
async fn submit_times_out_as_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(CONFIRMATION)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    init_tracing();
    let dispatcher = Dispatcher::new(&test_config(&mock_server, 1), key_store()).unwrap();
    let err = dispatcher.submit(&receipt()).await.unwrap_err();
    match err {
        EetError::Transport(TransportError::Http { source, .. }) => assert!(source.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_receipt_is_never_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIRMATION))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let mut raw = receipt();
    raw.tax_id = "CZ1234".to_string();

    let err = dispatcher.submit(&raw).await.unwrap_err();
    assert!(matches!(err, EetError::Validation(_)));
}

#[tokio::test]
async fn prepared_request_codes_survive_failed_delivery() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let dispatcher = test_dispatcher(&mock_server).await;
    let prepared = dispatcher.prepare(&receipt()).unwrap();
    assert!(dispatcher.dispatch(&prepared).await.is_err());
    assert_eq!(
        prepared.record().codes().bkp().value(),
        "2E8ED60D-8A218200-B229A372-35A9F8E8-469613C6"
    );
}

#[tokio::test]
async fn caller_supplied_http_client_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SERVICE_PATH))
        .and(header("user-agent", "till-7/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIRMATION))
        .expect(1)
        .mount(&mock_server)
        .await;

    init_tracing();
    let http = reqwest::Client::builder()
        .user_agent("till-7/1.0")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let dispatcher = Dispatcher::with_transport(
        test_config(&mock_server, 5).endpoint,
        key_store(),
        Arc::new(HttpTransport::with_client(http)),
    );

    let response = dispatcher.submit(&receipt()).await.unwrap();
    assert!(response.is_confirmation());
}

// ── Unreachable service ──────────────────────────────────────────────

struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn send(
        &self,
        endpoint: &Url,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Unavailable {
            endpoint: endpoint.to_string(),
            reason: "connection refused".into(),
        })
    }
}

#[tokio::test]
async fn submit_unreachable_service_is_transport_error() {
    init_tracing();
    let dispatcher = Dispatcher::with_transport(
        Url::parse("https://pg.eet.cz/eet/services/EETServiceSOAP/v3").unwrap(),
        key_store(),
        Arc::new(UnreachableTransport),
    );

    let err = dispatcher.submit(&receipt()).await.unwrap_err();
    match err {
        EetError::Transport(TransportError::Unavailable { reason, .. }) => {
            assert_eq!(reason, "connection refused");
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}
