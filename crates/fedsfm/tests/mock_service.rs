//! Mock service tests for the fedsfm library.
//!
//! These tests use wiremock to simulate the fedsfm REST service and test the
//! library's behavior without network access, real credentials, or a real
//! client certificate (a self-signed fixture pair stands in so the mutual-TLS
//! identity path is exercised).

use fedsfm::config::env_vars;
use fedsfm::{AppSettings, CatalogOutcome, DownloadOutcome, Environment, Error, Session, SkipReason};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Settings pointing at a mock server, with the fixture PEM pair configured.
fn mock_settings(server: &MockServer) -> AppSettings {
    mock_settings_with(server, "operator", "s3cret", "00ab")
}

fn mock_settings_with(
    server: &MockServer,
    user_name: &str,
    password: &str,
    serial: &str,
) -> AppSettings {
    let base_url = format!("http://127.0.0.1:{}", server.address().port());
    let vars = [
        (env_vars::BASE_URL, base_url),
        (env_vars::USERNAME, user_name.to_string()),
        (env_vars::PASSWORD, password.to_string()),
        (env_vars::SERIAL_NUMBER, serial.to_string()),
        (env_vars::CERT_FILE, fixture("client-cert.pem")),
        (env_vars::KEY_FILE, fixture("client-key.pem")),
    ];
    AppSettings::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/test-contur/authenticate"))
        .and(body_json(json!({
            "userName": "operator",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "hasErrors": false,
            "value": {
                "accessToken": "test-access-token",
                "currentUser": {
                    "userName": "operator",
                    "kbShortName": "KB",
                    "kbLoginType": 1,
                    "isAuthenticated": true
                }
            }
        })))
        .mount(server)
        .await;
}

async fn authorized_session(server: &MockServer) -> Session {
    mount_login(server).await;
    Session::authorize(&mock_settings(server), Environment::Test)
        .await
        .unwrap()
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn authorize_success() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;
    assert_eq!(session.environment(), Environment::Test);
}

#[tokio::test]
async fn session_debug_never_exposes_the_token() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    let debug = format!("{session:?}");
    assert!(!debug.contains("test-access-token"));
    assert!(debug.contains("[REDACTED]"));
}

#[tokio::test]
async fn authorize_production_uses_production_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "hasErrors": false,
            "value": { "accessToken": "prod-token" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::authorize(&mock_settings(&server), Environment::Production)
        .await
        .unwrap();
    assert_eq!(session.environment(), Environment::Production);
}

#[tokio::test]
async fn authorize_rejected_status_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test-contur/authenticate"))
        .respond_with(ResponseTemplate::new(403).set_body_string("certificate not accepted"))
        .mount(&server)
        .await;

    let err = Session::authorize(&mock_settings(&server), Environment::Test)
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("403"));
    assert!(msg.contains("certificate not accepted"));
}

#[tokio::test]
async fn authorize_failure_message_joins_secondary_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test-contur/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "invalid credentials",
            "hasErrors": true,
            "errors": ["a", "b"]
        })))
        .mount(&server)
        .await;

    let err = Session::authorize(&mock_settings(&server), Environment::Test)
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("invalid credentials"));
    assert!(msg.contains("a"));
    assert!(msg.contains("b"));
}

#[tokio::test]
async fn authorize_fails_when_token_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test-contur/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "hasErrors": false,
            "value": {}
        })))
        .mount(&server)
        .await;

    let err = Session::authorize(&mock_settings(&server), Environment::Test)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("token"));
}

#[tokio::test]
async fn authorize_fails_on_unparseable_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/test-contur/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = Session::authorize(&mock_settings(&server), Environment::Test).await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn blank_fields_fail_before_any_request() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    for settings in [
        mock_settings_with(&server, "   ", "s3cret", "00ab"),
        mock_settings_with(&server, "operator", "", "00ab"),
        mock_settings_with(&server, "operator", "s3cret", "  "),
    ] {
        let result = Session::authorize(&settings, Environment::Test).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.is_empty(),
        "validation must fail before any network activity"
    );
}

// ============================================================================
// Catalog fetch
// ============================================================================

#[tokio::test]
async fn catalog_found_with_iso_date() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-catalog"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idXml": "doc-123",
            "date": "2024-03-05T00:00:00Z",
            "isActive": true,
            "idRecStatus": 7
        })))
        .mount(&server)
        .await;

    let catalog = session.te2_catalog().await.found().unwrap();
    assert_eq!(catalog.document_id, "doc-123");
    assert_eq!(catalog.date.format("%Y%m%d").to_string(), "20240305");
    assert!(catalog.is_active);
    assert_eq!(catalog.status_id, Some(json!(7)));
}

#[tokio::test]
async fn catalog_without_id_is_not_published() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-mvk-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "date": "2024-03-05T00:00:00Z",
            "isActive": false
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        session.mvk_catalog().await,
        CatalogOutcome::NotPublished
    ));
}

#[tokio::test]
async fn catalog_server_error_is_transport_failed_not_fatal() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-catalog"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    match session.te2_catalog().await {
        CatalogOutcome::TransportFailed(e) => assert!(e.to_string().contains("500")),
        other => panic!("expected TransportFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn catalog_garbage_body_is_transport_failed() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        session.te2_catalog().await,
        CatalogOutcome::TransportFailed(_)
    ));
}

#[tokio::test]
async fn un_catalog_always_uses_production_path() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    // Session is in the test environment, yet the UN list only exists on the
    // production circuit.
    Mock::given(method("POST"))
        .and(path("/suspect-catalogs/current-un-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(matches!(
        session.un_catalog().await,
        CatalogOutcome::NotPublished
    ));
}

// ============================================================================
// Downloads
// ============================================================================

#[tokio::test]
async fn download_saves_binary_body_under_dated_name() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idXml": "doc-123",
            "date": "2024-03-05",
            "isActive": true
        })))
        .mount(&server)
        .await;

    // Deliberately not valid UTF-8: the body must survive as raw bytes.
    let payload: Vec<u8> = vec![0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe, 0x00, 0x99];
    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-file"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("id=doc-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(payload.clone()),
        )
        .mount(&server)
        .await;

    let catalog = session.te2_catalog().await.found().unwrap();
    let dir = tempfile::tempdir().unwrap();

    match session.download_te2_file(&catalog, dir.path()).await {
        DownloadOutcome::Saved(path) => {
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                "suspect_20240305.zip"
            );
            assert_eq!(std::fs::read(&path).unwrap(), payload);
        }
        DownloadOutcome::Skipped(reason) => panic!("expected save, skipped: {reason}"),
    }
}

#[tokio::test]
async fn download_mvk_files_use_freeze_prefix() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-mvk-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idXml": "doc-77",
            "date": "2023-12-31",
            "isActive": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/mvk-catalog-file"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<mvk/>".to_vec()))
        .mount(&server)
        .await;

    let catalog = session.mvk_catalog().await.found().unwrap();
    let dir = tempfile::tempdir().unwrap();

    match session.download_mvk_file(&catalog, dir.path()).await {
        DownloadOutcome::Saved(path) => {
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                "freeze_20231231.xml"
            );
        }
        DownloadOutcome::Skipped(reason) => panic!("expected save, skipped: {reason}"),
    }
}

#[tokio::test]
async fn download_error_status_writes_nothing() {
    let server = MockServer::start().await;
    let session = authorized_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idXml": "doc-123",
            "date": "2024-03-05",
            "isActive": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test-contur/suspect-catalogs/current-te2-file"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let catalog = session.te2_catalog().await.found().unwrap();
    let dir = tempfile::tempdir().unwrap();

    match session.download_te2_file(&catalog, dir.path()).await {
        DownloadOutcome::Skipped(SkipReason::Http { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "gone");
        }
        other => panic!("expected HTTP skip, got {other:?}"),
    }

    assert_eq!(
        std::fs::read_dir(dir.path()).unwrap().count(),
        0,
        "a rejected download must write nothing"
    );
}
