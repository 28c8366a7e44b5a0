#![allow(clippy::unwrap_used)]
// End-to-end tests for `Config::client()` + `SessionClient` using wiremock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sdpctl_core::{
    ApplianceVersion, AuthMode, AuthStatus, Config, CoreError, TlsMode, VersionCatalog,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn config_for(server: &MockServer, version: u16) -> Config {
    Config {
        url: format!("{}/admin", server.uri()),
        username: Some("admin".into()),
        password: Some(SecretString::from("admin".to_string())),
        version,
        insecure: true,
        login_timeout: Duration::from_secs(1),
        ..Config::default()
    }
}

fn login_response_54() -> serde_json::Value {
    json!({
        "user": {
            "name": "admin",
            "needTwoFactorAuth": false,
            "canAccessAuditLogs": false,
            "privileges": []
        },
        "token": "very-long-string",
        "expires": "2021-06-05T06:43:44.101853Z"
    })
}

fn error_body() -> serde_json::Value {
    json!({ "id": "string", "message": "An unexpected error occurred." })
}

async fn mount_login(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(template)
        .mount(server)
        .await;
}

fn latest() -> ApplianceVersion {
    VersionCatalog::default().latest_supported_version()
}

// ── Successful negotiation ──────────────────────────────────────────

#[tokio::test]
async fn test_v15_login_without_reported_version() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;

    let client = config_for(&server, 15).client().unwrap();
    let token = client.get_token().await.unwrap();

    assert_eq!(token.expose_secret(), "Bearer very-long-string");
    let version = client.appliance_version().unwrap();
    assert_eq!(version.to_string(), "5.4.0+estimated");
    assert!(version.is_estimated());
    assert_eq!(client.latest_supported_version(), &latest());
    assert_eq!(client.status(), AuthStatus::Authenticated);
    assert!(client.tls_mode().is_insecure());
}

#[tokio::test]
async fn test_v13_login_estimates_from_catalog() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;

    let client = config_for(&server, 13).client().unwrap();
    client.get_token().await.unwrap();

    let expected: ApplianceVersion = "5.2.0+estimated".parse().unwrap();
    assert_eq!(client.appliance_version(), Some(expected));
    // Latest never depends on the requested version.
    assert_eq!(client.latest_supported_version(), &latest());
}

#[tokio::test]
async fn test_token_is_cached_after_first_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_response_54()))
        .expect(1)
        .mount(&server)
        .await;

    let client = config_for(&server, 15).client().unwrap();
    let first = client.get_token().await.unwrap();
    let second = client.get_token().await.unwrap();

    assert_eq!(first.expose_secret(), second.expose_secret());
    let session = client.session().await.unwrap();
    assert_eq!(session.user.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(login_response_54())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(config_for(&server, 15).client().unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.get_token().await })
        })
        .collect();

    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "Bearer very-long-string");
    }
}

#[tokio::test]
async fn test_estimate_visible_before_login() {
    let server = MockServer::start().await;
    let client = config_for(&server, 16).client().unwrap();

    let before = client.appliance_version().unwrap();
    assert_eq!(before.to_string(), "5.5.0+estimated");
    assert_eq!(client.status(), AuthStatus::Unauthenticated);

    // Unknown versions have no estimate until the controller speaks.
    let client = config_for(&server, 99).client().unwrap();
    assert!(client.appliance_version().is_none());
}

// ── Negotiation failures ────────────────────────────────────────────

#[tokio::test]
async fn test_406_fails_and_caches_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "id": "string",
            "message": "string",
            "minSupportedVersion": 7,
            "maxSupportedVersion": 15
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = config_for(&server, 99).client().unwrap();
    let err = client.get_token().await.unwrap_err();

    assert!(
        matches!(
            err,
            CoreError::VersionNotAccepted {
                requested: 99,
                min: Some(7),
                max: Some(15),
                ..
            }
        ),
        "expected VersionNotAccepted, got: {err:?}"
    );
    assert_eq!(client.status(), AuthStatus::Failed);
    assert!(client.session().await.is_none());

    // Cached failure: no second round trip.
    let again = client.get_token().await.unwrap_err();
    assert_eq!(again, err);
}

#[tokio::test]
async fn test_server_errors_exhaust_login_timeout() {
    for status in [500_u16, 502, 503] {
        let server = MockServer::start().await;
        mount_login(&server, ResponseTemplate::new(status).set_body_json(error_body())).await;

        let client = config_for(&server, 15).client().unwrap();
        let err = client.get_token().await.unwrap_err();

        assert_eq!(
            err,
            CoreError::ControllerUnavailable {
                status: Some(status),
                message: "An unexpected error occurred.".into()
            }
        );
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn test_single_server_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;

    let config = Config {
        login_timeout: Duration::from_secs(3),
        ..config_for(&server, 15)
    };
    let client = config.client().unwrap();
    let token = client.get_token().await.unwrap();

    assert_eq!(token.expose_secret(), "Bearer very-long-string");
}

#[tokio::test]
async fn test_reset_allows_fresh_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "id": "unauthorized",
            "message": "Invalid username or password."
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;

    let client = config_for(&server, 15).client().unwrap();
    let err = client.get_token().await.unwrap_err();
    assert!(matches!(err, CoreError::LoginFailed { status: Some(401), .. }));

    client.reset().await;
    assert_eq!(client.status(), AuthStatus::Unauthenticated);

    let token = client.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "Bearer very-long-string");
}

// ── Trust store ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_pem_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_response_54()))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        insecure: false,
        pem_file_path: Some(fixture("invalid_cert.pem")),
        ..config_for(&server, 15)
    };
    let result = config.client();

    assert!(
        matches!(result, Err(CoreError::InvalidCertificate { .. })),
        "expected InvalidCertificate"
    );
}

#[tokio::test]
async fn test_valid_pem_pins_certificate() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;

    let config = Config {
        insecure: true,
        pem_file_path: Some(fixture("cert.pem")),
        ..config_for(&server, 15)
    };
    let client = config.client().unwrap();

    assert_eq!(client.tls_mode(), &TlsMode::CustomCa(fixture("cert.pem")));
    assert!(!client.tls_mode().is_insecure());

    // Plain-HTTP mock controller; the pinned roots are simply unused.
    let token = client.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "Bearer very-long-string");
}

// ── Bearer token ────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        url: format!("{}/admin", server.uri()),
        bearer_token: Some(SecretString::from("dG9rZW4tZnJvbS1lbHNld2hlcmU=".to_string())),
        ..Config::default()
    };
    let client = config.client().unwrap();
    assert_eq!(client.auth_mode(), AuthMode::BearerToken);

    let token = client.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "Bearer dG9rZW4tZnJvbS1lbHNld2hlcmU=");
    assert!(client.appliance_version().unwrap().is_estimated());
}

#[tokio::test]
async fn test_client_rejects_invalid_token_and_missing_credentials() {
    let bad_token = Config {
        url: "https://controller.example.com/admin".into(),
        bearer_token: Some(SecretString::from("not_b64_string".to_string())),
        ..Config::default()
    };
    assert!(matches!(
        bad_token.client(),
        Err(CoreError::InvalidToken { .. })
    ));

    let nothing = Config {
        url: "https://controller.example.com/admin".into(),
        ..Config::default()
    };
    assert!(matches!(
        nothing.client(),
        Err(CoreError::MissingCredentials { .. })
    ));
}

// ── Collaborator requests ───────────────────────────────────────────

#[tokio::test]
async fn test_authorize_attaches_token() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(login_response_54()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/admin/sites"))
        .and(header("authorization", "Bearer very-long-string"))
        .and(header("accept", "application/vnd.appgate.peer-v15+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = config_for(&server, 15).client().unwrap();
    let url = client.api().api_url("sites").unwrap();
    let request = client
        .authorize(client.api().http().get(url))
        .await
        .unwrap();
    let resp = request.send().await.unwrap();

    assert!(resp.status().is_success());
}
