use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wechat_miniprogram::{ApiClient, Config, Error, OperationKind};

fn config(server: &MockServer) -> Config {
    Config::from_values("wx123", "s3cret", Some(server.uri()), Some(5), None)
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", "wx123"))
        .and(query_param("secret", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ACCESS",
            "expires_in": 7200
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn service_token_is_fetched_once_and_cached() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    let client = ApiClient::new(config(&server)).expect("client");
    let first = client.fetch_service_token().await.expect("token");
    let second = client.fetch_service_token().await.expect("token");

    assert_eq!(first.credential(), "ACCESS");
    assert_eq!(first, second);
    assert!(!first.is_expired());
}

#[tokio::test]
async fn construction_does_not_touch_the_network() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;

    let client = ApiClient::new(config(&server)).expect("client");
    assert_eq!(client.app_id(), "wx123");
}

#[tokio::test]
async fn login_code_exchange_needs_no_access_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .and(query_param("grant_type", "authorization_code"))
        .and(query_param("appid", "wx123"))
        .and(query_param("secret", "s3cret"))
        .and(query_param("js_code", "login-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openid": "o-user",
            "session_key": "session-key",
            "unionid": "u-user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let session = client.exchange_login_code("login-code").await.expect("session");

    assert_eq!(session.open_id, "o-user");
    assert_eq!(session.session_key, "session-key");
    assert_eq!(session.union_id.as_deref(), Some("u-user"));
}

#[tokio::test]
async fn phone_number_attaches_cached_token_as_query_parameter() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/wxa/business/getuserphonenumber"))
        .and(query_param("access_token", "ACCESS"))
        .and(body_json(json!({ "code": "phone-code" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "phone_info": {
                "phoneNumber": "13800000000",
                "purePhoneNumber": "13800000000",
                "countryCode": "86",
                "watermark": { "timestamp": 1637744274, "appid": "wx123" }
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let first = client.resolve_phone_number("phone-code").await.expect("phone");
    let second = client.resolve_phone_number("phone-code").await.expect("phone");

    assert_eq!(first, second);
    assert_eq!(first.phone_info.pure_phone_number, "13800000000");
    assert_eq!(first.phone_info.country_code, "86");
    assert_eq!(first.phone_info.watermark.app_id, "wx123");
}

#[tokio::test]
async fn non_zero_errcode_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40029,
            "errmsg": "invalid code"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client
        .exchange_login_code("stale-code")
        .await
        .expect_err("backend rejected the code");

    match err {
        Error::Api {
            operation,
            code,
            message,
        } => {
            assert_eq!(operation, OperationKind::CodeToSession);
            assert_eq!(code, 40029);
            assert_eq!(message, "invalid code");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_supplier_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40013,
            "errmsg": "invalid appid"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wxa/business/getuserphonenumber"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client.fetch_service_token().await.expect_err("bad appid");
    assert!(matches!(err, Error::Supplier(_)), "{err:?}");
    assert_eq!(err.api_code(), Some(40013));
    assert!(!err.is_transient());

    // Nothing was cached, so the privileged call retries the fetch and stops there.
    let err = client
        .resolve_phone_number("phone-code")
        .await
        .expect_err("no token");
    assert_eq!(err.api_code(), Some(40013));
}

#[tokio::test]
async fn http_failure_is_distinct_from_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client.exchange_login_code("code").await.expect_err("502");

    match &err {
        Error::Http {
            operation, status, ..
        } => {
            assert_eq!(*operation, OperationKind::CodeToSession);
            assert_eq!(status.as_u16(), 502);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_transient());
    assert_eq!(err.api_code(), None);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client.exchange_login_code("code").await.expect_err("html");
    assert!(
        matches!(
            err,
            Error::Decode {
                operation: OperationKind::CodeToSession,
                ..
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn blank_codes_are_rejected_before_sending() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 0).await;

    let client = ApiClient::new(config(&server)).unwrap();
    let err = client.exchange_login_code("  ").await.expect_err("blank");
    assert!(matches!(err, Error::InvalidArgument(_)));
    let err = client.resolve_phone_number("").await.expect_err("blank");
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn invalid_base_url_fails_fast() {
    let cfg = Config::from_values(
        "wx123",
        "s3cret",
        Some("://not-a-valid-url".into()),
        None,
        None,
    );

    match ApiClient::new(cfg) {
        Err(Error::Config(msg)) => assert!(msg.contains("Invalid API base URL")),
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("expected invalid URL error"),
    }
}

#[tokio::test]
async fn close_keeps_serving_the_cached_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    let client = ApiClient::new(config(&server)).unwrap();
    let before = client.fetch_service_token().await.unwrap();
    client.close();
    let after = client.clone().fetch_service_token().await.unwrap();
    assert_eq!(before, after);
}
