use bitrue_client::core::config::Credentials;
use bitrue_client::core::errors::{ExchangeError, TransportError};
use bitrue_client::core::kernel::signer::API_KEY_HEADER;
use bitrue_client::core::kernel::{
    FixedClock, HmacSigner, RequestParams, ReqwestRest, RestClient, RestClientBuilder,
    RestClientConfig,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXED_TS: u64 = 1_700_000_000_000;
const ORDER_SIGNATURE: &str = "e56a9b4144278bc9f9b1fd5501448a7cad9cf8d750db6c9df038651e76d49259";
const TIMESTAMP_ONLY_SIGNATURE: &str =
    "f46ab3ba35e725ca68d5a9bcd2499ff88a48f3c14e899a8c047f7b6cf82b6adf";

fn signed_client(base_url: String) -> ReqwestRest {
    let credentials = Arc::new(Credentials::new("test-key", "s3cr3t"));
    RestClientBuilder::new(RestClientConfig::new(base_url, "bitrue".to_string()))
        .with_signer(Arc::new(HmacSigner::new(credentials)))
        .with_clock(Arc::new(FixedClock::new(FIXED_TS)))
        .build()
        .unwrap()
}

fn public_client(base_url: String) -> ReqwestRest {
    RestClientBuilder::new(RestClientConfig::new(base_url, "bitrue".to_string()))
        .build()
        .unwrap()
}

fn order_params() -> RequestParams {
    RequestParams::new()
        .with("symbol", "BTRUSDT")
        .with("side", "BUY")
        .with("type", "LIMIT")
        .with("quantity", Decimal::from(10))
        .with("price", Decimal::from_str("1.23").unwrap())
}

#[derive(Debug, Deserialize)]
struct OrderId {
    #[serde(rename = "orderId")]
    order_id: u64,
}

#[tokio::test]
async fn test_signed_post_sends_exact_form_body() {
    let server = MockServer::start().await;
    let expected_body = format!(
        "price=1.23&quantity=10&side=BUY&symbol=BTRUSDT&type=LIMIT&timestamp={}&signature={}",
        FIXED_TS, ORDER_SIGNATURE
    );

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .and(header(API_KEY_HEADER, "test-key"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"orderId":42}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_client(server.uri());
    let body = client
        .signed_request(Method::POST, "/api/v1/order", &order_params())
        .await
        .unwrap();

    assert_eq!(body, r#"{"orderId":42}"#);
}

#[tokio::test]
async fn test_signed_get_with_no_params_signs_timestamp_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/account"))
        .and(body_string(format!(
            "timestamp={}&signature={}",
            FIXED_TS, TIMESTAMP_ONLY_SIGNATURE
        )))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"balances":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_client(server.uri());
    let body = client
        .signed_request(Method::GET, "/api/v1/account", &RequestParams::new())
        .await
        .unwrap();

    assert_eq!(body, r#"{"balances":[]}"#);
}

#[tokio::test]
async fn test_signed_request_json_decodes_success_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"orderId":"777"}"#))
        .mount(&server)
        .await;

    let client = signed_client(server.uri());
    let ack: serde_json::Value = client
        .signed_request_json(Method::POST, "/api/v1/order", &order_params())
        .await
        .unwrap();

    assert_eq!(ack["orderId"], "777");
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/order"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"code":-2011,"msg":"Unknown order sent."}"#),
        )
        .mount(&server)
        .await;

    let client = signed_client(server.uri());
    let params = RequestParams::new()
        .with("symbol", "BTRUSDT")
        .with("orderId", 1_u64);

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"orderId":9}"#))
        .mount(&server)
        .await;
    let ack: OrderId = client
        .signed_request_json(Method::POST, "/api/v1/order", &params)
        .await
        .unwrap();
    assert_eq!(ack.order_id, 9);

    let raw = client
        .signed_request(Method::DELETE, "/api/v1/order", &params)
        .await
        .unwrap();
    assert!(raw.starts_with(r#"{"code""#));

    let err = client
        .signed_request_json::<OrderId>(Method::DELETE, "/api/v1/order", &params)
        .await
        .unwrap_err();
    match err {
        ExchangeError::Api { code, message } => {
            assert_eq!(code, -2011);
            assert_eq!(message, "Unknown order sent.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_public_get_uses_sorted_query_string() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/depth"))
        .and(query_param("symbol", "BTRUSDT"))
        .and(query_param("limit", "5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"lastUpdateId":1,"bids":[],"asks":[]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = public_client(server.uri());
    let params = RequestParams::new()
        .with("symbol", "BTRUSDT")
        .with("limit", 5_u32);

    let body = client.get("/api/v1/depth", &params).await.unwrap();
    assert!(body.contains("lastUpdateId"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("limit=5&symbol=BTRUSDT"));
}

#[tokio::test]
async fn test_public_get_without_credentials_has_no_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/ticker/price"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"symbol":"BTRUSDT","price":"0.1"}"#),
        )
        .mount(&server)
        .await;

    let client = public_client(server.uri());
    let params = RequestParams::new().with("symbol", "BTRUSDT");
    client.get("/api/v1/ticker/price", &params).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key(API_KEY_HEADER));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = signed_client(format!("http://{}", addr));
    let err = client
        .signed_request(Method::POST, "/api/v1/order", &order_params())
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Transport(TransportError::Network(_))));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_url_is_request_error() {
    let client = signed_client("not a url".to_string());
    let err = client
        .signed_request(Method::GET, "/api/v1/account", &RequestParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Transport(TransportError::Request(_))));
    assert!(!err.is_retryable());
}
