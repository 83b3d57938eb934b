use crate::core::errors::{ExchangeError, TransportError};
use crate::core::kernel::canonical::RequestParams;
use crate::core::kernel::clock::{Clock, SystemClock};
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// REST client trait for making HTTP requests
///
/// The raw methods return the response body untouched, whatever the HTTP
/// status: business-level error envelopes are the caller's to interpret.
/// The `_json` variants run the body through [`ApiResponse`].
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Unauthenticated GET with the parameters as a sorted query string
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `params` - Query parameters
    async fn get(&self, endpoint: &str, params: &RequestParams) -> Result<String, ExchangeError>;

    /// Unauthenticated GET with strongly-typed response
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<T, ExchangeError>;

    /// Signed request: parameters are signed and sent as a form body,
    /// for every method including reads
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - The API endpoint path
    /// * `params` - Request parameters (timestamp and signature are added)
    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<String, ExchangeError>;

    /// Signed request with strongly-typed response
    async fn signed_request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<T, ExchangeError>;
}

/// Error envelope the venue returns in place of a success body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// A response body decoded as either the expected record or the error envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(ApiErrorBody),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Try the success shape first, then fall back to the error envelope
    pub fn parse(body: &str) -> Result<Self, ExchangeError> {
        match serde_json::from_str::<T>(body) {
            Ok(value) => Ok(Self::Success(value)),
            Err(success_err) => match serde_json::from_str::<ApiErrorBody>(body) {
                Ok(envelope) => Ok(Self::Failure(envelope)),
                Err(_) => Err(ExchangeError::Deserialization(format!(
                    "Failed to parse response: {} (body: {})",
                    success_err,
                    truncate(body, 256)
                ))),
            },
        }
    }

    pub fn into_result(self) -> Result<T, ExchangeError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(envelope) => Err(ExchangeError::Api {
                code: envelope.code,
                message: envelope.msg,
            }),
        }
    }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("bitrue-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Set the clock used for request timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::Request(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            clock: self.clock,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    #[instrument(
        skip(self, params),
        fields(
            exchange = %self.config.exchange_name,
            method = %method,
            endpoint = %endpoint,
            authenticated = authenticated
        )
    )]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &RequestParams,
        authenticated: bool,
    ) -> Result<String, ExchangeError> {
        let url = self.build_url(endpoint);

        let request = if authenticated {
            let signer = self
                .signer
                .as_ref()
                .ok_or(ExchangeError::AuthenticationRequired)?;
            let timestamp = self.clock.now_ms();
            let (headers, payload) = signer.sign_request(params, timestamp)?;

            let mut request = self
                .client
                .request(method, &url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE);
            for (key, value) in headers {
                request = request.header(key, value);
            }
            request.body(payload.into_request_body())
        } else {
            let query = params.canonical_string();
            let url = if query.is_empty() {
                url
            } else {
                format!("{}?{}", url, query)
            };
            self.client.request(method, url)
        };

        let response = request.send().await.map_err(TransportError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TransportError::Network(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            debug!(status = %status, "non-success status, body passed to caller");
        }
        trace!("Response body: {}", body);

        Ok(body)
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    async fn get(&self, endpoint: &str, params: &RequestParams) -> Result<String, ExchangeError> {
        self.make_request(Method::GET, endpoint, params, false).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<T, ExchangeError> {
        let body = self.make_request(Method::GET, endpoint, params, false).await?;
        ApiResponse::parse(&body)?.into_result()
    }

    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<String, ExchangeError> {
        self.make_request(method, endpoint, params, true).await
    }

    async fn signed_request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<T, ExchangeError> {
        let body = self.make_request(method, endpoint, params, true).await?;
        ApiResponse::parse(&body)?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Ack {
        #[serde(rename = "orderId")]
        order_id: u64,
    }

    #[test]
    fn test_parse_success_shape_first() {
        let parsed = ApiResponse::<Ack>::parse(r#"{"orderId":42}"#).unwrap();
        assert_eq!(parsed, ApiResponse::Success(Ack { order_id: 42 }));
    }

    #[test]
    fn test_parse_falls_back_to_error_envelope() {
        let parsed = ApiResponse::<Ack>::parse(r#"{"code":-2013,"msg":"Order does not exist."}"#)
            .unwrap();
        let err = parsed.into_result().unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Api { code: -2013, ref message } if message == "Order does not exist."
        ));
    }

    #[test]
    fn test_parse_neither_shape() {
        let err = ApiResponse::<Ack>::parse("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ExchangeError::Deserialization(_)));
    }

    #[test]
    fn test_build_url_joins_without_double_slash() {
        let rest = RestClientBuilder::new(RestClientConfig::new(
            "https://www.bitrue.com/".to_string(),
            "bitrue".to_string(),
        ))
        .build()
        .unwrap();

        assert_eq!(
            rest.build_url("/api/v1/depth"),
            "https://www.bitrue.com/api/v1/depth"
        );
        assert!(!rest.has_signer());
    }

    #[tokio::test]
    async fn test_signed_request_without_signer() {
        let rest = RestClientBuilder::new(RestClientConfig::new(
            "http://127.0.0.1:9".to_string(),
            "bitrue".to_string(),
        ))
        .build()
        .unwrap();

        let err = rest
            .signed_request(Method::GET, "/api/v1/account", &RequestParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationRequired));
    }

    #[derive(Clone, Default)]
    struct RequestSpanFields(Arc<std::sync::Mutex<Vec<(String, String)>>>);

    struct FieldCollector<'a>(&'a mut Vec<(String, String)>);

    impl tracing::field::Visit for FieldCollector<'_> {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for RequestSpanFields {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if attrs.metadata().name() == "make_request" {
                if let Ok(mut fields) = self.0.lock() {
                    attrs.record(&mut FieldCollector(&mut fields));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_request_span_records_authenticated_flag() {
        use tracing_subscriber::layer::SubscriberExt;

        let layer = RequestSpanFields::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let rest = RestClientBuilder::new(RestClientConfig::new(
            "http://127.0.0.1:9".to_string(),
            "bitrue".to_string(),
        ))
        .build()
        .unwrap();
        let _ = rest
            .signed_request(Method::GET, "/api/v1/account", &RequestParams::new())
            .await;

        let fields = layer.0.lock().unwrap();
        assert!(fields.contains(&("authenticated".to_string(), "true".to_string())));
        assert!(fields.contains(&("endpoint".to_string(), "/api/v1/account".to_string())));
    }
}
