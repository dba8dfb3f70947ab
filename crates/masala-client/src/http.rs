//! # REST Client
//!
//! [`ApiClient`] implements every gateway trait over reqwest.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  endpoint(["bills"])  ──►  Url (segments percent-encoded)               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  RequestBuilder + bearer token + timeout (+ Idempotency-Key)            │
//! │        │                                                                │
//! │        ├── transport error ─────────────► ClientError::from_transport   │
//! │        ▼                                                                │
//! │  status ─┬── 2xx ──► bytes ──► serde_json ──► T  (else InvalidResponse) │
//! │          └── other ─► classify_status(status, {message})                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use masala_core::{Bill, CatalogItem};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::dto::{
    BillResponse, CreateBillRequest, ErrorBody, MenuResponse, PrintRequest,
    PrintResponse, PrinterConfig, PrinterStatus,
};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{BillGateway, MenuSource, PrinterGateway};

/// Header carrying the per-cart submission token.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Used when no timeout is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://pos.example.com/api`.
    pub base_url: String,
    /// Bearer token, sent when present.
    pub token: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the restaurant API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Builds a client. Fails with `InvalidConfig` on a malformed or
    /// non-HTTP base URL.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        let token = config
            .token
            .as_ref()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let request = self.authorize(self.client.get(url));
        let response = request.send().await.map_err(ClientError::from_transport)?;
        handle_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T> {
        debug!(%url, "POST");
        let mut request = self.authorize(self.client.post(url)).json(body);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }
        let response = request.send().await.map_err(ClientError::from_transport)?;
        handle_response(response).await
    }
}

fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::InvalidConfig(format!("invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidConfig(format!(
            "unsupported URL scheme '{other}'"
        ))),
    }
}

/// Maps a non-success status to an error.
///
/// 408 and 429 are retryable even though they are 4xx.
pub fn classify_status(status: u16, message: Option<String>) -> ClientError {
    let message = message.unwrap_or_else(|| {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    });

    match status {
        408 | 429 => ClientError::Transient { message },
        400..=499 => ClientError::Rejected { status, message },
        _ => ClientError::Transient { message },
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();

    if status.is_success() {
        // The server already acted; a lost body is not a transient failure.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("failed to read body: {e}")))?;
        return serde_json::from_slice(&bytes).map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Unreadable success response");
            ClientError::InvalidResponse(e.to_string())
        });
    }

    let message = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(ErrorBody::into_message),
        Err(_) => None,
    };

    let err = classify_status(status.as_u16(), message);
    debug!(status = status.as_u16(), error = %err, "Request failed");
    Err(err)
}

// =============================================================================
// Gateway Implementations
// =============================================================================

#[async_trait]
impl MenuSource for ApiClient {
    async fn fetch_menu(&self) -> ClientResult<Vec<CatalogItem>> {
        let mut url = self.endpoint(&["menu"])?;
        url.set_query(Some("available=true"));
        let envelope: MenuResponse = self.get(url).await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl BillGateway for ApiClient {
    async fn create_bill(
        &self,
        request: &CreateBillRequest,
        idempotency_key: &str,
    ) -> ClientResult<Bill> {
        let url = self.endpoint(&["bills"])?;
        let envelope: BillResponse = self.post(url, request, Some(idempotency_key)).await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl PrinterGateway for ApiClient {
    async fn printer_status(&self) -> ClientResult<PrinterStatus> {
        let url = self.endpoint(&["printer", "status"])?;
        self.get(url).await
    }

    async fn print_bill(&self, bill_id: &str, config: &PrinterConfig) -> ClientResult<PrintResponse> {
        let url = self.endpoint(&["printer", "print", bill_id])?;
        let body = PrintRequest {
            printer_config: config,
        };
        self.post(url, &body, None).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use masala_core::{CartLine, CustomerDetails, Money, PaymentMethod};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(
            &ClientConfig::new(base_url)
                .with_token("secret")
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    fn sample_request() -> CreateBillRequest {
        let lines = vec![CartLine {
            item_id: "m1".to_string(),
            name: "Butter Chicken".to_string(),
            unit_price: Money::from_paise(28_000),
            quantity: 2,
        }];
        CreateBillRequest::new(
            &lines,
            &CustomerDetails::default(),
            Money::from_paise(5_600),
            PaymentMethod::Cash,
        )
    }

    fn bill_json() -> Value {
        json!({
            "_id": "65f0c0ffee",
            "billNumber": "B-1001",
            "items": [{"menuItem": "m1", "name": "Butter Chicken", "quantity": 2, "price": 280}],
            "subtotal": 560,
            "tax": 100.8,
            "discount": 56,
            "total": 604.8,
            "paymentMethod": "cash",
            "createdAt": "2024-03-01T12:30:00.000Z",
            "status": "paid"
        })
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(422, Some("bad phone".into())),
            ClientError::Rejected {
                status: 422,
                message: "bad phone".into()
            }
        );
        assert!(classify_status(408, None).is_transient());
        assert!(classify_status(429, None).is_transient());
        assert!(classify_status(500, None).is_transient());
        assert!(classify_status(503, None).is_transient());

        match classify_status(404, None) {
            ClientError::Rejected { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_server_times_out_as_transient() {
        let app = Router::new().route(
            "/api/bills",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"data": bill_json()}))
            }),
        );
        let api = ApiClient::new(
            &ClientConfig::new(serve(app).await).with_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        let err = api.create_bill(&sample_request(), "key-1").await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");
        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        for raw in ["not a url", "ftp://example.com/api", ""] {
            let err = ApiClient::new(&ClientConfig::new(raw)).unwrap_err();
            assert!(matches!(err, ClientError::InvalidConfig(_)), "{raw}");
        }
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let api = ApiClient::new(&ClientConfig::new("https://pos.example.com/api/")).unwrap();
        assert_eq!(
            api.endpoint(&["printer", "print", "a/b"]).unwrap().as_str(),
            "https://pos.example.com/api/printer/print/a%2Fb"
        );
        assert_eq!(
            api.endpoint(&["bills"]).unwrap().as_str(),
            "https://pos.example.com/api/bills"
        );
    }

    #[tokio::test]
    async fn test_fetch_menu_sends_token_and_filter() {
        let app = Router::new().route(
            "/api/menu",
            get(
                |headers: HeaderMap, uri: axum::http::Uri| async move {
                    assert_eq!(headers["authorization"], "Bearer secret");
                    assert_eq!(uri.query(), Some("available=true"));
                    Json(json!({
                        "data": [
                            {"_id": "m1", "name": "Butter Chicken", "category": "Main", "price": 280, "stock": 5, "isAvailable": true},
                            {"_id": "m2", "name": "Naan", "price": 40.5, "stock": 0}
                        ]
                    }))
                },
            ),
        );
        let api = client(&serve(app).await);

        let items = api.fetch_menu().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Money::from_paise(28_000));
        assert_eq!(items[1].price, Money::from_paise(4_050));
        assert_eq!(items[1].stock, 0);
    }

    #[tokio::test]
    async fn test_create_bill_posts_payload_with_idempotency_key() {
        let app = Router::new().route(
            "/api/bills",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers[IDEMPOTENCY_HEADER], "cart-123");
                assert_eq!(body["items"][0]["menuItemId"], "m1");
                assert_eq!(body["discount"], 56.0);
                (AxumStatus::CREATED, Json(json!({ "data": bill_json() })))
            }),
        );
        let api = client(&serve(app).await);

        let bill = api.create_bill(&sample_request(), "cart-123").await.unwrap();
        assert_eq!(bill.bill_number, "B-1001");
        assert_eq!(bill.total, Money::from_paise(60_480));
        assert_eq!(bill.items[0].menu_item.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_create_bill_rejected_keeps_server_message() {
        let app = Router::new().route(
            "/api/bills",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(json!({"message": "Insufficient stock for Naan"})),
                )
            }),
        );
        let api = client(&serve(app).await);

        let err = api.create_bill(&sample_request(), "k").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Rejected {
                status: 400,
                message: "Insufficient stock for Naan".into()
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let app = Router::new().route(
            "/api/bills",
            post(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "down for maintenance") }),
        );
        let api = client(&serve(app).await);

        let err = api.create_bill(&sample_request(), "k").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unreadable_success_body_is_invalid_response() {
        let app = Router::new().route("/api/bills", post(|| async { "<html>ok</html>" }));
        let api = client(&serve(app).await);

        let err = api.create_bill(&sample_request(), "k").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}/api", addr));
        let err = api.fetch_menu().await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");
    }

    #[tokio::test]
    async fn test_printer_status_and_print() {
        let app = Router::new()
            .route(
                "/api/printer/status",
                get(|| async {
                    Json(json!({"status": "online", "printers": [{"name": "Counter", "isDefault": true}]}))
                }),
            )
            .route(
                "/api/printer/print/{bill_id}",
                post(|Path(bill_id): Path<String>, Json(body): Json<Value>| async move {
                    assert_eq!(bill_id, "65f0c0ffee");
                    assert_eq!(body["printerConfig"]["printerName"], "Counter");
                    Json(json!({"success": true, "message": "Queued"}))
                }),
            );
        let api = client(&serve(app).await);

        let status = api.printer_status().await.unwrap();
        assert!(status.is_available());

        let config = PrinterConfig {
            printer_name: "Counter".to_string(),
            paper_width: 42,
        };
        let response = api.print_bill("65f0c0ffee", &config).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Queued"));
    }
}
