//! HTTP transport for the Nimbus Resource Manager API
//!
//! [`RestClient`] owns the base URL and bearer credentials and issues
//! authenticated requests; [`ApiResponse`] carries back the status, headers
//! and raw body so higher layers (the poller, workflows) can classify the
//! outcome themselves. Non-success statuses are decoded into
//! [`CoreError::Api`] using the remote error document where one is present.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{CoreError, Result};

/// User agent string for nimbus HTTP requests
const NIMBUS_USER_AGENT: &str = concat!("nimbusctl/", env!("CARGO_PKG_VERSION"));

/// Header naming the operation-status endpoint for asynchronous mutations
pub const OPERATION_LOCATION: &str = "operation-location";

/// Authenticated client for a single Resource Manager endpoint
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

/// A decoded-enough HTTP response: status, headers, and the raw body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RestClient {
    /// Create a client for `api_url` authenticating with a bearer token
    pub fn new(api_url: &str, access_token: &str) -> Result<Self> {
        let base_url = Url::parse(api_url)?;
        let http = reqwest::Client::builder()
            .user_agent(NIMBUS_USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    /// Resolve a path (or an already-absolute URL) against the base URL
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            Ok(Url::parse(path_or_url)?)
        } else {
            Ok(self.base_url.join(path_or_url)?)
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(Method::GET, url, None).await
    }

    /// GET against an already-resolved URL (operation-status endpoints come
    /// back as absolute URLs in response headers)
    pub async fn get_url(&self, url: &Url) -> Result<ApiResponse> {
        self.execute(Method::GET, url.clone(), None).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(Method::PUT, url, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(Method::PATCH, url, Some(body)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(Method::POST, url, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        let url = self.resolve(path)?;
        self.execute(Method::DELETE, url, None).await
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&Value>) -> Result<ApiResponse> {
        debug!(%method, %url, "issuing API request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        trace!(status = status.as_u16(), body_len = body.len(), "API response");

        if status.is_success() {
            return Ok(ApiResponse {
                status,
                headers,
                body,
            });
        }

        Err(api_error(status, &body))
    }
}

/// Build a [`CoreError::Api`] from a non-success response, preferring the
/// structured error document over raw body text
fn api_error(status: StatusCode, body: &[u8]) -> CoreError {
    let (code, message) = match serde_json::from_slice::<Value>(body) {
        Ok(doc) => {
            // Either `{"error": {"code", "message"}}` or the flat form
            let detail = doc.get("error").unwrap_or(&doc);
            let code = detail
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = detail
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            (code, message)
        }
        Err(_) => (None, None),
    };

    let message = message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            text.chars().take(200).collect()
        }
    });

    CoreError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The operation-status URL for an asynchronous acceptance, if the
    /// response named one (`Operation-Location`, falling back to `Location`)
    pub fn operation_url(&self) -> Option<Url> {
        self.header_str(OPERATION_LOCATION)
            .or_else(|| self.headers.get(LOCATION).and_then(|v| v.to_str().ok()))
            .and_then(|raw| Url::parse(raw).ok())
    }

    /// The `Operation-Location` header alone. A plain `Location` on a
    /// 200/201 names the created resource, not an operation, so it must not
    /// count as an asynchronous acceptance there.
    pub fn operation_location(&self) -> Option<Url> {
        self.header_str(OPERATION_LOCATION)
            .and_then(|raw| Url::parse(raw).ok())
    }

    /// The server's `Retry-After` hint in seconds, if present
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v: &HeaderValue| v.to_str().ok())
    }

    /// Whether the response carried a body at all. An empty-object body
    /// (`{}`) counts as present; a zero-length body does not.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Decode the body as JSON, treating an absent body as `None`
    pub fn body_value(&self) -> Result<Option<Value>> {
        if !self.has_body() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&self.body)?))
    }

    /// Decode the body into a typed payload; an absent body is an error
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> ApiResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(
                reqwest::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_operation_url_prefers_operation_location() {
        let resp = response(
            202,
            &[
                ("operation-location", "https://api.test/operations/1"),
                ("location", "https://api.test/other"),
            ],
            b"",
        );
        assert_eq!(
            resp.operation_url().unwrap().as_str(),
            "https://api.test/operations/1"
        );
    }

    #[test]
    fn test_operation_location_ignores_plain_location() {
        let resp = response(201, &[("location", "https://api.test/things/1")], b"{}");
        assert!(resp.operation_location().is_none());
        // The 202 accessor still honors the fallback.
        assert!(resp.operation_url().is_some());
    }

    #[test]
    fn test_operation_url_falls_back_to_location() {
        let resp = response(202, &[("location", "https://api.test/operations/2")], b"");
        assert_eq!(
            resp.operation_url().unwrap().as_str(),
            "https://api.test/operations/2"
        );
    }

    #[test]
    fn test_retry_after_parsed_as_seconds() {
        let resp = response(202, &[("retry-after", "15")], b"");
        assert_eq!(resp.retry_after(), Some(Duration::from_secs(15)));

        let resp = response(202, &[("retry-after", "not-a-number")], b"");
        assert_eq!(resp.retry_after(), None);
    }

    #[test]
    fn test_absent_body_is_distinct_from_empty_object() {
        let absent = response(200, &[], b"");
        assert!(!absent.has_body());
        assert!(absent.body_value().unwrap().is_none());

        let empty_object = response(200, &[], b"{}");
        assert!(empty_object.has_body());
        assert_eq!(
            empty_object.body_value().unwrap(),
            Some(serde_json::json!({}))
        );
    }

    #[test]
    fn test_api_error_decodes_wrapped_error_document() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            br#"{"error": {"code": "InvalidParameter", "message": "bad peering name"}}"#,
        );
        match err {
            CoreError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("InvalidParameter"));
                assert_eq!(message, "bad peering name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_status_reason() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        match err {
            CoreError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_joins_relative_and_passes_absolute() {
        let client = RestClient::new("https://api.test", "token").unwrap();
        assert_eq!(
            client.resolve("/subscriptions/abc").unwrap().as_str(),
            "https://api.test/subscriptions/abc"
        );
        assert_eq!(
            client.resolve("https://other.test/x").unwrap().as_str(),
            "https://other.test/x"
        );
    }
}
