//! HTTP transport seam.
//!
//! Service clients build [`HttpRequest`]s and hand them to an
//! [`HttpTransport`]. Production code uses [`ReqwestTransport`]; tests plug
//! in scripted transports.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Headers.
    pub headers: HeaderMap,
    /// Body bytes.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidRequest(format!("invalid value for {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets a JSON body and content type.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        self.headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers.
    pub headers: HeaderMap,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8 (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Converts a non-success response into a service error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::from_status(self.status, &self.text()))
        }
    }
}

/// Sends requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns whatever response arrived, successful or
    /// not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when no response was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wraps a configured client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::post("https://example.com/submitJob".parse().unwrap())
            .header("x-xbl-contract-version", "100")
            .unwrap()
            .json(&serde_json::json!({ "userId": "1" }))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header_value("x-xbl-contract-version"), Some("100"));
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some(br#"{"userId":"1"}"#.as_slice()));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let request = HttpRequest::get("https://example.com".parse().unwrap());
        assert!(request.header("x-test", "line\nbreak").is_err());
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse::new(StatusCode::OK, "fine");
        assert!(ok.error_for_status().is_ok());

        let throttled = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, "slow down");
        let error = throttled.error_for_status().unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::TooManyRequests);
    }
}
