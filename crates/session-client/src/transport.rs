//! HTTP transport seam.
//!
//! The client never talks to reqwest directly: every call goes through
//! [`Transport`], which takes a fully described [`ApiRequest`] and returns
//! whatever the server answered. Status interpretation is the client's job.

use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 401 body code marking an expired (rather than invalid) access token.
pub const TOKEN_EXPIRED_CODE: &str = "token.expired";

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Bearer credential sent as `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body<T: Serialize + ?Sized>(status: u16, body: &T) -> Self {
        Self::new(status, serde_json::to_string(body).unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `code` field of a JSON error body, if any.
    pub fn error_code(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.code)
    }

    /// A 401 whose body says the access token merely expired.
    pub fn is_token_expired(&self) -> bool {
        self.status == 401 && self.error_code().as_deref() == Some(TOKEN_EXPIRED_CODE)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turn a non-2xx response into `ClientError::Http`.
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Http {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Sends requests without interpreting responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

/// reqwest-backed transport rooted at an API base URL.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: Url) -> ClientResult<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: Url, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` under the base URL, keeping any base path prefix.
    pub fn url_for(&self, path: &str) -> ClientResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if let Some(token) = &request.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::Transport(format!("invalid bearer token: {e}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(method = %request.method, path = %request.path, status, "HTTP response");

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_token_expired_detection() {
        let expired = ApiResponse::new(401, r#"{"code":"token.expired"}"#);
        assert!(expired.is_token_expired());

        let invalid = ApiResponse::new(401, r#"{"code":"token.invalid"}"#);
        assert!(!invalid.is_token_expired());

        let not_json = ApiResponse::new(401, "Unauthorized");
        assert!(!not_json.is_token_expired());

        let wrong_status = ApiResponse::new(403, r#"{"code":"token.expired"}"#);
        assert!(!wrong_status.is_token_expired());
    }

    #[test]
    fn test_error_for_status() {
        assert!(ApiResponse::new(204, "").error_for_status().is_ok());
        let err = ApiResponse::new(404, "missing").error_for_status().unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let transport =
            ReqwestTransport::new(Url::parse("https://api.example.com/v1/").unwrap()).unwrap();
        assert_eq!(
            transport.url_for("/me").unwrap().as_str(),
            "https://api.example.com/v1/me"
        );
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(json!({ "refreshToken": "r-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t-2" })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let request = ApiRequest::post("/refresh")
            .with_json(&json!({ "refreshToken": "r-1" }))
            .unwrap()
            .with_bearer(Some("abc".to_string()));

        let response = transport.send(&request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json::<serde_json::Value>().unwrap()["token"], "t-2");
    }

    #[tokio::test]
    async fn test_reqwest_transport_returns_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "code": "token.expired" })),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let response = transport.send(&ApiRequest::get("/me")).await.unwrap();
        assert!(response.is_token_expired());
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_failure() {
        let transport =
            ReqwestTransport::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = transport.send(&ApiRequest::get("/me")).await.unwrap_err();
        assert!(err.is_transient());
    }
}
