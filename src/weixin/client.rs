//! HTTP client for the Weixin official account API.
//! One best-effort attempt per call; no retry layer.
use bytes::{Bytes, BytesMut};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::PublishError;

/// Reply envelope shared by every endpoint. Failures carry a non-zero
/// `errcode`; successes carry the endpoint's own fields.
#[derive(Debug, Deserialize)]
pub struct PlatformReply<T> {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> PlatformReply<T> {
    pub fn into_result(self) -> Result<T, CallError> {
        if self.errcode != 0 {
            return Err(CallError::Platform {
                code: self.errcode,
                message: self.errmsg.unwrap_or_default(),
            });
        }
        Ok(self.data)
    }
}

/// Failure of a single platform call, before it is classified by the caller.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("platform error {code}: {message}")]
    Platform { code: i64, message: String },

    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl CallError {
    pub fn code(&self) -> Option<i64> {
        match self {
            CallError::Platform { code, .. } => Some(*code),
            CallError::Transport(_) | CallError::TooLarge { .. } => None,
        }
    }

    /// Platform `errmsg` verbatim, or the transport error text.
    pub fn detail(&self) -> String {
        match self {
            CallError::Platform { message, .. } => message.clone(),
            CallError::Transport(e) => e.to_string(),
            CallError::TooLarge { .. } => self.to_string(),
        }
    }

    pub fn into_upload_error(self) -> PublishError {
        PublishError::upload(self.code(), self.detail())
    }

    pub fn into_publish_error(self) -> PublishError {
        PublishError::publish(self.code(), self.detail())
    }

    pub fn into_auth_error(self) -> PublishError {
        match self {
            CallError::Platform { code, message } => {
                PublishError::authentication(format!("errcode {}: {}", code, message))
            }
            other => PublishError::authentication(other.detail()),
        }
    }
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        // Query strings carry the secret or the access token.
        CallError::Transport(e.without_url())
    }
}

#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(8)
            .user_agent(concat!("publisher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET an API path and decode the reply envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CallError> {
        let resp = self.http.get(self.url(path)).query(query).send().await?;
        let reply: PlatformReply<T> = resp.json().await?;
        reply.into_result()
    }

    /// POST a JSON body to an authenticated API path.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        access_token: &str,
        body: &B,
    ) -> Result<T, CallError> {
        let resp = self
            .http
            .post(self.url(path))
            .query(&[("access_token", access_token)])
            .json(body)
            .send()
            .await?;
        let reply: PlatformReply<T> = resp.json().await?;
        reply.into_result()
    }

    /// POST a single file as the multipart field `media`.
    pub async fn post_media<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        extra_query: &[(&str, &str)],
        media: Part,
    ) -> Result<T, CallError> {
        let form = Form::new().part("media", media);
        let resp = self
            .http
            .post(self.url(path))
            .query(&[("access_token", access_token)])
            .query(extra_query)
            .header(reqwest::header::ACCEPT, "*/*")
            .multipart(form)
            .send()
            .await?;
        let reply: PlatformReply<T> = resp.json().await?;
        reply.into_result()
    }

    /// Download raw bytes from an arbitrary (non-platform) URL, reading at
    /// most `max_bytes`.
    pub async fn fetch_bytes(&self, url: &str, max_bytes: usize) -> Result<Bytes, CallError> {
        let mut resp = self.http.get(url).send().await?.error_for_status()?;
        if resp
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(CallError::TooLarge { limit: max_bytes });
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = resp.chunk().await? {
            if body.len() + chunk.len() > max_bytes {
                return Err(CallError::TooLarge { limit: max_bytes });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct UrlReply {
        url: Option<String>,
    }

    #[test]
    fn test_success_envelope() {
        let reply: PlatformReply<UrlReply> =
            serde_json::from_str(r#"{"url": "http://mmbiz.qpic.cn/x"}"#).unwrap();
        let data = reply.into_result().unwrap();
        assert_eq!(data.url.as_deref(), Some("http://mmbiz.qpic.cn/x"));
    }

    #[test]
    fn test_zero_errcode_is_success() {
        let reply: PlatformReply<UrlReply> =
            serde_json::from_str(r#"{"errcode": 0, "errmsg": "ok", "url": "u"}"#).unwrap();
        assert!(reply.into_result().is_ok());
    }

    #[test]
    fn test_error_envelope() {
        let reply: PlatformReply<UrlReply> =
            serde_json::from_str(r#"{"errcode": 40005, "errmsg": "invalid file type"}"#).unwrap();
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.code(), Some(40005));
        assert_eq!(err.detail(), "invalid file type");

        let err = err.into_upload_error();
        assert_eq!(err.code(), Some(40005));
        assert_eq!(err.detail(), "invalid file type");
    }

    #[tokio::test]
    async fn test_fetch_bytes_enforces_limit() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64]))
            .mount(&server)
            .await;
        let client = PlatformClient::new(server.uri()).unwrap();
        let url = format!("{}/img", server.uri());

        let body = client.fetch_bytes(&url, 64).await.unwrap();
        assert_eq!(body.len(), 64);

        let err = client.fetch_bytes(&url, 63).await.unwrap_err();
        assert!(matches!(err, CallError::TooLarge { limit: 63 }));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = PlatformClient::new("http://localhost:1234/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.url("/cgi-bin/token"), "http://localhost:1234/cgi-bin/token");
    }
}
