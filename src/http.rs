//! HTTP client wrapper for Dropbox API requests.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RANGE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response};

use crate::error::{DropboxError, Result};

/// Header carrying JSON arguments on content endpoints.
pub const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Header carrying JSON results on download endpoints.
pub const API_RESULT_HEADER: &str = "Dropbox-API-Result";

/// Response body delivered piece by piece.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Status and selected headers of a response whose body is not read yet.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    /// `Retry-After` in seconds, when present.
    pub retry_after: Option<u64>,
    /// `Dropbox-API-Result`, when present.
    pub api_result: Option<String>,
    body: Response,
}

impl HttpResponse {
    fn new(response: Response) -> Self {
        let headers = response.headers();
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let api_result = headers
            .get(API_RESULT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            status: response.status().as_u16(),
            retry_after,
            api_result,
            body: response,
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.body.bytes().await?)
    }

    /// Read the whole body as (lossy) UTF-8 text.
    pub async fn text(self) -> String {
        match self.body.bytes().await {
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(e) => format!("<unreadable body: {}>", e),
        }
    }

    /// Hand the body over as a stream, without buffering it.
    pub fn into_stream(self) -> ByteStream {
        self.body.bytes_stream().map_err(DropboxError::from).boxed()
    }
}

/// HTTP client for making requests to Dropbox servers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DropboxError::Config(format!("Failed to build client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(proxy: &str, timeout: Duration) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| DropboxError::Config(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| DropboxError::Config(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    /// POST a JSON body to an RPC endpoint.
    pub async fn post_json(&self, url: &str, token: &str, body: &str) -> Result<HttpResponse> {
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        Self::send(request).await
    }

    /// POST to a content endpoint, arguments in the `Dropbox-API-Arg` header.
    ///
    /// `arg` must already be header-safe (see [`header_safe_json`]). With
    /// `limit`, only the first `limit` bytes of the result are requested.
    pub async fn post_content(
        &self,
        url: &str,
        token: &str,
        arg: &str,
        body: Bytes,
        limit: Option<u64>,
    ) -> Result<HttpResponse> {
        let mut request = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(API_ARG_HEADER, arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if let Some(range) = limit.and_then(range_header) {
            request = request.header(RANGE, range);
        }
        Self::send(request).await
    }

    async fn send(request: RequestBuilder) -> Result<HttpResponse> {
        Ok(HttpResponse::new(request.send().await?))
    }
}

/// `Range` value for the first `limit` bytes. There is no range for zero bytes.
fn range_header(limit: u64) -> Option<String> {
    (limit > 0).then(|| format!("bytes=0-{}", limit - 1))
}

/// Serialize JSON for an HTTP header.
///
/// Header values must be ASCII, so every non-ASCII character (and DEL) is
/// written as a `\uXXXX` escape, using surrogate pairs above the BMP.
pub fn header_safe_json(value: &serde_json::Value) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}
