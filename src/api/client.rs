//! Dropbox v2 HTTP API client with request/response handling.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::error::ApiErrorKind;
use crate::api::metadata::{
    FileMetadata, ListFolderResult, Metadata, RelocationResult, UploadCursor,
    UploadSessionStartResult,
};
use crate::api::remote::RemoteStorage;
use crate::config::ConnectionConfig;
use crate::error::{DropboxError, Result};
use crate::http::{header_safe_json, ByteStream, HttpClient, HttpResponse};

/// Base URL for RPC endpoints
const API_URL: &str = "https://api.dropboxapi.com/2";

/// Base URL for content (upload/download) endpoints
const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const INITIAL_DELAY_MS: u64 = 250;
const MAX_DELAY_MS: u64 = 60_000;

/// A request that can be sent more than once.
enum Request {
    Rpc {
        url: String,
        body: String,
    },
    Content {
        url: String,
        arg: String,
        data: Bytes,
        limit: Option<u64>,
    },
}

/// Body of an HTTP 409 endpoint error.
#[derive(Deserialize)]
struct EndpointError {
    error_summary: String,
}

/// Dropbox API client.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    access_token: String,
    max_retries: u32,
    api_url: String,
    content_url: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("http", &self.http)
            .field("max_retries", &self.max_retries)
            .field("api_url", &self.api_url)
            .field("content_url", &self.content_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from connection settings.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        Self::with_base_urls(config, API_URL, CONTENT_URL)
    }

    /// Create a client talking to other RPC and content hosts.
    pub(crate) fn with_base_urls(
        config: &ConnectionConfig,
        api_url: &str,
        content_url: &str,
    ) -> Result<Self> {
        config.validate()?;
        let http = match &config.proxy {
            Some(proxy) => HttpClient::with_proxy(proxy, config.timeout())?,
            None => HttpClient::new(config.timeout())?,
        };
        Ok(Self {
            http,
            access_token: config.access_token.clone(),
            max_retries: config.max_retries,
            api_url: api_url.trim_end_matches('/').to_string(),
            content_url: content_url.trim_end_matches('/').to_string(),
        })
    }

    /// Call an RPC endpoint with JSON arguments.
    pub async fn rpc<T: DeserializeOwned>(&self, endpoint: &str, args: Value) -> Result<T> {
        let request = Request::Rpc {
            url: format!("{}/{}", self.api_url, endpoint),
            body: serde_json::to_string(&args)?,
        };
        let response = self.execute(endpoint, &request).await?;
        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }

    /// Call a content endpoint. The response body is left unread.
    async fn content_request(
        &self,
        endpoint: &str,
        args: Value,
        data: Bytes,
        limit: Option<u64>,
    ) -> Result<HttpResponse> {
        let request = Request::Content {
            url: format!("{}/{}", self.content_url, endpoint),
            arg: header_safe_json(&args)?,
            data,
            limit,
        };
        self.execute(endpoint, &request).await
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn execute(&self, endpoint: &str, request: &Request) -> Result<HttpResponse> {
        let mut delay_ms = INITIAL_DELAY_MS;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            debug!(endpoint, attempts, "api request");

            let response = match request {
                Request::Rpc { url, body } => {
                    self.http.post_json(url, &self.access_token, body).await?
                }
                Request::Content {
                    url,
                    arg,
                    data,
                    limit,
                } => {
                    self.http
                        .post_content(url, &self.access_token, arg, data.clone(), *limit)
                        .await?
                }
            };
            debug!(endpoint, status = response.status, "api response");

            if response.is_success() {
                return Ok(response);
            }

            let status = response.status;
            let retry_after = response.retry_after;
            match status {
                409 => {
                    let err = endpoint_error(status, &response.bytes().await?);
                    if !is_throttled(&err) {
                        return Err(err);
                    }
                }
                429 | 503 => {}
                _ => {
                    return Err(DropboxError::HttpError {
                        status,
                        body: response.text().await,
                    })
                }
            }

            if attempts > self.max_retries {
                return Err(DropboxError::RateLimited);
            }
            let wait_ms = backoff_ms(retry_after, delay_ms);
            warn!(endpoint, status, wait_ms, "rate limited, backing off");
            sleep(Duration::from_millis(wait_ms)).await;
            delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
        }
    }
}

/// How long to wait before the next attempt: the server's `Retry-After`
/// when given, else `delay_ms` plus up to half of it again. Never above
/// [`MAX_DELAY_MS`].
fn backoff_ms(retry_after: Option<u64>, delay_ms: u64) -> u64 {
    let wait = match retry_after {
        Some(secs) => secs.saturating_mul(1000),
        None => delay_ms + rand::thread_rng().gen_range(0..=delay_ms / 2),
    };
    wait.min(MAX_DELAY_MS)
}

/// Turn an HTTP 409 body into a structured API error.
fn endpoint_error(status: u16, body: &[u8]) -> DropboxError {
    match serde_json::from_slice::<EndpointError>(body) {
        Ok(err) => DropboxError::api(err.error_summary),
        Err(_) => DropboxError::HttpError {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Endpoint errors that mean "slow down" rather than "this failed".
fn is_throttled(err: &DropboxError) -> bool {
    match err {
        DropboxError::ApiError { summary } => matches!(
            summary.kind(),
            ApiErrorKind::TooManyRequests | ApiErrorKind::TooManyWriteOperations
        ),
        _ => false,
    }
}

/// The API names the namespace root with the empty string.
fn api_path(path: &str) -> &str {
    if path == "/" {
        ""
    } else {
        path
    }
}

fn commit_info(path: &str) -> Value {
    json!({
        "path": path,
        "mode": "overwrite",
        "mute": true
    })
}

async fn parse_body<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let body = response.bytes().await?;
    parse_json(&body)
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        DropboxError::InvalidResponse(format!("{}: {}", e, String::from_utf8_lossy(body)))
    })
}

#[async_trait]
impl RemoteStorage for ApiClient {
    async fn get_metadata(&self, path: &str) -> Result<Metadata> {
        self.rpc("files/get_metadata", json!({ "path": api_path(path) }))
            .await
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>> {
        let mut page: ListFolderResult = self
            .rpc(
                "files/list_folder",
                json!({ "path": api_path(path), "recursive": recursive }),
            )
            .await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more {
            page = self
                .rpc("files/list_folder/continue", json!({ "cursor": page.cursor }))
                .await?;
            entries.append(&mut page.entries);
        }

        Ok(entries)
    }

    async fn download(&self, path: &str, limit: Option<u64>) -> Result<ByteStream> {
        let response = self
            .content_request(
                "files/download",
                json!({ "path": api_path(path) }),
                Bytes::new(),
                limit,
            )
            .await?;
        if response.api_result.is_none() {
            return Err(DropboxError::InvalidResponse(
                "download response has no result header".to_string(),
            ));
        }
        Ok(response.into_stream())
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<FileMetadata> {
        let response = self
            .content_request("files/upload", commit_info(path), Bytes::from(data), None)
            .await?;
        parse_body(response).await
    }

    async fn upload_session_start(&self, data: Vec<u8>) -> Result<String> {
        let response = self
            .content_request(
                "files/upload_session/start",
                json!({ "close": false }),
                Bytes::from(data),
                None,
            )
            .await?;
        let started: UploadSessionStartResult = parse_body(response).await?;
        Ok(started.session_id)
    }

    async fn upload_session_append(&self, data: Vec<u8>, cursor: &UploadCursor) -> Result<()> {
        self.content_request(
            "files/upload_session/append_v2",
            json!({ "cursor": cursor, "close": false }),
            Bytes::from(data),
            None,
        )
        .await?;
        Ok(())
    }

    async fn upload_session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        path: &str,
    ) -> Result<FileMetadata> {
        let response = self
            .content_request(
                "files/upload_session/finish",
                json!({ "cursor": cursor, "commit": commit_info(path) }),
                Bytes::from(data),
                None,
            )
            .await?;
        parse_body(response).await
    }

    /// Closes the session; Dropbox has no explicit discard and expires it later.
    async fn upload_session_abort(&self, cursor: &UploadCursor) -> Result<()> {
        self.content_request(
            "files/upload_session/append_v2",
            json!({ "cursor": cursor, "close": true }),
            Bytes::new(),
            None,
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<Metadata> {
        let result: RelocationResult = self
            .rpc("files/delete_v2", json!({ "path": api_path(path) }))
            .await?;
        Ok(result.metadata)
    }

    async fn move_path(&self, from: &str, to: &str) -> Result<Metadata> {
        let result: RelocationResult = self
            .rpc(
                "files/move_v2",
                json!({
                    "from_path": api_path(from),
                    "to_path": api_path(to),
                    "autorename": false
                }),
            )
            .await?;
        Ok(result.metadata)
    }

    async fn close(&self) {
        info!("closing dropbox session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A canned HTTP reply: status, extra headers, body.
    struct Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: String,
    }

    impl Reply {
        fn ok(body: serde_json::Value) -> Self {
            Self {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            }
        }

        fn status(status: u16, body: &str) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }
        }

        fn header(mut self, name: &'static str, value: &str) -> Self {
            self.headers.push((name, value.to_string()));
            self
        }
    }

    /// A request as the server saw it.
    #[derive(Debug, Clone)]
    struct Seen {
        head: String,
        body: String,
    }

    impl Seen {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }

        fn header(&self, name: &str) -> Option<String> {
            self.head.lines().skip(1).find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_string())
            })
        }
    }

    /// Serve `replies` in order, one connection each, and record the requests.
    async fn serve(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<Seen>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos;
                    }
                    assert!(n > 0, "connection closed before request head");
                };
                let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
                let request = Seen {
                    head,
                    body: String::new(),
                };
                let length: usize = request
                    .header("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                while buf.len() < head_end + 4 + length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    assert!(n > 0, "connection closed before request body");
                    buf.extend_from_slice(&chunk[..n]);
                }
                let body = String::from_utf8_lossy(&buf[head_end + 4..head_end + 4 + length])
                    .into_owned();
                log.lock().unwrap().push(Seen { body, ..request });

                let mut response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for (name, value) in &reply.headers {
                    response.push_str(&format!("{}: {}\r\n", name, value));
                }
                response.push_str("\r\n");
                response.push_str(&reply.body);
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (base, seen)
    }

    fn client(base: &str, max_retries: u32) -> ApiClient {
        let mut config = ConnectionConfig::new("token");
        config.max_retries = max_retries;
        config.timeout_secs = 10;
        ApiClient::with_base_urls(&config, base, base).unwrap()
    }

    fn folder(name: &str) -> serde_json::Value {
        json!({".tag": "folder", "name": name, "path_display": format!("/{}", name)})
    }

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new(&ConnectionConfig::new("token")).unwrap();
        assert_eq!(client.max_retries, 5);
        assert_eq!(client.api_url, API_URL);
        assert_eq!(client.content_url, CONTENT_URL);
    }

    #[test]
    fn test_client_rejects_empty_token() {
        assert!(ApiClient::new(&ConnectionConfig::new("")).is_err());
    }

    #[test]
    fn test_proxy_creation() {
        let mut config = ConnectionConfig::new("token");
        config.proxy = Some("http://127.0.0.1:8080".to_string());
        assert!(ApiClient::new(&config).is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::new(&ConnectionConfig::new("sl.secret")).unwrap();
        assert!(!format!("{:?}", client).contains("sl.secret"));
    }

    #[test]
    fn test_api_path_root() {
        assert_eq!(api_path("/"), "");
        assert_eq!(api_path("/a/b"), "/a/b");
    }

    #[test]
    fn test_endpoint_error_parsing() {
        let err = endpoint_error(
            409,
            br#"{"error_summary": "path_lookup/not_found/..", "error": {".tag": "path_lookup"}}"#,
        );
        assert!(err.is_not_found());

        let err = endpoint_error(409, b"not json");
        assert!(matches!(err, DropboxError::HttpError { status: 409, .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_throttle_detection() {
        assert!(is_throttled(&DropboxError::api("too_many_write_operations/..")));
        assert!(is_throttled(&DropboxError::api("path/too_many_requests/")));
        assert!(!is_throttled(&DropboxError::api("path/not_found/..")));
        assert!(!is_throttled(&DropboxError::RateLimited));
    }

    #[test]
    fn test_commit_info_overwrites() {
        let commit = commit_info("/a.txt");
        assert_eq!(commit["mode"], "overwrite");
        assert_eq!(commit["mute"], true);
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = parse_json::<FileMetadata>(b"null").unwrap_err();
        assert!(matches!(err, DropboxError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_list_folder_follows_continuation() {
        let (base, seen) = serve(vec![
            Reply::ok(json!({"entries": [folder("a")], "cursor": "c1", "has_more": true})),
            Reply::ok(json!({"entries": [folder("b"), folder("c")], "cursor": "c2", "has_more": false})),
        ])
        .await;

        let entries = client(&base, 0).list_folder("/", true).await.unwrap();
        let names: Vec<&str> = entries.iter().map(Metadata::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let seen = seen.lock().unwrap();
        assert!(seen[0].request_line().contains("/files/list_folder "));
        let first: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(first, json!({"path": "", "recursive": true}));
        assert!(seen[1].request_line().contains("/files/list_folder/continue "));
        let second: Value = serde_json::from_str(&seen[1].body).unwrap();
        assert_eq!(second, json!({"cursor": "c1"}));
        assert_eq!(seen[1].header("authorization").as_deref(), Some("Bearer token"));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let (base, seen) = serve(vec![
            Reply::status(429, "slow down").header("Retry-After", "0"),
            Reply::status(409, r#"{"error_summary": "too_many_requests/.."}"#)
                .header("Retry-After", "0"),
            Reply::ok(json!({".tag": "folder", "name": "docs"})),
        ])
        .await;

        let metadata = client(&base, 3).get_metadata("/docs").await.unwrap();
        assert_eq!(metadata.name(), "docs");
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_retried_upload_resends_the_same_body() {
        let (base, seen) = serve(vec![
            Reply::status(503, "").header("Retry-After", "0"),
            Reply::ok(json!({"session_id": "s-1"})),
        ])
        .await;

        let chunk = b"chunk of data".to_vec();
        let id = client(&base, 1)
            .upload_session_start(chunk.clone())
            .await
            .unwrap();
        assert_eq!(id, "s-1");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for request in seen.iter() {
            assert!(request.request_line().contains("/files/upload_session/start "));
            assert_eq!(request.body.as_bytes(), chunk.as_slice());
        }
    }

    #[tokio::test]
    async fn test_retries_stop_at_limit() {
        let (base, seen) = serve(vec![
            Reply::status(503, "").header("Retry-After", "0"),
            Reply::status(429, "").header("Retry-After", "0"),
            Reply::status(429, "").header("Retry-After", "0"),
        ])
        .await;

        let err = client(&base, 2).get_metadata("/docs").await.unwrap_err();
        assert!(matches!(err, DropboxError::RateLimited));
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_endpoint_errors_are_not_retried() {
        let (base, seen) = serve(vec![Reply::status(
            409,
            r#"{"error_summary": "path/not_found/.."}"#,
        )])
        .await;

        let err = client(&base, 5).get_metadata("/gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_backoff_is_bounded() {
        assert_eq!(backoff_ms(Some(0), 250), 0);
        assert_eq!(backoff_ms(Some(2), 250), 2000);
        assert_eq!(backoff_ms(Some(u64::MAX), 250), MAX_DELAY_MS);
        assert_eq!(backoff_ms(Some(3600), 250), MAX_DELAY_MS);

        let jittered = backoff_ms(None, 1000);
        assert!((1000..=1500).contains(&jittered));
        assert_eq!(backoff_ms(None, MAX_DELAY_MS), MAX_DELAY_MS);
    }

    #[tokio::test]
    async fn test_download_requests_only_the_limit() {
        let (base, seen) = serve(vec![
            Reply::status(200, "hello").header(
                "Dropbox-API-Result",
                r#"{"name": "a.txt", "size": 11}"#,
            ),
        ])
        .await;

        let mut stream = client(&base, 0)
            .download("/a.txt", Some(5))
            .await
            .unwrap();
        let mut body = Vec::new();
        while let Some(piece) = stream.next().await {
            body.extend_from_slice(&piece.unwrap());
        }
        assert_eq!(body, b"hello");

        let seen = seen.lock().unwrap();
        assert!(seen[0].request_line().contains("/files/download "));
        assert_eq!(seen[0].header("range").as_deref(), Some("bytes=0-4"));
        assert_eq!(
            seen[0].header("dropbox-api-arg").as_deref(),
            Some(r#"{"path":"/a.txt"}"#)
        );
    }

    #[tokio::test]
    async fn test_download_without_limit_has_no_range() {
        let (base, seen) = serve(vec![Reply::status(200, "abc")
            .header("Dropbox-API-Result", r#"{"name": "a", "size": 3}"#)])
        .await;

        let stream = client(&base, 0).download("/a", None).await.unwrap();
        let pieces: Vec<Result<Bytes>> = stream.collect().await;
        let total: usize = pieces.iter().map(|p| p.as_ref().unwrap().len()).sum();
        assert_eq!(total, 3);
        assert!(seen.lock().unwrap()[0].header("range").is_none());
    }
}
