//! HTTP transport to the recognition backend

use crate::dispatch::error::{DispatchError, Result};
use crate::dispatch::LabelHeader;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::time::Duration;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// A fully built upload, owned by value so it can outlive the gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub endpoint: String,
    pub label_header: LabelHeader,
    pub label: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Network seam for dispatch and template retrieval.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// POST the request and return the response body as text.
    async fn post(&self, request: OutboundRequest) -> Result<String>;

    /// GET the url and return the response body as text.
    async fn get(&self, url: &str) -> Result<String>;
}

/// `Transport` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport. No timeout is applied unless one is given.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DispatchError::Transport(format!(
                "server returned {}: {}",
                status, body
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: OutboundRequest) -> Result<String> {
        // Labels such as "Ñ" are not plain ASCII; send their UTF-8 bytes as-is.
        let label = HeaderValue::from_bytes(request.label.as_bytes()).map_err(|e| {
            DispatchError::Transport(format!("invalid {} header: {}", request.label_header, e))
        })?;

        let response = self
            .client
            .post(&request.endpoint)
            .header(request.label_header.header_name(), label)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        Self::read_body(response).await
    }

    async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Self::read_body(response).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one canned HTTP response on loopback.
    ///
    /// The join handle yields the raw request bytes.
    pub(crate) async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn json_request(endpoint: String) -> OutboundRequest {
        OutboundRequest {
            endpoint,
            label_header: LabelHeader::Sign,
            label: "CH".to_string(),
            content_type: CONTENT_TYPE_JSON,
            body: br#"[{"location":{"x":1.0,"y":2.0},"timestamp":0.5}]"#.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_post_sends_label_and_returns_body() {
        let (base, server) = serve_once("200 OK", "Sign CH recognised").await;
        let transport = HttpTransport::new(None).unwrap();

        let text = transport
            .post(json_request(format!("{}/receive_json", base)))
            .await
            .unwrap();
        assert_eq!(text, "Sign CH recognised");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /receive_json"));
        assert!(request.contains("sign: ch"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.contains(r#""timestamp":0.5"#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "boom").await;
        let transport = HttpTransport::new(None).unwrap();

        let err = transport.post(json_request(base)).await.unwrap_err();
        match err {
            DispatchError::Transport(msg) => {
                assert!(msg.contains("500"), "{}", msg);
                assert!(msg.contains("boom"), "{}", msg);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Some(Duration::from_secs(5))).unwrap();
        let err = transport
            .post(json_request(format!("http://{}/receive_json", addr)))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(ref msg) if !msg.is_empty()));
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let (base, server) = serve_once("200 OK", "[[1,2]]").await;
        let transport = HttpTransport::new(None).unwrap();

        let text = transport.get(&format!("{}/get-template?sign=G", base)).await.unwrap();
        assert_eq!(text, "[[1,2]]");
        assert!(server.await.unwrap().starts_with("GET /get-template?sign=G"));
    }
}
