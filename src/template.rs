//! Reference path retrieval
//!
//! Some screens overlay the expected path for a sign. The backend serves it
//! as a JSON array of `[x, y]` pairs.

use crate::dispatch::{DispatchError, Transport};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Request failed: {0}")]
    Request(#[from] DispatchError),

    #[error("Invalid data received from the server: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemplatePoint {
    pub x: f64,
    pub y: f64,
}

pub struct TemplateClient<T: Transport> {
    transport: Arc<T>,
    endpoint: String,
}

impl<T: Transport> TemplateClient<T> {
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn url_for(&self, sign: &str) -> String {
        format!("{}?sign={}", self.endpoint, urlencoding::encode(sign))
    }

    /// Fetch the reference path for `sign`.
    pub async fn fetch(&self, sign: &str) -> Result<Vec<TemplatePoint>, TemplateError> {
        let body = self.transport.get(&self.url_for(sign)).await?;
        let points = parse_template(&body)?;
        tracing::debug!("Fetched template for {} ({} points)", sign, points.len());
        Ok(points)
    }
}

pub fn parse_template(body: &str) -> Result<Vec<TemplatePoint>, TemplateError> {
    let pairs: Vec<Vec<f64>> =
        serde_json::from_str(body).map_err(|e| TemplateError::InvalidData(e.to_string()))?;

    if pairs.is_empty() {
        return Err(TemplateError::InvalidData("empty template".to_string()));
    }

    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| match pair.as_slice() {
            [x, y, ..] => Ok(TemplatePoint { x: *x, y: *y }),
            _ => Err(TemplateError::InvalidData(format!(
                "entry {} has {} values, expected 2",
                i,
                pair.len()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::error::Result as DispatchFallible;
    use crate::dispatch::OutboundRequest;
    use async_trait::async_trait;
    use parking_lot::Mutex as ParkingMutex;

    struct CannedTransport {
        body: DispatchFallible<String>,
        urls: ParkingMutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn post(&self, _request: OutboundRequest) -> DispatchFallible<String> {
            unreachable!("templates are read-only")
        }

        async fn get(&self, url: &str) -> DispatchFallible<String> {
            self.urls.lock().push(url.to_string());
            self.body.clone()
        }
    }

    fn client(body: DispatchFallible<String>) -> (TemplateClient<CannedTransport>, Arc<CannedTransport>) {
        let transport = Arc::new(CannedTransport {
            body,
            urls: ParkingMutex::new(Vec::new()),
        });
        (
            TemplateClient::new(transport.clone(), "http://127.0.0.1:5000/get-template"),
            transport,
        )
    }

    #[tokio::test]
    async fn test_fetch_parses_pairs() {
        let (client, transport) = client(Ok("[[10.5, 20], [11, 22.25]]".to_string()));

        let points = client.fetch("Ñ").await.unwrap();
        assert_eq!(
            points,
            vec![TemplatePoint { x: 10.5, y: 20.0 }, TemplatePoint { x: 11.0, y: 22.25 }]
        );
        assert_eq!(
            transport.urls.lock()[0],
            "http://127.0.0.1:5000/get-template?sign=%C3%91"
        );
    }

    #[tokio::test]
    async fn test_fetch_propagates_transport_error() {
        let (client, _) = client(Err(DispatchError::Transport("host unreachable".to_string())));
        let err = client.fetch("G").await.unwrap_err();
        assert!(matches!(err, TemplateError::Request(DispatchError::Transport(_))));
    }

    #[test]
    fn test_rejects_empty_and_short_pairs() {
        assert!(matches!(parse_template("[]"), Err(TemplateError::InvalidData(_))));
        assert!(matches!(parse_template("[[1, 2], [3]]"), Err(TemplateError::InvalidData(ref m)) if m.contains("entry 1")));
        assert!(matches!(parse_template("{\"x\": 1}"), Err(TemplateError::InvalidData(_))));
    }
}
