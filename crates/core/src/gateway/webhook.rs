use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

use super::{GatewayError, RecordGateway};
use crate::models::BorrowRecord;

/// Posts each record as JSON to a spreadsheet-backed webhook.
///
/// One attempt per record. The request carries no idempotency key, so a
/// timeout may still have produced a row on the other side.
#[derive(Debug, Clone)]
pub struct WebhookGateway {
    client: reqwest::Client,
    url: String,
}

impl WebhookGateway {
    /// Create a gateway for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Target endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordGateway for WebhookGateway {
    async fn submit(&self, record: &BorrowRecord) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|err| {
                warn!(record_id = %record.id, error = %err, "Webhook request failed");
                GatewayError::from(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(record_id = %record.id, status = status.as_u16(), "Webhook rejected record");
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        info!(record_id = %record.id, kind = %record.kind, "Record forwarded to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    // Accepts one connection, captures the JSON body, answers with `status_line`.
    async fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/exec", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 1024];
            let body = loop {
                let read = socket.read(&mut chunk).await.unwrap();
                buffer.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&buffer).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|value| value.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    let body_start = split + 4;
                    if buffer.len() >= body_start + length {
                        break buffer[body_start..body_start + length].to_vec();
                    }
                }
                if read == 0 {
                    break Vec::new();
                }
            };
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            serde_json::from_slice(&body).unwrap()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn posts_record_as_json() {
        let (url, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let gateway = WebhookGateway::new(url, Duration::from_secs(5)).unwrap();
        let record = BorrowRecord::return_all("12345");

        gateway.submit(&record).await.unwrap();

        let body = server.await.unwrap();
        assert_eq!(body["id"], record.id.as_str());
        assert_eq!(body["studentId"], "12345");
        assert_eq!(body["type"], "RETURN");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (url, server) = one_shot_server("HTTP/1.1 503 Service Unavailable").await;
        let gateway = WebhookGateway::new(url, Duration::from_secs(5)).unwrap();

        let err = gateway
            .submit(&BorrowRecord::return_all("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::HttpStatus(503)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_url_is_a_request_error() {
        let gateway = WebhookGateway::new("://bad", Duration::from_secs(1)).unwrap();
        let err = gateway
            .submit(&BorrowRecord::return_all("12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
    }
}
