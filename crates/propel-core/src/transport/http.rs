//! `reqwest`-backed transport with retries for unreachable servers

use std::time::Duration;

use async_trait::async_trait;

use super::{ExponentialBackoff, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use crate::config::ClientConfig;
use crate::error::TransportError;

/// Longest single pause between retries
const MAX_RETRY_DELAY: Duration = Duration::from_secs(120);

/// Transport over a shared `reqwest::Client`
///
/// Connection failures are retried `retries` times with exponential backoff.
/// Everything else, including error statuses, is returned on the first try.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retries: u32,
    backoff_factor: f64,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retries: config.http_retries,
            backoff_factor: config.backoff_factor,
        })
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut backoff = ExponentialBackoff::from_factor(self.backoff_factor, MAX_RETRY_DELAY);
        let mut attempt = 0;

        loop {
            match self.send_once(&request).await {
                Err(e) if e.is_connectivity() && attempt < self.retries => {
                    attempt += 1;
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        "{} {} unreachable ({}), retry {}/{} in {:?}",
                        request.method,
                        request.url,
                        e,
                        attempt,
                        self.retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
